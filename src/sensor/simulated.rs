use super::SensorReading;
use crate::geo::{destination, distance_km, Coordinate};
use crate::hash::{jitter, mix, unit};

/// Stream ids for the noise generator
const STREAM_STEP: u64 = 1;
const STREAM_TURN: u64 = 2;
const STREAM_ACCURACY: u64 = 3;
const STREAM_COMPASS: u64 = 4;

/// Deterministic walker: drifts around an origin while the compass sweeps
/// slowly, with jittered accuracy. Stays within `max_radius_km` of origin.
pub struct SimulatedSource {
    origin: Coordinate,
    position: Coordinate,
    course: f64,
    heading: f64,
    step: u64,
    max_radius_km: f64,
}

impl SimulatedSource {
    pub fn new(origin: Coordinate) -> Self {
        Self {
            origin,
            position: origin,
            course: 0.0,
            heading: 0.0,
            step: 0,
            max_radius_km: 2.0,
        }
    }

    /// Advance one tick and return a position and an orientation reading
    pub fn next_readings(&mut self) -> [SensorReading; 2] {
        self.step += 1;

        // Walking pace, about 1.4 m per tick, with a wandering course
        self.course = (self.course + jitter(self.step, STREAM_TURN, 25.0)).rem_euclid(360.0);
        let dist_km = 0.0014 * (0.5 + unit(mix(self.step, STREAM_STEP)));
        let next = destination(self.position, self.course, dist_km);

        self.position = if distance_km(self.origin, next) > self.max_radius_km {
            // Turn back toward the origin
            self.course = (self.course + 180.0).rem_euclid(360.0);
            destination(self.position, self.course, dist_km)
        } else {
            next
        };

        let accuracy_m = 5.0 + unit(mix(self.step, STREAM_ACCURACY)) * 30.0;

        self.heading = (self.heading + 1.5 + jitter(self.step, STREAM_COMPASS, 2.0)).rem_euclid(360.0);

        [
            SensorReading::Position {
                coord: self.position,
                accuracy_m: Some(accuracy_m),
            },
            SensorReading::Orientation {
                compass: Some(self.heading),
                alpha: None,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stays_near_origin() {
        let origin = Coordinate::new(32.0, 34.8);
        let mut sim = SimulatedSource::new(origin);
        for _ in 0..10_000 {
            let [pos, _] = sim.next_readings();
            let SensorReading::Position { coord, accuracy_m } = pos else {
                panic!("expected a position first");
            };
            assert!(distance_km(origin, coord) <= 2.01);
            let acc = accuracy_m.unwrap();
            assert!((5.0..35.0).contains(&acc));
        }
    }

    #[test]
    fn test_heading_in_range_and_deterministic() {
        let origin = Coordinate::new(0.0, 0.0);
        let mut a = SimulatedSource::new(origin);
        let mut b = SimulatedSource::new(origin);
        for _ in 0..500 {
            let ra = a.next_readings();
            let rb = b.next_readings();
            assert_eq!(ra, rb);
            if let SensorReading::Orientation {
                compass: Some(h), ..
            } = ra[1]
            {
                assert!((0.0..360.0).contains(&h));
            }
        }
    }
}
