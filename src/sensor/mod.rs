//! Sensor bridge.
//!
//! Position and orientation come from one configured source and are turned
//! into [`AppEvent`]s: coordinates with an accuracy radius, and normalized
//! compass headings.

pub mod gpsd;
mod simulated;

pub use simulated::SimulatedSource;

use crate::config::{SensorConfig, SourceKind};
use crate::event::{AppEvent, EventSender};
use crate::geo::{heading_from_orientation, Coordinate};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

/// A raw platform reading before conversion
#[derive(Clone, Debug, PartialEq)]
pub enum SensorReading {
    Position {
        coord: Coordinate,
        accuracy_m: Option<f64>,
    },
    /// Absolute compass heading and/or the alpha (yaw) angle
    Orientation {
        compass: Option<f64>,
        alpha: Option<f64>,
    },
}

impl SensorReading {
    pub fn into_event(self) -> AppEvent {
        match self {
            SensorReading::Position { coord, accuracy_m } => AppEvent::Position { coord, accuracy_m },
            SensorReading::Orientation { compass, alpha } => {
                AppEvent::Heading(heading_from_orientation(compass, alpha))
            }
        }
    }
}

pub(crate) fn error_event(e: &crate::error::SensorError) -> AppEvent {
    AppEvent::SensorError(e.to_string())
}

/// Starts the configured source on the runtime
pub struct SensorBridge {
    config: SensorConfig,
    events: EventSender,
    runtime: Handle,
}

impl SensorBridge {
    pub fn new(config: SensorConfig, events: EventSender, runtime: Handle) -> Self {
        Self {
            config,
            events,
            runtime,
        }
    }

    pub fn start(&self) -> JoinHandle<()> {
        let events = self.events.clone();
        let period = Duration::from_secs(self.config.interval.max(1));
        info!("starting {:?} sensor source", self.config.source);

        match self.config.source {
            SourceKind::Gpsd => {
                let addr = self.config.gpsd.clone();
                self.runtime.spawn(gpsd::run(addr, period * 5, events))
            }
            SourceKind::Simulated => {
                let mut sim = SimulatedSource::new(self.config.origin());
                self.runtime.spawn(async move {
                    let mut ticker = interval(period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    loop {
                        ticker.tick().await;
                        for reading in sim.next_readings() {
                            if events.send(reading.into_event()).is_err() {
                                return;
                            }
                        }
                    }
                })
            }
            SourceKind::Fixed => {
                let readings = fixed_readings(&self.config);
                self.runtime.spawn(async move {
                    for reading in readings {
                        if events.send(reading.into_event()).is_err() {
                            return;
                        }
                    }
                })
            }
        }
    }
}

/// One-shot readings of the fixed source
fn fixed_readings(config: &SensorConfig) -> Vec<SensorReading> {
    let mut readings = vec![SensorReading::Position {
        coord: config.origin(),
        accuracy_m: Some(config.accuracy),
    }];
    if let Some(h) = config.heading {
        readings.push(SensorReading::Orientation {
            compass: Some(h),
            alpha: None,
        });
    }
    readings
}
