/// Mix a step counter with a stream id into a well-spread seed
#[inline(always)]
pub fn mix(step: u64, stream: u64) -> u64 {
    let mut seed = step
        .wrapping_mul(2654435761)
        .wrapping_add(stream.wrapping_mul(2246822519));
    seed ^= seed << 13;
    seed ^= seed >> 7;
    seed ^= seed << 17;
    seed
}

/// Deterministic uniform value in [0, 1) using splitmix64
#[inline(always)]
pub fn unit(seed: u64) -> f64 {
    let mut x = seed.wrapping_mul(0x9e3779b97f4a7c15);
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d049bb133111eb);
    x ^= x >> 31;
    (x >> 11) as f64 / 9007199254740992.0 // 2^53
}

/// Deterministic value in [-amplitude, amplitude)
#[inline(always)]
pub fn jitter(step: u64, stream: u64, amplitude: f64) -> f64 {
    (unit(mix(step, stream)) * 2.0 - 1.0) * amplitude
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_range() {
        for i in 0..10_000 {
            let v = unit(i);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_jitter_is_deterministic() {
        assert_eq!(jitter(42, 7, 3.0), jitter(42, 7, 3.0));
        assert_ne!(jitter(42, 7, 3.0), jitter(43, 7, 3.0));
        assert!(jitter(1, 1, 0.5).abs() <= 0.5);
    }
}
