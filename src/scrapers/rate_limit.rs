//! Randomized inter-request delays.
//!
//! Fixed-interval request patterns are easy for bot mitigation to spot, so
//! every fetch is followed by a uniformly random pause. The bounds differ
//! per phase: results pages are heavier and fewer, advert pages lighter and
//! more numerous.

use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::scrapers::error::ScrapeError;

/// Block the calling thread for a uniformly random duration in
/// `[low, high]` seconds.
///
/// `low > high` is rejected with [`ScrapeError::InvalidDelayRange`] rather
/// than swapped or ignored. `low == high` degenerates to a fixed sleep.
pub fn delay_random(low: f64, high: f64) -> Result<(), ScrapeError> {
    if low > high {
        return Err(ScrapeError::InvalidDelayRange { low, high });
    }
    let secs = rand::rng().random_range(low..=high);
    thread::sleep(Duration::from_secs_f64(secs));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn rejects_inverted_bounds() {
        let err = delay_random(1.2, 0.1).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::InvalidDelayRange { low, high } if low == 1.2 && high == 0.1
        ));
    }

    #[test]
    fn equal_bounds_are_a_fixed_sleep() {
        let start = Instant::now();
        delay_random(0.0, 0.0).unwrap();
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn sleeps_within_bounds() {
        let start = Instant::now();
        delay_random(0.01, 0.05).unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(10));
        // generous upper margin for slow CI schedulers
        assert!(elapsed < Duration::from_secs(1));
    }
}
