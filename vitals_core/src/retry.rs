//! Bounded retry around a single `SampleReader::read`.

use crate::config::RetryPolicy;
use crate::error::VitalsError;
use crate::hw_error::map_hw_error;
use std::time::Duration;
use vitals_traits::SampleReader;
use vitals_traits::clock::Clock;

/// Read once, retrying up to `policy.max_attempts` total attempts with
/// `policy.delay` between them. Returns the last failure, mapped.
pub fn read_with_retry<R, C>(
    reader: &mut R,
    timeout: Duration,
    policy: &RetryPolicy,
    clock: &C,
) -> Result<R::Sample, VitalsError>
where
    R: SampleReader + ?Sized,
    C: Clock + ?Sized,
{
    let attempts = policy.max_attempts.max(1);
    let mut last = VitalsError::Timeout;
    for attempt in 1..=attempts {
        match reader.read(timeout) {
            Ok(v) => {
                if attempt > 1 {
                    tracing::debug!(attempt, "sensor read recovered");
                }
                return Ok(v);
            }
            Err(e) => {
                last = map_hw_error(e.as_ref());
                tracing::warn!(attempt, attempts, error = %last, "sensor read failed");
                if attempt < attempts {
                    clock.sleep(policy.delay);
                }
            }
        }
    }
    Err(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_traits::clock::test_clock::TestClock;

    struct Flaky {
        fail_first: u32,
        calls: u32,
    }

    impl SampleReader for Flaky {
        type Sample = u32;

        fn read(&mut self, _t: Duration) -> Result<u32, Box<dyn std::error::Error + Send + Sync>> {
            self.calls += 1;
            if self.calls <= self.fail_first {
                Err("bus timeout".into())
            } else {
                Ok(self.calls)
            }
        }
    }

    fn policy(n: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts: n,
            delay: Duration::from_millis(20),
        }
    }

    #[test]
    fn recovers_within_budget() {
        let clock = TestClock::new();
        let mut r = Flaky {
            fail_first: 2,
            calls: 0,
        };
        let v = read_with_retry(&mut r, Duration::from_millis(5), &policy(3), &clock).unwrap();
        assert_eq!(v, 3);
        // two delays between three attempts
        assert_eq!(clock.elapsed(), Duration::from_millis(40));
    }

    #[test]
    fn gives_up_with_last_error() {
        let clock = TestClock::new();
        let mut r = Flaky {
            fail_first: 10,
            calls: 0,
        };
        let err = read_with_retry(&mut r, Duration::from_millis(5), &policy(3), &clock).unwrap_err();
        assert!(matches!(err, VitalsError::Timeout));
        assert_eq!(r.calls, 3);
        assert_eq!(clock.elapsed(), Duration::from_millis(40));
    }

    #[test]
    fn zero_attempts_still_reads_once() {
        let clock = TestClock::new();
        let mut r = Flaky {
            fail_first: 0,
            calls: 0,
        };
        assert!(read_with_retry(&mut r, Duration::ZERO, &policy(0), &clock).is_ok());
    }
}
