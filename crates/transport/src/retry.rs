use std::thread;
use std::time::Duration;

/// Indicates whether an error should be retried or treated as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

/// Result of running an operation under the retry policy.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The error was considered fatal and should bubble up immediately.
    Fatal(E),
    /// The error was retryable, but the configured attempts were exhausted.
    AttemptsExceeded(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal(err) => err,
            RetryError::AttemptsExceeded(err) => err,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: if max_delay.is_zero() {
                base_delay
            } else {
                max_delay
            },
        }
    }

    /// Preset tuned for the upstream API (more attempts, longer delays).
    pub fn for_upstream() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }

    /// Executes the operation with the configured retry policy, sleeping
    /// between retryable failures.
    pub fn run<F, T, E, Classifier>(
        &self,
        mut op: F,
        classify: Classifier,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        Classifier: Fn(&E) -> RetryDisposition,
    {
        let mut attempt = 0;

        loop {
            match op() {
                Ok(result) => return Ok(result),
                Err(err) => match classify(&err) {
                    RetryDisposition::Stop => return Err(RetryError::Fatal(err)),
                    RetryDisposition::Retry => {
                        if attempt + 1 >= self.max_attempts {
                            return Err(RetryError::AttemptsExceeded(err));
                        }

                        let delay = self.backoff_delay(attempt);
                        thread::sleep(delay);
                        attempt += 1;
                    }
                },
            }
        }
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::from_millis(0);
        }

        let factor = 1u128 << attempt.min(6);
        let base_ms = self.base_delay.as_millis();
        let delay_ms = base_ms.saturating_mul(factor);
        let capped = delay_ms.min(self.max_delay.as_millis());
        Duration::from_millis(capped as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    // Zero base delay keeps the retry loop instant in tests.
    fn instant_policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let result: Result<u32, RetryError<&str>> = instant_policy(3).run(
            || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 { Err("flaky") } else { Ok(42) }
            },
            |_| RetryDisposition::Retry,
        );
        assert!(matches!(result, Ok(42)));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn fatal_errors_stop_immediately() {
        let calls = Cell::new(0);
        let result: Result<u32, RetryError<&str>> = instant_policy(5).run(
            || {
                calls.set(calls.get() + 1);
                Err("broken")
            },
            |_| RetryDisposition::Stop,
        );
        assert!(matches!(result, Err(RetryError::Fatal("broken"))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retryable_errors_exhaust_attempts() {
        let calls = Cell::new(0);
        let result: Result<u32, RetryError<&str>> = instant_policy(3).run(
            || {
                calls.set(calls.get() + 1);
                Err("flaky")
            },
            |_| RetryDisposition::Retry,
        );
        assert!(matches!(result, Err(RetryError::AttemptsExceeded("flaky"))));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(
            10,
            Duration::from_millis(100),
            Duration::from_millis(450),
        );
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(450));
    }
}
