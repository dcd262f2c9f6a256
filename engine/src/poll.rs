use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T, E> {
    Ready { value: T, attempts: u32 },
    TimedOut {
        attempts: u32,
        last_value: Option<T>,
        last_error: Option<E>,
    },
}

impl<T, E> PollOutcome<T, E> {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts, .. } | PollOutcome::TimedOut { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Calls `probe` until `done` accepts its value, sleeping `policy.interval` between
/// attempts. Failed probes count as attempts and are retried; once the budget is
/// spent the outcome is `TimedOut`.
pub async fn poll_until<T, E, F, Fut, P>(policy: PollPolicy, mut probe: F, mut done: P) -> PollOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&T) -> bool,
    E: Display,
{
    let mut last_value = None;
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        if attempt > 1 {
            tokio::time::sleep(policy.interval).await;
        }

        match probe(attempt).await {
            Ok(value) if done(&value) => {
                return PollOutcome::Ready {
                    value,
                    attempts: attempt,
                };
            }
            Ok(value) => {
                last_value = Some(value);
            }
            Err(err) => {
                log::warn!("poll attempt {attempt}/{} failed: {err}", policy.max_attempts);
                last_error = Some(err);
            }
        }
    }

    PollOutcome::TimedOut {
        attempts: policy.max_attempts,
        last_value,
        last_error,
    }
}
