//! Retry orchestration for one unit of analysis work.
//!
//! Failures never escape a unit: when every attempt is exhausted the
//! caller-provided stub is emitted instead, so a batch always produces one
//! record per input. Independent of attempt outcomes, a fixed inter-call
//! delay runs after every unit because the completion service applies an
//! implicit rate ceiling — fixed sleeps, not adaptive backpressure.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

/// Maximum attempts for one unit of work.
pub const MAX_ATTEMPTS: u32 = 3;
/// Fixed pause between failed attempts.
pub const BACKOFF: Duration = Duration::from_secs(10);
/// Pause after every unit, success or failure.
pub const INTER_CALL_DELAY: Duration = Duration::from_secs(5);

/// Backoff strategy between attempts. Behind a trait so exponential or
/// jittered variants can replace the fixed pause without touching the
/// orchestration loop.
pub trait Backoff: Send + Sync {
    /// Delay before the attempt following `failed_attempt` (1-based).
    fn delay(&self, failed_attempt: u32) -> Duration;
}

/// The policy the pipeline ships with: the same pause after every failure.
pub struct FixedBackoff(pub Duration);

impl Backoff for FixedBackoff {
    fn delay(&self, _failed_attempt: u32) -> Duration {
        self.0
    }
}

pub struct RetryOrchestrator {
    max_attempts: u32,
    backoff: Box<dyn Backoff>,
    inter_call_delay: Duration,
}

impl Default for RetryOrchestrator {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, Box::new(FixedBackoff(BACKOFF)), INTER_CALL_DELAY)
    }
}

impl RetryOrchestrator {
    pub fn new(max_attempts: u32, backoff: Box<dyn Backoff>, inter_call_delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
            inter_call_delay,
        }
    }

    /// Drives `unit` to success or exhaustion. Every failed attempt is
    /// followed by a backoff sleep (except after the final one, where no
    /// further attempt exists); exhaustion yields `stub()`. Never returns
    /// an error past this point.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut unit: F, stub: impl FnOnce() -> T) -> T
    where
        E: std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut outcome = None;

        for attempt in 1..=self.max_attempts {
            match unit(attempt).await {
                Ok(value) => {
                    info!(%label, attempt, "unit succeeded");
                    outcome = Some(value);
                    break;
                }
                Err(error) => {
                    warn!(%label, attempt, max = self.max_attempts, %error, "unit attempt failed");
                    if attempt < self.max_attempts {
                        sleep(self.backoff.delay(attempt)).await;
                    }
                }
            }
        }

        let result = outcome.unwrap_or_else(|| {
            warn!(%label, "all attempts exhausted; emitting stub record");
            stub()
        });

        // Rate-limit pause after every unit, success or stub.
        sleep(self.inter_call_delay).await;
        result
    }
}
