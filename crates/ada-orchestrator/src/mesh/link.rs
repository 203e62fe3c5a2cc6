use ada_core::config::MeshConfig;
use ada_core::{Clock, LogBook, LogType, RandomSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{OrchestrationError, Result};

/// Outcome of a successful delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// Unreliable simulated link: each attempt fails with a fixed probability and
/// failed attempts are retried after a linear backoff.
pub struct MeshLink {
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    config: MeshConfig,
    log: Option<Arc<LogBook>>,
}

impl std::fmt::Debug for MeshLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshLink").field("config", &self.config).finish_non_exhaustive()
    }
}

impl MeshLink {
    pub fn new(clock: Arc<dyn Clock>, random: Arc<dyn RandomSource>, config: MeshConfig) -> Self {
        Self { clock, random, config, log: None }
    }

    /// Records RETRY entries for failed attempts.
    #[must_use]
    pub fn with_log(mut self, log: Arc<LogBook>) -> Self {
        self.log = Some(log);
        self
    }

    /// Delivers one message from `from` to `to`.
    ///
    /// # Errors
    /// Returns `MeshExhausted` once `max_attempts` attempts have failed
    pub async fn deliver(&self, from: &str, to: &str) -> Result<Delivery> {
        let max_attempts = self.config.max_attempts.max(1);
        let [min, max] = self.config.latency_ms;

        for attempt in 1..=max_attempts {
            self.clock.sleep(Duration::from_millis(self.random.between(min, max))).await;

            if !self.random.chance(self.config.failure_probability) {
                debug!(from = %from, to = %to, attempt, "Delivered");
                return Ok(Delivery { attempts: attempt });
            }

            if attempt == max_attempts {
                break;
            }

            let backoff = self.config.backoff_for(attempt);
            warn!(from = %from, to = %to, attempt, backoff_ms = backoff.as_millis() as u64, "Delivery failed, retrying");
            if let Some(log) = &self.log {
                log.log(
                    LogType::Retry,
                    format!(
                        "Attempt {attempt}/{max_attempts} to '{to}' failed. Retrying in {}ms.",
                        backoff.as_millis()
                    ),
                    from,
                );
            }
            self.clock.sleep(backoff).await;
        }

        Err(OrchestrationError::MeshExhausted { to: to.to_string(), attempts: max_attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ada_core::{EventBus, ManualClock, SequenceRandom};

    fn link(random: SequenceRandom, clock: &Arc<ManualClock>) -> (MeshLink, Arc<LogBook>) {
        let clock_dyn: Arc<dyn Clock> = clock.clone();
        let log = Arc::new(LogBook::new(20, Arc::clone(&clock_dyn), EventBus::default()));
        let config = MeshConfig { latency_ms: [100, 100], ..MeshConfig::default() };
        (MeshLink::new(clock_dyn, Arc::new(random), config).with_log(Arc::clone(&log)), log)
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let clock = Arc::new(ManualClock::new());
        let (link, log) = link(SequenceRandom::constant(0.5), &clock);

        let delivery = link.deliver("ada.central", "travel_agent").await.unwrap();
        assert_eq!(delivery.attempts, 1);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(100)]);
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_retries_with_linear_backoff() {
        let clock = Arc::new(ManualClock::new());
        // Fixed latency draws nothing, so only failure rolls consume values.
        let (link, log) = link(SequenceRandom::new(vec![0.1, 0.1, 0.9]), &clock);

        let delivery = link.deliver("ada.central", "crm_agent").await.unwrap();
        assert_eq!(delivery.attempts, 3);
        assert_eq!(
            clock.sleeps(),
            vec![
                Duration::from_millis(100),
                Duration::from_secs(1),
                Duration::from_millis(100),
                Duration::from_secs(2),
                Duration::from_millis(100),
            ]
        );
        assert_eq!(log.count_of(LogType::Retry), 2);
        assert_eq!(log.latest().unwrap().message, "Attempt 2/3 to 'crm_agent' failed. Retrying in 2000ms.");
    }

    #[tokio::test]
    async fn test_exhaustion_is_an_error() {
        let clock = Arc::new(ManualClock::new());
        let (link, log) = link(SequenceRandom::constant(0.0), &clock);

        let err = link.deliver("ada.central", "finance_agent").await.unwrap_err();
        assert!(matches!(err, OrchestrationError::MeshExhausted { attempts: 3, .. }));
        // No backoff after the final attempt.
        assert_eq!(clock.total_slept(), Duration::from_millis(3_300));
        assert_eq!(log.count_of(LogType::Retry), 2);
    }
}
