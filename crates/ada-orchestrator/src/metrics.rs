//! System metrics scoreboard.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// Aggregate task statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub total_tasks: u64,
    pub successful_tasks: u64,
    pub failed_tasks: u64,
    pub total_latency_ms: u64,
    /// Agent nodes that are not offline
    pub active_agents: usize,
    /// Running mean of vote confidence
    pub avg_confidence: f64,
    pub votes: u64,
}

impl SystemMetrics {
    /// Percentage of successful tasks; 100 when nothing ran.
    pub fn success_rate(&self) -> f64 {
        if self.total_tasks == 0 {
            return 100.0;
        }
        self.successful_tasks as f64 / self.total_tasks as f64 * 100.0
    }

    pub fn avg_latency_ms(&self) -> u64 {
        if self.total_tasks == 0 {
            return 0;
        }
        (self.total_latency_ms as f64 / self.total_tasks as f64).round() as u64
    }
}

/// Thread-safe recorder behind [`SystemMetrics`].
#[derive(Debug, Default)]
pub struct Scoreboard {
    inner: Mutex<SystemMetrics>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_task(&self, succeeded: bool, latency_ms: u64) {
        let mut metrics = self.lock();
        metrics.total_tasks += 1;
        if succeeded {
            metrics.successful_tasks += 1;
        } else {
            metrics.failed_tasks += 1;
        }
        metrics.total_latency_ms = metrics.total_latency_ms.saturating_add(latency_ms);
    }

    pub fn record_vote(&self, confidence: f64) {
        let mut metrics = self.lock();
        metrics.votes += 1;
        metrics.avg_confidence += (confidence - metrics.avg_confidence) / metrics.votes as f64;
    }

    /// Current metrics with the given active agent count.
    pub fn snapshot(&self, active_agents: usize) -> SystemMetrics {
        SystemMetrics { active_agents, ..self.lock().clone() }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SystemMetrics> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scoreboard() {
        let metrics = Scoreboard::new().snapshot(4);
        assert!((metrics.success_rate() - 100.0).abs() < f64::EPSILON);
        assert_eq!(metrics.avg_latency_ms(), 0);
        assert_eq!(metrics.active_agents, 4);
    }

    #[test]
    fn test_rates_and_averages() {
        let board = Scoreboard::new();
        board.record_task(true, 1000);
        board.record_task(true, 2000);
        board.record_task(false, 3001);
        board.record_vote(0.9);
        board.record_vote(0.7);

        let metrics = board.snapshot(3);
        assert_eq!(metrics.total_tasks, 3);
        assert_eq!(metrics.failed_tasks, 1);
        assert!((metrics.success_rate() - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.avg_latency_ms(), 2000);
        assert!((metrics.avg_confidence - 0.8).abs() < 1e-9);
    }
}
