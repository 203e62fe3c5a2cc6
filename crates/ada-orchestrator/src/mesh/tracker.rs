use ada_core::{Clock, Direction, LogBook, LogRecord, LogType};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// An in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: String,
    pub started_at: DateTime<Utc>,
    pub from: String,
    pub to: String,
    pub description: String,
}

/// A request resolved by its matching response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub request_id: String,
    pub from: String,
    pub to: String,
    pub latency_ms: u64,
}

/// A request resolved by its timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutEvent {
    pub request_id: String,
    pub from: String,
    pub to: String,
}

/// Invoked once per timed-out request.
pub type TimeoutHandler = Arc<dyn Fn(&TimeoutEvent) + Send + Sync>;

struct Entry {
    request: PendingRequest,
    timer: JoinHandle<()>,
}

type Ledger = Arc<Mutex<HashMap<String, Entry>>>;

/// Outstanding-request ledger with a fixed timeout window.
///
/// Timers run on `tokio::time`, so tests can pause and advance them. Whoever
/// removes an entry from the ledger first resolves it; the other path then
/// finds nothing and does nothing.
pub struct RequestTracker {
    pending: Ledger,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    on_timeout: TimeoutHandler,
    log: Option<Arc<LogBook>>,
}

impl fmt::Debug for RequestTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestTracker")
            .field("pending", &self.pending_count())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RequestTracker {
    pub fn new(clock: Arc<dyn Clock>, timeout: Duration, on_timeout: TimeoutHandler) -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            clock,
            timeout,
            on_timeout,
            log: None,
        }
    }

    /// Records RTC messages for begun and completed requests.
    #[must_use]
    pub fn with_log(mut self, log: Arc<LogBook>) -> Self {
        self.log = Some(log);
        self
    }

    fn next_request_id(&self) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("rtc-{}-{}", self.clock.now().timestamp_millis(), &suffix[..5])
    }

    /// Starts a request and schedules its timeout. Must run inside a tokio runtime.
    pub fn begin_request(&self, from: &str, to: &str, description: &str) -> String {
        let request_id = self.next_request_id();
        let request = PendingRequest {
            request_id: request_id.clone(),
            started_at: self.clock.now(),
            from: from.to_string(),
            to: to.to_string(),
            description: description.to_string(),
        };

        {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            let timer = self.spawn_timer(request_id.clone());
            pending.insert(request_id.clone(), Entry { request, timer });
        }

        debug!(request_id = %request_id, from = %from, to = %to, "Request started");
        if let Some(log) = &self.log {
            log.append(
                LogRecord::new(LogType::RtcMessage, format!("Requesting task: '{description}'"))
                    .source(from)
                    .rtc(&request_id, Direction::Outbound),
            );
        }
        request_id
    }

    fn spawn_timer(&self, request_id: String) -> JoinHandle<()> {
        let pending = Arc::clone(&self.pending);
        let on_timeout = Arc::clone(&self.on_timeout);
        let deadline = tokio::time::Instant::now() + self.timeout;
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let expired = pending.lock().unwrap_or_else(PoisonError::into_inner).remove(&request_id);
            if let Some(entry) = expired {
                warn!(request_id = %request_id, to = %entry.request.to, "Request timed out");
                on_timeout(&TimeoutEvent {
                    request_id,
                    from: entry.request.from,
                    to: entry.request.to,
                });
            }
        })
    }

    /// Resolves a pending request with its response.
    ///
    /// Returns `None` without side effects if the request already timed out,
    /// was already completed, or never existed.
    pub fn complete_request(&self, request_id: &str, message: &str) -> Option<Completion> {
        let entry = self.pending.lock().unwrap_or_else(PoisonError::into_inner).remove(request_id)?;
        entry.timer.abort();

        let latency_ms = self.clock.millis_since(entry.request.started_at);
        debug!(request_id = %request_id, latency_ms, "Request completed");
        if let Some(log) = &self.log {
            log.append(
                LogRecord::new(LogType::RtcMessage, message)
                    .source(&entry.request.to)
                    .rtc(request_id, Direction::Inbound)
                    .latency_ms(latency_ms),
            );
        }

        Some(Completion {
            request_id: request_id.to_string(),
            from: entry.request.from,
            to: entry.request.to,
            latency_ms,
        })
    }

    /// Drops a pending request without a response and stops its timer.
    ///
    /// Nothing is logged: the request was never answered. Returns false if
    /// the request was already resolved.
    pub fn cancel_request(&self, request_id: &str) -> bool {
        let Some(entry) =
            self.pending.lock().unwrap_or_else(PoisonError::into_inner).remove(request_id)
        else {
            return false;
        };
        entry.timer.abort();
        debug!(request_id = %request_id, to = %entry.request.to, "Request cancelled");
        true
    }

    pub fn is_pending(&self, request_id: &str) -> bool {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).contains_key(request_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn pending(&self) -> Vec<PendingRequest> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|e| e.request.clone())
            .collect()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Drop for RequestTracker {
    fn drop(&mut self) {
        for (_, entry) in self.pending.lock().unwrap_or_else(PoisonError::into_inner).drain() {
            entry.timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ada_core::{EventBus, TokioClock};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tracker(fired: &Arc<AtomicUsize>) -> RequestTracker {
        let fired = Arc::clone(fired);
        RequestTracker::new(
            Arc::new(TokioClock::new()),
            Duration::from_secs(15),
            Arc::new(move |_event: &TimeoutEvent| {
                fired.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_cancels_timeout() {
        let fired = Arc::new(AtomicUsize::new(0));
        let tracker = tracker(&fired);

        let id = tracker.begin_request("ada.central", "travel_agent", "flight_booking");
        tokio::time::advance(Duration::from_millis(250)).await;
        let completion = tracker.complete_request(&id, "ack").unwrap();
        assert_eq!(completion.to, "travel_agent");
        assert_eq!(completion.latency_ms, 250);

        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(tracker.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_once_and_late_completion_is_noop() {
        let fired = Arc::new(AtomicUsize::new(0));
        let tracker = tracker(&fired);

        let id = tracker.begin_request("ada.central", "crm_agent", "lookup");
        tokio::time::advance(Duration::from_millis(14_999)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(tracker.is_pending(&id));

        tokio::time::advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!tracker.is_pending(&id));

        assert!(tracker.complete_request(&id, "late").is_none());
        tokio::time::advance(Duration::from_secs(60)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_and_unknown_completions_are_noops() {
        let fired = Arc::new(AtomicUsize::new(0));
        let tracker = tracker(&fired);

        let id = tracker.begin_request("a", "b", "ping");
        assert!(tracker.complete_request(&id, "pong").is_some());
        assert!(tracker.complete_request(&id, "pong").is_none());
        assert!(tracker.complete_request("rtc-unknown", "pong").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_resolves_silently() {
        let fired = Arc::new(AtomicUsize::new(0));
        let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
        let log = Arc::new(LogBook::new(50, Arc::clone(&clock), EventBus::default()));
        let tracker = tracker(&fired).with_log(Arc::clone(&log));

        let id = tracker.begin_request("ada.central", "crm_agent", "lookup");
        assert!(tracker.cancel_request(&id));
        assert!(!tracker.cancel_request(&id));
        assert!(tracker.complete_request(&id, "late").is_none());

        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(tracker.pending_count(), 0);
        // only the outbound request was logged
        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].direction, Some(Direction::Outbound));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_event_carries_endpoints() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let tracker = RequestTracker::new(
            Arc::new(TokioClock::new()),
            Duration::from_millis(100),
            Arc::new(move |event: &TimeoutEvent| {
                sink.lock().unwrap().push(event.clone());
            }),
        );

        let id = tracker.begin_request("ada.central", "finance_agent", "pay");
        tokio::time::advance(Duration::from_millis(100)).await;
        tokio::task::yield_now().await;

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![TimeoutEvent {
                request_id: id,
                from: "ada.central".to_string(),
                to: "finance_agent".to_string(),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rtc_messages_are_logged() {
        let fired = Arc::new(AtomicUsize::new(0));
        let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
        let log = Arc::new(LogBook::new(50, Arc::clone(&clock), EventBus::default()));
        let tracker = tracker(&fired).with_log(Arc::clone(&log));

        let id = tracker.begin_request("ada.central", "travel_agent", "flight_booking");
        assert!(id.starts_with("rtc-"));
        tokio::time::advance(Duration::from_millis(40)).await;
        tracker.complete_request(&id, "Acknowledged");

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].message, "Requesting task: 'flight_booking'");
        assert_eq!(entries[1].direction, Some(Direction::Outbound));
        assert_eq!(entries[0].source.as_deref(), Some("travel_agent"));
        assert_eq!(entries[0].direction, Some(Direction::Inbound));
        assert_eq!(entries[0].response_time_ms, Some(40));
        assert_eq!(entries[0].request_id.as_deref(), Some(id.as_str()));
    }
}
