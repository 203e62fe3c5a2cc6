//! Bounded activity log.
//!
//! The log is observational: the executor appends to it and presentation
//! layers read it, but nothing in the orchestrator reads entries back.
//! Entries are kept newest first and the oldest are dropped past capacity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::clock::Clock;
use crate::events::{AdaEvent, EventBus};

/// Kind of activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogType {
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "SUCC")]
    Success,
    #[serde(rename = "ERR")]
    Error,
    #[serde(rename = "RTRY")]
    Retry,
    #[serde(rename = "THNK")]
    Thinking,
    #[serde(rename = "VOTE")]
    Voting,
    #[serde(rename = "CNSS")]
    Consensus,
    #[serde(rename = "BACK")]
    Backtrack,
    #[serde(rename = "RTC")]
    RtcMessage,
    #[serde(rename = "T/O")]
    Timeout,
    #[serde(rename = "TOOL")]
    ToolSelection,
    #[serde(rename = "SEAL")]
    Seal,
    #[serde(rename = "CXT")]
    ContextEnrichment,
    #[serde(rename = "STEP")]
    WorkflowStep,
    #[serde(rename = "DEC")]
    McpDecision,
    #[serde(rename = "PLAN")]
    McpWorkflowPlan,
}

impl LogType {
    /// Short code shown in terminals.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Success => "SUCC",
            Self::Error => "ERR",
            Self::Retry => "RTRY",
            Self::Thinking => "THNK",
            Self::Voting => "VOTE",
            Self::Consensus => "CNSS",
            Self::Backtrack => "BACK",
            Self::RtcMessage => "RTC",
            Self::Timeout => "T/O",
            Self::ToolSelection => "TOOL",
            Self::Seal => "SEAL",
            Self::ContextEnrichment => "CXT",
            Self::WorkflowStep => "STEP",
            Self::McpDecision => "DEC",
            Self::McpWorkflowPlan => "PLAN",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Direction of a simulated mesh message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// A stored log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub log_type: LogType,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_distribution: Option<BTreeMap<String, usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

/// An entry about to be appended; the book assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub log_type: LogType,
    pub message: String,
    pub source: Option<String>,
    pub vote_distribution: Option<BTreeMap<String, usize>>,
    pub request_id: Option<String>,
    pub response_time_ms: Option<u64>,
    pub direction: Option<Direction>,
}

impl LogRecord {
    pub fn new(log_type: LogType, message: impl Into<String>) -> Self {
        Self {
            log_type,
            message: message.into(),
            source: None,
            vote_distribution: None,
            request_id: None,
            response_time_ms: None,
            direction: None,
        }
    }

    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn votes(mut self, distribution: BTreeMap<String, usize>) -> Self {
        self.vote_distribution = Some(distribution);
        self
    }

    #[must_use]
    pub fn rtc(mut self, request_id: impl Into<String>, direction: Direction) -> Self {
        self.request_id = Some(request_id.into());
        self.direction = Some(direction);
        self
    }

    #[must_use]
    pub fn latency_ms(mut self, millis: u64) -> Self {
        self.response_time_ms = Some(millis);
        self
    }
}

/// Filter over log types and sources. Empty sets match everything.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub types: HashSet<LogType>,
    pub sources: HashSet<String>,
}

impl LogFilter {
    #[must_use]
    pub fn with_type(mut self, log_type: LogType) -> Self {
        self.types.insert(log_type);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.sources.insert(source.into());
        self
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        let type_ok = self.types.is_empty() || self.types.contains(&entry.log_type);
        let source_ok = self.sources.is_empty()
            || entry.source.as_ref().is_some_and(|s| self.sources.contains(s));
        type_ok && source_ok
    }
}

/// Append-only, bounded, newest-first activity log.
pub struct LogBook {
    entries: RwLock<VecDeque<LogEntry>>,
    capacity: usize,
    next_id: AtomicU64,
    clock: Arc<dyn Clock>,
    bus: EventBus,
}

impl fmt::Debug for LogBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogBook")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl LogBook {
    pub fn new(capacity: usize, clock: Arc<dyn Clock>, bus: EventBus) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
            next_id: AtomicU64::new(1),
            clock,
            bus,
        }
    }

    /// Appends a record and returns the stored entry.
    pub fn append(&self, record: LogRecord) -> LogEntry {
        let entry = LogEntry {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            timestamp: self.clock.now(),
            log_type: record.log_type,
            message: record.message,
            source: record.source,
            vote_distribution: record.vote_distribution,
            request_id: record.request_id,
            response_time_ms: record.response_time_ms,
            direction: record.direction,
        };

        {
            let mut entries = self.entries.write().unwrap_or_else(std::sync::PoisonError::into_inner);
            entries.push_front(entry.clone());
            entries.truncate(self.capacity);
        }

        self.bus.publish(AdaEvent::LogAppended { entry: entry.clone() });
        entry
    }

    /// Shorthand for a plain entry with a source.
    pub fn log(&self, log_type: LogType, message: impl Into<String>, source: &str) -> LogEntry {
        self.append(LogRecord::new(log_type, message).source(source))
    }

    /// All entries, newest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.read().iter().cloned().collect()
    }

    /// Newest `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.read().iter().take(limit).cloned().collect()
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<LogEntry> {
        self.read().front().cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries matching `filter`, newest first.
    pub fn filter(&self, filter: &LogFilter) -> Vec<LogEntry> {
        self.read().iter().filter(|e| filter.matches(e)).cloned().collect()
    }

    /// Distinct sources present in the log, sorted.
    pub fn sources(&self) -> Vec<String> {
        let set: BTreeSet<String> = self.read().iter().filter_map(|e| e.source.clone()).collect();
        set.into_iter().collect()
    }

    /// Number of entries of the given type.
    pub fn count_of(&self, log_type: LogType) -> usize {
        self.read().iter().filter(|e| e.log_type == log_type).count()
    }

    /// Replaces the whole log (newest first), e.g. from a checkpoint.
    pub fn replace(&self, entries: Vec<LogEntry>) {
        let next = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let len;
        {
            let mut current = self.entries.write().unwrap_or_else(std::sync::PoisonError::into_inner);
            *current = entries.into_iter().take(self.capacity).collect();
            len = current.len();
        }
        self.next_id.fetch_max(next, Ordering::Relaxed);
        self.bus.publish(AdaEvent::LogReset { len });
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(std::sync::PoisonError::into_inner).clear();
        self.bus.publish(AdaEvent::LogReset { len: 0 });
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, VecDeque<LogEntry>> {
        self.entries.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
