//! Transaction Log
//!
//! Append-only record of successful top-up estimates. Handlers receive the log
//! through `AppState`; nothing here is process-global.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// One successful estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// ISO-8601 UTC, millisecond precision
    pub timestamp: String,
    /// Human-readable description, e.g. "117.00 kWh for R100.00"
    pub record: String,
}

impl Transaction {
    pub fn now(record: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            record: record.into(),
        }
    }
}

/// Append-only, unbounded store of transactions.
///
/// Implementations must preserve insertion order and never drop entries.
pub trait TransactionLog: Send + Sync {
    fn append(&self, transaction: Transaction);

    /// Copy of every entry, oldest first
    fn snapshot(&self) -> Vec<Transaction>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process log, lost on restart
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: RwLock<Vec<Transaction>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionLog for MemoryLog {
    fn append(&self, transaction: Transaction) {
        // A poisoned lock still holds a consistent Vec: pushes cannot be observed half-done.
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push(transaction);
    }

    fn snapshot(&self) -> Vec<Transaction> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_append_preserves_order() {
        let log = MemoryLog::new();
        assert!(log.is_empty());

        log.append(Transaction::now("first"));
        log.append(Transaction::now("second"));
        log.append(Transaction::now("second"));

        let records: Vec<String> = log.snapshot().into_iter().map(|t| t.record).collect();
        assert_eq!(records, vec!["first", "second", "second"]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_timestamp_is_iso8601_utc() {
        let t = Transaction::now("x");
        assert!(t.timestamp.ends_with('Z'), "got {}", t.timestamp);
        assert!(chrono::DateTime::parse_from_rfc3339(&t.timestamp).is_ok());
    }

    #[test]
    fn test_concurrent_appends_are_all_kept() {
        let log = Arc::new(MemoryLog::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        log.append(Transaction::now(format!("{}-{}", i, j)));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(log.len(), 400);
    }
}
