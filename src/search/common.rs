use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::record::MatchResult;

/// Live counters for one search, readable while it runs
#[derive(Debug, Default)]
pub struct SearchStats {
    /// Records to evaluate
    pub total: AtomicUsize,

    /// Records evaluated so far
    pub evaluated: AtomicUsize,

    /// Records that matched
    pub matched: AtomicUsize,

    /// Records with missing or blank text
    pub empty_records: AtomicUsize,
}

impl SearchStats {
    pub fn new(total: usize) -> Self {
        Self {
            total: AtomicUsize::new(total),
            ..Default::default()
        }
    }

    pub(crate) fn record_evaluation(&self, matched: bool) {
        self.evaluated.fetch_add(1, Ordering::Relaxed);
        if matched {
            self.matched.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get progress percentage (0.0 - 100.0)
    pub fn progress(&self) -> f32 {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            return 100.0;
        }
        self.evaluated.load(Ordering::Relaxed) as f32 / total as f32 * 100.0
    }

    /// Get status summary
    pub fn summary(&self) -> String {
        format!(
            "{}/{} records evaluated, {} matched, {} without text",
            self.evaluated.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
            self.matched.load(Ordering::Relaxed),
            self.empty_records.load(Ordering::Relaxed)
        )
    }
}

/// Cancellation flag shared between a caller and a running search
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop evaluating further records
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Result of a search run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Matches in input record order
    pub matches: Vec<MatchResult>,

    /// Records actually evaluated
    pub evaluated: usize,

    /// Records in the batch
    pub total: usize,

    /// True when the search stopped early
    pub cancelled: bool,
}

impl SearchOutcome {
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.evaluated == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_progress() {
        let stats = SearchStats::new(4);
        assert_eq!(stats.progress(), 0.0);

        stats.record_evaluation(true);
        stats.record_evaluation(false);
        assert_eq!(stats.progress(), 50.0);
        assert_eq!(stats.matched.load(Ordering::Relaxed), 1);
        assert_eq!(
            stats.summary(),
            "2/4 records evaluated, 1 matched, 0 without text"
        );
    }

    #[test]
    fn test_stats_empty_batch_is_done() {
        assert_eq!(SearchStats::new(0).progress(), 100.0);
    }

    #[test]
    fn test_cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_outcome_completeness() {
        let outcome = SearchOutcome {
            matches: vec![],
            evaluated: 3,
            total: 3,
            cancelled: false,
        };
        assert!(outcome.is_complete());

        let partial = SearchOutcome {
            evaluated: 1,
            cancelled: true,
            ..outcome
        };
        assert!(!partial.is_complete());
    }
}
