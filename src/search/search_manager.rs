use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{debug, info};

use super::common::{CancellationToken, SearchOutcome, SearchStats};
use super::error::SearchError;
use super::evaluator::CompiledQuery;
use super::matcher::MatcherIndex;
use super::normalizer::Normalizer;
use super::query_parser::QueryParser;

use crate::config::Config;
use crate::record::{MatchResult, RawRecord};

/// Parses a query once and evaluates it against every record
pub struct SearchManager {
    normalizer: Normalizer,
    pool: Option<Arc<ThreadPool>>,
    parallel_threshold: usize,
}

impl std::fmt::Debug for SearchManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchManager")
            .field("normalizer", &self.normalizer)
            .field(
                "workers",
                &self.pool.as_ref().map(|p| p.current_num_threads()).unwrap_or(1),
            )
            .field("parallel_threshold", &self.parallel_threshold)
            .finish()
    }
}

impl SearchManager {
    /// Create a manager from config; more than one worker starts a thread pool
    pub fn new(config: &Config) -> Result<Self, SearchError> {
        let pool = if config.workers > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(config.workers)
                .thread_name(|i| format!("resume-search-{i}"))
                .build()
                .map_err(|e| SearchError::WorkerPool(e.to_string()))?;
            Some(Arc::new(pool))
        } else {
            None
        };

        Ok(Self {
            normalizer: Normalizer::new(config.normalizer),
            pool,
            parallel_threshold: config.parallel_threshold,
        })
    }

    /// Single-threaded manager
    pub fn sequential(normalizer: Normalizer) -> Self {
        Self {
            normalizer,
            pool: None,
            parallel_threshold: usize::MAX,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Matching record ids in input order
    pub fn search(
        &self,
        records: &[RawRecord],
        expression: &str,
    ) -> Result<Vec<MatchResult>, SearchError> {
        let outcome = self.search_with_cancel(records, expression, &CancellationToken::new())?;
        Ok(outcome.matches)
    }

    pub fn search_with_cancel(
        &self,
        records: &[RawRecord],
        expression: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome, SearchError> {
        self.search_with_stats(records, expression, cancel, &SearchStats::default())
    }

    /// Search while updating `stats` so another thread can report progress
    pub fn search_with_stats(
        &self,
        records: &[RawRecord],
        expression: &str,
        cancel: &CancellationToken,
        stats: &SearchStats,
    ) -> Result<SearchOutcome, SearchError> {
        let query = self.compile(expression)?;
        stats.total.store(records.len(), Ordering::Relaxed);

        let slots = self.evaluate_all(records.len(), cancel, stats, |i| {
            let index = self.index_record(&records[i], stats);
            query.matches(&index)
        });

        Ok(Self::collect(slots, |i| &records[i].id))
    }

    /// Search records whose indexes were built ahead of time
    ///
    /// `indexes[i]` must belong to `records[i]`; slices of different lengths
    /// are rejected.
    pub fn search_indexed(
        &self,
        records: &[RawRecord],
        indexes: &[MatcherIndex],
        expression: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome, SearchError> {
        if records.len() != indexes.len() {
            return Err(SearchError::IndexMismatch {
                records: records.len(),
                indexes: indexes.len(),
            });
        }

        let query = self.compile(expression)?;
        let stats = SearchStats::new(indexes.len());

        let slots = self.evaluate_all(indexes.len(), cancel, &stats, |i| {
            query.matches(&indexes[i])
        });

        Ok(Self::collect(slots, |i| &records[i].id))
    }

    /// Normalize and index every record, in input order
    pub fn build_indexes(&self, records: &[RawRecord]) -> Vec<MatcherIndex> {
        let stats = SearchStats::new(records.len());
        let build = |record: &RawRecord| self.index_record(record, &stats);

        let indexes: Vec<MatcherIndex> = match &self.pool {
            Some(pool) if records.len() >= self.parallel_threshold => {
                pool.install(|| records.par_iter().map(build).collect())
            }
            _ => records.iter().map(build).collect(),
        };

        info!(
            "Indexed {} records ({} without text)",
            indexes.len(),
            stats.empty_records.load(Ordering::Relaxed)
        );
        indexes
    }

    fn compile(&self, expression: &str) -> Result<CompiledQuery, SearchError> {
        let ast = QueryParser::parse(expression)?;
        debug!("Parsed query `{}` as `{}`", expression, ast);
        Ok(CompiledQuery::compile(&ast, &self.normalizer))
    }

    fn index_record(&self, record: &RawRecord, stats: &SearchStats) -> MatcherIndex {
        match record.text.as_deref() {
            Some(text) if !text.trim().is_empty() => {
                MatcherIndex::from_text(text, &self.normalizer)
            }
            _ => {
                stats.empty_records.fetch_add(1, Ordering::Relaxed);
                debug!("Record {} has no text and matches nothing", record.id);
                MatcherIndex::empty()
            }
        }
    }

    /// One slot per record: `None` when cancelled before evaluation
    fn evaluate_all<F>(
        &self,
        total: usize,
        cancel: &CancellationToken,
        stats: &SearchStats,
        evaluate: F,
    ) -> Vec<Option<bool>>
    where
        F: Fn(usize) -> bool + Sync,
    {
        let run_one = |i: usize| {
            if cancel.is_cancelled() {
                return None;
            }
            let matched = evaluate(i);
            stats.record_evaluation(matched);
            Some(matched)
        };

        match &self.pool {
            Some(pool) if total >= self.parallel_threshold => {
                debug!(
                    "Evaluating {} records on {} workers",
                    total,
                    pool.current_num_threads()
                );
                pool.install(|| (0..total).into_par_iter().map(run_one).collect())
            }
            _ => (0..total).map(run_one).collect(),
        }
    }

    fn collect<'r>(
        slots: Vec<Option<bool>>,
        id_of: impl Fn(usize) -> &'r String,
    ) -> SearchOutcome {
        let total = slots.len();
        let evaluated = slots.iter().filter(|slot| slot.is_some()).count();
        let matches: Vec<MatchResult> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| **slot == Some(true))
            .map(|(i, _)| MatchResult::matched(id_of(i).as_str()))
            .collect();

        // A token fired after the last record leaves the run complete
        let cancelled = evaluated < total;
        if cancelled {
            info!("Search cancelled after {}/{} records", evaluated, total);
        } else {
            info!("Search matched {}/{} records", matches.len(), total);
        }

        SearchOutcome {
            matches,
            evaluated,
            total,
            cancelled,
        }
    }
}

/// Search with the default normalizer on the calling thread
pub fn search(records: &[RawRecord], expression: &str) -> Result<Vec<MatchResult>, SearchError> {
    SearchManager::sequential(Normalizer::default()).search(records, expression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::error::{QueryError, SyntaxErrorKind};

    fn records() -> Vec<RawRecord> {
        vec![
            RawRecord::new("r1", "Experienced with HuggingFace and AWS."),
            RawRecord::new("r2", "Skilled in Machine Learning and Python."),
            RawRecord::without_text("r3"),
            RawRecord::new("r4", "Java developer on Azure"),
        ]
    }

    fn ids(matches: &[MatchResult]) -> Vec<&str> {
        matches.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_search_preserves_input_order() {
        let results = search(&records(), "AWS OR Python OR Azure").unwrap();
        assert_eq!(ids(&results), vec!["r1", "r2", "r4"]);
        assert!(results.iter().all(|m| m.matched));
    }

    #[test]
    fn test_parse_error_evaluates_nothing() {
        let manager = SearchManager::sequential(Normalizer::default());
        let stats = SearchStats::default();
        let err = manager
            .search_with_stats(&records(), "(Java AND", &CancellationToken::new(), &stats)
            .unwrap_err();

        assert!(matches!(err, SearchError::Query(QueryError::Syntax { .. })));
        assert_eq!(stats.evaluated.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_empty_query_error() {
        let err = search(&records(), "  ").unwrap_err();
        assert!(matches!(err, SearchError::Query(QueryError::EmptyQuery)));
    }

    #[test]
    fn test_empty_record_is_counted_and_skipped() {
        let manager = SearchManager::sequential(Normalizer::default());
        let stats = SearchStats::default();
        let outcome = manager
            .search_with_stats(&records(), "Java", &CancellationToken::new(), &stats)
            .unwrap();

        assert_eq!(ids(&outcome.matches), vec!["r4"]);
        assert!(outcome.is_complete());
        assert_eq!(stats.empty_records.load(Ordering::Relaxed), 1);
        assert_eq!(stats.evaluated.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn test_cancelled_before_start() {
        let manager = SearchManager::sequential(Normalizer::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = manager.search_with_cancel(&records(), "AWS", &cancel).unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.evaluated, 0);
        assert!(outcome.matches.is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let config = Config {
            workers: 4,
            parallel_threshold: 1,
            ..Default::default()
        };
        let parallel = SearchManager::new(&config).unwrap();

        let batch: Vec<RawRecord> = (0..500)
            .map(|i| {
                let text = if i % 3 == 0 { "Rust and AWS" } else { "Go on GCP" };
                RawRecord::new(format!("r{i}"), text)
            })
            .collect();

        let expected = search(&batch, "Rust AND AWS").unwrap();
        let actual = parallel.search(&batch, "Rust AND AWS").unwrap();
        assert_eq!(actual, expected);
        assert_eq!(actual.len(), 167);
        assert_eq!(actual[0].id, "r0");
        assert_eq!(actual[1].id, "r3");
    }

    #[test]
    fn test_search_indexed() {
        let manager = SearchManager::sequential(Normalizer::default());
        let batch = records();
        let indexes = manager.build_indexes(&batch);
        assert_eq!(indexes.len(), batch.len());
        assert!(indexes[2].is_empty());

        let outcome = manager
            .search_indexed(&batch, &indexes, "\"machine learning\"", &CancellationToken::new())
            .unwrap();
        assert_eq!(ids(&outcome.matches), vec!["r2"]);
    }

    #[test]
    fn test_search_indexed_rejects_mismatched_lengths() {
        let manager = SearchManager::sequential(Normalizer::default());
        let batch = records();
        let mut indexes = manager.build_indexes(&batch);
        indexes.push(MatcherIndex::empty());

        let err = manager
            .search_indexed(&batch, &indexes, "AWS", &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::IndexMismatch {
                records: 4,
                indexes: 5
            }
        ));

        let err = manager
            .search_indexed(&batch, &indexes[..2], "AWS", &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, SearchError::IndexMismatch { .. }));
    }

    #[test]
    fn test_late_cancellation_keeps_run_complete() {
        let ids = vec!["a".to_string(), "b".to_string()];

        let outcome = SearchManager::collect(vec![Some(true), Some(false)], |i| &ids[i]);
        assert!(!outcome.cancelled);
        assert!(outcome.is_complete());
        assert_eq!(outcome.matches, vec![MatchResult::matched("a")]);

        let outcome = SearchManager::collect(vec![Some(true), None], |i| &ids[i]);
        assert!(outcome.cancelled);
        assert_eq!(outcome.evaluated, 1);
    }

    #[test]
    fn test_cancel_after_last_record_is_not_reported() {
        let manager = SearchManager::sequential(Normalizer::default());
        let cancel = CancellationToken::new();
        let stats = SearchStats::default();
        let outcome = manager
            .search_with_stats(&records(), "AWS", &cancel, &stats)
            .unwrap();
        cancel.cancel();

        assert!(!outcome.cancelled);
        assert_eq!(outcome.evaluated, 4);
    }

    #[test]
    fn test_deeply_nested_query_is_rejected() {
        let batch = vec![RawRecord::new("a", "Rust")];
        let deep = format!("{}Rust{}", "(".repeat(1000), ")".repeat(1000));
        let err = search(&batch, &deep).unwrap_err();
        assert!(matches!(
            err,
            SearchError::Query(QueryError::Syntax {
                kind: SyntaxErrorKind::TooDeep,
                ..
            })
        ));

        let long = vec!["rust"; 60_000].join(" ");
        let err = search(&batch, &long).unwrap_err();
        assert!(matches!(
            err,
            SearchError::Query(QueryError::Syntax {
                kind: SyntaxErrorKind::TooManyOperands,
                ..
            })
        ));
    }
}
