//! Search session: a loaded record batch with its matcher indexes.
//!
//! A session is created from a [`RecordSource`], keeps every record's index
//! for repeated queries, and releases them on [`SearchSession::close`] or drop.

use anyhow::{Context, Result};
use std::collections::HashMap;
use tracing::{info, warn};

use super::common::{CancellationToken, SearchOutcome};
use super::error::SearchError;
use super::matcher::MatcherIndex;
use super::search_manager::SearchManager;

use crate::record::{MatchResult, RawRecord, RecordSource};

#[derive(Debug)]
pub struct SearchSession {
    manager: SearchManager,
    records: Vec<RawRecord>,
    indexes: Vec<MatcherIndex>,
    positions: HashMap<String, usize>,
}

impl SearchSession {
    /// Fetch all records from `source` and index them off the async runtime
    pub async fn load(source: &dyn RecordSource, manager: SearchManager) -> Result<Self> {
        let records = source
            .fetch_all()
            .await
            .context("Failed to fetch records")?;

        tokio::task::spawn_blocking(move || Self::from_records(records, manager))
            .await
            .context("Index build task failed")
    }

    pub fn from_records(records: Vec<RawRecord>, manager: SearchManager) -> Self {
        let indexes = manager.build_indexes(&records);

        let mut positions = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if positions.contains_key(&record.id) {
                warn!("Duplicate record id {}; lookups return the first", record.id);
                continue;
            }
            positions.insert(record.id.clone(), i);
        }

        info!("Search session opened with {} records", records.len());
        Self {
            manager,
            records,
            indexes,
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    /// Look a match back up to its record
    pub fn record(&self, id: &str) -> Option<&RawRecord> {
        self.positions.get(id).map(|&i| &self.records[i])
    }

    pub fn search(&self, expression: &str) -> Result<Vec<MatchResult>, SearchError> {
        let outcome = self.search_with_cancel(expression, &CancellationToken::new())?;
        Ok(outcome.matches)
    }

    pub fn search_with_cancel(
        &self,
        expression: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome, SearchError> {
        self.manager
            .search_indexed(&self.records, &self.indexes, expression, cancel)
    }

    /// End the session, returning how many records were released
    pub fn close(self) -> usize {
        let released = self.records.len();
        info!("Search session closed ({} records released)", released);
        released
    }
}
