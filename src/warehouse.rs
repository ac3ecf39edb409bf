//! Read path over the warehouse star schema.
//!
//! Results are memoized per process in a cache keyed by a fingerprint of the
//! query text and its parameters. Entries are never invalidated; a new process
//! sees fresh data.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::db::schema::analytical_view_sql;
use crate::db::{AnalyticsRow, Store};
use crate::error::PipelineError;

/// Rows of the joined fact/dimension view.
pub type AnalyticalView = Vec<AnalyticsRow>;

/// Result of one view request. A failed query yields an empty view plus the
/// error, so callers can render a warning instead of aborting.
#[derive(Debug)]
pub struct ViewOutcome {
    pub view: AnalyticalView,
    pub error: Option<PipelineError>,
}

impl ViewOutcome {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// SHA-256 over the query text and parameters, as lowercase hex.
pub fn fingerprint(sql: &str, params: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sql.as_bytes());
    for param in params {
        // Separator keeps ("ab", "c") and ("a", "bc") apart
        hasher.update([0u8]);
        hasher.update(param.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<String, AnalyticalView>,
}

impl QueryCache {
    pub fn get(&self, key: &str) -> Option<&AnalyticalView> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, view: AnalyticalView) {
        self.entries.insert(key, view);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct WarehouseService<'a> {
    store: &'a Store,
    row_limit: usize,
    cache: QueryCache,
}

impl<'a> WarehouseService<'a> {
    pub fn new(store: &'a Store, row_limit: usize) -> Self {
        Self {
            store,
            row_limit,
            cache: QueryCache::default(),
        }
    }

    /// Fetch the analytical view, at most `row_limit` rows, in store order.
    pub fn load_view(&mut self) -> ViewOutcome {
        let sql = analytical_view_sql(self.row_limit);
        let key = fingerprint(&sql, &[self.store.backend_name().to_string()]);

        if let Some(view) = self.cache.get(&key) {
            debug!("Analytical view served from cache ({} rows)", view.len());
            return ViewOutcome {
                view: view.clone(),
                error: None,
            };
        }

        match self.store.query_view(&sql) {
            Ok(view) => {
                info!("Loaded {} rows from the warehouse", view.len());
                self.cache.insert(key, view.clone());
                ViewOutcome { view, error: None }
            }
            Err(e) => {
                let error = match e {
                    PipelineError::Query(_) => e,
                    other => PipelineError::query(other),
                };
                warn!("Warehouse query failed: {}", error);
                ViewOutcome {
                    view: Vec::new(),
                    error: Some(error),
                }
            }
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::STAR_SCHEMA;

    #[test]
    fn test_fingerprint_is_stable_and_sensitive() {
        let a = fingerprint("SELECT 1", &["x".to_string()]);
        assert_eq!(a, fingerprint("SELECT 1", &["x".to_string()]));
        assert_eq!(a.len(), 64);
        assert_ne!(a, fingerprint("SELECT 2", &["x".to_string()]));
        assert_ne!(
            fingerprint("q", &["ab".to_string(), "c".to_string()]),
            fingerprint("q", &["a".to_string(), "bc".to_string()])
        );
    }

    #[test]
    fn test_failure_degrades_to_empty_view() {
        let store = Store::open_in_memory().unwrap();
        let mut service = WarehouseService::new(&store, 1000);

        let outcome = service.load_view();

        assert!(outcome.view.is_empty());
        assert!(outcome.is_degraded());
        assert!(matches!(outcome.error, Some(PipelineError::Query(_))));
        assert!(service.cache().is_empty());
    }

    #[test]
    fn test_successful_view_is_cached() {
        let store = Store::open_in_memory().unwrap();
        store.sqlite_conn().execute_batch(STAR_SCHEMA).unwrap();
        store
            .sqlite_conn()
            .execute_batch(
                "INSERT INTO fact_emotion_analysis (fact_key, confidence_score, is_correct_prediction) \
                 VALUES (1, 0.9, 1);",
            )
            .unwrap();

        let mut service = WarehouseService::new(&store, 1000);
        let first = service.load_view();
        assert_eq!(first.view.len(), 1);
        assert!(!first.is_degraded());

        // New rows are not visible until the process restarts
        store
            .sqlite_conn()
            .execute_batch(
                "INSERT INTO fact_emotion_analysis (fact_key, confidence_score, is_correct_prediction) \
                 VALUES (2, 0.8, 0);",
            )
            .unwrap();
        let second = service.load_view();
        assert_eq!(second.view, first.view);
        assert_eq!(service.cache().len(), 1);
    }
}
