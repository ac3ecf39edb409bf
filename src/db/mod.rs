pub mod schema;
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

use serde::Serialize;
use std::path::Path;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::results::StagingRow;

/// One row of the joined fact/dimension view.
///
/// Dimension attributes are nullable because of the outer joins; measures are
/// read as nullable too so that a sparse fact row never fails the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsRow {
    pub confidence_score: Option<f64>,
    pub is_correct_prediction: Option<bool>,
    pub predicted_valence: Option<f64>,
    pub predicted_arousal: Option<f64>,
    pub emotion_name: Option<String>,
    pub valence_benchmark: Option<f64>,
    pub arousal_benchmark: Option<f64>,
    pub age_group: Option<String>,
    pub model_name: Option<String>,
    pub date_actual: Option<String>,
    pub day_of_week_name: Option<String>,
}

/// Macro to dispatch a method call to the active backend variant.
macro_rules! dispatch {
    ($self:expr, $method:ident($($arg:expr),* $(,)?)) => {
        match &$self.inner {
            StoreInner::Sqlite(db) => db.$method($($arg),*),
            #[cfg(feature = "postgres")]
            StoreInner::Postgres(db) => db.$method($($arg),*),
        }
    };
}

enum StoreInner {
    Sqlite(sqlite::SqliteStore),
    #[cfg(feature = "postgres")]
    Postgres(postgres::PgStore),
}

/// Handle to the relational store holding the staging table and the
/// warehouse star schema.
pub struct Store {
    inner: StoreInner,
}

impl Store {
    /// Connect using the validated database configuration.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        match config {
            DatabaseConfig::Sqlite { path } => Self::open_sqlite(path),
            #[cfg(feature = "postgres")]
            DatabaseConfig::Postgres(pg) => {
                let db = postgres::PgStore::open(pg)?;
                Ok(Self { inner: StoreInner::Postgres(db) })
            }
            #[cfg(not(feature = "postgres"))]
            DatabaseConfig::Postgres(_) => Err(crate::error::PipelineError::Configuration(
                "this build has no PostgreSQL support; set DB_BACKEND=sqlite".to_string(),
            )),
        }
    }

    pub fn open_sqlite(path: &Path) -> Result<Self> {
        let db = sqlite::SqliteStore::open(path)?;
        Ok(Self { inner: StoreInner::Sqlite(db) })
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = sqlite::SqliteStore::open_in_memory()?;
        Ok(Self { inner: StoreInner::Sqlite(db) })
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.inner {
            StoreInner::Sqlite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            StoreInner::Postgres(_) => "postgresql",
        }
    }

    /// Drop and recreate `table`, then insert every row, in one transaction.
    /// Returns the number of rows written.
    pub fn replace_staging(&self, table: &str, rows: &[StagingRow]) -> Result<usize> {
        schema::validate_table_name(table)?;
        dispatch!(self, replace_staging(table, rows))
    }

    pub fn count_rows(&self, table: &str) -> Result<usize> {
        schema::validate_table_name(table)?;
        dispatch!(self, count_rows(table))
    }

    /// Run the analytical join. Failures surface as [`PipelineError::Query`].
    pub fn query_view(&self, sql: &str) -> Result<Vec<AnalyticsRow>> {
        dispatch!(self, query_view(sql))
    }

    #[cfg(test)]
    pub(crate) fn sqlite_conn(&self) -> &rusqlite::Connection {
        match &self.inner {
            StoreInner::Sqlite(db) => &db.conn,
            #[cfg(feature = "postgres")]
            StoreInner::Postgres(_) => panic!("not a sqlite store"),
        }
    }
}
