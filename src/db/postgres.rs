//! PostgreSQL backend implementation.

use postgres::NoTls;
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;

use super::schema::{
    count_sql, create_staging_sql, drop_staging_sql, insert_staging_sql, Placeholder,
};
use super::AnalyticsRow;
use crate::config::PostgresConfig;
use crate::error::{PipelineError, Result};
use crate::results::StagingRow;

type Manager = PostgresConnectionManager<NoTls>;

pub struct PgStore {
    pool: Pool<Manager>,
}

/// Helper to parse a row of the analytical view.
fn row_to_analytics(row: &postgres::Row) -> std::result::Result<AnalyticsRow, postgres::Error> {
    let is_correct: Option<i32> = row.try_get(1)?;
    Ok(AnalyticsRow {
        confidence_score: row.try_get(0)?,
        is_correct_prediction: is_correct.map(|v| v != 0),
        predicted_valence: row.try_get(2)?,
        predicted_arousal: row.try_get(3)?,
        emotion_name: row.try_get(4)?,
        valence_benchmark: row.try_get(5)?,
        arousal_benchmark: row.try_get(6)?,
        age_group: row.try_get(7)?,
        model_name: row.try_get(8)?,
        date_actual: row.try_get(9)?,
        day_of_week_name: row.try_get(10)?,
    })
}

impl PgStore {
    /// Connect with a single-connection pool; every operation is sequential.
    pub fn open(config: &PostgresConfig) -> Result<Self> {
        let mut pg_config = postgres::Config::new();
        pg_config
            .user(&config.user)
            .password(&config.password)
            .host(&config.host)
            .port(config.port)
            .dbname(&config.dbname);

        let manager = PostgresConnectionManager::new(pg_config, NoTls);
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(PipelineError::storage)?;
        Ok(Self { pool })
    }

    fn client(&self) -> Result<PooledConnection<Manager>> {
        self.pool.get().map_err(PipelineError::storage)
    }

    pub fn replace_staging(&self, table: &str, rows: &[StagingRow]) -> Result<usize> {
        let mut client = self.client()?;
        // DDL is transactional in PostgreSQL, so readers see either the old
        // table or the fully loaded new one.
        let mut tx = client.transaction().map_err(PipelineError::storage)?;

        tx.batch_execute(&format!(
            "{};\n{};",
            drop_staging_sql(table),
            create_staging_sql(table)
        ))
        .map_err(PipelineError::storage)?;

        let stmt = tx
            .prepare(&insert_staging_sql(table, Placeholder::Dollar))
            .map_err(PipelineError::storage)?;
        for row in rows {
            tx.execute(
                &stmt,
                &[
                    &row.image_id,
                    &row.capture_timestamp,
                    &row.subject_id_anon,
                    &row.model_version_name,
                    &row.true_emotion,
                    &row.predicted_emotion,
                    &row.predicted_valence_score,
                    &row.predicted_arousal_score,
                    &row.confidence_score,
                    &row.age_group,
                ],
            )
            .map_err(PipelineError::storage)?;
        }

        tx.commit().map_err(PipelineError::storage)?;
        Ok(rows.len())
    }

    pub fn count_rows(&self, table: &str) -> Result<usize> {
        let mut client = self.client()?;
        let row = client
            .query_one(&count_sql(table), &[])
            .map_err(PipelineError::storage)?;
        let count: i64 = row.get(0);
        Ok(count as usize)
    }

    pub fn query_view(&self, sql: &str) -> Result<Vec<AnalyticsRow>> {
        let mut client = self.pool.get().map_err(PipelineError::query)?;
        let rows = client.query(sql, &[]).map_err(PipelineError::query)?;
        rows.iter()
            .map(row_to_analytics)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(PipelineError::query)
    }
}
