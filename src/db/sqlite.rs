//! SQLite backend implementation.

use rusqlite::Connection;
use std::path::Path;

use super::schema::{
    count_sql, create_staging_sql, drop_staging_sql, insert_staging_sql, Placeholder,
};
use super::AnalyticsRow;
use crate::error::{PipelineError, Result};
use crate::results::StagingRow;

pub struct SqliteStore {
    pub(crate) conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(PipelineError::storage)?;
        }
        let conn = Connection::open(path).map_err(PipelineError::storage)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(PipelineError::storage)?;
        Ok(Self { conn })
    }

    pub fn replace_staging(&self, table: &str, rows: &[StagingRow]) -> Result<usize> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(PipelineError::storage)?;

        tx.execute(&drop_staging_sql(table), [])
            .map_err(PipelineError::storage)?;
        tx.execute(&create_staging_sql(table), [])
            .map_err(PipelineError::storage)?;

        {
            let mut stmt = tx
                .prepare(&insert_staging_sql(table, Placeholder::Question))
                .map_err(PipelineError::storage)?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.image_id,
                    row.capture_timestamp,
                    row.subject_id_anon,
                    row.model_version_name,
                    row.true_emotion,
                    row.predicted_emotion,
                    row.predicted_valence_score,
                    row.predicted_arousal_score,
                    row.confidence_score,
                    row.age_group,
                ])
                .map_err(PipelineError::storage)?;
            }
        }

        tx.commit().map_err(PipelineError::storage)?;
        Ok(rows.len())
    }

    pub fn count_rows(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&count_sql(table), [], |row| row.get(0))
            .map_err(PipelineError::storage)?;
        Ok(count as usize)
    }

    pub fn query_view(&self, sql: &str) -> Result<Vec<AnalyticsRow>> {
        let mut stmt = self.conn.prepare(sql).map_err(PipelineError::query)?;

        let rows = stmt
            .query_map([], |row| {
                let is_correct: Option<i64> = row.get(1)?;
                Ok(AnalyticsRow {
                    confidence_score: row.get(0)?,
                    is_correct_prediction: is_correct.map(|v| v != 0),
                    predicted_valence: row.get(2)?,
                    predicted_arousal: row.get(3)?,
                    emotion_name: row.get(4)?,
                    valence_benchmark: row.get(5)?,
                    arousal_benchmark: row.get(6)?,
                    age_group: row.get(7)?,
                    model_name: row.get(8)?,
                    date_actual: row.get(9)?,
                    day_of_week_name: row.get(10)?,
                })
            })
            .map_err(PipelineError::query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(PipelineError::query)?;

        Ok(rows)
    }
}
