//! SQL text for the staging table and the analytical view.
//!
//! The statements are written in the subset of SQL that both PostgreSQL and
//! SQLite accept; only bind placeholders differ between the two.

use crate::error::{PipelineError, Result};
use crate::results::RESULT_COLUMNS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Timestamp,
    Double,
}

impl ColumnType {
    fn sql(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Double => "DOUBLE PRECISION",
        }
    }
}

/// Column types of the staging table, in result-file column order.
pub const STAGING_COLUMN_TYPES: [ColumnType; 10] = [
    ColumnType::Text,
    ColumnType::Timestamp,
    ColumnType::Text,
    ColumnType::Text,
    ColumnType::Text,
    ColumnType::Text,
    ColumnType::Double,
    ColumnType::Double,
    ColumnType::Double,
    ColumnType::Text,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?1, ?2, ...`
    Question,
    /// `$1, $2, ...`
    Dollar,
}

/// Reject anything that is not a plain SQL identifier. Table names are
/// interpolated into statements, so this is the only guard against injection.
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid && name.len() <= 63 {
        Ok(())
    } else {
        Err(PipelineError::Configuration(format!(
            "invalid staging table name: {:?}",
            name
        )))
    }
}

pub fn drop_staging_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", table)
}

pub fn create_staging_sql(table: &str) -> String {
    let columns: Vec<String> = RESULT_COLUMNS
        .iter()
        .zip(STAGING_COLUMN_TYPES.iter())
        .map(|(name, ty)| format!("    {} {}", name, ty.sql()))
        .collect();
    format!("CREATE TABLE {} (\n{}\n)", table, columns.join(",\n"))
}

pub fn insert_staging_sql(table: &str, placeholder: Placeholder) -> String {
    let params: Vec<String> = (1..=RESULT_COLUMNS.len())
        .map(|i| match placeholder {
            Placeholder::Question => format!("?{}", i),
            Placeholder::Dollar => format!("${}", i),
        })
        .collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        RESULT_COLUMNS.join(", "),
        params.join(", ")
    )
}

pub fn count_sql(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", table)
}

/// The fixed fact/dimension join read by the dashboard.
///
/// Measures are cast so both backends hand back the same column types:
/// doubles, an integer correctness flag, and the calendar date as text.
pub fn analytical_view_sql(limit: usize) -> String {
    format!(
        r#"
    SELECT
        CAST(f.confidence_score AS DOUBLE PRECISION) AS confidence_score,
        CAST(f.is_correct_prediction AS INTEGER) AS is_correct_prediction,
        CAST(f.predicted_valence AS DOUBLE PRECISION) AS predicted_valence,
        CAST(f.predicted_arousal AS DOUBLE PRECISION) AS predicted_arousal,

        d_emo.emotion_name,
        CAST(d_emo.valence_benchmark AS DOUBLE PRECISION) AS valence_benchmark,
        CAST(d_emo.arousal_benchmark AS DOUBLE PRECISION) AS arousal_benchmark,
        d_sub.age_group,
        d_mod.model_version_name AS model_name,
        CAST(d_time.date_actual AS TEXT) AS date_actual,
        d_time.day_of_week_name

    FROM fact_emotion_analysis AS f

    LEFT JOIN dim_emotion AS d_emo ON f.emotion_key = d_emo.emotion_key
    LEFT JOIN dim_subject AS d_sub ON f.subject_key = d_sub.subject_key
    LEFT JOIN dim_model AS d_mod ON f.model_key = d_mod.model_key
    LEFT JOIN dim_time AS d_time ON f.date_key = d_time.date_key

    LIMIT {}
    "#,
        limit
    )
}
