//! The CSV result file shared by the extract and load steps.

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::ResultRow;
use crate::error::{PipelineError, Result};

/// Column order of the result file and the staging table.
pub const RESULT_COLUMNS: [&str; 10] = [
    "image_id",
    "capture_timestamp",
    "subject_id_anon",
    "model_version_name",
    "true_emotion",
    "predicted_emotion",
    "predicted_valence_score",
    "predicted_arousal_score",
    "confidence_score",
    "age_group",
];

/// Write `rows` to `output_path`, replacing any previous file.
///
/// Rows go to a sibling `.partial` file first, which is renamed over the
/// destination once fully flushed. A failed run leaves the destination as it was.
pub fn write_result_file(rows: &[ResultRow], output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            PipelineError::Storage(format!("cannot create {}: {}", parent.display(), e))
        })?;
    }

    let partial = partial_path(output_path);
    if let Err(e) = write_rows(rows, &partial) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    fs::rename(&partial, output_path).map_err(|e| {
        let _ = fs::remove_file(&partial);
        PipelineError::Storage(format!("cannot replace {}: {}", output_path.display(), e))
    })
}

fn write_rows(rows: &[ResultRow], path: &Path) -> Result<()> {
    let write_err = |e: csv::Error| {
        PipelineError::Storage(format!("cannot write {}: {}", path.display(), e))
    };

    let mut wtr = csv::Writer::from_path(path).map_err(write_err)?;

    // An empty result set still gets a header
    if rows.is_empty() {
        wtr.write_record(RESULT_COLUMNS).map_err(write_err)?;
    }
    for row in rows {
        wtr.serialize(row).map_err(write_err)?;
    }

    wtr.flush()
        .map_err(|e| PipelineError::Storage(format!("cannot flush {}: {}", path.display(), e)))
}

fn partial_path(output_path: &Path) -> PathBuf {
    let mut name = output_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    output_path.with_file_name(name)
}

/// A result file row as bound into the staging table.
///
/// Label columns are free text: files from other producers may carry model
/// versions, emotions or age buckets the extract step never generates.
#[derive(Debug, Clone, PartialEq)]
pub struct StagingRow {
    pub image_id: String,
    pub capture_timestamp: NaiveDateTime,
    pub subject_id_anon: String,
    pub model_version_name: String,
    pub true_emotion: String,
    pub predicted_emotion: String,
    pub predicted_valence_score: f64,
    pub predicted_arousal_score: f64,
    pub confidence_score: f64,
    pub age_group: String,
}

impl From<&ResultRow> for StagingRow {
    fn from(row: &ResultRow) -> Self {
        Self {
            image_id: row.image_id.clone(),
            capture_timestamp: row.capture_timestamp,
            subject_id_anon: row.subject_id_anon.clone(),
            model_version_name: row.model_version_name.to_string(),
            true_emotion: row.true_emotion.to_string(),
            predicted_emotion: row.predicted_emotion.to_string(),
            predicted_valence_score: row.predicted_valence_score,
            predicted_arousal_score: row.predicted_arousal_score,
            confidence_score: row.confidence_score,
            age_group: row.age_group.to_string(),
        }
    }
}

/// Row as it appears on disk; the timestamp is parsed separately so that any
/// ISO-8601 spelling is accepted.
#[derive(Debug, Deserialize)]
struct RawResultRow {
    image_id: String,
    capture_timestamp: String,
    subject_id_anon: String,
    model_version_name: String,
    true_emotion: String,
    predicted_emotion: String,
    predicted_valence_score: f64,
    predicted_arousal_score: f64,
    confidence_score: f64,
    age_group: String,
}

/// Read a result file written by [`write_result_file`] or any file with the
/// same header.
pub fn read_result_file(path: &Path) -> Result<Vec<StagingRow>> {
    if !path.is_file() {
        return Err(PipelineError::NotFound { path: path.to_path_buf() });
    }

    let mut rdr = csv::Reader::from_path(path).map_err(|e| PipelineError::Format {
        row: 0,
        message: e.to_string(),
    })?;

    let mut rows = Vec::new();
    for (index, result) in rdr.deserialize::<RawResultRow>().enumerate() {
        let row_number = index + 1;
        let raw = result.map_err(|e| PipelineError::Format {
            row: row_number,
            message: e.to_string(),
        })?;

        let capture_timestamp =
            parse_timestamp(&raw.capture_timestamp).ok_or_else(|| PipelineError::Format {
                row: row_number,
                message: format!("unparseable capture_timestamp {:?}", raw.capture_timestamp),
            })?;

        rows.push(StagingRow {
            image_id: raw.image_id,
            capture_timestamp,
            subject_id_anon: raw.subject_id_anon,
            model_version_name: raw.model_version_name,
            true_emotion: raw.true_emotion,
            predicted_emotion: raw.predicted_emotion,
            predicted_valence_score: raw.predicted_valence_score,
            predicted_arousal_score: raw.predicted_arousal_score,
            confidence_score: raw.confidence_score,
            age_group: raw.age_group,
        });
    }

    Ok(rows)
}

/// Parse an ISO-8601 timestamp. Offsets are normalized to UTC.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_utc());
    }

    DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z")
        .ok()
        .map(|ts| ts.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::Emotion;
    use crate::results::AgeGroup;
    use crate::simulate::ModelVersion;
    use chrono::{Duration, NaiveDate};
    use tempfile::tempdir;

    fn sample_rows(n: usize) -> Vec<ResultRow> {
        let base = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| ResultRow {
                image_id: format!("img_{}.jpg", i),
                capture_timestamp: base + Duration::seconds(i as i64),
                subject_id_anon: format!("Sub_{}", i + 1),
                model_version_name: ModelVersion::ALL[i % 2],
                true_emotion: Emotion::ALL[i % 8],
                predicted_emotion: Emotion::ALL[(i + 1) % 8],
                predicted_valence_score: -0.123456789 + i as f64 * 0.01,
                predicted_arousal_score: 0.987654321 - i as f64 * 0.02,
                confidence_score: 0.6 + i as f64 * 0.001,
                age_group: AgeGroup::ALL[i % 3],
            })
            .collect()
    }

    #[test]
    fn test_write_then_read_preserves_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out/results.csv");
        let rows = sample_rows(25);

        write_result_file(&rows, &path).unwrap();
        let loaded = read_result_file(&path).unwrap();

        let expected: Vec<StagingRow> = rows.iter().map(StagingRow::from).collect();
        assert_eq!(loaded, expected);
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_header_matches_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        write_result_file(&sample_rows(1), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(header, RESULT_COLUMNS.join(","));
        assert!(content.contains("2025-01-01T00:00:00"));
        assert!(content.contains("V1_ResNet"));
        assert!(content.contains("20-30"));
    }

    #[test]
    fn test_overwrites_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        write_result_file(&sample_rows(10), &path).unwrap();
        write_result_file(&sample_rows(3), &path).unwrap();

        assert_eq!(read_result_file(&path).unwrap().len(), 3);
    }

    #[test]
    fn test_empty_result_set_has_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        write_result_file(&[], &path).unwrap();

        assert!(read_result_file(&path).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_result_file(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));
    }

    #[test]
    fn test_bad_timestamp_is_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(
            &path,
            format!(
                "{}\nimg_0.jpg,yesterday,Sub_1,V1_ResNet,Happy,Happy,0.1,0.2,0.9,20-30\n",
                RESULT_COLUMNS.join(",")
            ),
        )
        .unwrap();

        match read_result_file(&path).unwrap_err() {
            PipelineError::Format { row, message } => {
                assert_eq!(row, 1);
                assert!(message.contains("capture_timestamp"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_labels_outside_generated_sets_are_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(
            &path,
            format!(
                "{}\nimg_0.jpg,2025-01-01 00:00:00,Sub_1,V2_EfficientNet,Contempt,Happy,0.1,0.2,0.9,50-60\n",
                RESULT_COLUMNS.join(",")
            ),
        )
        .unwrap();

        let rows = read_result_file(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].model_version_name, "V2_EfficientNet");
        assert_eq!(rows[0].true_emotion, "Contempt");
        assert_eq!(rows[0].age_group, "50-60");
    }

    #[test]
    fn test_non_numeric_score_is_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(
            &path,
            format!(
                "{}\nimg_0.jpg,2025-01-01 00:00:00,Sub_1,V1_ResNet,Happy,Happy,high,0.2,0.9,20-30\n",
                RESULT_COLUMNS.join(",")
            ),
        )
        .unwrap();

        assert!(matches!(
            read_result_file(&path).unwrap_err(),
            PipelineError::Format { row: 1, .. }
        ));
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 5)
            .unwrap();

        assert_eq!(parse_timestamp("2025-01-01T00:00:05"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01 00:00:05"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01 00:00:05.000"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01T00:00:05Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01T02:00:05+02:00"), Some(expected));
        assert_eq!(parse_timestamp("01/01/2025"), None);
    }
}
