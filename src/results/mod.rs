//! Flat result rows: annotation + simulated prediction + synthetic metadata.

pub mod file;

use chrono::{Duration, NaiveDateTime};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::annotations::AnnotationRecord;
use crate::emotion::Emotion;
use crate::simulate::{simulate, ModelVersion};

pub use file::{read_result_file, write_result_file, StagingRow, RESULT_COLUMNS};

/// Size of the anonymous subject pool (`Sub_1` ..= `Sub_500`).
pub const SUBJECT_POOL: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "20-30")]
    Twenties,
    #[serde(rename = "30-40")]
    Thirties,
    #[serde(rename = "40-50")]
    Forties,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 3] = [AgeGroup::Twenties, AgeGroup::Thirties, AgeGroup::Forties];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Twenties => "20-30",
            AgeGroup::Thirties => "30-40",
            AgeGroup::Forties => "40-50",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One processed label file, as written to the result file and staging table.
///
/// Field order matches the column order of the result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub image_id: String,
    pub capture_timestamp: NaiveDateTime,
    pub subject_id_anon: String,
    pub model_version_name: ModelVersion,
    pub true_emotion: Emotion,
    pub predicted_emotion: Emotion,
    pub predicted_valence_score: f64,
    pub predicted_arousal_score: f64,
    pub confidence_score: f64,
    pub age_group: AgeGroup,
}

impl ResultRow {
    pub fn is_correct(&self) -> bool {
        self.true_emotion == self.predicted_emotion
    }
}

/// Builds result rows in reader order.
///
/// The i-th accepted record gets `base_time + i` seconds as its capture time.
pub struct RowAssembler<R> {
    base_time: NaiveDateTime,
    rng: R,
    next_index: i64,
}

impl<R: Rng> RowAssembler<R> {
    pub fn new(base_time: NaiveDateTime, rng: R) -> Self {
        Self {
            base_time,
            rng,
            next_index: 0,
        }
    }

    pub fn assemble_one(&mut self, record: AnnotationRecord) -> ResultRow {
        let prediction = simulate(&mut self.rng, record.true_emotion);

        let capture_timestamp = self.base_time + Duration::seconds(self.next_index);
        self.next_index += 1;

        let subject_id_anon = format!("Sub_{}", self.rng.random_range(1..=SUBJECT_POOL));
        let age_group = *AgeGroup::ALL
            .choose(&mut self.rng)
            .unwrap_or(&AgeGroup::Twenties);

        ResultRow {
            image_id: record.image_id,
            capture_timestamp,
            subject_id_anon,
            model_version_name: prediction.model_version,
            true_emotion: record.true_emotion,
            predicted_emotion: prediction.predicted_emotion,
            predicted_valence_score: prediction.valence,
            predicted_arousal_score: prediction.arousal,
            confidence_score: prediction.confidence,
            age_group,
        }
    }

    /// Assemble every record into one in-memory result set.
    pub fn assemble<I>(&mut self, records: I) -> Vec<ResultRow>
    where
        I: IntoIterator<Item = AnnotationRecord>,
    {
        records
            .into_iter()
            .map(|record| self.assemble_one(record))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn record(id: &str, emotion: Emotion) -> AnnotationRecord {
        AnnotationRecord {
            image_id: id.to_string(),
            class_index: emotion.class_index(),
            true_emotion: emotion,
        }
    }

    #[test]
    fn test_timestamps_one_second_apart() {
        let mut assembler = RowAssembler::new(base_time(), StdRng::seed_from_u64(5));
        let records = (0..50).map(|i| record(&format!("{}.jpg", i), Emotion::ALL[i % 8]));
        let rows = assembler.assemble(records);

        assert_eq!(rows[0].capture_timestamp, base_time());
        for pair in rows.windows(2) {
            assert_eq!(
                pair[1].capture_timestamp - pair[0].capture_timestamp,
                Duration::seconds(1)
            );
        }
    }

    #[test]
    fn test_synthetic_metadata_in_pools() {
        let mut assembler = RowAssembler::new(base_time(), StdRng::seed_from_u64(9));
        let rows = assembler.assemble((0..500).map(|i| record(&format!("{}.jpg", i), Emotion::Fear)));

        for row in &rows {
            let n: u32 = row.subject_id_anon.strip_prefix("Sub_").unwrap().parse().unwrap();
            assert!((1..=SUBJECT_POOL).contains(&n));
            assert_eq!(row.true_emotion, Emotion::Fear);
        }
        let groups: std::collections::HashSet<AgeGroup> = rows.iter().map(|r| r.age_group).collect();
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_same_seed_same_rows() {
        let records = || (0..20).map(|i| record(&format!("{}.jpg", i), Emotion::Happy));
        let a = RowAssembler::new(base_time(), StdRng::seed_from_u64(11)).assemble(records());
        let b = RowAssembler::new(base_time(), StdRng::seed_from_u64(11)).assemble(records());
        assert_eq!(a, b);
    }
}
