//! Aggregates shown by the dashboard.
//!
//! Everything here is computed from an [`AnalyticalView`] without touching
//! the store; the terminal UI only draws the result.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::warehouse::{AnalyticalView, ViewOutcome};

pub const EMPTY_VIEW_WARNING: &str =
    "Could not load data from the data warehouse. Dashboard cannot be displayed.";

/// Group label for rows whose dimension lookup did not match.
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorrectnessCounts {
    pub correct: u64,
    pub incorrect: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelAccuracy {
    pub model_name: String,
    /// Mean of the correctness flag, 0.0 ..= 1.0.
    pub accuracy: f64,
    pub formatted: String,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub emotion: String,
    /// `(predicted_valence, predicted_arousal)` pairs.
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_rows: usize,
    pub correctness: CorrectnessCounts,
    pub accuracy_by_model: Vec<ModelAccuracy>,
    pub scatter: Vec<ScatterSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardState {
    /// Nothing to show; only the warning is rendered.
    Empty {
        warning: String,
        detail: Option<String>,
    },
    Ready(DashboardSummary),
}

impl DashboardState {
    pub fn from_outcome(outcome: &ViewOutcome) -> Self {
        let mut state = Self::from_view(&outcome.view);
        if let (DashboardState::Empty { detail, .. }, Some(err)) = (&mut state, &outcome.error) {
            *detail = Some(err.to_string());
        }
        state
    }

    pub fn from_view(view: &AnalyticalView) -> Self {
        if view.is_empty() {
            return DashboardState::Empty {
                warning: EMPTY_VIEW_WARNING.to_string(),
                detail: None,
            };
        }

        DashboardState::Ready(DashboardSummary {
            total_rows: view.len(),
            correctness: correctness_counts(view),
            accuracy_by_model: accuracy_by_model(view),
            scatter: scatter_by_emotion(view),
        })
    }
}

pub fn correctness_counts(view: &AnalyticalView) -> CorrectnessCounts {
    view.iter()
        .filter_map(|row| row.is_correct_prediction)
        .fold(CorrectnessCounts::default(), |mut counts, correct| {
            if correct {
                counts.correct += 1;
            } else {
                counts.incorrect += 1;
            }
            counts
        })
}

/// Mean correctness per model name. Rows without a flag do not count.
pub fn accuracy_by_model(view: &AnalyticalView) -> Vec<ModelAccuracy> {
    let mut groups: BTreeMap<String, (usize, usize)> = BTreeMap::new();

    for row in view {
        let Some(correct) = row.is_correct_prediction else {
            continue;
        };
        let name = row.model_name.clone().unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        let entry = groups.entry(name).or_default();
        entry.1 += 1;
        if correct {
            entry.0 += 1;
        }
    }

    groups
        .into_iter()
        .map(|(model_name, (correct, total))| {
            let accuracy = correct as f64 / total as f64;
            ModelAccuracy {
                model_name,
                accuracy,
                formatted: format_percent(accuracy),
                samples: total,
            }
        })
        .collect()
}

/// Valence/arousal points grouped by emotion name, in name order.
pub fn scatter_by_emotion(view: &AnalyticalView) -> Vec<ScatterSeries> {
    let mut series: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();

    for row in view {
        if let (Some(x), Some(y)) = (row.predicted_valence, row.predicted_arousal) {
            let emotion = row.emotion_name.clone().unwrap_or_else(|| UNKNOWN_LABEL.to_string());
            series.entry(emotion).or_default().push((x, y));
        }
    }

    series
        .into_iter()
        .map(|(emotion, points)| ScatterSeries { emotion, points })
        .collect()
}

/// `0.6667` -> `"66.67%"`
pub fn format_percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}
