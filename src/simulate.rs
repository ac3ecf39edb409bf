//! Placeholder model output.
//!
//! Predictions are random draws, not inference. The mismatch rate and the
//! independent sampling of every attribute are fixed policy; confidence is not
//! correlated with correctness.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::emotion::Emotion;

/// Probability that the simulated model predicts a wrong label.
pub const MISMATCH_RATE: f64 = 0.3;

pub const CONFIDENCE_RANGE: (f64, f64) = (0.6, 0.99);
pub const AFFECT_RANGE: (f64, f64) = (-1.0, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelVersion {
    #[serde(rename = "V1_ResNet")]
    ResNet,
    #[serde(rename = "V1_MobileNet")]
    MobileNet,
}

impl ModelVersion {
    pub const ALL: [ModelVersion; 2] = [ModelVersion::ResNet, ModelVersion::MobileNet];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVersion::ResNet => "V1_ResNet",
            ModelVersion::MobileNet => "V1_MobileNet",
        }
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPrediction {
    pub predicted_emotion: Emotion,
    pub confidence: f64,
    pub valence: f64,
    pub arousal: f64,
    pub model_version: ModelVersion,
}

impl SimulatedPrediction {
    pub fn is_correct(&self, truth: Emotion) -> bool {
        self.predicted_emotion == truth
    }
}

/// Draw one simulated prediction for an image whose true label is `truth`.
pub fn simulate<R: Rng + ?Sized>(rng: &mut R, truth: Emotion) -> SimulatedPrediction {
    let predicted_emotion = if rng.random_bool(MISMATCH_RATE) {
        let wrong: Vec<Emotion> = truth.others().collect();
        *wrong.choose(rng).unwrap_or(&truth)
    } else {
        truth
    };

    let confidence = rng.random_range(CONFIDENCE_RANGE.0..=CONFIDENCE_RANGE.1);
    let valence = rng.random_range(AFFECT_RANGE.0..=AFFECT_RANGE.1);
    let arousal = rng.random_range(AFFECT_RANGE.0..=AFFECT_RANGE.1);
    let model_version = *ModelVersion::ALL.choose(rng).unwrap_or(&ModelVersion::ResNet);

    SimulatedPrediction {
        predicted_emotion,
        confidence,
        valence,
        arousal,
        model_version,
    }
}
