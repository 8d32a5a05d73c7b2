//! Prediction service: the loaded model plus request normalization, and the
//! HTTP transport in [`http`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

use crate::artifact::ModelArtifact;
use crate::constants::service::{FALLBACK_ALGORITHM, MISSING_MODEL_MESSAGE};
use crate::errors::SortpickError;
use crate::features::{self, FeatureVector};
use crate::forest::Classifier;
use crate::sorting::Algorithm;

pub mod http;


/// Answer for one sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Recommended algorithm.
    pub algorithm: Algorithm,
    /// Probability mass on `algorithm`; `0.0` means no learned signal.
    pub confidence: f64,
    /// Features extracted from the request sequence.
    pub features: FeatureVector,
    /// Present only on fallback answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Holds the model loaded at startup (if any). Immutable afterwards, so one
/// instance can serve any number of concurrent callers.
pub struct Predictor {
    model: Option<Box<dyn Classifier>>,
}

impl Predictor {
    /// Predictor that always answers with the fallback.
    pub fn fallback() -> Self {
        Self { model: None }
    }

    /// Predictor backed by `classifier`.
    pub fn with_classifier<C: Classifier + 'static>(classifier: C) -> Self {
        Self {
            model: Some(Box::new(classifier)),
        }
    }

    /// Load the artifact at `path`, failing if it is missing or invalid.
    pub fn try_load(path: &Path) -> Result<Self, SortpickError> {
        Ok(Self::with_classifier(ModelArtifact::load(path)?))
    }

    /// Load the artifact at `path`, degrading to [`Predictor::fallback`] with
    /// a warning when that fails.
    pub fn load(path: &Path) -> Self {
        Self::try_load(path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "no usable model; serving fallback answers");
            Self::fallback()
        })
    }

    /// `true` when a model is loaded.
    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    /// Extract features from `sequence` and classify them.
    pub fn recommend(&self, sequence: &[f64]) -> Recommendation {
        let features = features::extract(sequence);
        let Some(model) = &self.model else {
            return Recommendation {
                algorithm: FALLBACK_ALGORITHM,
                confidence: 0.0,
                features,
                error: Some(MISSING_MODEL_MESSAGE.to_string()),
            };
        };
        let algorithm = model.predict(&features);
        let confidence = model
            .predict_proba(&features)
            .and_then(|proba| {
                proba
                    .into_iter()
                    .find(|(class, _)| *class == algorithm)
                    .map(|(_, p)| p)
            })
            .map_or(0.0, |p| p.clamp(0.0, 1.0));
        Recommendation {
            algorithm,
            confidence,
            features,
            error: None,
        }
    }
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("classes", &self.model.as_ref().map(|m| m.classes().to_vec()))
            .finish()
    }
}

/// Pull the `array` field out of a request body.
///
/// Anything malformed (not an object, no `array`, not a list, or any
/// non-numeric element) becomes the empty sequence instead of an error.
pub fn normalize_request(body: &Value) -> Vec<f64> {
    match body.get("array") {
        Some(Value::Array(items)) => items
            .iter()
            .map(Value::as_f64)
            .collect::<Option<Vec<f64>>>()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
