use chrono::{DateTime, Utc};
use credit_core::{Attribution, CreditError, FeatureVector, FEATURE_NAMES};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;
pub const MODEL_FILE: &str = "credit_model.json";
pub const EXPLAINER_FILE: &str = "explainer.json";

/// Serialized regression model: weights in feature-name order plus an
/// intercept. The feature-name manifest lets the loader reject a stale
/// cache instead of silently mis-indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub intercept: f64,
    pub trained_at: DateTime<Utc>,
}

impl ModelArtifact {
    pub fn predict(&self, values: &[f64; 6]) -> f64 {
        self.weights
            .iter()
            .zip(values.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }

    pub fn save(&self, dir: &Path) -> Result<(), CreditError> {
        write_atomic(dir, MODEL_FILE, self)
    }

    /// None means "no usable artifact": missing file, unreadable JSON,
    /// or a manifest that does not match the current feature set. All
    /// three resolve to retraining, never a crash on a stale cache.
    pub fn load(dir: &Path) -> Result<Option<Self>, CreditError> {
        let Some(raw) = read_artifact(dir, MODEL_FILE)? else {
            return Ok(None);
        };

        let artifact: Self = match serde_json::from_str(&raw) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(error = %e, "Model artifact unreadable, treating as missing");
                return Ok(None);
            }
        };

        if !manifest_matches(artifact.format_version, &artifact.feature_names)
            || artifact.weights.len() != FEATURE_NAMES.len()
        {
            tracing::warn!("Model artifact manifest mismatch, treating as missing");
            return Ok(None);
        }

        Ok(Some(artifact))
    }
}

/// Serialized attribution baseline: the training-set feature means.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainerArtifact {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub baseline: Vec<f64>,
}

impl ExplainerArtifact {
    pub fn save(&self, dir: &Path) -> Result<(), CreditError> {
        write_atomic(dir, EXPLAINER_FILE, self)
    }

    pub fn load(dir: &Path) -> Result<Option<Self>, CreditError> {
        let Some(raw) = read_artifact(dir, EXPLAINER_FILE)? else {
            return Ok(None);
        };

        let artifact: Self = match serde_json::from_str(&raw) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(error = %e, "Explainer artifact unreadable, ignoring");
                return Ok(None);
            }
        };

        if !manifest_matches(artifact.format_version, &artifact.feature_names)
            || artifact.baseline.len() != FEATURE_NAMES.len()
        {
            tracing::warn!("Explainer artifact manifest mismatch, ignoring");
            return Ok(None);
        }

        Ok(Some(artifact))
    }
}

fn manifest_matches(version: u32, feature_names: &[String]) -> bool {
    version == ARTIFACT_FORMAT_VERSION
        && feature_names.len() == FEATURE_NAMES.len()
        && feature_names.iter().zip(FEATURE_NAMES.iter()).all(|(a, b)| a == b)
}

/// Write to a temp sibling then rename: a concurrent reader sees the
/// old complete file or the new complete file, never a partial one.
fn write_atomic<T: Serialize>(dir: &Path, file: &str, value: &T) -> Result<(), CreditError> {
    fs::create_dir_all(dir)?;
    let tmp = dir.join(format!("{file}.tmp"));
    let target = dir.join(file);
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, &target)?;
    Ok(())
}

fn read_artifact(dir: &Path, file: &str) -> Result<Option<String>, CreditError> {
    let path = dir.join(file);
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(fs::read_to_string(path)?))
}

/// Per-feature attribution: `w_i * (x_i - baseline_i)`. The values sum
/// to the raw prediction minus the prediction at the baseline, so the
/// ranked list explains exactly where the score moved.
pub struct Explainer {
    weights: Vec<f64>,
    baseline: Vec<f64>,
}

impl Explainer {
    pub fn new(weights: Vec<f64>, baseline: Vec<f64>) -> Self {
        Self { weights, baseline }
    }

    /// On-demand fallback when no explainer artifact exists: attribute
    /// relative to the zero vector, i.e. against the intercept.
    pub fn from_model(artifact: &ModelArtifact) -> Self {
        Self {
            weights: artifact.weights.clone(),
            baseline: vec![0.0; artifact.weights.len()],
        }
    }

    /// Sorted by descending absolute attribution; the stable sort keeps
    /// feature declaration order for ties.
    pub fn attributions(&self, features: &FeatureVector) -> Vec<Attribution> {
        let values = features.as_array();
        let mut list: Vec<Attribution> = FEATURE_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| Attribution {
                feature: (*name).to_string(),
                value: values[i],
                attribution: self.weights[i] * (values[i] - self.baseline[i]),
            })
            .collect();

        list.sort_by(|a, b| {
            b.attribution
                .abs()
                .partial_cmp(&a.attribution.abs())
                .unwrap_or(Ordering::Equal)
        });
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("credit-iq-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_artifact() -> ModelArtifact {
        ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            weights: vec![-10.0, 50.0, 80.0, 40.0, 0.01, -0.02],
            intercept: 600.0,
            trained_at: Utc::now(),
        }
    }

    #[test]
    fn save_load_round_trip() {
        let dir = temp_dir("artifact-roundtrip");
        let artifact = sample_artifact();
        artifact.save(&dir).unwrap();

        let loaded = ModelArtifact::load(&dir).unwrap().unwrap();
        assert_eq!(loaded.weights, artifact.weights);
        assert_eq!(loaded.intercept, artifact.intercept);
    }

    #[test]
    fn missing_artifact_loads_as_none() {
        let dir = temp_dir("artifact-missing");
        assert!(ModelArtifact::load(&dir).unwrap().is_none());
    }

    #[test]
    fn version_mismatch_treated_as_missing() {
        let dir = temp_dir("artifact-version");
        let mut artifact = sample_artifact();
        artifact.format_version = ARTIFACT_FORMAT_VERSION + 1;
        fs::write(
            dir.join(MODEL_FILE),
            serde_json::to_vec(&artifact).unwrap(),
        )
        .unwrap();

        assert!(ModelArtifact::load(&dir).unwrap().is_none());
    }

    #[test]
    fn feature_manifest_mismatch_treated_as_missing() {
        let dir = temp_dir("artifact-manifest");
        let mut artifact = sample_artifact();
        artifact.feature_names[0] = "unexpected_feature".into();
        fs::write(
            dir.join(MODEL_FILE),
            serde_json::to_vec(&artifact).unwrap(),
        )
        .unwrap();

        assert!(ModelArtifact::load(&dir).unwrap().is_none());
    }

    #[test]
    fn corrupt_json_treated_as_missing() {
        let dir = temp_dir("artifact-corrupt");
        fs::write(dir.join(MODEL_FILE), b"{ not json").unwrap();
        assert!(ModelArtifact::load(&dir).unwrap().is_none());
    }

    #[test]
    fn attributions_sorted_by_absolute_impact() {
        let explainer = Explainer::new(
            vec![-10.0, 50.0, 80.0, 40.0, 0.01, -0.02],
            vec![0.0; 6],
        );
        let features = FeatureVector {
            debt_to_ebitda: 3.0,
            ebitda_margin: 0.2,
            revenue_growth: -0.5,
            avg_sentiment: 0.1,
            recent_revenue: 100.0,
            recent_total_debt: 50.0,
        };

        let list = explainer.attributions(&features);
        assert_eq!(list.len(), 6);
        for pair in list.windows(2) {
            assert!(pair[0].attribution.abs() >= pair[1].attribution.abs());
        }
    }

    #[test]
    fn attributions_sum_to_raw_minus_baseline_prediction() {
        let artifact = sample_artifact();
        let baseline = vec![2.0, 0.1, 0.05, 0.0, 120.0, 80.0];
        let explainer = Explainer::new(artifact.weights.clone(), baseline.clone());

        let features = FeatureVector {
            debt_to_ebitda: 3.0,
            ebitda_margin: 0.2,
            revenue_growth: -0.5,
            avg_sentiment: 0.1,
            recent_revenue: 100.0,
            recent_total_debt: 50.0,
        };

        let raw = artifact.predict(&features.as_array());
        let baseline_pred = artifact.predict(&[
            baseline[0], baseline[1], baseline[2], baseline[3], baseline[4], baseline[5],
        ]);
        let sum: f64 = explainer
            .attributions(&features)
            .iter()
            .map(|a| a.attribution)
            .sum();

        assert!((sum - (raw - baseline_pred)).abs() < 1e-9);
    }
}
