use crate::artifact::{Explainer, ExplainerArtifact, ModelArtifact};
use crate::features::FeatureEngine;
use crate::labels::{SCORE_MAX, SCORE_MIN};
use crate::trainer::ModelTrainer;
use credit_core::{CreditError, ScoreReport};
use credit_store::Store;
use std::path::PathBuf;

/// Loads the cached model (training on demand when absent), computes
/// an issuer's features and produces a clamped score with ranked
/// per-feature attributions.
pub struct Scorer {
    features: FeatureEngine,
    trainer: ModelTrainer,
    model_dir: PathBuf,
}

impl Scorer {
    pub fn new(store: Store, model_dir: impl Into<PathBuf>) -> Self {
        let model_dir = model_dir.into();
        Self {
            features: FeatureEngine::new(store.clone()),
            trainer: ModelTrainer::new(store, model_dir.clone()),
            model_dir,
        }
    }

    pub async fn score_and_explain(&self, issuer_id: i64) -> Result<ScoreReport, CreditError> {
        let artifact = match ModelArtifact::load(&self.model_dir)? {
            Some(artifact) => artifact,
            // Sole synchronous fallback path: blocks this caller until
            // training completes, once per process lifetime.
            None => self.trainer.train_and_save().await?,
        };

        let features = self.features.compute_features(issuer_id).await?;
        let raw_score = artifact.predict(&features.as_array());
        let score = raw_score.clamp(SCORE_MIN, SCORE_MAX);

        let attributions = match self.build_explainer(&artifact) {
            Ok(explainer) => explainer.attributions(&features),
            Err(e) => {
                // Degraded explanation, never a hard error: the score
                // is still returned.
                tracing::warn!(error = %e, "Attribution engine unavailable, returning empty explanation");
                Vec::new()
            }
        };

        Ok(ScoreReport {
            score,
            raw_score,
            features,
            attributions,
        })
    }

    /// Cached explainer when present and consistent with the model;
    /// otherwise built on demand from the model weights alone.
    fn build_explainer(&self, artifact: &ModelArtifact) -> Result<Explainer, CreditError> {
        match ExplainerArtifact::load(&self.model_dir)? {
            Some(explainer) => Ok(Explainer::new(
                artifact.weights.clone(),
                explainer.baseline,
            )),
            None => Ok(Explainer::from_model(artifact)),
        }
    }
}
