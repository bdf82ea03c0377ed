pub mod artifact;
pub mod features;
pub mod labels;
pub mod scorer;
pub mod trainer;

pub use artifact::{ExplainerArtifact, ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use features::{safe_div, FeatureEngine, EPS};
pub use labels::{synthesize_label, SCORE_MAX, SCORE_MIN};
pub use scorer::Scorer;
pub use trainer::ModelTrainer;
