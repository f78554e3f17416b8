pub mod classifier;
pub mod features;
pub mod service;
pub mod training;

pub use classifier::{LogisticRegression, ModelArtifact, TrainConfig};
pub use features::{Encoding, FeatureMatrix, RowView, Selection};
pub use service::{ModelSource, Prediction, WinrateModelService};
pub use training::{train, TrainingOptions, TrainingReport};
