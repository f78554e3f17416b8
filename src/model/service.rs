//! Prediction service wrapping a loaded (or placeholder) classifier.

use super::classifier::{LogisticRegression, ModelArtifact, TrainConfig};
use super::features::{Encoding, FeatureMatrix, Selection};
use crate::config::Config;
use crate::data::table::ChampionId;
use crate::error::AppError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

const PLACEHOLDER_SEED: u64 = 42;
const PLACEHOLDER_SAMPLES: usize = 200;
const PLACEHOLDER_MAX_ID: u32 = 200;

/// Where the answering model came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    /// Fitted on match history and loaded from disk.
    Trained,
    /// Fitted on random data; its output carries no information.
    Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub winrate: f64,
    pub source: ModelSource,
}

impl Prediction {
    pub fn is_placeholder(&self) -> bool {
        self.source == ModelSource::Placeholder
    }
}

/// Immutable after construction; safe to share across threads.
#[derive(Debug, Clone)]
pub struct WinrateModelService {
    artifact: ModelArtifact,
    source: ModelSource,
}

impl WinrateModelService {
    /// Reads the model at `config.model_path`. When the file does not exist
    /// a placeholder is fitted instead, unless the config forbids it.
    pub fn load(config: &Config) -> Result<Self, AppError> {
        let path = &config.model_path;

        if path.exists() {
            let artifact = ModelArtifact::load(path)?;
            tracing::info!(
                "Loaded {} model ({} samples) from {}",
                artifact.encoding.name(),
                artifact.samples,
                path.display()
            );
            return Self::from_artifact(artifact, ModelSource::Trained);
        }

        if !config.allow_placeholder_model {
            return Err(AppError::ModelUnavailable(format!(
                "no model at {} and placeholder models are disabled",
                path.display()
            )));
        }

        tracing::warn!(
            "No model at {}, falling back to a placeholder trained on random data",
            path.display()
        );
        Self::placeholder()
    }

    pub fn from_artifact(artifact: ModelArtifact, source: ModelSource) -> Result<Self, AppError> {
        artifact.validate()?;
        Ok(WinrateModelService { artifact, source })
    }

    /// A padded-encoding model fitted on random ids and random outcomes.
    pub fn placeholder() -> Result<Self, AppError> {
        let encoding = Encoding::Padded;
        let mut rng = StdRng::seed_from_u64(PLACEHOLDER_SEED);

        let mut features = FeatureMatrix::with_capacity(encoding.len(), PLACEHOLDER_SAMPLES);
        let mut labels = Vec::with_capacity(PLACEHOLDER_SAMPLES);
        let mut row = vec![0.0; encoding.len()];
        for _ in 0..PLACEHOLDER_SAMPLES {
            for cell in row.iter_mut() {
                *cell = rng.gen_range(0..PLACEHOLDER_MAX_ID) as f64;
            }
            features.push_row(&row);
            labels.push(if rng.gen_bool(0.5) { 1.0 } else { 0.0 });
        }

        let model = LogisticRegression::fit(&features, &labels, &TrainConfig::default())
            .map_err(|e| AppError::ModelUnavailable(format!("placeholder fit failed: {}", e)))?;
        let artifact = ModelArtifact::new(encoding, model, PLACEHOLDER_SAMPLES);
        Self::from_artifact(artifact, ModelSource::Placeholder)
    }

    pub fn source(&self) -> ModelSource {
        self.source
    }

    pub fn encoding(&self) -> Encoding {
        self.artifact.encoding
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn predict(&self, selection: &Selection) -> Prediction {
        let features = self.artifact.encoding.encode(selection);
        Prediction {
            winrate: self.artifact.model.predict_proba(&features),
            source: self.source,
        }
    }

    /// Validates the rosters, then predicts.
    pub fn predict_winrate(
        &self,
        team: Vec<ChampionId>,
        enemy: Vec<ChampionId>,
    ) -> Result<Prediction, AppError> {
        let selection = Selection::new(team, enemy)?;
        Ok(self.predict(&selection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_model(path: std::path::PathBuf, allow_placeholder: bool) -> Config {
        Config {
            model_path: path,
            allow_placeholder_model: allow_placeholder,
            ..Config::default()
        }
    }

    #[test]
    fn test_placeholder_prediction_in_range_and_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_model(dir.path().join("missing.json"), true);
        let service = WinrateModelService::load(&config).unwrap();

        let prediction = service
            .predict_winrate(vec![1, 2, 3, 4, 5], vec![6, 7, 8, 9, 10])
            .unwrap();
        assert!((0.0..=1.0).contains(&prediction.winrate));
        assert!(prediction.is_placeholder());
    }

    #[test]
    fn test_missing_model_without_placeholder_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_model(dir.path().join("missing.json"), false);
        assert!(matches!(
            WinrateModelService::load(&config),
            Err(AppError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_loaded_model_is_tagged_trained() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        WinrateModelService::placeholder()
            .unwrap()
            .artifact()
            .save(&path)
            .unwrap();

        let service = WinrateModelService::load(&config_with_model(path, false)).unwrap();
        assert_eq!(service.source(), ModelSource::Trained);
        assert_eq!(service.encoding(), Encoding::Padded);
    }

    #[test]
    fn test_placeholder_is_deterministic() {
        let a = WinrateModelService::placeholder().unwrap();
        let b = WinrateModelService::placeholder().unwrap();
        let selection = Selection::new(vec![12, 40], vec![99]).unwrap();
        assert_eq!(a.predict(&selection).winrate, b.predict(&selection).winrate);
    }

    #[test]
    fn test_invalid_selection_is_rejected() {
        let service = WinrateModelService::placeholder().unwrap();
        assert!(matches!(
            service.predict_winrate(vec![], vec![1]),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_service_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WinrateModelService>();
    }
}
