// External imports
use anyhow::{Context, Result};
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

// Internal imports
use super::step_1_tensor_preparation::NormalizationBundle;
use super::step_3_cnn_lstm_model_arch::CnnLstmForecaster;
use super::step_4_train_model::{TrainedForecaster, TrainingConfig, TrainingHistory};
use crate::built_info;
use crate::constants::MODEL_PATH;
use crate::error::ForecastError;

/// Everything besides the weights needed to rebuild and use a saved model
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelMetadata {
    pub version: String,
    pub rustc_version: String,
    pub timestamp: u64,
    pub window_size: usize,
    pub n_layers: usize,
    pub normalization: NormalizationBundle,
    pub training: TrainingConfig,
    #[serde(default)]
    pub history: TrainingHistory,
}

impl ModelMetadata {
    /// Describe `model`; the architecture fields come from the model itself
    /// and `config` is kept only as a record of the training run
    pub fn new<B: Backend>(
        model: &CnnLstmForecaster<B>,
        config: &TrainingConfig,
        normalization: NormalizationBundle,
    ) -> Self {
        Self {
            version: built_info::PKG_VERSION.to_string(),
            rustc_version: built_info::RUSTC_VERSION.to_string(),
            timestamp: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            window_size: model.window_size(),
            n_layers: model.n_layers(),
            normalization,
            training: config.clone(),
            history: TrainingHistory::default(),
        }
    }

    pub fn with_history(mut self, history: TrainingHistory) -> Self {
        self.history = history;
        self
    }

    /// Reject metadata that would rebuild a different architecture than `model`
    pub fn check_model<B: Backend>(
        &self,
        model: &CnnLstmForecaster<B>,
    ) -> Result<(), ForecastError> {
        let fields = [
            ("window_size", self.window_size, model.window_size()),
            ("n_layers", self.n_layers, model.n_layers()),
        ];
        for (field, metadata, built) in fields {
            if metadata != built {
                return Err(ForecastError::ConfigMismatch {
                    field,
                    metadata,
                    model: built,
                });
            }
        }
        Ok(())
    }
}

/// Default location for a named model under `MODEL_PATH`
pub fn get_model_path(model_name: &str) -> PathBuf {
    Path::new(MODEL_PATH).join(model_name)
}

/// Save the model to `<path>.bin` and its metadata to `<path>.meta.json`
pub fn save_model_with_metadata<B: Backend>(
    model: &CnnLstmForecaster<B>,
    metadata: &ModelMetadata,
    path: impl AsRef<Path>,
) -> Result<()> {
    metadata.check_model(model)?;

    // Ensure parent directory exists
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).context("Failed to create model parent directory")?;
    }

    let model_path = path.as_ref().with_extension("bin");
    model
        .clone()
        .save_file::<BinFileRecorder<FullPrecisionSettings>, _>(
            model_path.clone(),
            &Default::default(),
        )
        .context("Failed to save model")?;

    let metadata_path = path.as_ref().with_extension("meta.json");
    let metadata_json =
        serde_json::to_string_pretty(metadata).context("Failed to serialize metadata")?;
    std::fs::write(&metadata_path, metadata_json).context("Failed to write metadata file")?;

    info!("Model saved to: {}", model_path.display());
    Ok(())
}

/// Read only the metadata of a saved model
pub fn load_metadata(path: impl AsRef<Path>) -> Result<ModelMetadata> {
    let metadata_path = path.as_ref().with_extension("meta.json");
    let metadata_json =
        std::fs::read_to_string(&metadata_path).context("Failed to read metadata file")?;
    serde_json::from_str(&metadata_json).context("Failed to parse metadata")
}

/// Load the model and its metadata; the architecture is rebuilt from the metadata
pub fn load_model_with_metadata<B: Backend>(
    path: impl AsRef<Path>,
    device: &B::Device,
) -> Result<(CnnLstmForecaster<B>, ModelMetadata)> {
    let metadata = load_metadata(path.as_ref())?;

    let model_path = path.as_ref().with_extension("bin");
    let base_model = CnnLstmForecaster::<B>::new(metadata.window_size, metadata.n_layers, device)?;
    let model = base_model
        .load_file::<BinFileRecorder<FullPrecisionSettings>, _>(
            model_path.clone(),
            &Default::default(),
            device,
        )
        .context("Failed to load model")?;

    info!("Model loaded from: {}", model_path.display());
    Ok((model, metadata))
}

/// Persist a training result together with the config that produced it
pub fn save_trained_forecaster<B: Backend>(
    trained: &TrainedForecaster<B>,
    config: &TrainingConfig,
    path: impl AsRef<Path>,
) -> Result<ModelMetadata> {
    let metadata = ModelMetadata::new(&trained.model, config, trained.normalization)
        .with_history(trained.history.clone());
    save_model_with_metadata(&trained.model, &metadata, path)?;
    Ok(metadata)
}

/// Restore the model, history and normalization bundle written by `save_trained_forecaster`
pub fn load_trained_forecaster<B: Backend>(
    path: impl AsRef<Path>,
    device: &B::Device,
) -> Result<TrainedForecaster<B>> {
    let (model, metadata) = load_model_with_metadata(path, device)?;
    Ok(TrainedForecaster {
        model,
        history: metadata.history,
        normalization: metadata.normalization,
    })
}

/// Check if a model file exists and its metadata is readable
pub fn verify_model(path: impl AsRef<Path>) -> Result<bool> {
    let model_path = path.as_ref().with_extension("bin");
    let metadata_path = path.as_ref().with_extension("meta.json");

    if !model_path.exists() || !metadata_path.exists() {
        return Ok(false);
    }

    load_metadata(path)?;
    Ok(true)
}
