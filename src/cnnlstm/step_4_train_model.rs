// External imports
use anyhow::{Context, Result};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::cast::ToElement;
use burn::tensor::{backend::Backend, Int, Tensor, TensorData};
use log::{debug, info};
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::mpsc::Sender;

// Internal imports
use super::step_1_tensor_preparation::{
    features_to_tensor, fit_normalize, labels_to_tensor, validate_training_data,
    NormalizationBundle,
};
use super::step_3_cnn_lstm_model_arch::CnnLstmForecaster;
use crate::constants::{
    ADAM_BETA_1, ADAM_BETA_2, ADAM_EPSILON, BATCH_SIZE, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE,
    DEFAULT_N_LAYERS,
};
use crate::error::ForecastError;

/// Configuration for training the CNN-LSTM model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub window_size: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    /// Accepted and recorded, but the recurrent depth is fixed at two
    pub n_layers: usize,
    pub batch_size: usize,
    pub shuffle: bool,
    /// Seeds weight initialization and the per-epoch shuffle
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            epochs: DEFAULT_EPOCHS,
            learning_rate: DEFAULT_LEARNING_RATE,
            n_layers: DEFAULT_N_LAYERS,
            batch_size: BATCH_SIZE,
            shuffle: true,
            seed: None,
        }
    }
}

impl TrainingConfig {
    pub fn new(window_size: usize, epochs: usize, learning_rate: f64) -> Self {
        Self {
            window_size,
            epochs,
            learning_rate,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Load a configuration from JSON; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config {}", path.as_ref().display()))?;
        serde_json::from_str(&json).context("Failed to parse training config")
    }
}

/// Metrics reported at the end of an epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochLogs {
    /// Huber loss averaged over every training example
    pub loss: f64,
    pub batches: usize,
}

/// One epoch notification, as sent over a channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochEvent {
    pub epoch: usize,
    pub logs: EpochLogs,
}

/// Receives progress once per completed epoch
pub trait EpochObserver {
    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs);
}

impl<F> EpochObserver for F
where
    F: FnMut(usize, &EpochLogs),
{
    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs) {
        self(epoch, logs)
    }
}

/// Forwards epoch events to an mpsc channel
pub struct ChannelObserver {
    sender: Sender<EpochEvent>,
}

impl ChannelObserver {
    pub fn new(sender: Sender<EpochEvent>) -> Self {
        Self { sender }
    }
}

impl EpochObserver for ChannelObserver {
    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs) {
        let event = EpochEvent { epoch, logs: *logs };
        if self.sender.send(event).is_err() {
            debug!("Epoch {} event dropped: receiver is gone", epoch);
        }
    }
}

/// Per-epoch loss recorded during training
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epoch: Vec<usize>,
    pub loss: Vec<f64>,
}

impl TrainingHistory {
    fn record(&mut self, epoch: usize, loss: f64) {
        self.epoch.push(epoch);
        self.loss.push(loss);
    }

    pub fn len(&self) -> usize {
        self.loss.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loss.is_empty()
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.loss.last().copied()
    }
}

/// Everything a prediction call needs, produced by one training run
#[derive(Debug, Clone)]
pub struct TrainedForecaster<B: Backend> {
    pub model: CnnLstmForecaster<B>,
    pub history: TrainingHistory,
    pub normalization: NormalizationBundle,
}

/// Train the CNN-LSTM model.
///
/// Inputs and labels are each min-max scaled with their own global max/min;
/// those four scalars come back in `normalization` and must accompany the
/// model to every prediction.
pub fn train_model<B, O>(
    features: ArrayView2<f32>,
    labels: ArrayView1<f32>,
    config: &TrainingConfig,
    mut observer: O,
    device: &B::Device,
) -> Result<TrainedForecaster<B>>
where
    B: AutodiffBackend,
    O: EpochObserver,
{
    validate_training_data(&features, &labels, config.window_size)?;

    info!(
        "Starting CNN-LSTM training: {} windows of size {}, {} epochs, lr={}",
        features.nrows(),
        config.window_size,
        config.epochs,
        config.learning_rate
    );

    if let Some(seed) = config.seed {
        B::seed(seed);
    }

    let (xs, input_params) = fit_normalize(features_to_tensor::<B>(&features, device));
    let (ys, label_params) = fit_normalize(labels_to_tensor::<B>(&labels, device));
    let normalization = NormalizationBundle::new(input_params, label_params);
    debug!("Normalization bundle: {:?}", normalization);

    let model = CnnLstmForecaster::<B>::new(config.window_size, config.n_layers, device)?;
    let (model, history) = fit_model(model, xs, ys, config, &mut observer, device)?;

    if let Some(loss) = history.final_loss() {
        info!("Training completed. Final loss: {:.6}", loss);
    }

    Ok(TrainedForecaster {
        model,
        history,
        normalization,
    })
}

/// Run the epoch loop on already-normalized tensors
pub fn fit_model<B, O>(
    mut model: CnnLstmForecaster<B>,
    xs: Tensor<B, 3>,
    ys: Tensor<B, 2>,
    config: &TrainingConfig,
    observer: &mut O,
    device: &B::Device,
) -> Result<(CnnLstmForecaster<B>, TrainingHistory), ForecastError>
where
    B: AutodiffBackend,
    O: EpochObserver,
{
    let batch_size = config.batch_size;
    if batch_size == 0 {
        return Err(ForecastError::InvalidBatchSize(batch_size));
    }
    let num_samples = xs.dims()[0];

    let mut optimizer = AdamConfig::new()
        .with_beta_1(ADAM_BETA_1)
        .with_beta_2(ADAM_BETA_2)
        .with_epsilon(ADAM_EPSILON)
        .init();

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut order: Vec<i64> = (0..num_samples as i64).collect();
    let mut history = TrainingHistory::default();

    for epoch in 0..config.epochs {
        if config.shuffle {
            order.shuffle(&mut rng);
        }

        let mut loss_sum = 0.0;
        let mut batches = 0;
        for chunk in order.chunks(batch_size) {
            let indices =
                Tensor::<B, 1, Int>::from_data(TensorData::new(chunk.to_vec(), [chunk.len()]), device);
            let batch_features = xs.clone().select(0, indices.clone());
            let batch_targets = ys.clone().select(0, indices);

            // Forward pass
            let predictions = model.forward(batch_features);
            let loss_tensor = model.loss(predictions, batch_targets);
            loss_sum += loss_tensor.clone().into_scalar().to_f64() * chunk.len() as f64;

            // Backward pass and optimizer step
            let grads = loss_tensor.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);
            batches += 1;
        }

        let logs = EpochLogs {
            loss: loss_sum / num_samples as f64,
            batches,
        };
        debug!("Epoch {}/{} - Loss: {:.6}", epoch + 1, config.epochs, logs.loss);

        history.record(epoch, logs.loss);
        observer.on_epoch_end(epoch, &logs);
    }

    Ok((model, history))
}
