// External imports
use anyhow::Result;
use burn::module::AutodiffModule;
use burn_ndarray::NdArrayDevice;
use ndarray::{Array1, Array2};
use tempfile::tempdir;

// Internal imports
use crate::cnnlstm::step_1_tensor_preparation::{features_from_rows, sliding_windows};
use crate::cnnlstm::step_4_train_model::{train_model, EpochLogs, TrainingConfig};
use crate::cnnlstm::step_5_prediction::{evaluate_model, predict};
use crate::cnnlstm::step_6_model_serialization::{load_trained_forecaster, save_trained_forecaster};
use crate::test::backend_rng_guard;
use crate::{DefaultAutodiffBackend, DefaultBackend, TrainedForecaster};

const WINDOW_SIZE: usize = 10;

fn linear_series() -> (Vec<f32>, Array2<f32>, Array1<f32>) {
    let series: Vec<f32> = (1..=100).map(|v| v as f32).collect();
    let (features, labels) = sliding_windows(&series, WINDOW_SIZE).unwrap();
    (series, features, labels)
}

fn train_linear(epochs: usize) -> Result<TrainedForecaster<DefaultAutodiffBackend>> {
    let (_, features, labels) = linear_series();
    let config = TrainingConfig::new(WINDOW_SIZE, epochs, 0.01).with_seed(42);

    train_model::<DefaultAutodiffBackend, _>(
        features.view(),
        labels.view(),
        &config,
        |_: usize, _: &EpochLogs| {},
        &NdArrayDevice::Cpu,
    )
}

#[test]
fn test_linear_series_next_value() -> Result<()> {
    let _guard = backend_rng_guard();
    let device = NdArrayDevice::Cpu;
    let (_, features, labels) = linear_series();

    let trained = train_linear(60)?;
    let model = trained.model.valid();

    let predictions = predict::<DefaultBackend>(features.view(), &model, &trained.normalization, &device)?;
    assert_eq!(predictions.len(), features.nrows());

    let mae = predictions
        .iter()
        .zip(labels.iter())
        .map(|(p, y)| (p - y).abs() as f64)
        .sum::<f64>()
        / predictions.len() as f64;
    assert!(mae < 15.0, "mean absolute error too large: {}", mae);

    let rmse = evaluate_model::<DefaultBackend>(
        features.view(),
        labels.view(),
        &model,
        &trained.normalization,
        &device,
    )?;
    assert!(rmse.is_finite());

    let first = trained.history.loss[0];
    let last = trained.history.final_loss().unwrap_or(f64::NAN);
    assert!(last < first, "loss did not decrease: {} -> {}", first, last);

    Ok(())
}

#[test]
fn test_constant_labels_give_nan_loss() -> Result<()> {
    let _guard = backend_rng_guard();
    let device = NdArrayDevice::Cpu;
    let (_, features, _) = linear_series();
    let labels = Array1::from_elem(features.nrows(), 5.0_f32);
    let config = TrainingConfig::new(WINDOW_SIZE, 2, 0.01).with_seed(1);

    let trained = train_model::<DefaultAutodiffBackend, _>(
        features.view(),
        labels.view(),
        &config,
        |_: usize, _: &EpochLogs| {},
        &device,
    )?;

    assert!(trained.normalization.label.is_degenerate());
    assert_eq!(trained.history.len(), 2);
    assert!(trained.history.loss.iter().all(|l| l.is_nan()));

    Ok(())
}

#[test]
fn test_row_input_trains() -> Result<()> {
    let _guard = backend_rng_guard();
    let device = NdArrayDevice::Cpu;
    let (series, _, _) = linear_series();
    let rows: Vec<Vec<f32>> = series
        .windows(WINDOW_SIZE + 1)
        .map(|w| w[..WINDOW_SIZE].to_vec())
        .collect();
    let labels: Array1<f32> = series[WINDOW_SIZE..].iter().copied().collect();

    let features = features_from_rows(&rows)?;
    let config = TrainingConfig::new(WINDOW_SIZE, 1, 0.01).with_seed(5);

    let mut epochs_seen = 0;
    let trained = train_model::<DefaultAutodiffBackend, _>(
        features.view(),
        labels.view(),
        &config,
        |_: usize, _: &EpochLogs| epochs_seen += 1,
        &device,
    )?;

    assert_eq!(epochs_seen, 1);
    assert_eq!(trained.history.len(), 1);
    assert_eq!(trained.normalization.input.max, 99.0);

    Ok(())
}

#[test]
fn test_reloaded_bundle_predicts_the_same() -> Result<()> {
    let _guard = backend_rng_guard();
    let device = NdArrayDevice::Cpu;
    let temp_dir = tempdir()?;
    let base_path = temp_dir.path().join("linear_model");
    let (_, features, _) = linear_series();

    let trained = train_linear(3)?;
    let config = TrainingConfig::new(WINDOW_SIZE, 3, 0.01).with_seed(42);
    save_trained_forecaster(&trained, &config, &base_path)?;

    let reloaded: TrainedForecaster<DefaultBackend> = load_trained_forecaster(&base_path, &device)?;
    assert_eq!(reloaded.normalization, trained.normalization);
    assert_eq!(reloaded.history, trained.history);

    let model = trained.model.valid();
    let before = predict::<DefaultBackend>(features.view(), &model, &trained.normalization, &device)?;
    let after = predict(features.view(), &reloaded.model, &reloaded.normalization, &device)?;
    for (a, b) in before.iter().zip(after.iter()) {
        assert!((a - b).abs() < 1e-4, "{} vs {}", a, b);
    }

    Ok(())
}
