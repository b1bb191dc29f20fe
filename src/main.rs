// External crates
use anyhow::Result;
use burn::module::AutodiffModule;
use log::info;
use std::time::Instant;

// Local modules
use cnnlstm_forecast::cnnlstm::step_1_tensor_preparation::sliding_windows;
use cnnlstm_forecast::cnnlstm::step_6_model_serialization::{get_model_path, save_trained_forecaster};
use cnnlstm_forecast::constants::MODEL_FILE_NAME;
use cnnlstm_forecast::util::model_logger::{create_experiment_dir, TrainingReport};
use cnnlstm_forecast::{
    evaluate_model, predict_next, train_model, DefaultAutodiffBackend, DefaultBackend, EpochLogs,
    TrainingConfig,
};

const WINDOW_SIZE: usize = 10;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Synthetic linear series: predict the next integer
    let series: Vec<f32> = (1..=100).map(|v| v as f32).collect();
    let (features, labels) = sliding_windows(&series, WINDOW_SIZE)?;
    info!("Built {} windows of size {}", features.nrows(), WINDOW_SIZE);

    let config = TrainingConfig::new(WINDOW_SIZE, 60, 0.01).with_seed(42);
    let device = Default::default();

    let started = Instant::now();
    let trained = train_model::<DefaultAutodiffBackend, _>(
        features.view(),
        labels.view(),
        &config,
        |epoch: usize, logs: &EpochLogs| {
            if (epoch + 1) % 10 == 0 {
                info!("Epoch {}/{} - loss {:.6}", epoch + 1, config.epochs, logs.loss);
            }
        },
        &device,
    )?;
    let elapsed = started.elapsed().as_secs_f64();

    // Inference runs on the plain backend
    let model = trained.model.valid();
    let rmse = evaluate_model::<DefaultBackend>(
        features.view(),
        labels.view(),
        &model,
        &trained.normalization,
        &device,
    )?;
    info!("Training-set RMSE: {:.4}", rmse);

    let last_window = &series[series.len() - WINDOW_SIZE..];
    let next = predict_next::<DefaultBackend>(last_window, &model, &trained.normalization, &device)?;
    info!("Next value after {:?}: {:.3}", last_window, next);

    let model_path = get_model_path(MODEL_FILE_NAME);
    save_trained_forecaster(&trained, &config, &model_path)?;

    let mut report = TrainingReport::new("linear_series", &config);
    report.set_history(&trained.history);
    report.set_normalization(trained.normalization);
    report.set_eval_rmse(rmse);
    report.set_training_time(elapsed);
    report.add_note(&format!("Next value prediction: {:.3}", next));
    let report_path = report.save(&create_experiment_dir()?)?;
    info!("Report written to {}", report_path.display());

    Ok(())
}
