use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cnnlstm::step_1_tensor_preparation::NormalizationBundle;
use crate::cnnlstm::step_4_train_model::{TrainingConfig, TrainingHistory};
use crate::constants::EXPERIMENT_PATH;

/// JSON record of a single training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub timestamp: String,
    pub name: String,
    pub window_size: usize,
    pub n_layers: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub seed: Option<u64>,
    pub final_loss: Option<f64>,
    pub loss_history: Vec<f64>,
    pub normalization: Option<NormalizationBundle>,
    pub eval_rmse: Option<f64>,
    pub training_time_seconds: Option<f64>,
    pub notes: String,
}

impl TrainingReport {
    pub fn new(name: &str, config: &TrainingConfig) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            name: name.to_string(),
            window_size: config.window_size,
            n_layers: config.n_layers,
            epochs: config.epochs,
            batch_size: config.batch_size,
            learning_rate: config.learning_rate,
            seed: config.seed,
            final_loss: None,
            loss_history: Vec::new(),
            normalization: None,
            eval_rmse: None,
            training_time_seconds: None,
            notes: String::new(),
        }
    }

    pub fn set_history(&mut self, history: &TrainingHistory) {
        self.loss_history = history.loss.clone();
        self.final_loss = history.final_loss();
    }

    pub fn set_normalization(&mut self, normalization: NormalizationBundle) {
        self.normalization = Some(normalization);
    }

    pub fn set_eval_rmse(&mut self, rmse: f64) {
        self.eval_rmse = Some(rmse);
    }

    pub fn set_training_time(&mut self, seconds: f64) {
        self.training_time_seconds = Some(seconds);
    }

    pub fn add_note(&mut self, note: &str) {
        if !self.notes.is_empty() {
            self.notes.push('\n');
        }
        self.notes.push_str(note);
    }

    /// Write the report as pretty JSON into `report_dir`
    pub fn save(&self, report_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(report_dir).context("Failed to create report directory")?;

        let filename = format!(
            "{}_w{}_e{}_lr{}_report.json",
            self.name, self.window_size, self.epochs, self.learning_rate
        );
        let file_path = report_dir.join(filename);

        let json = serde_json::to_string_pretty(&self).context("Failed to serialize report")?;
        fs::write(&file_path, json).context("Failed to write report")?;

        Ok(file_path)
    }
}

/// Timestamped directory under `EXPERIMENT_PATH` for this run's reports
pub fn create_experiment_dir() -> Result<PathBuf> {
    let dir = Path::new(EXPERIMENT_PATH).join(Local::now().format("%Y%m%d_%H%M%S").to_string());
    fs::create_dir_all(&dir).context("Failed to create experiment directory")?;
    Ok(dir)
}
