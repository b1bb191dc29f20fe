pub mod cnnlstm;
pub mod constants;
pub mod error;
#[cfg(test)]
pub mod test;
pub mod util {
    pub mod model_logger;
}

/// Package and compiler versions captured at build time
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub use cnnlstm::step_1_tensor_preparation::{NormParams, NormalizationBundle};
pub use cnnlstm::step_3_cnn_lstm_model_arch::CnnLstmForecaster;
pub use cnnlstm::step_4_train_model::{
    train_model, ChannelObserver, EpochEvent, EpochLogs, EpochObserver, TrainedForecaster,
    TrainingConfig, TrainingHistory,
};
pub use cnnlstm::step_5_prediction::{evaluate_model, predict, predict_next};
pub use error::ForecastError;

/// CPU backend used by the binary and the tests
pub type DefaultBackend = burn_ndarray::NdArray<f32>;
/// Training counterpart of `DefaultBackend`
pub type DefaultAutodiffBackend = burn_autodiff::Autodiff<DefaultBackend>;
