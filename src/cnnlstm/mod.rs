/// # CNN-LSTM Forecasting Module
///
/// This module trains a hybrid convolutional/recurrent network that predicts the
/// next value of a series from a fixed-size window of past observations.
///
/// ## Module Structure:
///
/// 1. **step_1_tensor_preparation**: Min-max normalization, sliding windows and tensor building
/// 2. **step_2_lstm_cell**: LSTM layer with ReLU cell activation and hard-sigmoid gates
/// 3. **step_3_cnn_lstm_model_arch**: Conv1d -> LSTM(72) -> LSTM(48) -> Linear stack and Huber loss
/// 4. **step_4_train_model**: Training loop with per-epoch observers
/// 5. **step_5_prediction**: Prediction with the stored normalization bundle
/// 6. **step_6_model_serialization**: Model, metadata and normalization persistence
///
/// The normalization bundle computed during training travels with the model;
/// prediction never rescales new data by its own min/max.
///
pub mod step_1_tensor_preparation;
pub mod step_2_lstm_cell;
pub mod step_3_cnn_lstm_model_arch;
pub mod step_4_train_model;
pub mod step_5_prediction;
pub mod step_6_model_serialization;
