/// End-to-end tests for the CNN-LSTM pipeline
///
/// * Training on a linear series and predicting the next value
/// * Constant labels producing NaN losses (unhandled degenerate scaling)
/// * Row-oriented input through `features_from_rows`
/// * Prediction through a saved and reloaded model bundle
pub mod test_cnn_lstm;
