// Convolution front-end
pub const CONV_FILTERS: usize = 64;
pub const CONV_KERNEL_SIZE: usize = 6;

// Recurrent stack
pub const LSTM_1_UNITS: usize = 72; // Returns the full sequence
pub const LSTM_2_UNITS: usize = 48; // Returns only the final state

// Dense head
pub const OUTPUT_UNITS: usize = 1;

// Training parameters
pub const BATCH_SIZE: usize = 32;
pub const DEFAULT_EPOCHS: usize = 50;
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;
pub const DEFAULT_N_LAYERS: usize = 2;
pub const HUBER_DELTA: f64 = 1.0;

// Adam moments
pub const ADAM_BETA_1: f32 = 0.9;
pub const ADAM_BETA_2: f32 = 0.999;
pub const ADAM_EPSILON: f32 = 1e-7;

// Model paths
pub const MODEL_PATH: &str = "models";
pub const MODEL_FILE_NAME: &str = "cnn_lstm_model";
pub const EXPERIMENT_PATH: &str = "experiments";
