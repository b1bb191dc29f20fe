use thiserror::Error;

/// Shape and data errors raised before any tensor work starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// No rows were supplied
    #[error("Empty input: at least one feature window is required")]
    EmptyInput,

    /// A row of a row-oriented feature matrix has the wrong length
    #[error("Ragged feature row {row}: expected {expected} values, got {actual}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Features and labels disagree on the number of examples
    #[error("Label count mismatch: {features} feature rows but {labels} labels")]
    LabelCountMismatch { features: usize, labels: usize },

    /// Feature windows are not as wide as the model expects
    #[error("Window size mismatch: expected {expected}, got {actual}")]
    WindowSizeMismatch { expected: usize, actual: usize },

    /// The convolution kernel does not fit inside the window
    #[error("Window size {window_size} is shorter than the convolution kernel ({kernel_size})")]
    WindowTooShort {
        window_size: usize,
        kernel_size: usize,
    },

    /// A raw series cannot produce one window plus its label
    #[error("Series of length {len} is too short for window size {window_size}")]
    SeriesTooShort { len: usize, window_size: usize },

    /// Mini-batches must hold at least one example
    #[error("Invalid batch size {0}: must be at least 1")]
    InvalidBatchSize(usize),

    /// Saved metadata describes a different architecture than the weights
    #[error("Metadata {field} is {metadata} but the model was built with {model}")]
    ConfigMismatch {
        field: &'static str,
        metadata: usize,
        model: usize,
    },

    /// Tensor data could not be read back from the backend
    #[error("Failed to read tensor data: {0}")]
    TensorData(String),
}
