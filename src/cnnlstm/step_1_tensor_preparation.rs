// External imports
use burn::tensor::cast::ToElement;
use burn::tensor::{backend::Backend, Tensor, TensorData};
use log::warn;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

// Internal imports
use crate::constants::CONV_KERNEL_SIZE;
use crate::error::ForecastError;

/// Min-max scaling parameters of a single tensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormParams {
    pub max: f32,
    pub min: f32,
}

impl NormParams {
    pub fn new(max: f32, min: f32) -> Self {
        Self { max, min }
    }

    /// Width of the scaled interval. Zero for a constant tensor.
    pub fn range(&self) -> f32 {
        self.max - self.min
    }

    pub fn is_degenerate(&self) -> bool {
        self.range() == 0.0
    }
}

/// Input and label scaling captured at training time.
///
/// Every prediction must reuse these exact values; scaling new data by its own
/// min/max would silently shift the model's view of the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationBundle {
    pub input: NormParams,
    pub label: NormParams,
}

impl NormalizationBundle {
    pub fn new(input: NormParams, label: NormParams) -> Self {
        Self { input, label }
    }
}

/// Scale a tensor into [0, 1] using its own global max and min.
///
/// The max/min are taken over every element, not per feature. A constant
/// tensor (max == min) yields NaN values; that case is logged and left as is.
pub fn fit_normalize<B: Backend, const D: usize>(
    tensor: Tensor<B, D>,
) -> (Tensor<B, D>, NormParams) {
    let max = tensor.clone().max().into_scalar().to_f32();
    let min = tensor.clone().min().into_scalar().to_f32();
    let params = NormParams::new(max, min);

    if params.is_degenerate() {
        warn!(
            "Normalizing a constant tensor (max == min == {}); output will be NaN",
            max
        );
    }

    (apply_normalize(tensor, &params), params)
}

/// Scale a tensor with externally supplied parameters: (x - min) / (max - min)
pub fn apply_normalize<B: Backend, const D: usize>(
    tensor: Tensor<B, D>,
    params: &NormParams,
) -> Tensor<B, D> {
    tensor.sub_scalar(params.min).div_scalar(params.range())
}

/// Inverse of `apply_normalize`: x * (max - min) + min
pub fn denormalize<B: Backend, const D: usize>(
    tensor: Tensor<B, D>,
    params: &NormParams,
) -> Tensor<B, D> {
    tensor.mul_scalar(params.range()).add_scalar(params.min)
}

/// Build next-value training pairs from a raw series.
///
/// Row `i` holds `series[i..i + window_size]` and its label is
/// `series[i + window_size]`. Windows shorter than the convolution kernel
/// are rejected, as the model would reject them.
pub fn sliding_windows(
    series: &[f32],
    window_size: usize,
) -> Result<(Array2<f32>, Array1<f32>), ForecastError> {
    validate_window_size(window_size)?;
    if series.len() <= window_size {
        return Err(ForecastError::SeriesTooShort {
            len: series.len(),
            window_size,
        });
    }

    let rows = series.len() - window_size;
    let features = Array2::from_shape_fn((rows, window_size), |(i, j)| series[i + j]);
    let labels = Array1::from_iter(series[window_size..].iter().copied());

    Ok((features, labels))
}

/// Pack row-oriented windows into a matrix, rejecting ragged input
pub fn features_from_rows(rows: &[Vec<f32>]) -> Result<Array2<f32>, ForecastError> {
    let first = rows.first().ok_or(ForecastError::EmptyInput)?;
    let width = first.len();

    for (row, values) in rows.iter().enumerate() {
        if values.len() != width {
            return Err(ForecastError::RaggedRow {
                row,
                expected: width,
                actual: values.len(),
            });
        }
    }

    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), width), flat).map_err(|e| {
        ForecastError::TensorData(format!("Failed to build feature matrix: {}", e))
    })
}

/// Reject windows the convolution kernel cannot slide over
pub fn validate_window_size(window_size: usize) -> Result<(), ForecastError> {
    if window_size < CONV_KERNEL_SIZE {
        return Err(ForecastError::WindowTooShort {
            window_size,
            kernel_size: CONV_KERNEL_SIZE,
        });
    }
    Ok(())
}

/// Check a feature matrix against the expected window size
pub fn validate_features(
    features: &ArrayView2<f32>,
    window_size: usize,
) -> Result<(), ForecastError> {
    validate_window_size(window_size)?;

    let (rows, width) = features.dim();
    if rows == 0 {
        return Err(ForecastError::EmptyInput);
    }
    if width != window_size {
        return Err(ForecastError::WindowSizeMismatch {
            expected: window_size,
            actual: width,
        });
    }
    Ok(())
}

/// Check a feature matrix and its labels before training
pub fn validate_training_data(
    features: &ArrayView2<f32>,
    labels: &ArrayView1<f32>,
    window_size: usize,
) -> Result<(), ForecastError> {
    validate_features(features, window_size)?;

    if labels.len() != features.nrows() {
        return Err(ForecastError::LabelCountMismatch {
            features: features.nrows(),
            labels: labels.len(),
        });
    }
    Ok(())
}

/// Convert a `[rows, window]` matrix into a `[rows, window, 1]` tensor
pub fn features_to_tensor<B: Backend>(
    features: &ArrayView2<f32>,
    device: &B::Device,
) -> Tensor<B, 3> {
    let (rows, window) = features.dim();
    let values: Vec<f32> = features.iter().copied().collect();
    Tensor::from_data(TensorData::new(values, [rows, window, 1]), device)
}

/// Convert labels into a `[rows, 1]` tensor
pub fn labels_to_tensor<B: Backend>(labels: &ArrayView1<f32>, device: &B::Device) -> Tensor<B, 2> {
    let values: Vec<f32> = labels.iter().copied().collect();
    let rows = values.len();
    Tensor::from_data(TensorData::new(values, [rows, 1]), device)
}

/// Read every element of a tensor back to the host
pub fn tensor_to_vec<B: Backend, const D: usize>(
    tensor: Tensor<B, D>,
) -> Result<Vec<f32>, ForecastError> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| ForecastError::TensorData(format!("{:?}", e)))
}
