// External imports
use anyhow::Result;
use burn::tensor::backend::Backend;
use log::debug;
use ndarray::{ArrayView1, ArrayView2};

// Internal imports
use super::step_1_tensor_preparation::{
    apply_normalize, denormalize, features_to_tensor, tensor_to_vec, validate_features,
    NormalizationBundle,
};
use super::step_3_cnn_lstm_model_arch::CnnLstmForecaster;
use crate::error::ForecastError;

/// Predict one value per feature window.
///
/// Inputs are scaled with the training-time input max/min and the raw model
/// output is mapped back with the training-time label max/min. Nothing is
/// recomputed from `features`.
pub fn predict<B: Backend>(
    features: ArrayView2<f32>,
    model: &CnnLstmForecaster<B>,
    normalization: &NormalizationBundle,
    device: &B::Device,
) -> Result<Vec<f32>> {
    validate_features(&features, model.window_size())?;

    let inputs = apply_normalize(
        features_to_tensor::<B>(&features, device),
        &normalization.input,
    );
    let outputs = denormalize(model.forward(inputs), &normalization.label);

    let predictions = tensor_to_vec(outputs)?;
    debug!("Generated {} predictions", predictions.len());

    Ok(predictions)
}

/// Predict the value that follows a single window
pub fn predict_next<B: Backend>(
    window: &[f32],
    model: &CnnLstmForecaster<B>,
    normalization: &NormalizationBundle,
    device: &B::Device,
) -> Result<f32> {
    let features = ArrayView2::from_shape((1, window.len()), window).map_err(|_| {
        ForecastError::WindowSizeMismatch {
            expected: model.window_size(),
            actual: window.len(),
        }
    })?;

    let predictions = predict(features, model, normalization, device)?;
    predictions
        .first()
        .copied()
        .ok_or_else(|| ForecastError::EmptyInput.into())
}

/// Root mean squared error of the predictions, in original label units
pub fn evaluate_model<B: Backend>(
    features: ArrayView2<f32>,
    labels: ArrayView1<f32>,
    model: &CnnLstmForecaster<B>,
    normalization: &NormalizationBundle,
    device: &B::Device,
) -> Result<f64> {
    if labels.len() != features.nrows() {
        return Err(ForecastError::LabelCountMismatch {
            features: features.nrows(),
            labels: labels.len(),
        }
        .into());
    }

    let predictions = predict(features, model, normalization, device)?;
    let mse = predictions
        .iter()
        .zip(labels.iter())
        .map(|(p, y)| {
            let diff = (*p - *y) as f64;
            diff * diff
        })
        .sum::<f64>()
        / predictions.len() as f64;

    Ok(mse.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnnlstm::step_1_tensor_preparation::{sliding_windows, NormParams};
    use crate::test::backend_rng_guard;
    use burn_ndarray::{NdArray, NdArrayDevice};
    use ndarray::Array2;

    type TestBackend = NdArray<f32>;

    fn untrained(window_size: usize) -> CnnLstmForecaster<TestBackend> {
        CnnLstmForecaster::new(window_size, 2, &NdArrayDevice::Cpu).unwrap()
    }

    fn bundle() -> NormalizationBundle {
        NormalizationBundle::new(NormParams::new(100.0, 0.0), NormParams::new(100.0, 0.0))
    }

    #[test]
    fn test_predict_returns_one_value_per_row() {
        let _guard = backend_rng_guard();
        let device = NdArrayDevice::Cpu;
        let model = untrained(10);
        let series: Vec<f32> = (0..30).map(|v| v as f32).collect();
        let (features, _) = sliding_windows(&series, 10).unwrap();

        let predictions = predict(features.view(), &model, &bundle(), &device).unwrap();
        assert_eq!(predictions.len(), features.nrows());
        assert!(predictions.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_predict_is_batch_independent() {
        let _guard = backend_rng_guard();
        let device = NdArrayDevice::Cpu;
        let model = untrained(10);
        let series: Vec<f32> = (0..25).map(|v| (v as f32 * 0.3).sin() * 50.0 + 50.0).collect();
        let (features, _) = sliding_windows(&series, 10).unwrap();

        let batch = predict(features.view(), &model, &bundle(), &device).unwrap();
        let single = predict_next(&series[3..13], &model, &bundle(), &device).unwrap();

        assert!((batch[3] - single).abs() < 1e-4);
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let _guard = backend_rng_guard();
        let device = NdArrayDevice::Cpu;
        let model = untrained(10);
        let features = Array2::<f32>::zeros((3, 9));

        let err = predict(features.view(), &model, &bundle(), &device).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ForecastError>(),
            Some(&ForecastError::WindowSizeMismatch {
                expected: 10,
                actual: 9
            })
        );
    }

    #[test]
    fn test_evaluate_model_label_mismatch() {
        let _guard = backend_rng_guard();
        let device = NdArrayDevice::Cpu;
        let model = untrained(10);
        let features = Array2::<f32>::zeros((3, 10));
        let labels = ndarray::array![1.0, 2.0];

        let err = evaluate_model(features.view(), labels.view(), &model, &bundle(), &device)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ForecastError>(),
            Some(ForecastError::LabelCountMismatch { .. })
        ));
    }
}
