// External imports
use burn::module::Module;
use burn::nn::conv::{Conv1d, Conv1dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig1d};
use burn::prelude::Backend;
use burn::tensor::Tensor;

// Internal imports
use super::step_1_tensor_preparation::validate_window_size;
use super::step_2_lstm_cell::{CellActivation, GateActivation, LSTM};
use crate::constants::{
    CONV_FILTERS, CONV_KERNEL_SIZE, HUBER_DELTA, LSTM_1_UNITS, LSTM_2_UNITS, OUTPUT_UNITS,
};
use crate::error::ForecastError;

/// CnnLstmForecaster architecture for single-value forecasting.
///
/// Layers, in order:
/// 1. Conv1d over the window (64 filters, kernel 6, valid padding, linear)
/// 2. LSTM with 72 ReLU units, returning the whole sequence
/// 3. LSTM with 48 ReLU units, returning the final state
/// 4. Linear head producing one value
#[derive(Module, Debug)]
pub struct CnnLstmForecaster<B: Backend> {
    window_size: usize,
    n_layers: usize,
    conv: Conv1d<B>,
    lstm_sequence: LSTM<B>,
    lstm_final: LSTM<B>,
    output: Linear<B>,
}

impl<B: Backend> CnnLstmForecaster<B> {
    /// Create a new CnnLstmForecaster.
    ///
    /// `n_layers` is recorded but does not change the stack; the recurrent
    /// depth is always two.
    pub fn new(
        window_size: usize,
        n_layers: usize,
        device: &B::Device,
    ) -> Result<Self, ForecastError> {
        validate_window_size(window_size)?;

        // [batch_size, 1, window_size] -> [batch_size, 64, window_size - 5]
        let conv = Conv1dConfig::new(1, CONV_FILTERS, CONV_KERNEL_SIZE)
            .with_padding(PaddingConfig1d::Valid)
            .with_stride(1)
            .init(device);

        let lstm_sequence = LSTM::new(
            CONV_FILTERS,
            LSTM_1_UNITS,
            CellActivation::Relu,
            GateActivation::HardSigmoid,
            device,
        );
        let lstm_final = LSTM::new(
            LSTM_1_UNITS,
            LSTM_2_UNITS,
            CellActivation::Relu,
            GateActivation::HardSigmoid,
            device,
        );

        let output = LinearConfig::new(LSTM_2_UNITS, OUTPUT_UNITS).init(device);

        Ok(Self {
            window_size,
            n_layers,
            conv,
            lstm_sequence,
            lstm_final,
            output,
        })
    }

    /// Getter for window_size
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Getter for n_layers
    pub fn n_layers(&self) -> usize {
        self.n_layers
    }

    /// Number of time steps the recurrent layers see after the convolution
    pub fn conv_output_len(&self) -> usize {
        self.window_size - CONV_KERNEL_SIZE + 1
    }

    /// Forward pass.
    /// Input shape: [batch_size, window_size, 1]
    /// Output shape: [batch_size, 1]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        // Conv1d wants [batch, channels, length]
        let conv_out = self.conv.forward(x.permute([0, 2, 1]));

        // Back to [batch, steps, features] for the recurrent stack
        let features = conv_out.permute([0, 2, 1]);

        let sequence = self.lstm_sequence.forward(features);
        let last_state = self.lstm_final.forward_last(sequence);

        self.output.forward(last_state)
    }

    /// Huber loss averaged over all elements.
    ///
    /// Quadratic below `delta`, linear above it:
    /// 0.5 * min(|e|, delta)^2 + delta * (|e| - min(|e|, delta))
    pub fn huber_loss(&self, pred: Tensor<B, 2>, target: Tensor<B, 2>, delta: f64) -> Tensor<B, 1> {
        let abs_error = (pred - target).abs();
        let quadratic = abs_error.clone().clamp_max(delta);
        let linear = abs_error - quadratic.clone();

        let loss = quadratic.clone() * quadratic * 0.5 + linear * delta;
        loss.mean()
    }

    /// Huber loss with the default delta of 1.0
    pub fn loss(&self, pred: Tensor<B, 2>, target: Tensor<B, 2>) -> Tensor<B, 1> {
        self.huber_loss(pred, target, HUBER_DELTA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnnlstm::step_1_tensor_preparation::tensor_to_vec;
    use crate::test::backend_rng_guard;
    use burn::tensor::Distribution;
    use burn_ndarray::{NdArray, NdArrayDevice};

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_output_shape() {
        let _guard = backend_rng_guard();
        let device = NdArrayDevice::Cpu;
        let model = CnnLstmForecaster::<TestBackend>::new(10, 2, &device).unwrap();
        let x = Tensor::<TestBackend, 3>::random([8, 10, 1], Distribution::Default, &device);

        assert_eq!(model.forward(x).dims(), [8, 1]);
        assert_eq!(model.conv_output_len(), 5);
    }

    #[test]
    fn test_minimum_window_is_kernel_size() {
        let _guard = backend_rng_guard();
        let device = NdArrayDevice::Cpu;
        let model = CnnLstmForecaster::<TestBackend>::new(CONV_KERNEL_SIZE, 2, &device).unwrap();
        let x = Tensor::<TestBackend, 3>::random([2, CONV_KERNEL_SIZE, 1], Distribution::Default, &device);

        assert_eq!(model.conv_output_len(), 1);
        assert_eq!(model.forward(x).dims(), [2, 1]);
    }

    #[test]
    fn test_window_shorter_than_kernel_is_rejected() {
        let device = NdArrayDevice::Cpu;
        let err = CnnLstmForecaster::<TestBackend>::new(5, 2, &device).unwrap_err();

        assert_eq!(
            err,
            ForecastError::WindowTooShort {
                window_size: 5,
                kernel_size: CONV_KERNEL_SIZE
            }
        );
    }

    #[test]
    fn test_n_layers_does_not_change_architecture() {
        let _guard = backend_rng_guard();
        let device = NdArrayDevice::Cpu;
        let shallow = CnnLstmForecaster::<TestBackend>::new(12, 1, &device).unwrap();
        let deep = CnnLstmForecaster::<TestBackend>::new(12, 7, &device).unwrap();

        assert_eq!(shallow.num_params(), deep.num_params());
        assert_eq!(deep.n_layers(), 7);
    }

    #[test]
    fn test_huber_loss_quadratic_and_linear_regions() {
        let _guard = backend_rng_guard();
        let device = NdArrayDevice::Cpu;
        let model = CnnLstmForecaster::<TestBackend>::new(10, 2, &device).unwrap();

        // |e| = 0.5 -> 0.5 * 0.25 = 0.125
        let pred = Tensor::<TestBackend, 2>::from_floats([[1.5]], &device);
        let target = Tensor::<TestBackend, 2>::from_floats([[1.0]], &device);
        let small = tensor_to_vec(model.huber_loss(pred, target, 1.0)).unwrap();
        assert!((small[0] - 0.125).abs() < 1e-6);

        // |e| = 3 -> 0.5 + 1.0 * 2.0 = 2.5
        let pred = Tensor::<TestBackend, 2>::from_floats([[0.0]], &device);
        let target = Tensor::<TestBackend, 2>::from_floats([[3.0]], &device);
        let large = tensor_to_vec(model.huber_loss(pred, target, 1.0)).unwrap();
        assert!((large[0] - 2.5).abs() < 1e-6);

        // Mean of both examples
        let pred = Tensor::<TestBackend, 2>::from_floats([[1.5], [0.0]], &device);
        let target = Tensor::<TestBackend, 2>::from_floats([[1.0], [3.0]], &device);
        let mean = tensor_to_vec(model.loss(pred, target)).unwrap();
        assert!((mean[0] - 1.3125).abs() < 1e-6);
    }
}
