// External imports
use burn::module::{Ignored, Module};
use burn::nn::{Linear, LinearConfig};
use burn::tensor::{activation, backend::Backend, Tensor};

/// Activation applied to the candidate cell state and to the cell output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellActivation {
    Tanh,
    Relu,
}

impl CellActivation {
    fn apply<B: Backend>(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        match self {
            CellActivation::Tanh => activation::tanh(x),
            CellActivation::Relu => activation::relu(x),
        }
    }
}

/// Activation applied to the input, forget and output gates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateActivation {
    Sigmoid,
    /// Piecewise-linear sigmoid: clamp(0.2 * x + 0.5, 0, 1)
    HardSigmoid,
}

impl GateActivation {
    fn apply<B: Backend>(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        match self {
            GateActivation::Sigmoid => activation::sigmoid(x),
            GateActivation::HardSigmoid => x.mul_scalar(0.2).add_scalar(0.5).clamp(0.0, 1.0),
        }
    }
}

/// Single-direction LSTM layer
#[derive(Module, Debug)]
pub struct LSTM<B: Backend> {
    input_size: usize,
    hidden_size: usize,

    // All four gates (input, forget, cell, output) share one projection each
    input_weights: Linear<B>,
    hidden_weights: Linear<B>,

    cell_activation: Ignored<CellActivation>,
    gate_activation: Ignored<GateActivation>,
}

impl<B: Backend> LSTM<B> {
    /// Create a new LSTM layer
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        cell_activation: CellActivation,
        gate_activation: GateActivation,
        device: &B::Device,
    ) -> Self {
        let gate_size = 4 * hidden_size;

        // The bias lives on the input projection only
        let input_weights = LinearConfig::new(input_size, gate_size).init(device);
        let hidden_weights = LinearConfig::new(hidden_size, gate_size)
            .with_bias(false)
            .init(device);

        Self {
            input_size,
            hidden_size,
            input_weights,
            hidden_weights,
            cell_activation: Ignored(cell_activation),
            gate_activation: Ignored(gate_activation),
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Advance the recurrence by one time step
    fn step(
        &self,
        x_t: Tensor<B, 2>,
        h: Tensor<B, 2>,
        c: Tensor<B, 2>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let batch_size = x_t.dims()[0];

        let gates = self.input_weights.forward(x_t) + self.hidden_weights.forward(h);
        let gates = gates.reshape([batch_size, 4, self.hidden_size]);
        let gate = |idx: usize| {
            gates
                .clone()
                .narrow(1, idx, 1)
                .reshape([batch_size, self.hidden_size])
        };

        let i = self.gate_activation.0.apply(gate(0));
        let f = self.gate_activation.0.apply(gate(1));
        let g = self.cell_activation.0.apply(gate(2));
        let o = self.gate_activation.0.apply(gate(3));

        let c = f * c + i * g;
        let h = o * self.cell_activation.0.apply(c.clone());

        (h, c)
    }

    fn time_step(&self, x: &Tensor<B, 3>, t: usize) -> Tensor<B, 2> {
        let batch_size = x.dims()[0];
        x.clone()
            .narrow(1, t, 1)
            .reshape([batch_size, self.input_size])
    }

    fn initial_state(&self, batch_size: usize, device: &B::Device) -> (Tensor<B, 2>, Tensor<B, 2>) {
        (
            Tensor::zeros([batch_size, self.hidden_size], device),
            Tensor::zeros([batch_size, self.hidden_size], device),
        )
    }

    /// Run the whole sequence and return every hidden state.
    /// Input shape: [batch_size, seq_len, input_size]
    /// Output shape: [batch_size, seq_len, hidden_size]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let device = x.device();
        let [batch_size, seq_len, _] = x.dims();
        let (mut h, mut c) = self.initial_state(batch_size, &device);

        let mut outputs = Vec::with_capacity(seq_len);
        for t in 0..seq_len {
            let (h_next, c_next) = self.step(self.time_step(&x, t), h, c);
            outputs.push(h_next.clone().unsqueeze_dim::<3>(1));
            h = h_next;
            c = c_next;
        }

        Tensor::cat(outputs, 1)
    }

    /// Run the whole sequence and return only the final hidden state.
    /// Input shape: [batch_size, seq_len, input_size]
    /// Output shape: [batch_size, hidden_size]
    pub fn forward_last(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let device = x.device();
        let [batch_size, seq_len, _] = x.dims();
        let (mut h, mut c) = self.initial_state(batch_size, &device);

        for t in 0..seq_len {
            let (h_next, c_next) = self.step(self.time_step(&x, t), h, c);
            h = h_next;
            c = c_next;
        }

        h
    }
}
