//! Small dense regression network
//!
//! Fully connected layers with ReLU on every hidden layer and a linear output,
//! trained with mini-batch Adam on mean squared error.

use rand::seq::SliceRandom;
use rand::Rng;

/// Adam and batching hyper-parameters
#[derive(Debug, Clone, Copy)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 32,
            batch_size: 32,
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
        }
    }
}

#[derive(Debug, Clone)]
struct Dense {
    inputs: usize,
    outputs: usize,
    /// Row-major `outputs x inputs`
    weights: Vec<f64>,
    bias: Vec<f64>,
    relu: bool,
    // Adam moments
    m_w: Vec<f64>,
    v_w: Vec<f64>,
    m_b: Vec<f64>,
    v_b: Vec<f64>,
}

impl Dense {
    /// Glorot-uniform weights, zero bias
    fn new<R: Rng>(inputs: usize, outputs: usize, relu: bool, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + outputs) as f64).sqrt();
        let weights = (0..inputs * outputs)
            .map(|_| rng.gen_range(-limit..limit))
            .collect();

        Self {
            inputs,
            outputs,
            weights,
            bias: vec![0.0; outputs],
            relu,
            m_w: vec![0.0; inputs * outputs],
            v_w: vec![0.0; inputs * outputs],
            m_b: vec![0.0; outputs],
            v_b: vec![0.0; outputs],
        }
    }

    fn forward(&self, x: &[f64]) -> Vec<f64> {
        (0..self.outputs)
            .map(|o| {
                let row = &self.weights[o * self.inputs..(o + 1) * self.inputs];
                let z: f64 = row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + self.bias[o];
                if self.relu {
                    z.max(0.0)
                } else {
                    z
                }
            })
            .collect()
    }

    fn adam_step(&mut self, grad_w: &[f64], grad_b: &[f64], config: &TrainingConfig, step: i32) {
        adam_update(&mut self.weights, &mut self.m_w, &mut self.v_w, grad_w, config, step);
        adam_update(&mut self.bias, &mut self.m_b, &mut self.v_b, grad_b, config, step);
    }
}

fn adam_update(
    params: &mut [f64],
    m: &mut [f64],
    v: &mut [f64],
    grad: &[f64],
    config: &TrainingConfig,
    step: i32,
) {
    let correction1 = 1.0 - config.beta1.powi(step);
    let correction2 = 1.0 - config.beta2.powi(step);

    for i in 0..params.len() {
        m[i] = config.beta1 * m[i] + (1.0 - config.beta1) * grad[i];
        v[i] = config.beta2 * v[i] + (1.0 - config.beta2) * grad[i] * grad[i];
        let m_hat = m[i] / correction1;
        let v_hat = v[i] / correction2;
        params[i] -= config.learning_rate * m_hat / (v_hat.sqrt() + config.epsilon);
    }
}

/// Multi-layer perceptron with a single scalar output
#[derive(Debug, Clone)]
pub struct Mlp {
    layers: Vec<Dense>,
    steps: i32,
}

impl Mlp {
    /// `sizes` lists layer widths from input to output, e.g. `[3, 16, 8, 1]`
    pub fn new<R: Rng>(sizes: &[usize], rng: &mut R) -> Self {
        debug_assert!(sizes.len() >= 2, "need at least input and output widths");
        debug_assert_eq!(sizes[sizes.len() - 1], 1, "output layer must be scalar");

        let last = sizes.len() - 2;
        let layers = sizes
            .windows(2)
            .enumerate()
            .map(|(i, w)| Dense::new(w[0], w[1], i != last, &mut *rng))
            .collect();

        Self { layers, steps: 0 }
    }

    pub fn input_width(&self) -> usize {
        self.layers[0].inputs
    }

    /// Output of every layer, starting with the input itself
    fn activations(&self, x: &[f64]) -> Vec<Vec<f64>> {
        let mut acts = Vec::with_capacity(self.layers.len() + 1);
        acts.push(x.to_vec());
        for layer in &self.layers {
            let next = layer.forward(&acts[acts.len() - 1]);
            acts.push(next);
        }
        acts
    }

    pub fn predict(&self, x: &[f64]) -> f64 {
        debug_assert_eq!(x.len(), self.input_width());
        self.layers
            .iter()
            .fold(x.to_vec(), |a, layer| layer.forward(&a))[0]
    }

    #[cfg(test)]
    pub fn mse(&self, data: &[(Vec<f64>, f64)]) -> f64 {
        if data.is_empty() {
            return 0.0;
        }
        data.iter()
            .map(|(x, y)| (self.predict(x) - y).powi(2))
            .sum::<f64>()
            / data.len() as f64
    }

    /// Train on `(input, target)` pairs. Returns the mean loss of each epoch,
    /// measured on the batches as they were seen.
    pub fn fit<R: Rng>(&mut self, data: &[(Vec<f64>, f64)], config: &TrainingConfig, rng: &mut R) -> Vec<f64> {
        let mut order: Vec<usize> = (0..data.len()).collect();
        let mut epoch_losses = Vec::with_capacity(config.epochs);
        if data.is_empty() {
            return epoch_losses;
        }

        for _ in 0..config.epochs {
            order.shuffle(rng);
            let mut loss_sum = 0.0;

            for batch in order.chunks(config.batch_size.max(1)) {
                loss_sum += self.train_batch(data, batch, config);
            }

            epoch_losses.push(loss_sum / data.len() as f64);
        }

        epoch_losses
    }

    /// One Adam step over `batch`; returns the summed squared error before the step
    fn train_batch(&mut self, data: &[(Vec<f64>, f64)], batch: &[usize], config: &TrainingConfig) -> f64 {
        let mut grads: Vec<(Vec<f64>, Vec<f64>)> = self
            .layers
            .iter()
            .map(|l| (vec![0.0; l.weights.len()], vec![0.0; l.outputs]))
            .collect();

        let n = batch.len() as f64;
        let mut squared_error = 0.0;

        for &idx in batch {
            let (x, y) = &data[idx];
            let acts = self.activations(x);
            let err = acts[acts.len() - 1][0] - y;
            squared_error += err * err;

            // d(mean squared error)/d(output)
            let mut delta = vec![2.0 * err / n];

            for l in (0..self.layers.len()).rev() {
                let layer = &self.layers[l];
                let input = &acts[l];
                let (grad_w, grad_b) = &mut grads[l];

                for o in 0..layer.outputs {
                    grad_b[o] += delta[o];
                    for i in 0..layer.inputs {
                        grad_w[o * layer.inputs + i] += delta[o] * input[i];
                    }
                }

                if l > 0 {
                    let below_relu = self.layers[l - 1].relu;
                    delta = (0..layer.inputs)
                        .map(|i| {
                            if below_relu && input[i] <= 0.0 {
                                return 0.0;
                            }
                            (0..layer.outputs)
                                .map(|o| layer.weights[o * layer.inputs + i] * delta[o])
                                .sum()
                        })
                        .collect();
                }
            }
        }

        self.steps += 1;
        let step = self.steps;
        for (layer, (grad_w, grad_b)) in self.layers.iter_mut().zip(&grads) {
            layer.adam_step(grad_w, grad_b, config, step);
        }

        squared_error
    }
}
