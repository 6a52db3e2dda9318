use crate::prelude::*;
use crate::core::losses::cross_entropy;
use crate::utils::argmax_columns;
use log::info;

/// Layer sizes `[input_dim, hidden_dim, output_dim]`; fixes every
/// parameter shape of a [`TwoLayerNetwork`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Architecture {
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub output_dim: usize,
}

impl Architecture {
    /// Flattened 28×28 image.
    pub const DIGIT_INPUTS: usize = 784;
    pub const DIGIT_CLASSES: usize = 10;

    pub fn new(input_dim: usize, hidden_dim: usize, output_dim: usize) -> Result<Self> {
        if input_dim == 0 || hidden_dim == 0 || output_dim == 0 {
            return Err(NNError::InvalidLayerConfiguration(format!(
                "architecture [{}, {}, {}] has a zero-sized layer",
                input_dim, hidden_dim, output_dim
            )));
        }
        Ok(Self {
            input_dim,
            hidden_dim,
            output_dim,
        })
    }

    /// Digit classifier with the given hidden width.
    pub fn digits(hidden_dim: usize) -> Result<Self> {
        Self::new(Self::DIGIT_INPUTS, hidden_dim, Self::DIGIT_CLASSES)
    }

    pub fn to_array(&self) -> [usize; 3] {
        [self.input_dim, self.hidden_dim, self.output_dim]
    }

    pub fn w1_shape(&self) -> (usize, usize) {
        (self.hidden_dim, self.input_dim)
    }

    pub fn b1_shape(&self) -> (usize, usize) {
        (self.hidden_dim, 1)
    }

    pub fn w2_shape(&self) -> (usize, usize) {
        (self.output_dim, self.hidden_dim)
    }

    pub fn b2_shape(&self) -> (usize, usize) {
        (self.output_dim, 1)
    }

    pub fn parameter_count(&self) -> usize {
        (self.input_dim + 1) * self.hidden_dim + (self.hidden_dim + 1) * self.output_dim
    }
}

/// Whether a network holds parameters worth predicting with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    /// Freshly initialised, random or zero parameters.
    Uninitialized,
    /// Parameters were loaded or trained.
    Ready,
}

/// Batch-averaged parameter gradients of both layers.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub dw1: Array2<f64>,
    pub db1: Array2<f64>,
    pub dw2: Array2<f64>,
    pub db2: Array2<f64>,
}

/// Leaky-ReLU hidden layer followed by a softmax output layer.
#[derive(Debug, Clone)]
pub struct TwoLayerNetwork {
    architecture: Architecture,
    hidden: Dense,
    output: Dense,
    state: NetworkState,
}

impl TwoLayerNetwork {
    /// Randomly initialised network, ready for training.
    pub fn new(architecture: Architecture) -> Result<Self> {
        Ok(Self {
            architecture,
            hidden: Dense::new(architecture.input_dim, architecture.hidden_dim, Activation::LeakyRelu)?,
            output: Dense::new(architecture.hidden_dim, architecture.output_dim, Activation::Softmax)?,
            state: NetworkState::Uninitialized,
        })
    }

    /// All-zero network waiting for [`load_parameters`](Self::load_parameters).
    pub fn zeros(architecture: Architecture) -> Result<Self> {
        Ok(Self {
            architecture,
            hidden: Dense::zeros(architecture.input_dim, architecture.hidden_dim, Activation::LeakyRelu)?,
            output: Dense::zeros(architecture.hidden_dim, architecture.output_dim, Activation::Softmax)?,
            state: NetworkState::Uninitialized,
        })
    }

    pub fn from_parameters(parameters: Parameters) -> Result<Self> {
        parameters.validate()?;
        let Parameters { architecture, w1, b1, w2, b2 } = parameters;
        Ok(Self {
            architecture,
            hidden: Dense::from_parameters(w1, b1, Activation::LeakyRelu)?,
            output: Dense::from_parameters(w2, b2, Activation::Softmax)?,
            state: NetworkState::Ready,
        })
    }

    /// Replaces all parameters after checking them against their
    /// architecture. The network is `Ready` afterwards.
    pub fn load_parameters(&mut self, parameters: Parameters) -> Result<()> {
        parameters.validate()?;
        let Parameters { architecture, w1, b1, w2, b2 } = parameters;
        self.hidden = Dense::from_parameters(w1, b1, Activation::LeakyRelu)?;
        self.output = Dense::from_parameters(w2, b2, Activation::Softmax)?;
        self.architecture = architecture;
        self.state = NetworkState::Ready;
        Ok(())
    }

    pub fn to_parameters(&self) -> Parameters {
        Parameters {
            architecture: self.architecture,
            w1: self.hidden.weights().clone(),
            b1: self.hidden.biases().clone(),
            w2: self.output.weights().clone(),
            b2: self.output.biases().clone(),
        }
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    pub fn state(&self) -> NetworkState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == NetworkState::Ready
    }

    pub fn hidden(&self) -> &Dense {
        &self.hidden
    }

    pub fn output(&self) -> &Dense {
        &self.output
    }

    pub fn summary(&self) {
        let mut res = "\nModel TwoLayerNetwork\n".to_string();
        res.push_str("-------------------------------------------------------------\n");
        res.push_str("Layer (Activation)\t Output shape\t\t No.of params\n");
        for layer in [&self.hidden, &self.output] {
            let params = layer.weights().len() + layer.biases().len();
            res.push_str(&format!(
                "Dense ({:?})\t\t  (None, {})\t\t  {}\n",
                layer.activation(),
                layer.output_size(),
                params
            ));
        }
        res.push_str("-------------------------------------------------------------\n");
        res.push_str(&format!("Total params: {}\n", self.architecture.parameter_count()));
        info!("{}", res);
    }

    /// Class probabilities for normalised inputs shaped `(input_dim, m)`.
    /// Nothing is cached.
    pub fn probabilities(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let a1 = self.hidden.infer(x)?;
        self.output.infer(&a1)
    }

    /// Predicted label of one raw image with pixels in `[0, 255]`.
    pub fn predict(&self, image: &[f64]) -> Result<usize> {
        let x = Array2::from_shape_vec((image.len(), 1), image.to_vec())?;
        let labels = self.predict_batch(x)?;
        Ok(labels[0])
    }

    /// Predicted labels of raw images laid out one per column.
    pub fn predict_batch(&self, mut images: Array2<f64>) -> Result<Vec<usize>> {
        if !self.is_ready() {
            return Err(NNError::ModelNotReady);
        }
        if images.nrows() != self.architecture.input_dim {
            return Err(NNError::ShapeMismatch(format!(
                "expected images of {} pixels, got {}",
                self.architecture.input_dim,
                images.nrows()
            )));
        }
        images.normalize_pixels();
        let a2 = self.probabilities(&images)?;
        Ok(argmax_columns(&a2))
    }

    /// Fraction of raw images whose predicted label matches.
    pub fn evaluate(&self, images: Array2<f64>, labels: &[usize]) -> Result<f64> {
        if images.ncols() != labels.len() {
            return Err(NNError::ShapeMismatch(format!(
                "{} images but {} labels",
                images.ncols(),
                labels.len()
            )));
        }
        let predictions = self.predict_batch(images)?;
        let correct = predictions.iter().zip(labels).filter(|(p, l)| p == l).count();
        Ok(correct as f64 / labels.len().max(1) as f64)
    }

    /// Full forward pass on normalised inputs, keeping both layers' caches.
    pub fn forward(&self, x: &Array2<f64>) -> Result<(ForwardResult, ForwardResult)> {
        let hidden = self.hidden.forward(x)?;
        let output = self.output.forward(hidden.output())?;
        Ok((hidden, output))
    }

    /// Cross-entropy loss and gradients for normalised inputs `x` and
    /// one-hot labels `y`.
    pub fn gradients(&self, x: &Array2<f64>, y: &Array2<f64>) -> Result<(f64, Gradients)> {
        let (hidden, output) = self.forward(x)?;
        let loss = cross_entropy(output.output(), y)?;
        let (dz1, dw2, db2) = self.output.backward_output(output, y, &hidden)?;
        let (dw1, db1) = self.hidden.backward(hidden, &dz1)?;
        Ok((loss, Gradients { dw1, db1, dw2, db2 }))
    }

    pub fn apply_gradients(&mut self, gradients: &Gradients, learning_rate: f64) -> Result<()> {
        self.hidden.update(&gradients.dw1, &gradients.db1, learning_rate)?;
        self.output.update(&gradients.dw2, &gradients.db2, learning_rate)?;
        self.state = NetworkState::Ready;
        Ok(())
    }

    /// One gradient-descent step; returns the loss before the update.
    pub fn train_step(&mut self, x: &Array2<f64>, y: &Array2<f64>, learning_rate: f64) -> Result<f64> {
        let (loss, gradients) = self.gradients(x, y)?;
        self.apply_gradients(&gradients, learning_rate)?;
        Ok(loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::losses::one_hot;

    fn zero_parameters(architecture: Architecture) -> Parameters {
        Parameters {
            architecture,
            w1: Array2::zeros(architecture.w1_shape()),
            b1: Array2::zeros(architecture.b1_shape()),
            w2: Array2::zeros(architecture.w2_shape()),
            b2: Array2::zeros(architecture.b2_shape()),
        }
    }

    fn small_parameters() -> Parameters {
        Parameters {
            architecture: Architecture::new(3, 2, 3).unwrap(),
            w1: array![[0.5, -0.2, 0.1], [-0.3, 0.8, 0.4]],
            b1: array![[0.05], [-0.1]],
            w2: array![[0.2, -0.5], [0.7, 0.1], [-0.4, 0.3]],
            b2: array![[0.0], [0.1], [-0.1]],
        }
    }

    #[test]
    fn zero_network_predicts_first_class() {
        let architecture = Architecture::digits(10).unwrap();
        let network = TwoLayerNetwork::from_parameters(zero_parameters(architecture)).unwrap();
        let image = vec![127.5; 784];

        let mut x = Array2::from_shape_vec((784, 1), image.clone()).unwrap();
        x.normalize_pixels();
        let (hidden, output) = network.forward(&x).unwrap();
        assert!(hidden.output().iter().all(|&a| a == 0.0));
        assert!(output.output().iter().all(|&p| (p - 0.1).abs() < 1e-12));

        assert_eq!(network.predict(&image).unwrap(), 0);
    }

    #[test]
    fn batch_forward_returns_probability_columns() {
        let network = TwoLayerNetwork::new(Architecture::digits(16).unwrap()).unwrap();
        let x = Array2::from_shape_fn((784, 5), |(i, j)| ((i * 31 + j * 17) % 256) as f64 / 255.0);
        let a2 = network.probabilities(&x).unwrap();
        assert_eq!(a2.dim(), (10, 5));
        for column in a2.columns() {
            assert!((column.sum() - 1.0).abs() < 1e-9);
            assert!(column.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn repeated_predictions_are_identical() {
        let network = TwoLayerNetwork::new(Architecture::digits(8).unwrap()).unwrap();
        let network = TwoLayerNetwork::from_parameters(network.to_parameters()).unwrap();
        let x = Array2::from_shape_fn((784, 1), |(i, _)| (i % 7) as f64 / 7.0);
        let first = network.probabilities(&x).unwrap();
        let second = network.probabilities(&x).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unloaded_network_refuses_to_predict() {
        let network = TwoLayerNetwork::zeros(Architecture::digits(10).unwrap()).unwrap();
        assert_eq!(network.state(), NetworkState::Uninitialized);
        assert!(matches!(network.predict(&[0.0; 784]), Err(NNError::ModelNotReady)));
    }

    #[test]
    fn predict_rejects_wrong_image_length() {
        let network = TwoLayerNetwork::from_parameters(zero_parameters(Architecture::digits(10).unwrap())).unwrap();
        assert!(matches!(network.predict(&[0.0; 783]), Err(NNError::ShapeMismatch(_))));
    }

    #[test]
    fn loading_mismatched_hidden_weights_fails() {
        let architecture = Architecture::digits(10).unwrap();
        let mut parameters = zero_parameters(architecture);
        parameters.w1 = Array2::zeros((5, 784));
        let mut network = TwoLayerNetwork::zeros(architecture).unwrap();
        assert!(matches!(network.load_parameters(parameters), Err(NNError::ShapeMismatch(_))));
        assert!(!network.is_ready());
    }

    #[test]
    fn building_from_parameters_checks_shapes_before_allocating() {
        let parameters = Parameters {
            architecture: Architecture {
                input_dim: usize::MAX,
                hidden_dim: 2,
                output_dim: 2,
            },
            w1: Array2::zeros((2, 3)),
            b1: Array2::zeros((2, 1)),
            w2: Array2::zeros((2, 2)),
            b2: Array2::zeros((2, 1)),
        };
        assert!(matches!(
            TwoLayerNetwork::from_parameters(parameters),
            Err(NNError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn gradients_match_finite_differences() {
        let x = array![[0.2, 0.9], [0.4, -0.3], [0.6, 0.5]];
        let y = one_hot(&[2, 0], 3).unwrap();
        let base = small_parameters();
        let network = TwoLayerNetwork::from_parameters(base.clone()).unwrap();
        let (_, gradients) = network.gradients(&x, &y).unwrap();

        let loss_at = |parameters: Parameters| {
            let network = TwoLayerNetwork::from_parameters(parameters).unwrap();
            network.gradients(&x, &y).unwrap().0
        };
        let eps = 1e-6;

        for ((i, j), &analytic) in gradients.dw1.indexed_iter() {
            let mut plus = base.clone();
            plus.w1[[i, j]] += eps;
            let mut minus = base.clone();
            minus.w1[[i, j]] -= eps;
            let numeric = (loss_at(plus) - loss_at(minus)) / (2.0 * eps);
            assert!((numeric - analytic).abs() < 1e-7, "dw1[{i},{j}]: {numeric} vs {analytic}");
        }
        for ((i, j), &analytic) in gradients.dw2.indexed_iter() {
            let mut plus = base.clone();
            plus.w2[[i, j]] += eps;
            let mut minus = base.clone();
            minus.w2[[i, j]] -= eps;
            let numeric = (loss_at(plus) - loss_at(minus)) / (2.0 * eps);
            assert!((numeric - analytic).abs() < 1e-7, "dw2[{i},{j}]: {numeric} vs {analytic}");
        }
        for ((i, _), &analytic) in gradients.db2.indexed_iter() {
            let mut plus = base.clone();
            plus.b2[[i, 0]] += eps;
            let mut minus = base.clone();
            minus.b2[[i, 0]] -= eps;
            let numeric = (loss_at(plus) - loss_at(minus)) / (2.0 * eps);
            assert!((numeric - analytic).abs() < 1e-7, "db2[{i}]: {numeric} vs {analytic}");
        }
    }

    #[test]
    fn training_reduces_loss_and_marks_ready() {
        let mut network = TwoLayerNetwork::from_parameters(small_parameters()).unwrap();
        let mut restored = TwoLayerNetwork::zeros(Architecture::new(3, 2, 3).unwrap()).unwrap();
        assert!(!restored.is_ready());

        let x = array![[0.2, 0.9], [0.4, -0.3], [0.6, 0.5]];
        let y = one_hot(&[2, 0], 3).unwrap();
        let first = network.train_step(&x, &y, 0.5).unwrap();
        let mut last = first;
        for _ in 0..50 {
            last = network.train_step(&x, &y, 0.5).unwrap();
        }
        assert!(last < first);

        restored.load_parameters(network.to_parameters()).unwrap();
        assert!(restored.is_ready());
    }
}
