use std::sync::atomic::{AtomicU64, Ordering};

use crate::prelude::*;
use crate::rand_array;

static NEXT_LAYER_ID: AtomicU64 = AtomicU64::new(0);

fn next_layer_id() -> u64 {
    NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Fully connected layer: `a = activation(w · x + b)`.
///
/// `w` has shape `(output_size, input_size)` and `b` is a column of shape
/// `(output_size, 1)` broadcast across the batch. Inputs are laid out one
/// example per column.
#[derive(Debug)]
pub struct Dense {
    w: Array2<f64>,
    b: Array2<f64>,
    activation: Activation,
    id: u64,
    version: u64,
}

/// Intermediates of one [`Dense::forward`] call, handed back to
/// [`Dense::backward`] or [`Dense::backward_output`].
///
/// A result is tied to the layer instance that produced it and to the
/// parameters that layer had at the time.
#[derive(Debug, Clone)]
pub struct ForwardResult {
    input: Array2<f64>,
    z: Array2<f64>,
    a: Array2<f64>,
    activation: Activation,
    layer_id: u64,
    version: u64,
}

impl ForwardResult {
    pub fn input(&self) -> &Array2<f64> {
        &self.input
    }

    pub fn pre_activation(&self) -> &Array2<f64> {
        &self.z
    }

    pub fn output(&self) -> &Array2<f64> {
        &self.a
    }

    pub fn into_output(self) -> Array2<f64> {
        self.a
    }

    /// Number of examples in the batch.
    pub fn batch_size(&self) -> usize {
        self.input.ncols()
    }
}

impl Clone for Dense {
    fn clone(&self) -> Self {
        Self {
            w: self.w.clone(),
            b: self.b.clone(),
            activation: self.activation,
            id: next_layer_id(),
            version: 0,
        }
    }
}

impl Dense {
    /// Layer with weights drawn from `N(0, 1) * 0.01` and zero biases.
    pub fn new(input_size: usize, output_size: usize, activation: Activation) -> Result<Self> {
        check_dimensions(input_size, output_size)?;
        Ok(Self::assemble(
            rand_array!(output_size, input_size),
            Array2::zeros((output_size, 1)),
            activation,
        ))
    }

    /// Layer with all parameters zero, to be filled by loading.
    pub fn zeros(input_size: usize, output_size: usize, activation: Activation) -> Result<Self> {
        check_dimensions(input_size, output_size)?;
        Ok(Self::assemble(
            Array2::zeros((output_size, input_size)),
            Array2::zeros((output_size, 1)),
            activation,
        ))
    }

    pub fn from_parameters(w: Array2<f64>, b: Array2<f64>, activation: Activation) -> Result<Self> {
        check_dimensions(w.ncols(), w.nrows())?;
        if b.dim() != (w.nrows(), 1) {
            return Err(NNError::ShapeMismatch(format!(
                "bias shape {:?} does not match weight shape {:?}, expected ({}, 1)",
                b.shape(),
                w.shape(),
                w.nrows()
            )));
        }
        Ok(Self::assemble(w, b, activation))
    }

    fn assemble(w: Array2<f64>, b: Array2<f64>, activation: Activation) -> Self {
        Self {
            w,
            b,
            activation,
            id: next_layer_id(),
            version: 0,
        }
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.w
    }

    pub fn biases(&self) -> &Array2<f64> {
        &self.b
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn input_size(&self) -> usize {
        self.w.ncols()
    }

    pub fn output_size(&self) -> usize {
        self.w.nrows()
    }

    /// Forward pass keeping everything the backward pass needs.
    pub fn forward(&self, x: &Array2<f64>) -> Result<ForwardResult> {
        let z = self.pre_activation(x)?;
        let a = self.activation.forward(&z);
        Ok(ForwardResult {
            input: x.clone(),
            z,
            a,
            activation: self.activation,
            layer_id: self.id,
            version: self.version,
        })
    }

    /// Forward pass for inference only; nothing is cached.
    pub fn infer(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let z = self.pre_activation(x)?;
        Ok(self.activation.forward(&z))
    }

    fn pre_activation(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.nrows() != self.input_size() {
            return Err(NNError::ShapeMismatch(format!(
                "layer expects {} input rows, got {}",
                self.input_size(),
                x.nrows()
            )));
        }
        if x.ncols() == 0 {
            return Err(NNError::ShapeMismatch("batch must hold at least one example".to_string()));
        }
        Ok(self.w.dot(x) + &self.b)
    }

    fn check_stamp(&self, cache: &ForwardResult) -> Result<()> {
        if cache.layer_id != self.id {
            return Err(NNError::StaleState(format!(
                "forward result came from layer #{}, not layer #{}",
                cache.layer_id, self.id
            )));
        }
        if cache.version != self.version {
            return Err(NNError::StaleState(format!(
                "parameters of layer #{} changed since the forward pass",
                self.id
            )));
        }
        Ok(())
    }

    /// Gradients of a hidden layer given the error signal `dz` at its
    /// pre-activation. Returns `(dw, db)`, both averaged over the batch.
    pub fn backward(&self, cache: ForwardResult, dz: &Array2<f64>) -> Result<(Array2<f64>, Array2<f64>)> {
        self.check_stamp(&cache)?;
        if dz.dim() != cache.z.dim() {
            return Err(NNError::ShapeMismatch(format!(
                "error signal shape {:?} does not match layer output shape {:?}",
                dz.shape(),
                cache.z.shape()
            )));
        }
        Ok(parameter_gradients(dz, &cache.input))
    }

    /// Backward pass of a softmax output layer trained with cross-entropy.
    ///
    /// With `a2` the cached probabilities and `y` the one-hot labels, the
    /// error at the pre-activation is `a2 - y`. Returns `(dz1, dw2, db2)`
    /// where `dz1` is the error signal for the hidden layer that produced
    /// `hidden`.
    pub fn backward_output(
        &self,
        cache: ForwardResult,
        y: &Array2<f64>,
        hidden: &ForwardResult,
    ) -> Result<(Array2<f64>, Array2<f64>, Array2<f64>)> {
        self.check_stamp(&cache)?;
        if y.dim() != cache.a.dim() {
            return Err(NNError::ShapeMismatch(format!(
                "label shape {:?} does not match prediction shape {:?}",
                y.shape(),
                cache.a.shape()
            )));
        }
        if hidden.z.dim() != cache.input.dim() {
            return Err(NNError::ShapeMismatch(format!(
                "hidden pre-activation shape {:?} does not match output layer input shape {:?}",
                hidden.z.shape(),
                cache.input.shape()
            )));
        }

        let dz2 = &cache.a - y;
        let (dw2, db2) = parameter_gradients(&dz2, &cache.input);
        let dz1 = self.w.t().dot(&dz2) * hidden.activation.derivative(&hidden.z)?;
        Ok((dz1, dw2, db2))
    }

    /// Gradient-descent step `w -= lr * dw`, `b -= lr * db`.
    ///
    /// Any [`ForwardResult`] produced before the update becomes stale.
    pub fn update(&mut self, dw: &Array2<f64>, db: &Array2<f64>, learning_rate: f64) -> Result<()> {
        if dw.dim() != self.w.dim() || db.dim() != self.b.dim() {
            return Err(NNError::ShapeMismatch(format!(
                "gradient shapes {:?}/{:?} do not match parameter shapes {:?}/{:?}",
                dw.shape(),
                db.shape(),
                self.w.shape(),
                self.b.shape()
            )));
        }
        self.w.scaled_add(-learning_rate, dw);
        self.b.scaled_add(-learning_rate, db);
        self.version += 1;
        Ok(())
    }
}

fn check_dimensions(input_size: usize, output_size: usize) -> Result<()> {
    if input_size == 0 || output_size == 0 {
        return Err(NNError::InvalidLayerConfiguration(
            "Layer dimensions must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// `dw = (1/m) dz · xᵀ`, `db = (1/m) Σ_columns dz`.
fn parameter_gradients(dz: &Array2<f64>, x: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
    let m = x.ncols() as f64;
    let dw = dz.dot(&x.t()) / m;
    let db = dz.sum_axis(Axis(1)).insert_axis(Axis(1)) / m;
    (dw, db)
}
