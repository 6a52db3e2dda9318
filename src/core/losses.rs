use crate::prelude::*;

/// Probabilities are clamped to at least this before taking the log.
const EPSILON: f64 = 1e-15;

/// Mean categorical cross-entropy `-(1/m) Σ y · ln(a)` of softmax outputs
/// `a` against one-hot labels `y`, both shaped `(classes, m)`.
pub fn cross_entropy(a: &Array2<f64>, y: &Array2<f64>) -> Result<f64> {
    if a.shape() != y.shape() {
        return Err(NNError::ShapeMismatch(format!(
            "Prediction shape {:?} doesn't match target shape {:?}",
            a.shape(),
            y.shape()
        )));
    }
    let m = a.ncols().max(1) as f64;
    let log_a = a.mapv(|p| p.clamp(EPSILON, 1.0).ln());
    Ok(-(y * &log_a).sum() / m)
}

/// One column per label with a single `1.0` at the label's row.
pub fn one_hot(labels: &[usize], classes: usize) -> Result<Array2<f64>> {
    let mut y = Array2::zeros((classes, labels.len()));
    for (column, &label) in labels.iter().enumerate() {
        if label >= classes {
            return Err(NNError::ShapeMismatch(format!(
                "label {} is out of range for {} classes",
                label, classes
            )));
        }
        y[[label, column]] = 1.0;
    }
    Ok(y)
}
