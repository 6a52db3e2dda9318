use crate::prelude::*;

/// Slope of the leaky branch for non-positive inputs.
pub const LEAKY_SLOPE: f64 = 0.01;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    LeakyRelu,
    Softmax,
}

impl Activation {
    pub fn forward(&self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Self::LeakyRelu => leaky_relu(z),
            Self::Softmax => softmax(z),
        }
    }

    /// Elementwise derivative of the activation at `z`.
    ///
    /// Softmax has no elementwise derivative; its gradient is only taken
    /// jointly with cross-entropy, where it collapses to `a - y`.
    pub fn derivative(&self, z: &Array2<f64>) -> Result<Array2<f64>> {
        match self {
            Self::LeakyRelu => Ok(leaky_relu_derivative(z)),
            Self::Softmax => Err(NNError::InvalidActivation(
                "softmax has no elementwise derivative, pair it with cross-entropy".to_string(),
            )),
        }
    }
}

/// `max(0.01 * z, z)` elementwise.
pub fn leaky_relu(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|v| if v > 0.0 { v } else { LEAKY_SLOPE * v })
}

/// `1.0` where `z > 0`, `0.01` everywhere else (including `z == 0`).
pub fn leaky_relu_derivative(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|v| if v > 0.0 { 1.0 } else { LEAKY_SLOPE })
}

/// Column-wise softmax. Each column is shifted by its maximum before
/// exponentiation so large logits cannot overflow.
pub fn softmax(z: &Array2<f64>) -> Array2<f64> {
    let max = z.fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &v| acc.max(v));
    let exp = (z - &max.insert_axis(Axis(0))).mapv(f64::exp);
    let sum = exp.sum_axis(Axis(0)).insert_axis(Axis(0));
    exp / &sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaky_relu_keeps_positive_and_scales_the_rest() {
        let z = array![[2.0, -3.0], [0.0, 0.5]];
        let a = leaky_relu(&z);
        assert_eq!(a, array![[2.0, -0.03], [0.0, 0.5]]);
    }

    #[test]
    fn leaky_relu_derivative_maps_zero_to_leaky_slope() {
        let z = array![[1e-12, 0.0], [-0.0, -4.0]];
        let d = leaky_relu_derivative(&z);
        assert_eq!(d, array![[1.0, 0.01], [0.01, 0.01]]);
    }

    #[test]
    fn softmax_columns_sum_to_one() {
        let z = array![[1.0, -5.0, 0.0], [2.0, 7.5, 0.0], [3.0, 0.25, 0.0]];
        let a = softmax(&z);
        for column in a.columns() {
            assert!((column.sum() - 1.0).abs() < 1e-9);
            assert!(column.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
        // equal logits give a uniform column
        for &p in a.column(2).iter() {
            assert!((p - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn softmax_survives_extreme_logits() {
        let z = array![[1000.0, -1000.0], [1001.0, -1002.0]];
        let a = softmax(&z);
        assert!(a.iter().all(|p| p.is_finite()));
        assert!((a[[1, 0]] - 1.0 / (1.0 + (-1.0f64).exp())).abs() < 1e-12);
        assert!(a[[0, 1]] > a[[1, 1]]);
    }

    #[test]
    fn softmax_has_no_elementwise_derivative() {
        let z = array![[0.0]];
        assert!(matches!(
            Activation::Softmax.derivative(&z),
            Err(NNError::InvalidActivation(_))
        ));
        assert_eq!(Activation::LeakyRelu.derivative(&z).unwrap(), array![[0.01]]);
    }
}
