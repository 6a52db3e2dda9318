pub use serde::{Serialize, Deserialize};

pub use ndarray::*;
pub use ndarray_rand::RandomExt;
pub use ndarray_rand::rand_distr::StandardNormal;

pub use crate::models::{Architecture, Gradients, NetworkState, TwoLayerNetwork};
pub use crate::codec::Parameters;
pub use crate::error::*;

// Internal re-exports
pub use crate::core::{
    Activation,
    Dense,
    ForwardResult,
    Normalization,
    leaky_relu,
    leaky_relu_derivative,
    softmax,
};
