// src/core.rs
pub mod activations;
pub mod layers;
pub mod losses;
pub mod normalization;

// Re-export commonly used items
pub use activations::{Activation, leaky_relu, leaky_relu_derivative, softmax};
pub use layers::{Dense, ForwardResult};
pub use normalization::Normalization;
