pub mod codec;
pub mod config;
pub mod core;
pub mod dataset;
pub mod error;
pub mod models;
pub mod prelude;
pub mod server;
pub mod utils;

// Re-export types
pub use crate::core::{Activation, Dense, ForwardResult};
pub use error::{NNError, Result};
pub use models::{Architecture, TwoLayerNetwork};

pub mod plot {
    pub mod plot_digit;
    pub mod plot_loss_over_epochs;

    pub use plot_digit::plot_digit;
    pub use plot_loss_over_epochs::plot_loss_over_epochs;
}
