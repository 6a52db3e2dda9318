use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum NNError {
    // Shape related errors
    ShapeMismatch(String),
    ShapeError(ndarray::ShapeError),

    // Forward/backward bookkeeping
    StaleState(String),

    // Serving
    ModelNotReady,

    // Layer and activation configuration
    InvalidLayerConfiguration(String),
    InvalidActivation(String),
    InvalidConfig(String),

    // File operations
    MalformedFile(String),
    DatasetError(String),
    IoError(std::io::Error),
    SerializationError(Box<bincode::ErrorKind>),
    JsonError(serde_json::Error),
    NpzReadError(ndarray_npy::ReadNpzError),
    NpzWriteError(ndarray_npy::WriteNpzError),
    PlotError(String),
}

impl fmt::Display for NNError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NNError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            NNError::ShapeError(err) => write!(f, "Shape error: {}", err),
            NNError::StaleState(msg) => write!(f, "Stale forward state: {}", msg),
            NNError::ModelNotReady => write!(f, "Model is not loaded on the server."),
            NNError::InvalidLayerConfiguration(msg) => write!(f, "Invalid layer configuration: {}", msg),
            NNError::InvalidActivation(msg) => write!(f, "Invalid activation function: {}", msg),
            NNError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            NNError::MalformedFile(msg) => write!(f, "Malformed parameter file: {}", msg),
            NNError::DatasetError(msg) => write!(f, "Dataset error: {}", msg),
            NNError::IoError(err) => write!(f, "I/O error: {}", err),
            NNError::SerializationError(err) => write!(f, "Serialization error: {}", err),
            NNError::JsonError(err) => write!(f, "JSON error: {}", err),
            NNError::NpzReadError(err) => write!(f, "Failed to read npz archive: {}", err),
            NNError::NpzWriteError(err) => write!(f, "Failed to write npz archive: {}", err),
            NNError::PlotError(msg) => write!(f, "Plot error: {}", msg),
        }
    }
}

impl Error for NNError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NNError::ShapeError(err) => Some(err),
            NNError::IoError(err) => Some(err),
            NNError::SerializationError(err) => Some(err),
            NNError::JsonError(err) => Some(err),
            NNError::NpzReadError(err) => Some(err),
            NNError::NpzWriteError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NNError {
    fn from(err: std::io::Error) -> NNError {
        NNError::IoError(err)
    }
}

impl From<Box<bincode::ErrorKind>> for NNError {
    fn from(err: Box<bincode::ErrorKind>) -> NNError {
        NNError::SerializationError(err)
    }
}

impl From<serde_json::Error> for NNError {
    fn from(err: serde_json::Error) -> NNError {
        NNError::JsonError(err)
    }
}

impl From<ndarray::ShapeError> for NNError {
    fn from(err: ndarray::ShapeError) -> NNError {
        NNError::ShapeError(err)
    }
}

impl From<ndarray_npy::ReadNpzError> for NNError {
    fn from(err: ndarray_npy::ReadNpzError) -> NNError {
        NNError::NpzReadError(err)
    }
}

impl From<ndarray_npy::WriteNpzError> for NNError {
    fn from(err: ndarray_npy::WriteNpzError) -> NNError {
        NNError::NpzWriteError(err)
    }
}

impl From<csv::Error> for NNError {
    fn from(err: csv::Error) -> NNError {
        NNError::DatasetError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NNError>;
