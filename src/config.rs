use crate::prelude::*;
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MODEL_PATH: &str = "trained_model.npz";

/// Where the inference server listens and which parameters it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

impl ServerConfig {
    /// Reads `HOST`, `PORT` and `MODEL_PATH`, falling back to the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let port = match lookup("PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|err| NNError::InvalidConfig(format!("PORT '{}': {}", port, err)))?,
            None => defaults.port,
        };
        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            model_path: lookup("MODEL_PATH").map(PathBuf::from).unwrap_or(defaults.model_path),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Settings of the `train` binary.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrainConfig {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    pub hidden_dim: usize,
    pub learning_rate: f64,
    pub epochs: usize,
    /// Examples per gradient step; `None` means the whole dataset.
    pub batch_size: Option<usize>,
    pub has_headers: bool,
    /// Reshuffle the examples before every epoch.
    pub shuffle: bool,
    pub seed: Option<u64>,
    /// Loss curve PNG written after training, if set.
    pub loss_plot: Option<PathBuf>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("mnist_train.csv"),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            hidden_dim: 10,
            learning_rate: 0.1,
            epochs: 100,
            batch_size: None,
            has_headers: true,
            shuffle: false,
            seed: None,
            loss_plot: None,
        }
    }
}

impl TrainConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hidden_dim == 0 {
            return Err(NNError::InvalidConfig("hidden_dim must be greater than 0".to_string()));
        }
        if self.epochs == 0 {
            return Err(NNError::InvalidConfig("epochs must be greater than 0".to_string()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(NNError::InvalidConfig(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        if self.batch_size == Some(0) {
            return Err(NNError::InvalidConfig("batch_size must be greater than 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn server_config_uses_defaults_for_missing_keys() {
        let vars: HashMap<&str, &str> = [("PORT", "9001")].into_iter().collect();
        let config = ServerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(config.addr(), "127.0.0.1:9001");
    }

    #[test]
    fn invalid_port_is_a_config_error() {
        let result = ServerConfig::from_lookup(|key| (key == "PORT").then(|| "eighty".to_string()));
        assert!(matches!(result, Err(NNError::InvalidConfig(_))));
    }

    #[test]
    fn train_config_fills_missing_fields_from_defaults() {
        let config: TrainConfig = serde_json::from_str(r#"{"hidden_dim": 64, "batch_size": 128}"#).unwrap();
        assert_eq!(config.hidden_dim, 64);
        assert_eq!(config.batch_size, Some(128));
        assert_eq!(config.epochs, TrainConfig::default().epochs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn train_config_rejects_nonpositive_learning_rate() {
        let config = TrainConfig {
            learning_rate: 0.0,
            ..TrainConfig::default()
        };
        assert!(matches!(config.validate(), Err(NNError::InvalidConfig(_))));
    }
}
