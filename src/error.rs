use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldWatchError {
    #[error("Unknown sensor: {0}")]
    UnknownSensor(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Dataset is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Invalid value {value} for sensor {sensor}")]
    InvalidValue { sensor: String, value: f64 },
}

pub type Result<T> = std::result::Result<T, FieldWatchError>;
