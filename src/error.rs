use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShowingsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("API error: {message}")]
    Api { message: String },
}

impl ShowingsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ShowingsError::Status { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, ShowingsError>;
