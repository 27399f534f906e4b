use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubfluxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Subtitle parse error: {0}")]
    Parse(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Translation stalled: no progress for {0} seconds")]
    Timeout(u64),

    #[error("Insufficient credits: required {required:.2}, available {available:.2}")]
    InsufficientCredits { required: f64, available: f64 },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Voucher error: {0}")]
    Voucher(String),
}

pub type Result<T> = std::result::Result<T, SubfluxError>;
