use thiserror::Error;

/// Failures talking to the generative model endpoint
#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("no API key configured (set {0})")]
    MissingApiKey(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response carried no candidates")]
    EmptyResponse,
}

/// Failures from a position/orientation source
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("GPS: {0}")]
    Io(#[from] std::io::Error),
    #[error("GPS: stream closed by {0}")]
    Closed(String),
    #[error("GPS: bad report: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures loading the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0} not found")]
    NotFound(String),
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Parse(#[from] hcl::Error),
    #[error("invalid threat {id}: {reason}")]
    InvalidThreat { id: String, reason: String },
}
