use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure classes of the generative backend. The fallback orchestrator
/// keys its behavior on these, so they are a separate enum rather than
/// string payloads on [`DiscoveryError`].
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("authorization failure: {0}")]
    Authorization(String),

    #[error("provider failure: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
