use thiserror::Error;

/// Result type local to streamc-planner.
pub type Result<T> = std::result::Result<T, DslError>;

#[derive(Debug, Error)]
pub enum DslError {
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Plan(#[from] streamc_core::error::Error),

    #[error("invalid plan document: {0}")]
    Invalid(String),
}
