use streamc_core::id::StageId;
use thiserror::Error;

/// Result type local to streamc-dataflow.
pub type Result<T> = std::result::Result<T, DataflowError>;

#[derive(Debug, Error)]
pub enum DataflowError {
    #[error("unknown stage {0}")]
    UnknownStage(StageId),

    #[error("stage {0} is not a table and cannot be joined against")]
    NotATable(StageId),

    #[error("field '{field}' not found in input of stage {stage}")]
    MissingField { stage: StageId, field: String },

    #[error("unsupported serialization format '{0}'")]
    UnsupportedFormat(String),

    #[error("invalid codec: {0}")]
    InvalidCodec(String),
}
