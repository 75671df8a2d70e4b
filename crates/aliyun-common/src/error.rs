use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("metric {metric} expects {expected} label values, got {actual}")]
    LabelArity {
        metric: String,
        expected: usize,
        actual: usize,
    },
    #[error("internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
