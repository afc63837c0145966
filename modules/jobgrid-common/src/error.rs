use thiserror::Error;

/// The error taxonomy every fallible operation maps into. Exactly one kind
/// is retryable: `Aborted` (a transaction that could not commit). `Invalid`
/// and `Forbidden` are terminal; `NotFound`/`Conflict` are surfaced as-is.
/// Internal store errors are wrapped into `Aborted` and logged, never
/// leaked verbatim to callers.
#[derive(Error, Debug)]
pub enum JobGridError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("aborted: {0}")]
    Aborted(String),

    #[error("invalid input: {0}")]
    Invalid(String),
}

impl JobGridError {
    pub fn not_found(what: impl Into<String>) -> Self {
        JobGridError::NotFound(what.into())
    }

    pub fn forbidden(why: impl Into<String>) -> Self {
        JobGridError::Forbidden(why.into())
    }

    pub fn conflict(why: impl Into<String>) -> Self {
        JobGridError::Conflict(why.into())
    }

    pub fn aborted(why: impl Into<String>) -> Self {
        JobGridError::Aborted(why.into())
    }

    pub fn invalid(why: impl Into<String>) -> Self {
        JobGridError::Invalid(why.into())
    }

    /// Stable machine-readable kind for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            JobGridError::NotFound(_) => "not_found",
            JobGridError::Forbidden(_) => "forbidden",
            JobGridError::Conflict(_) => "conflict",
            JobGridError::Aborted(_) => "aborted",
            JobGridError::Invalid(_) => "invalid",
        }
    }

    /// Whether a caller may retry the operation after re-reading its input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobGridError::Aborted(_))
    }
}

pub type Result<T> = std::result::Result<T, JobGridError>;
