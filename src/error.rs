use thiserror::Error;

/// Failure classes surfaced by the workflow pipeline. The HTTP layer never
/// propagates these; they are folded into the response envelope.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("generation error: {0}")]
    Generation(String),
    #[error("provider error: {0}")]
    Provider(String),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
