pub type ReelResult<T> = Result<T, ReelError>;

/// Error taxonomy shared by the compiler, the timeline assembler and the job orchestrator.
///
/// Every variant renders as a single human-readable message, which is what ends up on a failed
/// job's status record.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Malformed plan, rejected before any work starts.
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or unreadable source asset.
    #[error("asset error: {0}")]
    Asset(String),

    /// Encoder, TTS, transcription or download failure.
    #[error("external service error: {0}")]
    External(String),

    /// User-initiated cancellation observed at a stage boundary.
    #[error("job cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn external(msg: impl Into<String>) -> Self {
        Self::External(msg.into())
    }

    /// `true` for the cancellation signal, which is not a failure of the job itself.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<serde_json::Error> for ReelError {
    fn from(e: serde_json::Error) -> Self {
        Self::Validation(format!("parse plan JSON: {e}"))
    }
}
