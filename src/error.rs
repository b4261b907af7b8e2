use thiserror::Error;

/// Failures the engine can run into. None of them is fatal: callers log,
/// warn or retry on the next cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposerError {
    #[error("host element not found: {0}")]
    ResolutionFailure(&'static str),
    #[error("host ignored the write: {0}")]
    WriteSuppressed(String),
    #[error("host did not take the message after {attempted} send attempts; your text was kept")]
    CommitExhausted { attempted: usize },
    #[error("draft storage unavailable: {0}")]
    PersistenceFailure(String),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}
