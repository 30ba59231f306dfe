//! Error types for sampling and generation runs.

/// Error from the random bit source or the uniform sampler.
///
/// Invalid arguments are surfaced immediately rather than corrected; the
/// sampler never substitutes a non-random fallback when the source fails.
#[derive(Debug)]
pub enum SamplerError {
    /// Caller passed a width, shot count, or range the sampler cannot serve.
    InvalidArgument(String),
    /// The measurement backend failed; the whole run fails with it.
    SourceFailure(String),
}

impl std::fmt::Display for SamplerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Self::SourceFailure(msg) => write!(f, "random source failure: {}", msg),
        }
    }
}

impl std::error::Error for SamplerError {}

/// Error from a full generation run.
///
/// Transport errors carry the caveat that notes already sent stay sent: the
/// channel offers no transactional semantics, so there is no rollback.
#[derive(Debug)]
pub enum RunError {
    Sampler(SamplerError),
    Transport(std::io::Error),
}

impl From<SamplerError> for RunError {
    fn from(e: SamplerError) -> Self {
        Self::Sampler(e)
    }
}

impl From<std::io::Error> for RunError {
    fn from(e: std::io::Error) -> Self {
        Self::Transport(e)
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sampler(e) => write!(f, "{}", e),
            Self::Transport(e) => write!(f, "transport unavailable: {}", e),
        }
    }
}

impl std::error::Error for RunError {}
