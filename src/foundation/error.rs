/// Result alias used throughout the crate.
pub type PromoResult<T> = Result<T, PromoError>;

/// Error taxonomy for the capture-and-encode pipeline.
///
/// The coordinator is the single point of recovery: every variant that reaches it aborts the run.
#[derive(thiserror::Error, Debug)]
pub enum PromoError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("resource load failure: {0}")]
    ResourceLoad(String),

    #[error("rasterization failure: {0}")]
    Rasterization(String),

    #[error("encoding failure: {0}")]
    Encoding(String),

    #[error("run cancelled")]
    Cancelled,

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification of a [`PromoError`], reported alongside failure notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Configuration or argument rejected before any work started.
    Validation,
    /// An image referenced by the scene could not be fetched or decoded.
    ResourceLoad,
    /// The capture call itself rejected.
    Rasterization,
    /// The encoder rejected a frame or failed to finalize.
    Encoding,
    /// The run was cancelled or a frame exceeded its timeout.
    Aborted,
    /// Anything else.
    Other,
}

impl PromoError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn resource_load(msg: impl Into<String>) -> Self {
        Self::ResourceLoad(msg.into())
    }

    pub fn rasterization(msg: impl Into<String>) -> Self {
        Self::Rasterization(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) | Self::Serde(_) => FailureKind::Validation,
            Self::ResourceLoad(_) => FailureKind::ResourceLoad,
            Self::Rasterization(_) => FailureKind::Rasterization,
            Self::Encoding(_) => FailureKind::Encoding,
            Self::Cancelled | Self::Timeout(_) => FailureKind::Aborted,
            Self::Other(_) => FailureKind::Other,
        }
    }
}
