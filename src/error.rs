use enough::StopReason;

use crate::engine::EngineError;

/// Errors that make a load call fail.
///
/// Degraded outcomes (a bad metadata block, an unsynthesizable color
/// profile, a thumbnail that fails to decode) never surface here; they are
/// reported through the [`MessageSink`](crate::MessageSink) only.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HeifError {
    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error(
        "HEIF hdr support is not implemented. Pass the force-SDR flag to get standard 8-bit image."
    )]
    HdrNotImplemented,

    #[error("DIB allocation failed, maybe caused by an invalid image size or by a lack of memory")]
    AllocationFailed,

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("invalid flag layout: {0} thread-limit bits (must be 1..=12)")]
    InvalidFlagLayout(u32),

    #[error("invalid pixel data: {0}")]
    InvalidData(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decoder panicked: {0}")]
    Panicked(String),

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for HeifError {
    fn from(r: StopReason) -> Self {
        HeifError::Cancelled(r)
    }
}

impl From<std::collections::TryReserveError> for HeifError {
    fn from(_: std::collections::TryReserveError) -> Self {
        HeifError::AllocationFailed
    }
}
