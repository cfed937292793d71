use crate::device::{DrawKind, RenderTarget};

/// Errors from rendering operations.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no compatible graphics adapter found")]
    AdapterUnavailable,
    #[error("failed to request graphics device: {0}")]
    RequestDevice(String),
    #[error("failed to create surface: {0}")]
    CreateSurface(String),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("{kind:?} draw is not allowed on the {target:?} target")]
    InvalidDraw { kind: DrawKind, target: RenderTarget },
    #[error("{kind:?} draw failed: {reason}")]
    DrawFailed { kind: DrawKind, reason: String },
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
