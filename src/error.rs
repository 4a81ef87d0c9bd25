use crate::modes::RenderMode;
use crate::scale::Scale;

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum OrbitalError {
    #[error("{0}")]
    InvalidQuantumNumbers(String),
    #[error("Unsupported render mode: {0}")]
    UnsupportedMode(String),
    #[error("Unsupported slice plane: {0} (expected x, y or z)")]
    UnsupportedPlane(String),
    #[error("Unsupported scale: {0} (expected auto, linear, log or symlog)")]
    UnsupportedScale(String),
    #[error("scale {scale} cannot represent mode {mode}")]
    IncompatibleScale { scale: Scale, mode: RenderMode },
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    #[error("coordinate arrays must share the same shape")]
    ShapeMismatch,
    #[error("unknown colormap: {0}")]
    UnknownColormap(String),
    #[error("render failed: {0}")]
    Render(String),
}
