//! Map engine errors.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here is fatal to the host page. Geometry and ownership errors drop
//! the affected element from one render pass; surface errors defer the pass
//! until the next scheduled trigger.

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("invalid viewport: {0}")]
    InvalidViewport(String),
    #[error("rendering surface not available")]
    SurfaceUnavailable,
    #[error("mission path owner not in snapshot: {0}")]
    MissingOwner(String),
    #[error("draw call failed: {0}")]
    Draw(String),
    #[error("snapshot decode failed: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
}
