use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    #[error("Failed to allocate a {width}x{height} pixel buffer")]
    AllocationFailed { width: u32, height: u32 },
    #[error("Unsupported pixel depth: {0} bits per pixel")]
    UnsupportedDepth(u32),
    #[error("Surface handle does not refer to a live surface")]
    NoSuchSurface,
    #[error("Overlays can only be created on the root surface")]
    ParentNotRoot,
}
