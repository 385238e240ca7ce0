/// Errors that can occur in the canvas layer.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// Writing the PNG snapshot failed.
    #[error("png encode failed: {0}")]
    Encode(#[from] png::EncodingError),
}
