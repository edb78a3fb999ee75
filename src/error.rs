use thiserror::Error;

/// Errors surfaced by direct store/grid API calls. A failed call never leaves
/// a partial mutation behind.
///
/// Stale references inside long-lived data (a map cell pointing past the
/// tileset, a pixel value above 15) are deliberately not errors; every read
/// site degrades them to the empty tile or the fallback color instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("index {index} out of range (limit {limit})")]
    IndexOutOfRange { index: usize, limit: usize },
    #[error("expected exactly {expected} entries, got {actual}")]
    InvalidSize { expected: usize, actual: usize },
    #[error("coordinate ({x}, {y}) outside {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}
