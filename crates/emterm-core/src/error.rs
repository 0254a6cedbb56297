//! Error types surfaced by the terminal façade.
//!
//! The parser and grid never raise errors; malformed input is absorbed
//! silently. Only lifecycle misuse of the façade produces an [`Error`],
//! and none of these corrupt terminal state.

/// Errors returned by [`crate::terminal::Terminal`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The operation requires an open terminal but `open` was not called.
    #[error("terminal is not open")]
    NotOpen,

    /// `open` was called on a terminal that is already open.
    #[error("terminal is already open")]
    AlreadyOpen,

    /// The operation was invoked on a disposed terminal.
    #[error("terminal has been disposed")]
    Disposed,

    /// `resize` was called with a zero dimension.
    #[error("invalid dimensions: {cols}x{rows}")]
    InvalidDimensions {
        /// Requested column count.
        cols: u16,
        /// Requested row count.
        rows: u16,
    },
}

/// Result alias for façade operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(Error::NotOpen.to_string(), "terminal is not open");
        assert_eq!(
            Error::InvalidDimensions { cols: 0, rows: 24 }.to_string(),
            "invalid dimensions: 0x24"
        );
    }
}
