//! Error types for blobread.

use std::fmt;

/// Errors that can occur while reading buffered bytes from a source.
#[derive(Debug)]
pub enum ReadError {
    /// The source has no more bytes to give.
    ///
    /// Returned by a refill that observed a clean end of stream. Unconsumed
    /// bytes already buffered are left intact and stay readable.
    Exhausted,

    /// An exact-length read ran out of stream before completing.
    UnexpectedEof {
        /// The number of bytes the caller asked for.
        requested: usize,
        /// The number of bytes assembled before the stream ran dry.
        fetched: usize,
    },

    /// The reader was constructed with a zero buffer capacity.
    InvalidCapacity,

    /// An I/O error occurred while reading from or closing the source.
    Io(std::io::Error),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Exhausted => write!(f, "source exhausted"),
            ReadError::UnexpectedEof { requested, fetched } => {
                write!(
                    f,
                    "unexpected end of stream: requested {} bytes, got {}",
                    requested, fetched
                )
            }
            ReadError::InvalidCapacity => {
                write!(f, "buffer capacity must be non-zero")
            }
            ReadError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReadError {
    fn from(e: std::io::Error) -> Self {
        ReadError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "test");
        let err: ReadError = io_err.into();
        assert!(matches!(err, ReadError::Io(_)));
    }

    #[test]
    fn test_display() {
        let err = ReadError::UnexpectedEof {
            requested: 7,
            fetched: 5,
        };
        assert!(err.to_string().contains("requested 7 bytes, got 5"));

        assert!(ReadError::Exhausted.to_string().contains("exhausted"));
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err = ReadError::from(std::io::Error::other("inner"));
        assert!(err.source().is_some());
        assert!(ReadError::Exhausted.source().is_none());
    }
}
