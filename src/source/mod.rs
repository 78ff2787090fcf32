//! The byte-source interface the reader pulls from.
//!
//! A source is any sequential, closable byte stream, typically a wrapper
//! around an object-storage download. Reading semantics come straight from
//! [`std::io::Read`]: a call fills as much of the destination as is
//! available, may return fewer bytes than requested on a non-final call,
//! and returns `Ok(0)` once the stream is exhausted.
//!
//! Seeking is deliberately not part of the interface. The reader never
//! rewinds, so sources that only support sequential reads are fully
//! sufficient; a seek capability on the concrete type is simply never
//! exercised.

use std::io::{self, Read};

/// A sequential, closable byte stream.
///
/// Implementors provide reading through the [`Read`] supertrait and add an
/// explicit close operation. The reader owning a source calls `close`
/// exactly once, from its own close.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use blobread::SourceStream;
///
/// let mut source = Cursor::new(b"abc".to_vec());
/// let mut buf = [0u8; 8];
/// let n = std::io::Read::read(&mut source, &mut buf).unwrap();
/// assert_eq!(&buf[..n], b"abc");
/// source.close().unwrap();
/// ```
pub trait SourceStream: Read {
    /// Releases the underlying handle.
    ///
    /// Called exactly once by the owning reader. Reading after close is not
    /// supported.
    fn close(&mut self) -> io::Result<()>;
}

/// The OS handle is released when the file is dropped; close has nothing
/// extra to flush for a read-only stream.
impl SourceStream for std::fs::File {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: AsRef<[u8]>> SourceStream for io::Cursor<T> {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_source() {
        let mut source = io::Cursor::new(b"hello".to_vec());
        let mut buf = [0u8; 3];

        assert_eq!(source.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"hel");
        assert_eq!(source.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"lo");
        assert_eq!(source.read(&mut buf).unwrap(), 0);
        assert!(source.close().is_ok());
    }
}
