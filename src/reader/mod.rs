//! The synchronous buffered reader.
//!
//! [`BlobReader`] sits between scanning code and a slow sequential byte
//! source, pulling the source in buffer-sized gulps and handing out views
//! into the fetched bytes. Reads that fit in the buffer are zero-copy;
//! reads that span a refill are assembled into independently owned copies.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use blobread::BlobReader;
//!
//! let source = Cursor::new(b"key\x00value".to_vec());
//! let mut reader = BlobReader::new(source, 4)?;
//!
//! let key = reader.read_n_bytes(3)?;       // served from the buffer
//! let rest = reader.read_n_bytes(6)?;      // spans a refill, owned copy
//!
//! assert_eq!(key.to_vec(), b"key");
//! assert_eq!(rest.to_vec(), b"\x00value");
//! assert!(reader.eof());
//! reader.close()?;
//! # Ok::<(), blobread::ReadError>(())
//! ```

pub(crate) mod core;

use bytes::{Bytes, BytesMut};

use crate::error::ReadError;
use crate::reader::core::ReaderCore;
use crate::source::SourceStream;
use crate::view::ByteView;

/// Default buffer capacity for [`BlobReader::with_default_buffer`].
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024; // 64 KiB

/// A buffered reader over a sequential byte source.
///
/// The reader owns one fixed-capacity buffer, refilled in place from the
/// source. [`BlobReader::next`] and buffer-sized [`BlobReader::read_n_bytes`]
/// calls return direct views that alias the buffer and stay valid until the
/// next refill; spanning reads return owned copies that are safe forever.
/// [`BlobReader::clone_slices`] promotes every outstanding direct view to an
/// owned copy, which is the only way such a view survives an explicit
/// refill.
///
/// One reader serves exactly one logical scan at a time; there is no
/// internal locking and no seeking.
pub struct BlobReader<S: SourceStream> {
    source: S,
    core: ReaderCore,
}

impl<S: SourceStream> BlobReader<S> {
    /// Creates a reader over `source` with the given buffer capacity and
    /// performs one initial refill.
    ///
    /// An empty source yields a valid, immediately exhausted reader; only a
    /// zero `capacity` or a hard I/O error fails construction.
    ///
    /// # Errors
    ///
    /// [`ReadError::InvalidCapacity`] if `capacity` is zero,
    /// [`ReadError::Io`] if the initial refill fails with a genuine I/O
    /// error.
    pub fn new(source: S, capacity: usize) -> Result<Self, ReadError> {
        let core = ReaderCore::new(capacity)?;
        let mut reader = Self { source, core };
        match reader.refill() {
            Ok(()) | Err(ReadError::Exhausted) => Ok(reader),
            Err(e) => Err(e),
        }
    }

    /// Creates a reader with [`DEFAULT_READ_BUFFER_SIZE`] of buffer.
    pub fn with_default_buffer(source: S) -> Result<Self, ReadError> {
        Self::new(source, DEFAULT_READ_BUFFER_SIZE)
    }

    /// Fixed buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Unconsumed bytes remaining in the buffer. [`BlobReader::next`] may
    /// take up to this many without further I/O.
    pub fn buffered(&self) -> usize {
        self.core.buffered()
    }

    /// True once the buffer is fully consumed and a refill has observed the
    /// source running dry. False whenever unconsumed bytes remain, even
    /// right after a failed refill.
    pub fn eof(&self) -> bool {
        self.core.eof()
    }

    /// Replaces the buffer contents with the next bytes from the source and
    /// rewinds the consumption cursor.
    ///
    /// Pulls until the buffer is full or the source reports end of stream;
    /// the final fill of a stream may be shorter than the capacity. Any
    /// direct view handed out earlier is invalidated by a successful
    /// refill; promote through [`BlobReader::clone_slices`] first if its
    /// value must survive.
    ///
    /// # Errors
    ///
    /// [`ReadError::Exhausted`] if no bytes at all were available, with the
    /// buffer and cursor left untouched so already-buffered bytes stay
    /// readable. Exhaustion is sticky until [`BlobReader::reset`].
    /// [`ReadError::Io`] on a hard source failure; the reader should be
    /// closed afterwards.
    pub fn refill(&mut self) -> Result<(), ReadError> {
        if self.core.is_exhausted() {
            return Err(ReadError::Exhausted);
        }
        let shared = self.core.shared();
        let mut filled = 0;
        let mut failure = None;
        {
            let mut state = shared.borrow_mut();
            let storage = state.storage_mut();
            while filled < storage.len() {
                match self.source.read(&mut storage[filled..]) {
                    Ok(0) => {
                        self.core.mark_exhausted();
                        break;
                    }
                    Ok(n) => filled += n,
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
        }
        if let Some(e) = failure {
            // The aborted fill may have rewritten part of the storage;
            // record the overwrite so direct views report stale.
            if filled > 0 {
                shared.borrow_mut().advance_generation();
            }
            return Err(ReadError::Io(e));
        }
        self.core.complete_fill(filled)
    }

    /// Returns a direct view of exactly `n` unconsumed bytes and advances
    /// past them. Performs no I/O.
    ///
    /// The low-level primitive for pull-style callers that drive their own
    /// refill cadence: consume up to [`BlobReader::buffered`] bytes, call
    /// [`BlobReader::refill`], repeat. The view is registered for later
    /// promotion by [`BlobReader::clone_slices`] or a spanning read.
    ///
    /// # Panics
    ///
    /// If `n` exceeds [`BlobReader::buffered`].
    pub fn next(&mut self, n: usize) -> ByteView {
        self.core.next(n)
    }

    /// Returns exactly `n` bytes, refilling as needed.
    ///
    /// Requests that fit in the buffered remainder are served as direct
    /// views with no I/O. A request that spans beyond it first promotes
    /// every outstanding direct view, so the refills performed here never
    /// corrupt results already returned, and then assembles an owned copy
    /// from the remainder plus one or more refills. `n == 0` returns an
    /// empty view.
    ///
    /// # Errors
    ///
    /// [`ReadError::UnexpectedEof`] if the source runs dry before `n` bytes
    /// are assembled; a short result is never returned. Bytes provisionally
    /// consumed into the abandoned assembly are gone, so the reader is done
    /// for exact-length reads past that point, though any bytes of the last
    /// short fill remain drainable through [`BlobReader::next`].
    /// [`ReadError::Io`] on a hard source failure.
    pub fn read_n_bytes(&mut self, n: usize) -> Result<ByteView, ReadError> {
        if n == 0 {
            return Ok(ByteView::owned(Bytes::new()));
        }
        if n <= self.core.buffered() {
            return Ok(self.core.next(n));
        }

        // Spanning read. Protect earlier results before any refill of ours.
        self.core.promote_outstanding();

        let mut assembled = BytesMut::with_capacity(n);
        self.core.drain_into(&mut assembled, n);
        while assembled.len() < n {
            match self.refill() {
                Ok(()) => {}
                Err(ReadError::Exhausted) => {
                    return Err(ReadError::UnexpectedEof {
                        requested: n,
                        fetched: assembled.len(),
                    });
                }
                Err(e) => return Err(e),
            }
            let remaining = n - assembled.len();
            self.core.drain_into(&mut assembled, remaining);
        }
        Ok(ByteView::owned(assembled.freeze()))
    }

    /// Promotes every outstanding direct view to an independently owned
    /// copy and clears the outstanding set.
    ///
    /// Each promoted handle keeps the value it had; it just stops depending
    /// on the buffer. Idempotent, and a no-op when nothing is outstanding.
    pub fn clone_slices(&mut self) {
        self.core.promote_outstanding();
    }

    /// Discards all buffered state: the buffer becomes empty, the
    /// exhaustion flag clears, and the outstanding set is dropped without
    /// promotion. The source is untouched, so reading resumes wherever the
    /// source left off.
    pub fn reset(&mut self) {
        self.core.reset();
    }

    /// Closes the underlying source and consumes the reader.
    ///
    /// # Errors
    ///
    /// [`ReadError::Io`] if the source's close fails.
    pub fn close(mut self) -> Result<(), ReadError> {
        self.source.close().map_err(ReadError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_zero_capacity_rejected() {
        let result = BlobReader::new(Cursor::new(b"abc".to_vec()), 0);
        assert!(matches!(result, Err(ReadError::InvalidCapacity)));
    }

    #[test]
    fn test_default_buffer_capacity() {
        let reader = BlobReader::with_default_buffer(Cursor::new(b"abc".to_vec())).unwrap();
        assert_eq!(reader.capacity(), DEFAULT_READ_BUFFER_SIZE);
    }

    #[test]
    fn test_initial_refill_fills_buffer() {
        let reader = BlobReader::new(Cursor::new(b"abcde".to_vec()), 3).unwrap();
        assert_eq!(reader.buffered(), 3);
        assert!(!reader.eof());
    }

    #[test]
    fn test_empty_source_is_immediately_exhausted() {
        let mut reader = BlobReader::new(Cursor::new(Vec::<u8>::new()), 3).unwrap();
        assert_eq!(reader.buffered(), 0);
        assert!(reader.eof());
        assert!(matches!(
            reader.read_n_bytes(1),
            Err(ReadError::UnexpectedEof {
                requested: 1,
                fetched: 0,
            })
        ));
    }

    #[test]
    fn test_zero_length_read() {
        let mut reader = BlobReader::new(Cursor::new(b"ab".to_vec()), 2).unwrap();
        let view = reader.read_n_bytes(0).unwrap();
        assert!(view.is_empty());
        assert_eq!(reader.buffered(), 2);
    }
}
