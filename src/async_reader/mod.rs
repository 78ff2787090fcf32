//! Async mirror of the synchronous reader.
//!
//! This module provides buffered exact-length reading over a
//! `futures_io::AsyncRead` source, making it runtime-agnostic and
//! compatible with tokio, async-std, smol, and other async runtimes.
//! Semantics are identical to [`BlobReader`](crate::BlobReader): same
//! buffer discipline, same view kinds, same exhaustion protocol. Only the
//! operations that touch the source are async.
//!
//! The reader is not `Send`; like its sync sibling it serves one logical
//! scan on one thread. Run it on a current-thread executor. A direct view
//! read while a refill of the same reader is parked at an await panics,
//! the same contract violation as reading one across a sync refill.
//!
//! # Example
//!
//! ```ignore
//! use blobread::AsyncBlobReader;
//! use futures_io::AsyncRead;
//!
//! async fn demo<R: AsyncRead + Unpin>(source: R) -> Result<(), blobread::ReadError> {
//!     let mut reader = AsyncBlobReader::new(source, 64 * 1024).await?;
//!
//!     let header = reader.read_n_bytes(16).await?;
//!     println!("header: {} bytes", header.len());
//!     Ok(())
//! }
//! ```
//!
//! For tokio sources, convert with `tokio_util::compat`:
//!
//! ```ignore
//! use tokio_util::compat::TokioAsyncReadCompatExt;
//!
//! let file = tokio::fs::File::open("part-00000").await?;
//! let reader = AsyncBlobReader::new(file.compat(), 64 * 1024).await?;
//! ```

use std::future::poll_fn;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures_io::AsyncRead;

use crate::error::ReadError;
use crate::reader::core::ReaderCore;
use crate::view::ByteView;

/// A buffered async reader over a sequential byte source.
///
/// See [`BlobReader`](crate::BlobReader) for the shared semantics. Closing
/// is by release here: [`AsyncBlobReader::into_inner`] hands the source
/// back for whatever shutdown it needs, since `AsyncRead` itself carries no
/// close operation.
pub struct AsyncBlobReader<R: AsyncRead + Unpin> {
    source: R,
    core: ReaderCore,
}

impl<R: AsyncRead + Unpin> AsyncBlobReader<R> {
    /// Creates a reader over `source` with the given buffer capacity and
    /// performs one initial refill.
    ///
    /// An empty source yields a valid, immediately exhausted reader.
    ///
    /// # Errors
    ///
    /// [`ReadError::InvalidCapacity`] if `capacity` is zero,
    /// [`ReadError::Io`] if the initial refill fails with a genuine I/O
    /// error.
    pub async fn new(source: R, capacity: usize) -> Result<Self, ReadError> {
        let core = ReaderCore::new(capacity)?;
        let mut reader = Self { source, core };
        match reader.refill().await {
            Ok(()) | Err(ReadError::Exhausted) => Ok(reader),
            Err(e) => Err(e),
        }
    }

    /// Fixed buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Unconsumed bytes remaining in the buffer.
    pub fn buffered(&self) -> usize {
        self.core.buffered()
    }

    /// True once the buffer is fully consumed and a refill has observed the
    /// source running dry.
    pub fn eof(&self) -> bool {
        self.core.eof()
    }

    /// Replaces the buffer contents with the next bytes from the source.
    ///
    /// Same contract as [`BlobReader::refill`](crate::BlobReader::refill):
    /// pulls until full or end of stream, invalidates outstanding direct
    /// views on success, and fails with a sticky
    /// [`ReadError::Exhausted`] once the source has nothing left, leaving
    /// buffered bytes intact.
    pub async fn refill(&mut self) -> Result<(), ReadError> {
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
                let source = &mut self.source;
                let result = poll_fn(|cx| {
                    Pin::new(&mut *source).poll_read(cx, &mut storage[filled..])
                })
                .await;
                match result {
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
    /// # Panics
    ///
    /// If `n` exceeds [`AsyncBlobReader::buffered`].
    pub fn next(&mut self, n: usize) -> ByteView {
        self.core.next(n)
    }

    /// Returns exactly `n` bytes, refilling as needed.
    ///
    /// Same contract as
    /// [`BlobReader::read_n_bytes`](crate::BlobReader::read_n_bytes):
    /// buffered requests come back as direct views, spanning requests
    /// promote all outstanding views and come back as owned copies, and a
    /// stream that runs dry mid-assembly fails with
    /// [`ReadError::UnexpectedEof`] rather than returning short.
    pub async fn read_n_bytes(&mut self, n: usize) -> Result<ByteView, ReadError> {
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
            match self.refill().await {
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
    /// copy and clears the outstanding set. Idempotent.
    pub fn clone_slices(&mut self) {
        self.core.promote_outstanding();
    }

    /// Discards all buffered state without touching the source.
    pub fn reset(&mut self) {
        self.core.reset();
    }

    /// Releases the source for shutdown, consuming the reader.
    pub fn into_inner(self) -> R {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::task::{Context, Poll};

    /// Serves at most `max_read` bytes per poll, so fills take several
    /// reads and spanning requests take several refills.
    struct ChunkedSource {
        data: Vec<u8>,
        pos: usize,
        max_read: usize,
    }

    impl ChunkedSource {
        fn new(data: &[u8], max_read: usize) -> Self {
            Self {
                data: data.to_vec(),
                pos: 0,
                max_read,
            }
        }
    }

    impl AsyncRead for ChunkedSource {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut [u8],
        ) -> Poll<io::Result<usize>> {
            let this = &mut *self;
            if this.pos >= this.data.len() {
                return Poll::Ready(Ok(0));
            }
            let n = buf
                .len()
                .min(this.max_read)
                .min(this.data.len() - this.pos);
            buf[..n].copy_from_slice(&this.data[this.pos..this.pos + n]);
            this.pos += n;
            Poll::Ready(Ok(n))
        }
    }

    #[tokio::test]
    async fn test_basic_protocol() {
        let mut reader = AsyncBlobReader::new(&b"abcde"[..], 3).await.unwrap();

        let x = reader.next(1);
        assert_eq!(x.to_vec(), b"a");
        assert_eq!(reader.next(2).to_vec(), b"bc");

        reader.refill().await.unwrap();
        assert!(!reader.eof());
        assert!(matches!(
            reader.refill().await,
            Err(ReadError::Exhausted)
        ));
        assert!(!reader.eof());
        reader.next(2);
        assert!(reader.eof());
    }

    #[tokio::test]
    async fn test_spanning_read_is_owned() {
        let mut reader = AsyncBlobReader::new(&b"abcde"[..], 3).await.unwrap();
        let all = reader.read_n_bytes(5).await.unwrap();
        assert!(all.is_owned());
        assert_eq!(all.to_vec(), b"abcde");

        assert!(matches!(
            reader.read_n_bytes(1).await,
            Err(ReadError::UnexpectedEof { .. })
        ));
    }

    #[tokio::test]
    async fn test_interleaved_direct_and_spanning() {
        let mut reader = AsyncBlobReader::new(&b"0123456789"[..], 1).await.unwrap();

        let y1 = reader.read_n_bytes(1).await.unwrap();
        let y2 = reader.read_n_bytes(2).await.unwrap();
        let y3 = reader.read_n_bytes(1).await.unwrap();
        let y4 = reader.read_n_bytes(2).await.unwrap();

        assert_eq!(y1.to_vec(), b"0");
        assert_eq!(y2.to_vec(), b"12");
        assert_eq!(y3.to_vec(), b"3");
        assert_eq!(y4.to_vec(), b"45");
    }

    #[tokio::test]
    async fn test_chunked_source_fills_buffer() {
        let source = ChunkedSource::new(b"abcdefgh", 2);
        let mut reader = AsyncBlobReader::new(source, 5).await.unwrap();

        // Three polls (2 + 2 + 1) behind one refill.
        assert_eq!(reader.buffered(), 5);
        assert_eq!(reader.read_n_bytes(8).await.unwrap().to_vec(), b"abcdefgh");
        assert!(reader.eof());
    }

    #[tokio::test]
    async fn test_clone_slices_preserves_views() {
        let mut reader = AsyncBlobReader::new(&b"0123456789"[..], 4).await.unwrap();
        let y1 = reader.read_n_bytes(2).await.unwrap();

        reader.clone_slices();
        reader.refill().await.unwrap();

        assert_eq!(y1.to_vec(), b"01");
        assert!(!y1.is_stale());
    }

    #[tokio::test]
    async fn test_into_inner_releases_source() {
        let reader = AsyncBlobReader::new(&b"abc"[..], 2).await.unwrap();
        let rest = reader.into_inner();
        assert_eq!(rest, b"c");
    }
}
