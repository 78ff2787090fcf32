//! blobread
//!
//! Buffered exact-length byte reading for Rust.
//!
//! `blobread` sits between a large sequential scan (a bulk import, an
//! external merge-sort) and a slow, range-unfriendly byte source such as an
//! object-storage stream. It pulls the source in buffer-sized gulps and
//! hands scanning code views into the fetched bytes:
//!
//! - requests that fit in the buffer are served zero-copy
//! - requests that span a refill come back as independently owned copies
//! - exact-length semantics: a read returns all `n` bytes or a distinct
//!   exhaustion error, never a silent short result
//! - outstanding zero-copy views can be promoted to owned copies on demand,
//!   and are promoted automatically before the reader refills on its own
//!
//! The crate intentionally:
//! - does NOT seek or read ranges
//! - does NOT decode any record format
//! - does NOT retry network failures
//! - does NOT coordinate concurrent readers
//!
//! It only does one thing: **turn a slow byte stream into cheap views**
//!
//! # Sync
//!
//! ```no_run
//! use std::fs::File;
//! use blobread::{BlobReader, ReadError};
//!
//! fn main() -> Result<(), ReadError> {
//!     let file = File::open("part-00000.sst")?;
//!     let mut reader = BlobReader::with_default_buffer(file)?;
//!
//!     while !reader.eof() {
//!         let record = reader.read_n_bytes(128)?;
//!         record.with_bytes(|bytes| println!("record {} bytes", bytes.len()));
//!     }
//!     reader.close()
//! }
//! ```
//!
//! # Async (feature = "async-io")
//!
//! ```ignore
//! use blobread::AsyncBlobReader;
//! use futures_io::AsyncRead;
//!
//! async fn demo<R: AsyncRead + Unpin>(source: R) -> Result<(), blobread::ReadError> {
//!     let mut reader = AsyncBlobReader::new(source, 64 * 1024).await?;
//!
//!     while !reader.eof() {
//!         let record = reader.read_n_bytes(128).await?;
//!         println!("record {} bytes", record.len());
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod reader;
mod source;
mod view;

mod buffer; // internal (shared backing storage)

#[cfg(feature = "async-io")]
mod async_reader;

//
// Public surface (intentionally tiny)
//

pub use error::ReadError;
pub use reader::{BlobReader, DEFAULT_READ_BUFFER_SIZE};
pub use source::SourceStream;
pub use view::ByteView;

#[cfg(feature = "async-io")]
pub use async_reader::AsyncBlobReader;
