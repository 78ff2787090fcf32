//! Byte views handed out by the reader.
//!
//! A [`ByteView`] is either *direct* or *owned*:
//!
//! - A **direct** view is a zero-copy window into the reader's buffer. It is
//!   valid exactly until the next refill overwrites the backing storage;
//!   after that it reads the newly fetched bytes at the same offsets and
//!   reports [`ByteView::is_stale`].
//! - An **owned** view carries independent storage and is safe to keep for
//!   any length of time.
//!
//! The reader can promote a direct view to owned in place, through the
//! shared slot both sides hold. The caller's handle observes no change in
//! value, only a change in what it depends on.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bytes::Bytes;

use crate::buffer::SharedBuffer;

/// The two representations a view can be in.
///
/// Direct views remember the fill generation they were cut from, so a
/// mismatch against the buffer's current generation identifies staleness.
pub(crate) enum ViewRepr {
    Direct {
        buffer: SharedBuffer,
        start: usize,
        len: usize,
        generation: u64,
    },
    Owned(Bytes),
}

/// The slot a view's representation lives in, shared between the caller's
/// handle and the reader's outstanding set so promotion can rewrite it.
pub(crate) type ViewSlot = Rc<RefCell<ViewRepr>>;

/// Rewrites a direct slot to an owned copy of its current window.
///
/// A no-op on slots that are already owned.
pub(crate) fn promote(slot: &ViewSlot) {
    let mut repr = slot.borrow_mut();
    if let ViewRepr::Direct {
        buffer, start, len, ..
    } = &*repr
    {
        let owned = Bytes::copy_from_slice(buffer.borrow().window(*start, *len));
        *repr = ViewRepr::Owned(owned);
    }
}

/// A view of bytes returned by a reader.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use blobread::BlobReader;
///
/// let mut reader = BlobReader::new(Cursor::new(b"abcdef".to_vec()), 4)?;
///
/// let head = reader.read_n_bytes(2)?;
/// assert!(!head.is_owned());          // zero-copy window into the buffer
///
/// reader.clone_slices();              // promote before the buffer is reused
/// assert!(head.is_owned());
/// assert_eq!(head.to_vec(), b"ab");
/// # Ok::<(), blobread::ReadError>(())
/// ```
pub struct ByteView {
    slot: ViewSlot,
}

impl ByteView {
    pub(crate) fn direct(buffer: SharedBuffer, start: usize, len: usize) -> Self {
        let generation = buffer.borrow().generation();
        Self {
            slot: Rc::new(RefCell::new(ViewRepr::Direct {
                buffer,
                start,
                len,
                generation,
            })),
        }
    }

    pub(crate) fn owned(bytes: Bytes) -> Self {
        Self {
            slot: Rc::new(RefCell::new(ViewRepr::Owned(bytes))),
        }
    }

    /// A second handle on the slot, for the reader's outstanding set.
    pub(crate) fn slot(&self) -> ViewSlot {
        Rc::clone(&self.slot)
    }

    /// Returns the length of the view in bytes.
    pub fn len(&self) -> usize {
        match &*self.slot.borrow() {
            ViewRepr::Direct { len, .. } => *len,
            ViewRepr::Owned(bytes) => bytes.len(),
        }
    }

    /// Returns true if the view has no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the view carries independent storage.
    ///
    /// Owned views are safe across any number of refills. Direct views are
    /// only valid until the next overwrite of the buffer they alias.
    pub fn is_owned(&self) -> bool {
        matches!(&*self.slot.borrow(), ViewRepr::Owned(_))
    }

    /// Returns true if this is a direct view whose backing bytes have been
    /// overwritten since it was cut.
    ///
    /// Reading a stale view yields whatever the buffer currently holds at
    /// the view's offsets, not the original bytes. Callers that need the
    /// original value across refills must promote first, either through the
    /// reader's clone operation or by letting a spanning read do it.
    pub fn is_stale(&self) -> bool {
        match &*self.slot.borrow() {
            ViewRepr::Direct {
                buffer, generation, ..
            } => buffer.borrow().generation() != *generation,
            ViewRepr::Owned(_) => false,
        }
    }

    /// Calls `f` with the view's bytes, without copying.
    ///
    /// For a direct view this borrows the reader's buffer for the duration
    /// of the call; do not invoke reader operations from inside `f`.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        match &*self.slot.borrow() {
            ViewRepr::Direct {
                buffer, start, len, ..
            } => f(buffer.borrow().window(*start, *len)),
            ViewRepr::Owned(bytes) => f(bytes),
        }
    }

    /// Returns the view's bytes as [`Bytes`].
    ///
    /// Cheap for owned views (a reference-counted clone); copies for direct
    /// views.
    pub fn to_bytes(&self) -> Bytes {
        match &*self.slot.borrow() {
            ViewRepr::Direct {
                buffer, start, len, ..
            } => Bytes::copy_from_slice(buffer.borrow().window(*start, *len)),
            ViewRepr::Owned(bytes) => bytes.clone(),
        }
    }

    /// Copies the view's bytes into a fresh vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.with_bytes(|bytes| bytes.to_vec())
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_bytes(|bytes| f.debug_tuple("ByteView").field(&bytes).finish())
    }
}

impl PartialEq<[u8]> for ByteView {
    fn eq(&self, other: &[u8]) -> bool {
        self.with_bytes(|bytes| bytes == other)
    }
}

impl PartialEq<&[u8]> for ByteView {
    fn eq(&self, other: &&[u8]) -> bool {
        self.with_bytes(|bytes| bytes == *other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferState;

    fn filled_buffer(content: &[u8]) -> SharedBuffer {
        let shared = BufferState::shared(content.len());
        shared.borrow_mut().storage_mut().copy_from_slice(content);
        shared
    }

    #[test]
    fn test_direct_view_reads_window() {
        let shared = filled_buffer(b"abcd");
        let view = ByteView::direct(Rc::clone(&shared), 1, 2);

        assert_eq!(view.len(), 2);
        assert!(!view.is_owned());
        assert!(!view.is_stale());
        assert_eq!(view.to_vec(), b"bc");
    }

    #[test]
    fn test_direct_view_goes_stale_on_overwrite() {
        let shared = filled_buffer(b"abcd");
        let view = ByteView::direct(Rc::clone(&shared), 0, 2);

        shared.borrow_mut().storage_mut().copy_from_slice(b"wxyz");
        shared.borrow_mut().advance_generation();

        assert!(view.is_stale());
        assert_eq!(view.to_vec(), b"wx");
    }

    #[test]
    fn test_promotion_preserves_value() {
        let shared = filled_buffer(b"abcd");
        let view = ByteView::direct(Rc::clone(&shared), 1, 2);

        promote(&view.slot());
        assert!(view.is_owned());

        shared.borrow_mut().storage_mut().copy_from_slice(b"wxyz");
        shared.borrow_mut().advance_generation();

        assert!(!view.is_stale());
        assert_eq!(view.to_vec(), b"bc");
    }

    #[test]
    fn test_promotion_is_idempotent() {
        let view = ByteView::owned(Bytes::from_static(b"hi"));
        promote(&view.slot());
        assert_eq!(view.to_vec(), b"hi");
    }

    #[test]
    fn test_empty_view() {
        let view = ByteView::owned(Bytes::new());
        assert!(view.is_empty());
        assert!(view.is_owned());
        assert_eq!(view.to_vec(), b"");
    }

    #[test]
    fn test_eq_slice() {
        let view = ByteView::owned(Bytes::from_static(b"bc"));
        assert_eq!(view, b"bc"[..]);
        assert_eq!(view, &b"bc"[..]);
    }

    #[test]
    fn test_to_bytes() {
        let shared = filled_buffer(b"abcd");
        let direct = ByteView::direct(Rc::clone(&shared), 0, 3);
        assert_eq!(direct.to_bytes(), Bytes::from_static(b"abc"));

        let owned = ByteView::owned(Bytes::from_static(b"abc"));
        assert_eq!(owned.to_bytes(), Bytes::from_static(b"abc"));
    }
}
