//! I/O-free reader state shared by the sync and async frontends.

use std::rc::Rc;

use bytes::BytesMut;

use crate::buffer::{BufferState, SharedBuffer};
use crate::error::ReadError;
use crate::view::{self, ByteView, ViewSlot};

/// Cursor, exhaustion, and outstanding-view bookkeeping over the shared
/// buffer. Everything here is synchronous and never touches the source;
/// the frontends own the source and drive fills through
/// [`ReaderCore::complete_fill`].
pub(crate) struct ReaderCore {
    shared: SharedBuffer,
    /// Bytes `[0, cursor)` of the current fill are consumed.
    cursor: usize,
    /// Valid length of the current fill, at most the capacity.
    limit: usize,
    /// Sticky until reset: a fill observed the source running dry.
    exhausted: bool,
    /// Direct views that still alias the buffer and have not been promoted.
    outstanding: Vec<ViewSlot>,
}

impl ReaderCore {
    pub(crate) fn new(capacity: usize) -> Result<Self, ReadError> {
        if capacity == 0 {
            return Err(ReadError::InvalidCapacity);
        }
        Ok(Self {
            shared: BufferState::shared(capacity),
            cursor: 0,
            limit: 0,
            exhausted: false,
            outstanding: Vec::new(),
        })
    }

    pub(crate) fn capacity(&self) -> usize {
        self.shared.borrow().capacity()
    }

    /// Unconsumed bytes remaining in the current fill.
    pub(crate) fn buffered(&self) -> usize {
        self.limit - self.cursor
    }

    pub(crate) fn eof(&self) -> bool {
        self.exhausted && self.cursor == self.limit
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub(crate) fn mark_exhausted(&mut self) {
        self.exhausted = true;
    }

    /// A second handle on the backing storage, for frontends to fill.
    pub(crate) fn shared(&self) -> SharedBuffer {
        Rc::clone(&self.shared)
    }

    /// Cuts a direct view of `n` bytes at the cursor, advances the cursor,
    /// and registers the view in the outstanding set.
    ///
    /// Panics if `n` exceeds [`ReaderCore::buffered`].
    pub(crate) fn next(&mut self, n: usize) -> ByteView {
        let available = self.buffered();
        assert!(
            n <= available,
            "next({n}) exceeds the {available} unconsumed buffered bytes"
        );
        let view = ByteView::direct(Rc::clone(&self.shared), self.cursor, n);
        self.cursor += n;
        self.outstanding.push(view.slot());
        view
    }

    /// Copies up to `want` unconsumed bytes into `out` and consumes them.
    /// Returns how many were taken. Creates no view.
    pub(crate) fn drain_into(&mut self, out: &mut BytesMut, want: usize) -> usize {
        let take = want.min(self.buffered());
        if take > 0 {
            let state = self.shared.borrow();
            out.extend_from_slice(state.window(self.cursor, take));
        }
        self.cursor += take;
        take
    }

    /// Promotes every outstanding direct view to an owned copy and clears
    /// the set. Idempotent.
    pub(crate) fn promote_outstanding(&mut self) {
        for slot in self.outstanding.drain(..) {
            view::promote(&slot);
        }
    }

    /// Records the outcome of a fill of the backing storage.
    ///
    /// Zero bytes means the source is exhausted; the current fill and
    /// cursor are left untouched so already-buffered bytes stay readable.
    /// Otherwise the fill becomes current: the generation advances and the
    /// cursor rewinds to the start.
    pub(crate) fn complete_fill(&mut self, filled: usize) -> Result<(), ReadError> {
        if filled == 0 {
            self.exhausted = true;
            return Err(ReadError::Exhausted);
        }
        self.shared.borrow_mut().advance_generation();
        self.limit = filled;
        self.cursor = 0;
        Ok(())
    }

    /// Returns to the initial empty, non-exhausted condition. Outstanding
    /// views are discarded without promotion; the buffered epoch they came
    /// from is gone, so the generation advances.
    pub(crate) fn reset(&mut self) {
        self.shared.borrow_mut().advance_generation();
        self.cursor = 0;
        self.limit = 0;
        self.exhausted = false;
        self.outstanding.clear();
    }
}
