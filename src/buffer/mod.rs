//! The reader's single reusable backing allocation.
//!
//! One fixed-capacity byte region is shared between a reader and every
//! direct view it has handed out. The region is overwritten in place on
//! each refill; a generation counter records every overwrite so views can
//! tell whether the bytes they were cut from are still present. This module
//! is an implementation detail and not part of the public API.

use std::cell::RefCell;
use std::rc::Rc;

/// Fixed-capacity backing storage plus its fill generation.
///
/// The storage is allocated once at construction and never grows or moves.
/// `generation` advances on every overwrite: a fill that rewrote any of the
/// storage, or a reset that discards the buffered epoch.
pub(crate) struct BufferState {
    storage: Box<[u8]>,
    generation: u64,
}

/// Handle shared between the reader and its outstanding direct views.
pub(crate) type SharedBuffer = Rc<RefCell<BufferState>>;

impl BufferState {
    pub(crate) fn shared(capacity: usize) -> SharedBuffer {
        Rc::new(RefCell::new(Self {
            storage: vec![0u8; capacity].into_boxed_slice(),
            generation: 0,
        }))
    }

    pub(crate) fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn advance_generation(&mut self) {
        self.generation += 1;
    }

    /// The `len` bytes of storage starting at `start`.
    pub(crate) fn window(&self, start: usize, len: usize) -> &[u8] {
        &self.storage[start..start + len]
    }

    pub(crate) fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.storage
    }
}
