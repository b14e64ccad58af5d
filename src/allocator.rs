//! Allocator contract (§4.A).
//!
//! `layout_for` fixes every allocation at `align_of::<u8>() = 1`, so only a
//! genuine `Vec<u8>` can be reconstructed from an [`Allocator`]-sourced
//! pointer without risking a layout mismatch. In practice that means
//! [`crate::storage::VectorStore`]'s `codes` buffer: the vector store's
//! backing bytes route through an [`Allocator`] trait object instead of
//! going straight to the global allocator, so a host can swap in an arena or
//! pool allocator per index instance without any process-wide effect, and
//! get a typed [`Error::OutOfMemory`](crate::Error::OutOfMemory) instead of
//! an abort on failure. Components whose backing storage isn't a `Vec<u8>`
//! (the graph store's neighbor arenas, Elias-Fano's bit arrays, the
//! visited-list stamp buffer) allocate through the global allocator directly
//! rather than forcing their typed `Vec`s through this align-1 contract.

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::Error;

/// Uniform allocate/deallocate/reallocate contract.
///
/// Implementations must be safe to call concurrently from multiple threads;
/// the index never synchronizes around calls into the allocator.
pub trait Allocator: fmt::Debug + Send + Sync {
    /// Allocate `size` bytes, zero-initialized. Returns `None` on failure.
    fn allocate(&self, size: usize) -> Option<NonNull<u8>>;

    /// Free a block previously returned by `allocate`/`reallocate` with the same `size`.
    ///
    /// # Safety
    /// `ptr` must have been obtained from this allocator with the given `size`,
    /// and must not be used after this call.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize);

    /// Grow or shrink a block in place where possible, otherwise move it.
    ///
    /// # Safety
    /// `ptr` must have been obtained from this allocator with `old_size`.
    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_size: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>>;
}

/// Default allocator delegating to Rust's global allocator (`std::alloc`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

fn layout_for(size: usize) -> Layout {
    // `u8` alignment so that `alloc_vec`'s `Vec::from_raw_parts` round-trips
    // through the global allocator's own deallocation path without a layout
    // mismatch; callers needing wider alignment (SIMD lanes) cast through
    // `bytemuck` at the point of use instead of over-aligning the backing buffer.
    Layout::from_size_align(size.max(1), std::mem::align_of::<u8>()).expect("size overflow")
}

impl Allocator for SystemAllocator {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        let layout = layout_for(size);
        // SAFETY: layout has non-zero size by construction.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        NonNull::new(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        let layout = layout_for(size);
        alloc::dealloc(ptr.as_ptr(), layout);
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_size: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>> {
        let old_layout = layout_for(old_size);
        let raw = alloc::realloc(ptr.as_ptr(), old_layout, new_size.max(1));
        NonNull::new(raw)
    }
}

/// Shared handle to an allocator, cloned cheaply into every component that needs one.
pub type AllocatorHandle = Arc<dyn Allocator>;

/// Build the default system-backed allocator handle.
#[must_use]
pub fn system_allocator() -> AllocatorHandle {
    Arc::new(SystemAllocator)
}

/// Allocate a zeroed byte buffer through `alloc`, surfacing [`Error::OutOfMemory`]
/// instead of panicking. Most call sites just want a `Vec<u8>` and don't need to
/// hold onto the raw pointer, so this is the ergonomic entry point most components use.
pub fn alloc_vec(alloc: &dyn Allocator, size: usize) -> Result<Vec<u8>, Error> {
    let ptr = alloc.allocate(size).ok_or(Error::OutOfMemory)?;
    // SAFETY: `ptr` was just allocated with exactly `size` bytes, zeroed.
    let vec = unsafe { Vec::from_raw_parts(ptr.as_ptr(), size, size) };
    Ok(vec)
}
