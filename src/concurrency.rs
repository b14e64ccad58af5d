//! Concurrency discipline (§4.K, §5).
//!
//! Two primitives cover the whole model:
//!
//! - [`Topology`]: a single `parking_lot::RwLock` over the structural fields that
//!   cannot be protected per-vertex (entry point, label-table tail, layer count).
//!   `add` takes it exclusively for two short critical sections; `search` takes
//!   it shared for the whole query.
//! - [`LockStripe`]: a fixed-size array of `parking_lot::RwLock<()>`, keyed by
//!   `inner_id as usize % N_LOCKS`, guarding external access to one vertex's
//!   neighbor slot. Keyed by id, not by pointer identity, per the §9 guidance —
//!   the lock's identity must not move when the graph store resizes its arena.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::label::InnerId;

/// Number of stripes in the per-vertex lock array. A power of two so the
/// modulo reduces to a mask; 2^16 matches the example count in §5.
pub const N_LOCKS: usize = 1 << 16;

/// Structural, index-wide fields that aren't safe to shard per-vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyState {
    /// Current global entry point, if any vertex has been inserted.
    pub entry_point: Option<(InnerId, u16)>,
    /// Number of layers currently allocated (`entry_point`'s level + 1, or 0).
    pub layer_count: u16,
    /// Number of labels registered so far (the label-table tail).
    pub label_count: u32,
}

impl Default for TopologyState {
    fn default() -> Self {
        Self {
            entry_point: None,
            layer_count: 0,
            label_count: 0,
        }
    }
}

/// The single shared/exclusive lock protecting [`TopologyState`].
#[derive(Debug, Default)]
pub struct Topology {
    state: RwLock<TopologyState>,
}

impl Topology {
    /// Create a topology lock in its empty-index state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the shared lock for the duration of a query.
    pub fn read(&self) -> RwLockReadGuard<'_, TopologyState> {
        self.state.read()
    }

    /// Take the exclusive lock for a short structural update (id assignment,
    /// entry-point upgrade, layer growth).
    pub fn write(&self) -> RwLockWriteGuard<'_, TopologyState> {
        self.state.write()
    }

    /// Snapshot the current state without holding the lock afterward.
    #[must_use]
    pub fn snapshot(&self) -> TopologyState {
        *self.state.read()
    }
}

/// Fixed-size array of per-vertex reader/writer locks, keyed by `InnerId mod N_LOCKS`.
///
/// These locks guard *access* to a vertex's neighbor slot; the slot's bytes
/// live in the graph store's own arena, not inside this struct, so resizing
/// the graph never invalidates a lock a caller is holding.
#[derive(Debug)]
pub struct LockStripe {
    locks: Vec<RwLock<()>>,
}

impl LockStripe {
    /// Build a stripe of `N_LOCKS` independent locks.
    #[must_use]
    pub fn new() -> Self {
        let mut locks = Vec::with_capacity(N_LOCKS);
        locks.resize_with(N_LOCKS, || RwLock::new(()));
        Self { locks }
    }

    fn index_of(&self, id: InnerId) -> usize {
        (id as usize) % self.locks.len()
    }

    /// Take the read lock guarding `id`'s neighbor slot.
    pub fn read(&self, id: InnerId) -> RwLockReadGuard<'_, ()> {
        self.locks[self.index_of(id)].read()
    }

    /// Take the write lock guarding `id`'s neighbor slot.
    ///
    /// Mutual-connect acquires exactly one vertex lock at a time (never two
    /// nested), so this stripe can never deadlock against itself.
    pub fn write(&self, id: InnerId) -> RwLockWriteGuard<'_, ()> {
        self.locks[self.index_of(id)].write()
    }
}

impl Default for LockStripe {
    fn default() -> Self {
        Self::new()
    }
}

/// An optional deadline probe threaded through long-running searches.
///
/// Checked between visited-list updates (§5 "Cancellation / timeouts"); past
/// the deadline, a search returns whatever partial heap it had accumulated
/// rather than an error.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: std::time::Instant,
}

impl Deadline {
    /// Build a deadline `timeout` in the future from now.
    #[must_use]
    pub fn after(timeout: std::time::Duration) -> Self {
        Self {
            expires_at: std::time::Instant::now() + timeout,
        }
    }

    /// True once the deadline has passed.
    #[must_use]
    pub fn expired(&self) -> bool {
        std::time::Instant::now() >= self.expires_at
    }
}
