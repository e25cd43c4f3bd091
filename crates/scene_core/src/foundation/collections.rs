//! Specialized collection types

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable handle to a node in a [`TransformHierarchy`](crate::scene::TransformHierarchy)
    ///
    /// Handles are generational: a handle to a destroyed node never aliases a
    /// node created later in the same slot.
    pub struct NodeHandle;
}

/// Handle-based map keyed by [`NodeHandle`]
pub type NodeMap<T> = SlotMap<NodeHandle, T>;

/// Monotonic identifier allocator
///
/// Owned by whoever hands out identifiers (typically the scene), never global.
/// Identifiers are not reused after release.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    /// Create an allocator starting at zero
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Create an allocator whose first identifier is `first`
    pub const fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    /// Hand out the next identifier
    ///
    /// # Panics
    /// Panics if the identifier space is exhausted.
    pub fn allocate(&mut self) -> u32 {
        let id = self.next;
        self.next = self
            .next
            .checked_add(1)
            .unwrap_or_else(|| panic!("IdAllocator exhausted after {id}"));
        id
    }

    /// Identifier the next call to [`allocate`](Self::allocate) returns
    pub const fn peek_next(&self) -> u32 {
        self.next
    }
}
