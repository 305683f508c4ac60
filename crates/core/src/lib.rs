#![warn(missing_docs)]
//! Core primitives shared across the workspace: paint order and reactive cells.

pub mod order;
pub mod signal;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use order::{
    compare_order_info, compare_render_items, resolve_order, ElementType, InstancedGroupKey,
    OrderInfo, OrderResolver, RenderItem, RootDistance, ZIndexOffset, MAX_BIASED_MAJOR_INDEX,
    MAX_BIASED_MINOR_INDEX,
};
pub use signal::{Signal, Subscription};

/// Stable identity of a UI element.
///
/// Used as the final, deterministic tie-break when two elements share a paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl ElementId {
    /// Placeholder identity for elements that are not registered anywhere.
    pub const DETACHED: Self = Self(0);

    /// Next identity in a monotonically increasing sequence.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}
