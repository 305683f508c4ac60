//! Paint and hit-test ordering for UI elements.
//!
//! Every renderable element receives an [`OrderInfo`] derived from its parent's order,
//! its own [`ElementType`], an optional z-index style offset and the key of the
//! instancing batch it is drawn with. The resulting total order drives the transparent
//! sort of the rendering backend and the distance bias applied during hit-testing.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::ElementId;

/// Element tiers in the order they usually stack (panels are most likely the background).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum ElementType {
    /// Background panels, painted first.
    #[default]
    Panel = 0,
    /// Raster images.
    Image = 1,
    /// Arbitrary scene objects embedded in the UI.
    Object = 2,
    /// Custom meshes supplied by the application.
    Custom = 3,
    /// Vector graphics.
    Svg = 4,
    /// Text, painted last.
    Text = 5,
}

impl ElementType {
    /// Numeric tier used by the hit-test bias.
    pub fn tier(self) -> u8 {
        self as u8
    }
}

/// Key of an instancing batch.
///
/// Two keys are equal when they contain the same entries, regardless of whether they
/// share the underlying allocation.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstancedGroupKey(Arc<BTreeMap<String, String>>);

impl InstancedGroupKey {
    /// Create an empty key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add an entry.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        Arc::make_mut(&mut self.0).insert(key.into(), value.to_string());
        self
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the key has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for InstancedGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

/// Requested shift of an element's order, similar to a CSS z-index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZIndexOffset {
    /// Added to the major index when positive; also resets the minor index.
    pub major: i32,
    /// Added to the minor index.
    pub minor: i32,
}

impl ZIndexOffset {
    /// No offset.
    pub const NONE: Self = Self { major: 0, minor: 0 };

    /// Create an offset from both components.
    pub fn new(major: i32, minor: i32) -> Self {
        Self { major, minor }
    }
}

impl From<i32> for ZIndexOffset {
    fn from(major: i32) -> Self {
        Self { major, minor: 0 }
    }
}

/// Position of an element in the paint order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OrderInfo {
    /// Compositing / batching layer.
    pub major_index: i32,
    /// Tier of the element within its layer.
    pub element_type: ElementType,
    /// Sibling index within the layer.
    pub minor_index: i32,
    /// Instancing batch this element is drawn with.
    pub instanced_group: Option<InstancedGroupKey>,
}

/// Major index range the hit-test bias is calibrated for.
pub const MAX_BIASED_MAJOR_INDEX: i32 = 100;
/// Minor index range the hit-test bias is calibrated for.
pub const MAX_BIASED_MINOR_INDEX: i32 = 100;

impl OrderInfo {
    /// Whether the indices lie inside the ranges the hit-test bias can separate without
    /// colliding with neighbouring bands.
    pub fn within_hit_bias_range(&self) -> bool {
        (0..MAX_BIASED_MAJOR_INDEX).contains(&self.major_index)
            && (0..MAX_BIASED_MINOR_INDEX).contains(&self.minor_index)
    }

    /// Compare two orders (see [`compare_order_info`]).
    pub fn paint_cmp(&self, other: &Self) -> Ordering {
        compare_order_info(self, other)
    }
}

/// Total order over [`OrderInfo`]: major index, then element type, then minor index.
///
/// The instanced group does not participate; elements that tie here are separated by
/// [`compare_render_items`] using their identity.
pub fn compare_order_info(a: &OrderInfo, b: &OrderInfo) -> Ordering {
    a.major_index
        .cmp(&b.major_index)
        .then(a.element_type.cmp(&b.element_type))
        .then(a.minor_index.cmp(&b.minor_index))
}

/// Compute the order of an element.
///
/// The result depends only on the parent, so siblings of the same type and group tie.
/// Paint and hit-test sorting separate them by [`ElementId`], which grows with insertion.
pub fn resolve_order(
    parent: Option<&OrderInfo>,
    element_type: ElementType,
    offset: ZIndexOffset,
    instanced_group: Option<&InstancedGroupKey>,
) -> OrderInfo {
    let (mut major_index, mut minor_index) = match parent {
        None => (0, 0),
        Some(parent) if element_type > parent.element_type => (parent.major_index, 0),
        Some(parent)
            if element_type != parent.element_type
                || instanced_group != parent.instanced_group.as_ref() =>
        {
            (parent.major_index + 1, 0)
        }
        Some(parent) => (parent.major_index, parent.minor_index + 1),
    };

    if offset.major > 0 {
        major_index += offset.major;
        minor_index = 0;
    }
    minor_index += offset.minor;

    OrderInfo {
        major_index,
        element_type,
        minor_index,
        instanced_group: instanced_group.cloned(),
    }
}

type OrderCacheKey = (
    Option<OrderInfo>,
    ElementType,
    ZIndexOffset,
    Option<InstancedGroupKey>,
);

/// Memoizing front-end for [`resolve_order`].
pub struct OrderResolver {
    cache: LruCache<OrderCacheKey, OrderInfo>,
    hits: u64,
}

impl OrderResolver {
    /// Default number of memoized entries.
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Create a resolver with the default cache capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a resolver caching up to `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(cap),
            hits: 0,
        }
    }

    /// Resolve the order of an element, reusing a previous result for identical inputs.
    pub fn resolve(
        &mut self,
        parent: Option<&OrderInfo>,
        element_type: ElementType,
        offset: ZIndexOffset,
        instanced_group: Option<&InstancedGroupKey>,
    ) -> OrderInfo {
        let key = (
            parent.cloned(),
            element_type,
            offset,
            instanced_group.cloned(),
        );
        if let Some(cached) = self.cache.get(&key) {
            self.hits += 1;
            return cached.clone();
        }
        let order = resolve_order(parent, element_type, offset, instanced_group);
        self.cache.put(key, order.clone());
        order
    }

    /// Number of lookups answered from the cache.
    pub fn cache_hits(&self) -> u64 {
        self.hits
    }

    /// Number of memoized entries.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for OrderResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OrderResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderResolver")
            .field("cached", &self.cache.len())
            .field("hits", &self.hits)
            .finish()
    }
}

/// Camera distance shared by every element below one UI root.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootDistance {
    /// Identity of the root.
    pub root: ElementId,
    /// Distance from the camera to the root.
    pub distance: f32,
}

/// Sort record handed to the transparent pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    /// Element identity, the final tie-break.
    pub id: ElementId,
    /// Coarse group order set by the application.
    pub group_order: i32,
    /// Explicit render order set by the application.
    pub render_order: i32,
    /// View-space depth, used when no root distance is attached.
    pub z: f32,
    /// Camera distance of the UI root this item belongs to.
    pub root_distance: Option<RootDistance>,
    /// Paint order inside the root.
    pub order: Option<OrderInfo>,
}

/// Stable back-to-front comparator for transparent UI items.
///
/// Items of the same root are ordered by their [`OrderInfo`]; different roots paint the
/// farther one first; items outside any root fall back to depth.
pub fn compare_render_items(a: &RenderItem, b: &RenderItem) -> Ordering {
    let by_group = a
        .group_order
        .cmp(&b.group_order)
        .then(a.render_order.cmp(&b.render_order));
    if by_group != Ordering::Equal {
        return by_group;
    }
    match (&a.root_distance, &b.root_distance) {
        (Some(ra), Some(rb)) if ra.root == rb.root => {
            let by_order = match (&a.order, &b.order) {
                (Some(oa), Some(ob)) => compare_order_info(oa, ob),
                _ => Ordering::Equal,
            };
            by_order.then(a.id.cmp(&b.id))
        }
        (Some(ra), Some(rb)) => rb
            .distance
            .total_cmp(&ra.distance)
            .then(a.id.cmp(&b.id)),
        _ => b.z.total_cmp(&a.z).then(a.id.cmp(&b.id)),
    }
}
