//! UI scene - owns the elements of one UI root and wires ordering, clipping,
//! text state and hit-testing together

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use meshui_core::{
    compare_render_items, ElementId, ElementType, OrderInfo, OrderResolver, RenderItem,
    RootDistance, Subscription,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::components::{Panel3D, Text3D};
use crate::interaction::{sort_intersections, ClipRect, ClippedPanel, Intersection, Ray};
use crate::scroll::{scroll_matrix, ScrollController};
use crate::text::{build_glyph_layout, measure_glyph_layout, GlyphMetrics, TextRenderState};

/// Handle to a UI element for updates/removal
pub type UiElementHandle = ElementId;

/// Errors raised by scene mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// The handle does not name an element of this scene
    #[error("unknown element {0:?}")]
    UnknownElement(ElementId),
    /// Only panels can have children
    #[error("element {0:?} cannot have children")]
    NotAContainer(ElementId),
    /// The operation needs a text element
    #[error("element {0:?} is not a text element")]
    NotText(ElementId),
}

/// A managed text element
#[derive(Debug)]
struct TextElement {
    text: Text3D,
    state: TextRenderState,
    box_size: Vec2,
}

#[derive(Debug)]
enum ElementKind {
    Panel {
        panel: Panel3D,
        content_transform: Rc<Cell<Mat4>>,
        /// Keeps the content transform following a scroll position
        scroll: Option<Subscription>,
    },
    Text(Box<TextElement>),
}

#[derive(Debug)]
struct SceneElement {
    parent: Option<ElementId>,
    order: OrderInfo,
    kind: ElementKind,
}

/// One entry of the paint-sorted draw list
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    /// Element to draw
    pub element: ElementId,
    /// Paint order
    pub order: OrderInfo,
    /// World matrix of the element's unit quad (panels) or text frame (texts)
    pub matrix_world: Mat4,
    /// Number of glyph instances; zero for panels
    pub glyphs: usize,
}

/// Manages all elements below one UI root
pub struct UiScene {
    id: ElementId,
    font: Arc<dyn GlyphMetrics>,
    resolver: OrderResolver,
    root_matrix: Mat4,
    elements: BTreeMap<ElementId, SceneElement>,
    next_handle: ElementId,
    /// Set by scroll subscriptions; text frames are stale until the next update
    frames_dirty: Rc<Cell<bool>>,
}

impl UiScene {
    /// Create an empty scene whose root sits at the world origin
    pub fn new(font: Arc<dyn GlyphMetrics>) -> Self {
        let id = ElementId(1);
        Self {
            id,
            font,
            resolver: OrderResolver::new(),
            root_matrix: Mat4::IDENTITY,
            elements: BTreeMap::new(),
            next_handle: id.next(),
            frames_dirty: Rc::new(Cell::new(false)),
        }
    }

    /// Builder: Place the root in the world
    pub fn with_root_matrix(mut self, matrix: Mat4) -> Self {
        self.root_matrix = matrix;
        self
    }

    /// Identity of the root, used as the shared camera-distance reference
    pub fn root_id(&self) -> ElementId {
        self.id
    }

    /// Move the root
    pub fn set_root_matrix(&mut self, matrix: Mat4) {
        self.root_matrix = matrix;
    }

    /// Get the number of elements
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Add a panel below `parent` (or the root)
    pub fn add_panel(
        &mut self,
        parent: Option<UiElementHandle>,
        panel: Panel3D,
    ) -> Result<UiElementHandle, SceneError> {
        let parent_order = self.container_order(parent)?;
        let group = panel.group_key();
        let order = self.resolver.resolve(
            parent_order.as_ref(),
            panel.element_type(),
            panel.z_index,
            Some(&group),
        );
        Ok(self.insert(
            parent,
            order,
            ElementKind::Panel {
                panel,
                content_transform: Rc::new(Cell::new(Mat4::IDENTITY)),
                scroll: None,
            },
        ))
    }

    /// Add a text element below `parent` (or the root) and lay it out
    pub fn add_text(
        &mut self,
        parent: Option<UiElementHandle>,
        text: Text3D,
    ) -> Result<UiElementHandle, SceneError> {
        let parent_order = self.container_order(parent)?;
        let order = self.resolver.resolve(
            parent_order.as_ref(),
            ElementType::Text,
            text.z_index,
            None,
        );
        let state = TextRenderState::new().with_alignment(text.horizontal_align, text.vertical_align);
        let mut element = TextElement {
            text,
            state,
            box_size: Vec2::ZERO,
        };
        layout_text(&mut element, &self.font);
        let handle = self.insert(parent, order, ElementKind::Text(Box::new(element)));
        self.refresh_text_frames();
        Ok(handle)
    }

    /// Replace the content of a text element, reusing its glyph slots
    pub fn set_text_content(
        &mut self,
        handle: UiElementHandle,
        content: impl Into<String>,
    ) -> Result<(), SceneError> {
        let font = Arc::clone(&self.font);
        let element = self.text_element_mut(handle)?;
        element.text.set_text(content);
        layout_text(element, &font);
        self.refresh_text_frames();
        Ok(())
    }

    /// Set the transform applied to a panel's children. Replaces any scroll binding.
    pub fn set_content_transform(
        &mut self,
        handle: UiElementHandle,
        matrix: Mat4,
    ) -> Result<(), SceneError> {
        match self.elements.get_mut(&handle) {
            Some(SceneElement {
                kind:
                    ElementKind::Panel {
                        content_transform,
                        scroll,
                        ..
                    },
                ..
            }) => {
                *scroll = None;
                content_transform.set(matrix);
            }
            Some(_) => return Err(SceneError::NotAContainer(handle)),
            None => return Err(SceneError::UnknownElement(handle)),
        }
        self.refresh_text_frames();
        Ok(())
    }

    /// Make a panel's children follow the position of `controller`.
    ///
    /// Every position change moves the content at once, so hit-testing sees it
    /// immediately. Clipped glyph instances catch up on the next [`UiScene::update`].
    /// The binding lasts until the panel is removed or its content transform is set.
    pub fn bind_scroll(
        &mut self,
        handle: UiElementHandle,
        controller: &ScrollController,
    ) -> Result<(), SceneError> {
        let position = controller.position();
        let pixel_size = controller.pixel_size();
        let (content_transform, scroll) = match self.elements.get_mut(&handle) {
            Some(SceneElement {
                kind:
                    ElementKind::Panel {
                        content_transform,
                        scroll,
                        ..
                    },
                ..
            }) => (content_transform, scroll),
            Some(_) => return Err(SceneError::NotAContainer(handle)),
            None => return Err(SceneError::UnknownElement(handle)),
        };

        content_transform.set(scroll_matrix(position.get(), pixel_size, &Mat4::IDENTITY));
        let target = Rc::clone(content_transform);
        let dirty = Rc::clone(&self.frames_dirty);
        *scroll = Some(position.subscribe(move |position| {
            target.set(scroll_matrix(*position, pixel_size, &Mat4::IDENTITY));
            dirty.set(true);
        }));
        debug!(?handle, "bound panel content to scroll position");
        self.refresh_text_frames();
        Ok(())
    }

    /// Push pending scroll movements into text clipping. Returns true when anything moved.
    pub fn update(&mut self) -> bool {
        if !self.frames_dirty.replace(false) {
            return false;
        }
        self.refresh_text_frames();
        true
    }

    /// Remove an element and all of its descendants
    pub fn remove(&mut self, handle: UiElementHandle) -> Result<(), SceneError> {
        if !self.elements.contains_key(&handle) {
            return Err(SceneError::UnknownElement(handle));
        }
        let mut doomed = vec![handle];
        let mut i = 0;
        while i < doomed.len() {
            let current = doomed[i];
            doomed.extend(
                self.elements
                    .iter()
                    .filter(|(_, e)| e.parent == Some(current))
                    .map(|(id, _)| *id),
            );
            i += 1;
        }
        for id in &doomed {
            self.elements.remove(id);
        }
        debug!(removed = doomed.len(), "removed ui elements");
        Ok(())
    }

    /// Paint order of an element
    pub fn order(&self, handle: UiElementHandle) -> Option<&OrderInfo> {
        self.elements.get(&handle).map(|e| &e.order)
    }

    /// Render state of a text element
    pub fn text_state(&self, handle: UiElementHandle) -> Option<&TextRenderState> {
        match &self.elements.get(&handle)?.kind {
            ElementKind::Text(element) => Some(&element.state),
            ElementKind::Panel { .. } => None,
        }
    }

    /// Mutable render state of a text element (selection, appearance)
    pub fn text_state_mut(&mut self, handle: UiElementHandle) -> Option<&mut TextRenderState> {
        match &mut self.elements.get_mut(&handle)?.kind {
            ElementKind::Text(element) => Some(&mut element.state),
            ElementKind::Panel { .. } => None,
        }
    }

    /// Order lookups served from the memo cache
    pub fn order_cache_hits(&self) -> u64 {
        self.resolver.cache_hits()
    }

    /// Raycast against all visible elements. Hits are bias-adjusted, clipped to their
    /// ancestors and sorted nearest first.
    pub fn raycast(&self, ray: &Ray) -> Vec<Intersection> {
        let mut intersections = Vec::new();
        for (id, element) in &self.elements {
            let Some(local) = self.hit_matrix(element) else {
                continue;
            };
            ClippedPanel {
                element: *id,
                order: element.order.clone(),
                matrix_world: self.root_matrix * local,
                clip: self.ancestor_clip(element.parent),
                root_matrix: self.root_matrix,
            }
            .raycast(ray, &mut intersections);
        }
        sort_intersections(&mut intersections);
        intersections
    }

    /// Visible elements in paint order for a camera at `camera_position`
    pub fn draw_list(&mut self, camera_position: Vec3) -> Vec<DrawItem> {
        self.update();
        let root_distance = RootDistance {
            root: self.id,
            distance: self
                .root_matrix
                .transform_point3(Vec3::ZERO)
                .distance(camera_position),
        };
        let mut items: Vec<(RenderItem, DrawItem)> = Vec::new();
        for (id, element) in &self.elements {
            let (matrix, glyphs) = match &element.kind {
                ElementKind::Panel { panel, .. } if panel.visible => {
                    (panel.mesh_matrix(&self.frame(element.parent)), 0)
                }
                ElementKind::Text(text) if text.state.is_shown() && text.text.visible => {
                    let frame = self.frame(element.parent) * text.text.transform.matrix();
                    (frame, text.state.instances().len())
                }
                _ => continue,
            };
            let matrix_world = self.root_matrix * matrix;
            let render = RenderItem {
                id: *id,
                group_order: 0,
                render_order: 0,
                z: matrix_world.transform_point3(Vec3::ZERO).distance(camera_position),
                root_distance: Some(root_distance),
                order: Some(element.order.clone()),
            };
            let draw = DrawItem {
                element: *id,
                order: element.order.clone(),
                matrix_world,
                glyphs,
            };
            items.push((render, draw));
        }
        items.sort_by(|a, b| compare_render_items(&a.0, &b.0));
        items.into_iter().map(|(_, draw)| draw).collect()
    }

    fn insert(&mut self, parent: Option<ElementId>, order: OrderInfo, kind: ElementKind) -> ElementId {
        let handle = self.next_handle;
        self.next_handle = handle.next();
        debug!(?handle, major = order.major_index, minor = order.minor_index, "added ui element");
        if !order.within_hit_bias_range() {
            warn!(
                ?handle,
                major = order.major_index,
                minor = order.minor_index,
                "order outside calibrated hit bias range; ties may mix with depth"
            );
        }
        self.elements.insert(
            handle,
            SceneElement {
                parent,
                order,
                kind,
            },
        );
        handle
    }

    fn container_order(&self, parent: Option<ElementId>) -> Result<Option<OrderInfo>, SceneError> {
        let Some(parent) = parent else {
            return Ok(None);
        };
        match self.elements.get(&parent) {
            Some(SceneElement {
                kind: ElementKind::Panel { .. },
                order,
                ..
            }) => Ok(Some(order.clone())),
            Some(_) => Err(SceneError::NotAContainer(parent)),
            None => Err(SceneError::UnknownElement(parent)),
        }
    }

    fn text_element_mut(&mut self, handle: ElementId) -> Result<&mut TextElement, SceneError> {
        match self.elements.get_mut(&handle) {
            Some(SceneElement {
                kind: ElementKind::Text(element),
                ..
            }) => Ok(&mut **element),
            Some(_) => Err(SceneError::NotText(handle)),
            None => Err(SceneError::UnknownElement(handle)),
        }
    }

    /// Frame of the children of `parent`, relative to the root
    fn frame(&self, parent: Option<ElementId>) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = parent;
        while let Some(id) = current {
            let Some(element) = self.elements.get(&id) else {
                break;
            };
            if let ElementKind::Panel {
                panel,
                content_transform,
                ..
            } = &element.kind
            {
                matrix = panel.transform.matrix() * content_transform.get() * matrix;
            }
            current = element.parent;
        }
        matrix
    }

    /// Visible region left by the clipping ancestors of an element, in the root frame
    fn ancestor_clip(&self, parent: Option<ElementId>) -> Option<ClipRect> {
        let mut clip: Option<ClipRect> = None;
        let mut current = parent;
        while let Some(id) = current {
            let Some(element) = self.elements.get(&id) else {
                break;
            };
            if let ElementKind::Panel { panel, .. } = &element.kind {
                if panel.clip_children {
                    let frame = self.frame(element.parent) * panel.transform.matrix();
                    let rect = ClipRect::from_panel(panel.size, &frame);
                    clip = Some(rect.within(clip.as_ref()));
                }
            }
            current = element.parent;
        }
        clip
    }

    /// Matrix of the hit-testable unit quad of an element, relative to the root
    fn hit_matrix(&self, element: &SceneElement) -> Option<Mat4> {
        match &element.kind {
            ElementKind::Panel { panel, .. } if panel.visible => {
                Some(panel.mesh_matrix(&self.frame(element.parent)))
            }
            ElementKind::Text(text) if text.text.visible && text.state.is_shown() => {
                let frame = self.frame(element.parent) * text.text.transform.matrix();
                Some(frame * Mat4::from_scale(text.box_size.extend(1.0)))
            }
            _ => None,
        }
    }

    fn refresh_text_frames(&mut self) {
        let updates: Vec<(ElementId, Mat4, Option<ClipRect>)> = self
            .elements
            .iter()
            .filter_map(|(id, element)| match &element.kind {
                ElementKind::Text(text) => Some((
                    *id,
                    self.frame(element.parent) * text.text.transform.matrix(),
                    self.ancestor_clip(element.parent),
                )),
                ElementKind::Panel { .. } => None,
            })
            .collect();
        for (id, matrix, clip) in updates {
            if let Some(SceneElement {
                kind: ElementKind::Text(text),
                ..
            }) = self.elements.get_mut(&id)
            {
                text.state.set_base_matrix(matrix);
                text.state.set_clip_rect(clip);
            }
        }
    }
}

impl std::fmt::Debug for UiScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiScene")
            .field("id", &self.id)
            .field("elements", &self.elements.len())
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

/// Lay out a text element and push the result into its render state
fn layout_text(element: &mut TextElement, font: &Arc<dyn GlyphMetrics>) {
    let props = element.text.layout_properties(Arc::clone(font));
    let measured = measure_glyph_layout(&props, element.text.max_width);
    let width = element.text.max_width.unwrap_or(measured.width);
    let layout = build_glyph_layout(&props, width, measured.height);
    element.box_size = Vec2::new(width, measured.height);
    let [r, g, b, a] = element.text.color;
    element.state.set_appearance([r, g, b], a);
    element.state.set_hidden(!element.text.visible);
    element.state.apply_layout(Arc::new(layout));
}
