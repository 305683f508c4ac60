//! Scroll position under pointer drag, wheel and per-frame inertia.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use glam::{Mat4, Vec2, Vec3};
use meshui_core::Signal;
use serde::Serialize;
use tracing::trace;

use super::node::{Axis, FlexNode, MaxScroll};
use super::scrollbar::{compute_scrollbar_geometry, scroll_matrix, ScrollbarGeometry};

/// Overscroll at which further scrolling in the same direction has no effect.
pub const OVERSCROLL_RESISTANCE: f32 = 100.0;
/// Fraction of the overscroll pulled back per frame.
pub const RESTORE_FACTOR: f32 = 0.3;
/// Velocity damping per frame.
pub const VELOCITY_DAMPING: f32 = 0.9;
/// Velocities below this snap to zero.
pub const MIN_VELOCITY: f32 = 0.01;
/// A rubber-banded position returning to within this distance of its bound snaps onto it.
pub const REST_SNAP_DISTANCE: f32 = 0.1;
/// Distance from both ends past which a region claims the event for an axis.
pub const CLAIM_DISTANCE: f32 = 5.0;

/// Monotonic time source in seconds.
pub trait Clock {
    /// Current time in seconds.
    fn now(&self) -> f64;
}

/// [`Clock`] reading wall time since its creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Start a clock at zero.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Per-event marker shared by nested scroll regions.
///
/// An axis marked as scrolled is ignored by every region that sees the event later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollEventContext {
    /// Axes claimed by an inner region
    pub scrolled: [bool; 2],
}

/// Pointer event in the scroll region's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Identifies the pointer across down/move/up
    pub pointer_id: u64,
    /// Hit point in the region's local frame (world units)
    pub local_point: Vec3,
    /// Set when another handler already acted on the event
    pub default_prevented: bool,
    /// Scroll claims of regions that saw the event first
    pub context: ScrollEventContext,
}

impl PointerEvent {
    /// Create an event with no claims.
    pub fn new(pointer_id: u64, local_point: Vec3) -> Self {
        Self {
            pointer_id,
            local_point,
            default_prevented: false,
            context: ScrollEventContext::default(),
        }
    }
}

/// Wheel event, deltas in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    /// Wheel deltas
    pub delta: Vec2,
    /// Set when another handler already acted on the event
    pub default_prevented: bool,
    /// Scroll claims of regions that saw the event first
    pub context: ScrollEventContext,
}

impl WheelEvent {
    /// Create an event with no claims.
    pub fn new(delta: Vec2) -> Self {
        Self {
            delta,
            default_prevented: false,
            context: ScrollEventContext::default(),
        }
    }
}

/// Called with the proposed position before it is committed. Returning `false` vetoes the
/// commit; writing the signal overrides the proposal.
pub type ScrollListener =
    Box<dyn FnMut(Vec2, &Signal<Vec2>, Option<&ScrollEventContext>) -> bool>;

/// Snapshot of a scroll region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollState {
    /// Position in pixels
    pub position: Vec2,
    /// Inertial velocity in pixels per second
    pub velocity: Vec2,
    /// Scroll bounds
    pub max_position: MaxScroll,
}

#[derive(Debug, Clone, Copy)]
struct PointerInteraction {
    point: Vec3,
    timestamp: f64,
}

/// Scroll state machine of one scrollable element.
pub struct ScrollController {
    node: Rc<dyn FlexNode>,
    position: Signal<Vec2>,
    velocity: Vec2,
    pointers: HashMap<u64, PointerInteraction>,
    clock: Box<dyn Clock>,
    listener: Option<ScrollListener>,
}

impl ScrollController {
    /// Controller at position zero using the system clock.
    pub fn new(node: Rc<dyn FlexNode>) -> Self {
        Self::with_clock(node, Box::new(SystemClock::new()))
    }

    /// Controller with an explicit time source.
    pub fn with_clock(node: Rc<dyn FlexNode>, clock: Box<dyn Clock>) -> Self {
        Self {
            node,
            position: Signal::new(Vec2::ZERO),
            velocity: Vec2::ZERO,
            pointers: HashMap::new(),
            clock,
            listener: None,
        }
    }

    /// Install the scroll listener, replacing any previous one.
    pub fn set_listener(&mut self, listener: ScrollListener) {
        self.listener = Some(listener);
    }

    /// Shared position cell.
    pub fn position(&self) -> &Signal<Vec2> {
        &self.position
    }

    /// Current velocity.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Override the velocity, e.g. for a programmatic fling.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// World units per layout pixel of the scrolled node.
    pub fn pixel_size(&self) -> f32 {
        self.node.pixel_size()
    }

    /// Whether any pointer is held down on the region.
    pub fn is_dragging(&self) -> bool {
        !self.pointers.is_empty()
    }

    /// Snapshot for reporting.
    pub fn state(&self) -> ScrollState {
        ScrollState {
            position: self.position.get(),
            velocity: self.velocity,
            max_position: self.node.max_scroll_position(),
        }
    }

    /// Apply a scroll delta and return the resulting position.
    ///
    /// Axes claimed in `event` are ignored and the axes this region claims are recorded
    /// back into it.
    pub fn on_delta(
        &mut self,
        mut event: Option<&mut ScrollEventContext>,
        delta: Vec2,
        delta_time: Option<f32>,
        rubber_band: bool,
    ) -> Vec2 {
        let claimed = event.as_deref().map_or([false; 2], |ctx| ctx.scrolled);
        let mut delta = delta;
        for axis in Axis::ALL {
            if claimed[axis.index()] {
                delta[axis.index()] = 0.0;
            }
        }

        let old = self.position.get();
        let max = self.node.max_scroll_position();
        let ancestor_scrollable = self.node.any_ancestor_scrollable();
        let mut proposal = old;
        for axis in Axis::ALL {
            let i = axis.index();
            proposal[i] = compute_scroll(old[i], max[i], delta[i], rubber_band && !ancestor_scrollable[i]);
        }

        if let Some(dt) = delta_time.filter(|dt| *dt > 0.0) {
            self.velocity = delta / dt;
        }

        if let Some(ctx) = event.as_deref_mut() {
            for axis in Axis::ALL {
                let i = axis.index();
                let room = old[i].min(max[i].unwrap_or(0.0) - old[i]);
                ctx.scrolled[i] = claimed[i] || room > CLAIM_DISTANCE;
            }
        }

        let writes = self.position.writes();
        if let Some(listener) = self.listener.as_mut() {
            if !listener(proposal, &self.position, event.as_deref()) {
                trace!(?proposal, "scroll vetoed by listener");
                return self.position.get();
            }
        }
        if self.position.writes() != writes {
            // The listener wrote the position itself, possibly to its current value.
            return self.position.get();
        }
        if proposal != old {
            self.position.set(proposal);
        }
        proposal
    }

    /// Per-frame update: pull overscroll back into bounds and apply inertia.
    pub fn tick(&mut self, delta_time: f32) {
        if self.is_dragging() {
            return;
        }
        let position = self.position.get();
        let max = self.node.max_scroll_position();
        let mut delta = Vec2::ZERO;
        for axis in Axis::ALL {
            let i = axis.index();
            delta[i] = outside_distance(position[i], 0.0, max[i].unwrap_or(0.0)) * -RESTORE_FACTOR;
        }
        delta += self.velocity * delta_time;

        self.velocity *= VELOCITY_DAMPING;
        for axis in Axis::ALL {
            let i = axis.index();
            if self.velocity[i].abs() < MIN_VELOCITY {
                self.velocity[i] = 0.0;
            }
        }

        if delta == Vec2::ZERO {
            return;
        }
        self.on_delta(None, delta, None, true);
    }

    /// Start tracking a pointer.
    pub fn on_pointer_down(&mut self, event: &PointerEvent) {
        if !self.is_scrollable() {
            return;
        }
        let interaction = PointerInteraction {
            point: event.local_point,
            timestamp: self.clock.now(),
        };
        self.pointers.insert(event.pointer_id, interaction);
    }

    /// Drag the content with a tracked pointer.
    pub fn on_pointer_move(&mut self, event: &mut PointerEvent) {
        let now = self.clock.now();
        let pixel_size = self.node.pixel_size();
        let Some(interaction) = self.pointers.get_mut(&event.pointer_id) else {
            return;
        };
        let distance = (event.local_point - interaction.point) / pixel_size;
        let delta_time = (now - interaction.timestamp) as f32;
        interaction.point = event.local_point;
        interaction.timestamp = now;

        if event.default_prevented {
            return;
        }
        self.on_delta(
            Some(&mut event.context),
            Vec2::new(-distance.x, distance.y),
            Some(delta_time),
            true,
        );
    }

    /// Stop tracking a released pointer.
    pub fn on_pointer_up(&mut self, pointer_id: u64) {
        self.pointers.remove(&pointer_id);
    }

    /// Stop tracking a pointer that left the region.
    pub fn on_pointer_leave(&mut self, pointer_id: u64) {
        self.pointers.remove(&pointer_id);
    }

    /// Stop tracking a cancelled pointer.
    pub fn on_pointer_cancel(&mut self, pointer_id: u64) {
        self.pointers.remove(&pointer_id);
    }

    /// Scroll by wheel deltas; never rubber-bands.
    pub fn on_wheel(&mut self, event: &mut WheelEvent) {
        if event.default_prevented || !self.is_scrollable() {
            return;
        }
        self.on_delta(Some(&mut event.context), event.delta, None, false);
    }

    /// Transform of the scrolled content.
    pub fn content_matrix(&self, global: &Mat4) -> Mat4 {
        scroll_matrix(self.position.get(), self.node.pixel_size(), global)
    }

    /// Thumb geometry of both scrollbars, X first.
    pub fn scrollbars(&self, thickness: f32) -> [ScrollbarGeometry; 2] {
        let size = self.node.size();
        let max = self.node.max_scroll_position();
        let inset = self.node.border_inset();
        let position = self.position.get();
        Axis::ALL.map(|axis| compute_scrollbar_geometry(axis, thickness, size, max, inset, position))
    }

    fn is_scrollable(&self) -> bool {
        self.node.scrollable().iter().any(|s| *s)
    }
}

impl fmt::Debug for ScrollController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollController")
            .field("position", &self.position.get())
            .field("velocity", &self.velocity)
            .field("pointers", &self.pointers.len())
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

/// Signed distance of `value` outside `[min, max]`; zero inside.
pub fn outside_distance(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        value - min
    } else if value > max {
        value - max
    } else {
        0.0
    }
}

/// New position on one axis after applying `delta`.
///
/// Scrolling further out of bounds is damped by the current overscroll. Without rubber
/// banding, or on an axis with no bounds, the result is clamped into `[0, max]`.
pub fn compute_scroll(position: f32, max: Option<f32>, delta: f32, rubber_band: bool) -> f32 {
    if delta == 0.0 {
        return position;
    }
    let upper = max.unwrap_or(0.0);
    let outside = outside_distance(position, 0.0, upper);
    let mut delta = delta;
    if (delta >= 0.0) == (outside >= 0.0) {
        delta *= (1.0 - outside.abs() / OVERSCROLL_RESISTANCE).max(0.0);
    }
    let new_position = position + delta;
    if !rubber_band || max.is_none() {
        return new_position.clamp(0.0, upper);
    }
    if outside != 0.0 && outside_distance(new_position, 0.0, upper).abs() < REST_SNAP_DISTANCE {
        return new_position.clamp(0.0, upper);
    }
    new_position
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::scroll::node::FlexNodeState;

    #[derive(Debug, Clone, Default)]
    struct TestClock(Rc<Cell<f64>>);

    impl Clock for TestClock {
        fn now(&self) -> f64 {
            self.0.get()
        }
    }

    fn node(max: MaxScroll) -> Rc<FlexNodeState> {
        let node = FlexNodeState::new(0.01);
        node.size.set(Vec2::new(100.0, 100.0));
        node.max_scroll_position.set(max);
        node.scrollable.set([max[0].is_some(), max[1].is_some()]);
        Rc::new(node)
    }

    fn controller(max: MaxScroll) -> (ScrollController, TestClock) {
        let clock = TestClock::default();
        let controller = ScrollController::with_clock(node(max), Box::new(clock.clone()));
        (controller, clock)
    }

    #[test]
    fn test_clamps_without_rubber_band() {
        let (mut c, _) = controller([None, Some(100.0)]);
        assert_eq!(c.on_delta(None, Vec2::new(0.0, 150.0), None, false), Vec2::new(0.0, 100.0));
        assert_eq!(c.on_delta(None, Vec2::new(0.0, -300.0), None, false), Vec2::ZERO);
    }

    #[test]
    fn test_unbounded_axis_stays_at_zero() {
        let (mut c, _) = controller([None, Some(100.0)]);
        assert_eq!(c.on_delta(None, Vec2::new(40.0, 0.0), None, true), Vec2::ZERO);
    }

    #[test]
    fn test_rubber_band_settles_back_into_bounds() {
        let (mut c, _) = controller([None, Some(100.0)]);
        let start = c.on_delta(None, Vec2::new(0.0, 150.0), None, true);
        assert!(start.y > 100.0);
        let mut last = start.y - 100.0;
        for _ in 0..60 {
            c.tick(1.0 / 60.0);
            let outside = c.position().get().y - 100.0;
            assert!(outside <= last);
            last = outside;
        }
        assert_eq!(c.position().get().y, 100.0);
    }

    #[test]
    fn test_overscroll_resistance() {
        assert_eq!(compute_scroll(150.0, Some(100.0), 10.0, true), 155.0);
        assert_eq!(compute_scroll(250.0, Some(100.0), 10.0, true), 250.0);
        // Moving back in is not damped.
        assert_eq!(compute_scroll(150.0, Some(100.0), -10.0, true), 140.0);
    }

    #[test]
    fn test_ancestor_scrollable_disables_rubber_band() {
        let node = node([None, Some(100.0)]);
        node.any_ancestor_scrollable.set([false, true]);
        let mut c = ScrollController::new(node);
        assert_eq!(c.on_delta(None, Vec2::new(0.0, 150.0), None, true).y, 100.0);
    }

    #[test]
    fn test_velocity_snaps_to_zero() {
        let (mut c, _) = controller([None, Some(100.0)]);
        c.set_velocity(Vec2::new(0.0, 0.011));
        c.tick(1.0);
        assert_eq!(c.velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_inertia_continues_after_release() {
        let (mut c, _) = controller([None, Some(1000.0)]);
        c.on_delta(None, Vec2::new(0.0, 10.0), Some(0.1), true);
        assert_eq!(c.velocity(), Vec2::new(0.0, 100.0));
        c.tick(0.1);
        assert!((c.position().get().y - 20.0).abs() < 1e-4);
        assert!((c.velocity().y - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_tick_is_skipped_while_dragging() {
        let (mut c, _) = controller([None, Some(100.0)]);
        c.on_delta(None, Vec2::new(0.0, 150.0), None, true);
        c.on_pointer_down(&PointerEvent::new(1, Vec3::ZERO));
        let before = c.position().get();
        c.tick(1.0 / 60.0);
        assert_eq!(c.position().get(), before);
        c.on_pointer_up(1);
        c.tick(1.0 / 60.0);
        assert!(c.position().get().y < before.y);
    }

    #[test]
    fn test_pointer_drag_scrolls_opposite_to_motion() {
        let (mut c, clock) = controller([Some(100.0), Some(100.0)]);
        c.on_pointer_down(&PointerEvent::new(7, Vec3::ZERO));
        clock.0.set(0.5);
        // Dragging left and down by 10 px scrolls right and down.
        let mut event = PointerEvent::new(7, Vec3::new(-0.1, 0.1, 0.0));
        c.on_pointer_move(&mut event);
        let position = c.position().get();
        assert!((position - Vec2::new(10.0, 10.0)).length() < 1e-3);
        assert!((c.velocity() - Vec2::new(20.0, 20.0)).length() < 1e-2);
        // Untracked pointers do nothing.
        let mut other = PointerEvent::new(8, Vec3::new(1.0, 1.0, 0.0));
        c.on_pointer_move(&mut other);
        assert_eq!(c.position().get(), position);
    }

    #[test]
    fn test_prevented_move_updates_anchor_only() {
        let (mut c, _) = controller([None, Some(100.0)]);
        c.on_pointer_down(&PointerEvent::new(1, Vec3::ZERO));
        let mut prevented = PointerEvent::new(1, Vec3::new(0.0, 0.5, 0.0));
        prevented.default_prevented = true;
        c.on_pointer_move(&mut prevented);
        assert_eq!(c.position().get(), Vec2::ZERO);
        let mut next = PointerEvent::new(1, Vec3::new(0.0, 0.6, 0.0));
        c.on_pointer_move(&mut next);
        assert!((c.position().get().y - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_wheel_marks_axis_for_outer_regions() {
        let (mut inner, _) = controller([None, Some(100.0)]);
        let (mut outer, _) = controller([None, Some(100.0)]);
        inner.on_delta(None, Vec2::new(0.0, 50.0), None, false);

        let mut event = WheelEvent::new(Vec2::new(0.0, 20.0));
        inner.on_wheel(&mut event);
        assert_eq!(inner.position().get().y, 70.0);
        assert_eq!(event.context.scrolled, [false, true]);
        outer.on_wheel(&mut event);
        assert_eq!(outer.position().get().y, 0.0);
    }

    #[test]
    fn test_listener_can_veto() {
        let (mut c, _) = controller([None, Some(100.0)]);
        c.set_listener(Box::new(|_, _, _| false));
        assert_eq!(c.on_delta(None, Vec2::new(0.0, 50.0), None, false), Vec2::ZERO);
        assert_eq!(c.position().get(), Vec2::ZERO);
    }

    #[test]
    fn test_listener_write_wins() {
        let (mut c, _) = controller([None, Some(100.0)]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        c.set_listener(Box::new(move |proposal, position, _| {
            log.borrow_mut().push(proposal);
            position.set(Vec2::new(0.0, 42.0));
            true
        }));
        assert_eq!(c.on_delta(None, Vec2::new(0.0, 50.0), None, false), Vec2::new(0.0, 42.0));
        assert_eq!(c.position().get().y, 42.0);
        assert_eq!(seen.borrow().as_slice(), &[Vec2::new(0.0, 50.0)]);
    }

    #[test]
    fn test_listener_pinning_current_position_wins() {
        let (mut c, _) = controller([None, Some(100.0)]);
        c.on_delta(None, Vec2::new(0.0, 30.0), None, false);
        c.set_listener(Box::new(|_, position, _| {
            position.set(position.get());
            true
        }));
        assert_eq!(c.on_delta(None, Vec2::new(0.0, 20.0), None, false), Vec2::new(0.0, 30.0));
        assert_eq!(c.position().get().y, 30.0);
    }

    #[test]
    fn test_non_scrollable_region_ignores_input() {
        let (mut c, _) = controller([None, None]);
        let mut wheel = WheelEvent::new(Vec2::new(0.0, 10.0));
        c.on_wheel(&mut wheel);
        c.on_pointer_down(&PointerEvent::new(1, Vec3::ZERO));
        assert!(!c.is_dragging());
        assert_eq!(wheel.context, ScrollEventContext::default());
    }
}
