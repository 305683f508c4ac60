//! Manually advanced time source.

use std::cell::Cell;
use std::rc::Rc;

use meshui_ui3d::Clock;

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<f64>>);

impl ManualClock {
    /// Clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `seconds`.
    pub fn advance(&self, seconds: f64) {
        self.0.set(self.0.get() + seconds);
    }

    /// Jump to an absolute time.
    pub fn set(&self, seconds: f64) {
        self.0.set(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.0.get()
    }
}
