//! Concrete mini gizmos and the value bookkeeping they share.

mod angle;
mod distance;

pub use angle::AngleGizmo;
pub use distance::DistanceGizmo;

/// Where the current value last came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Pointer,
    /// A typed value wins over pointer movement until the interaction ends.
    Keyboard,
}

/// Committed and in-progress value of a scalar gizmo.
///
/// `push` commits the current value at the end of an interaction; `revert`
/// (used on interrupt) returns to the last committed one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeState {
    original: f32,
    current: f32,
    pub min: f32,
}

impl Default for MagnitudeState {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl MagnitudeState {
    pub fn new(value: f32) -> Self {
        Self {
            original: value,
            current: value,
            min: f32::NEG_INFINITY,
        }
    }

    pub fn original(&self) -> f32 {
        self.original
    }

    /// Current value, never below `min`.
    pub fn current(&self) -> f32 {
        self.current.max(self.min)
    }

    pub fn set_current(&mut self, value: f32) {
        self.current = value;
    }

    /// Reset both the committed and the current value.
    pub fn set_original(&mut self, value: f32) {
        self.original = value;
        self.current = value;
    }

    pub fn push(&mut self) {
        self.original = self.current();
        self.current = self.original;
    }

    pub fn revert(&mut self) {
        self.current = self.original;
    }
}

/// Parse typed text as a number. Blank or malformed input yields `None`.
pub(crate) fn parse_number(text: &str) -> Option<f32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f32>().ok().filter(|v| v.is_finite())
}
