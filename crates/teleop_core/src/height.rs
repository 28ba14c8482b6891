use shared::domain::HeightBounds;
use tracing::debug;

/// Operator-set Z that replaces the height of every drag target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightOverride {
    value: f64,
    bounds: HeightBounds,
}

impl HeightOverride {
    pub fn new(initial: f64, bounds: HeightBounds) -> Self {
        let initial = if initial.is_finite() { initial } else { bounds.min };
        Self {
            value: bounds.clamp(initial),
            bounds,
        }
    }

    /// Stores `value` clamped to the bounds and returns what was stored.
    /// Non-finite values are ignored and the previous height is kept.
    pub fn set(&mut self, value: f64) -> f64 {
        if value.is_finite() {
            self.value = self.bounds.clamp(value);
        } else {
            debug!(value, "ignoring non-finite height");
        }
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn bounds(&self) -> HeightBounds {
        self.bounds
    }

    pub fn label(&self) -> String {
        format!("Z: {:.1} mm", self.value)
    }
}
