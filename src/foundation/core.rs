use crate::foundation::error::{LessonError, LessonResult};

/// Position in normalized canvas space; both axes lie in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CanvasPos {
    pub x: f64,
    pub y: f64,
}

impl CanvasPos {
    pub fn new(x: f64, y: f64) -> LessonResult<Self> {
        let pos = Self { x, y };
        pos.validate()?;
        Ok(pos)
    }

    pub fn center() -> Self {
        Self { x: 0.5, y: 0.5 }
    }

    pub fn validate(self) -> LessonResult<()> {
        let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !in_unit(self.x) || !in_unit(self.y) {
            return Err(LessonError::invalid_value(format!(
                "canvas position ({}, {}) must lie in [0, 1]",
                self.x, self.y
            )));
        }
        Ok(())
    }
}

impl Default for CanvasPos {
    fn default() -> Self {
        Self::center()
    }
}

/// Reject non-finite or non-positive durations.
pub fn positive_secs(what: &str, secs: f64) -> LessonResult<f64> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(LessonError::invalid_value(format!(
            "{what} must be finite and > 0 (got {secs})"
        )));
    }
    Ok(secs)
}

/// Round to one decimal place for display.
pub fn round_tenths(secs: f64) -> f64 {
    (secs * 10.0).round() / 10.0
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
