use crate::consts::*;
use crate::errors::*;

make_log_macro!(warn, "scale");

/// Cubic mapping between user-facing notches and raw hardware levels.
///
/// With `b` fixed to the notch count and `a` to the leftover range, the curve
/// stays near-linear at the dark end and accelerates toward full brightness,
/// which tracks perceived brightness better than equal raw steps on devices
/// whose range is much wider than the notch count.
#[derive(Clone, Copy, Debug)]
pub struct ScaleModel {
    a: f64,
    b: f64,
    c: f64,
    notches: u32,
}

impl ScaleModel {
    /// Fit the curve to a device range so that notch 0 lands on `min` and the
    /// top notch on `max`.
    pub fn new(notches: u32, min: i32, max: i32) -> Result<Self> {
        if notches == 0 {
            return Err(CubiclightError::InvalidNotchCount);
        }

        let b = f64::from(notches);
        let scale = ScaleModel {
            a: f64::from(max - min) - b,
            b,
            c: f64::from(min),
            notches,
        };

        if !scale.is_monotonic() {
            warn!("scale folds back for range {min}..{max} over {notches} notches");
        }

        Ok(scale)
    }

    pub fn notch_count(&self) -> u32 {
        self.notches
    }

    /// Raw hardware level for a notch index. The index is not clamped; values
    /// outside the scale go through the same cubic.
    pub fn raw_level(&self, notch: i32) -> i32 {
        let x = f64::from(notch) / f64::from(self.notches);
        (self.a * x * x * x + self.b * x + self.c).round() as i32
    }

    /// Nearest notch index for a raw hardware level, found with a fixed
    /// number of Newton-Raphson steps. Tuned for ranges where the linear term
    /// dominates near the root; this is not a general cubic solver.
    pub fn notch_index(&self, raw: i32) -> Result<i32> {
        let y = f64::from(raw);
        let mut x = 0.5;

        for _ in 0..NEWTON_ITERATIONS {
            let f = self.a * x * x * x + self.b * x + self.c - y;
            let fp = 3.0 * self.a * x * x + self.b;
            if fp == 0.0 {
                return Err(CubiclightError::SolverStalled);
            }
            x -= f / fp;
        }

        Ok((f64::from(self.notches) * x).round() as i32)
    }

    /// Whether raw levels are non-decreasing across the whole notch range.
    /// The derivative `3a·x² + b` only turns negative inside the scale when
    /// the raw range is narrower than two thirds of the notch count.
    pub fn is_monotonic(&self) -> bool {
        self.a >= 0.0 || 3.0 * self.a + self.b >= 0.0
    }
}
