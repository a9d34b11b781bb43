//! Projection of controller output onto the heater's power range.

/// Clamp a power command to `[0, max_w]`.
///
/// Returns `max_w` above the range, `0` below it, and the value unchanged
/// inside it. A NaN command maps to `0` so the heater never sees it.
pub fn clamp_power(value: f64, max_w: f64) -> f64 {
    if value > max_w {
        return max_w;
    }
    if value < 0.0 || value.is_nan() {
        return 0.0;
    }
    value
}
