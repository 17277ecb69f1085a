//! Arc geometry for the circular strip.
//!
//! A row of cards is laid on a circle whose sagitta at the viewport edge is
//! exactly `|bend|` pixels.  Everything here is a pure function of its
//! arguments so it can run per card, per frame, from any engine instance.

/// Vertical displacement and z-rotation for one card on the arc.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BendTransform {
    /// Pixels; negative moves the card up.
    pub y: f64,
    /// Degrees.
    pub rotation_z: f64,
}

impl BendTransform {
    pub const FLAT: BendTransform = BendTransform {
        y: 0.0,
        rotation_z: 0.0,
    };
}

/// Linear interpolation from `a` toward `b` by factor `t`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Sign with `sign(0) == 0` (unlike [`f64::signum`], which returns `1.0`).
#[inline]
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Place a card `x_from_center` pixels from the viewport centre on an arc of
/// intensity `bend`.
///
/// `bend == 0` is an exact flat row.  Distances beyond half the viewport are
/// clamped, so off-screen cards keep the edge curvature instead of running
/// off the circle.
pub fn compute_bend(x_from_center: f64, viewport_width: f64, bend: f64) -> BendTransform {
    if bend == 0.0 {
        return BendTransform::FLAT;
    }

    let half = (viewport_width / 2.0).max(0.0);
    let b_abs = bend.abs();
    let radius = (half * half + b_abs * b_abs) / (2.0 * b_abs);
    let effective_x = x_from_center.abs().min(half);

    // radius >= half always holds, the clamp only absorbs float error.
    let arc = radius - (radius * radius - effective_x * effective_x).max(0.0).sqrt();
    let angle = (effective_x / radius).min(1.0).asin().to_degrees();
    let side = sign(x_from_center);

    if bend > 0.0 {
        BendTransform {
            y: -arc,
            rotation_z: -side * angle,
        }
    } else {
        BendTransform {
            y: arc,
            rotation_z: side * angle,
        }
    }
}

/// Reduce a raw scroll offset into `[0, total_width)`.
///
/// Returns exactly `0.0` for an empty or degenerate strip.
pub fn normalized_scroll(raw: f64, total_width: f64) -> f64 {
    if total_width <= 0.0 || !raw.is_finite() {
        return 0.0;
    }
    let wrapped = raw.rem_euclid(total_width);
    // rem_euclid can round up to exactly total_width for tiny negatives.
    if wrapped >= total_width {
        0.0
    } else {
        wrapped
    }
}
