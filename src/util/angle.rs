//! Angle helpers for heading interpolation
//!
//! Headings are radians measured from +x toward +y (screen-down), matching `Vec2::from_angle`.

use std::f32::consts::{PI, TAU};

use crate::util::vec2::Vec2;

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance_to(b)
}

/// Reduce an angle to (-π, π] by repeated ±2π steps
pub fn normalize_angle(mut angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

/// Move `from` toward `to` by fraction `t` along the shorter arc.
///
/// The result is not normalized; callers keep accumulating headings and the
/// difference is re-normalized on every call.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let diff = normalize_angle(to - from);
    from + diff * t
}
