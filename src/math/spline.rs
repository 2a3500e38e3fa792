//! Adaptive flattening of quadratic Bezier segments into polylines.
//!
//! Glyph and profile outlines arrive as quadratic Beziers; the polygon
//! primitive wants a short polyline. The sampler bisects each segment
//! while the chord error exceeds `tolerance * chord_length`, bounded by a
//! maximum recursion depth to keep outline polygons small.

use glam::Vec2;

/// Recursive subdivision sampler for quadratic Bezier segments.
#[derive(Clone, Copy, Debug)]
pub struct Spline3Sampler {
  /// Relative chord-error tolerance.
  pub tolerance: f32,
  /// Maximum bisection depth per segment.
  pub max_depth: u32,
}

impl Default for Spline3Sampler {
  fn default() -> Self {
    Self {
      tolerance: 0.05,
      max_depth: 4,
    }
  }
}

impl Spline3Sampler {
  pub fn new(tolerance: f32) -> Self {
    Self {
      tolerance,
      ..Self::default()
    }
  }

  /// Flatten the segment `(p0, c, p1)` into `dst`.
  ///
  /// The start point `p0` is not emitted (callers chain segments); every
  /// interior subdivision point and the end point `p1` are.
  pub fn sample(&self, dst: &mut Vec<Vec2>, p0: Vec2, c: Vec2, p1: Vec2) {
    self.subdivide(dst, p0, c, p1, 0);
    dst.push(p1);
  }

  fn subdivide(&self, dst: &mut Vec<Vec2>, p0: Vec2, c: Vec2, p1: Vec2, depth: u32) {
    if depth >= self.max_depth {
      return;
    }
    // Deviation of the control point from the chord, relative to the
    // chord length.
    let chord = p1 - p0;
    let len = chord.length();
    if len <= f32::EPSILON {
      return;
    }
    let off = c - p0;
    let cross = (chord.x * off.y - chord.y * off.x).abs();
    if cross / len <= self.tolerance * len {
      return;
    }
    // De Casteljau split at t = 0.5.
    let l = p0.midpoint(c);
    let r = c.midpoint(p1);
    let m = l.midpoint(r);
    self.subdivide(dst, p0, l, m, depth + 1);
    dst.push(m);
    self.subdivide(dst, m, r, p1, depth + 1);
  }
}
