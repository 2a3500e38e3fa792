//! Axis-aligned bounding boxes for shape bounds propagation.
//!
//! Every shape node stores a conservative box: all points with
//! non-positive distance lie strictly inside it. Transform nodes map
//! these boxes through the helpers below.

use glam::{Vec2, Vec3};

/// Axis-aligned box in 3D.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb3 {
  /// Minimum corner (inclusive).
  pub min: Vec3,
  /// Maximum corner (inclusive).
  pub max: Vec3,
}

impl Aabb3 {
  /// Create a box from min and max corners.
  ///
  /// # Panics
  /// Debug-asserts that min <= max on all axes.
  pub fn new(min: Vec3, max: Vec3) -> Self {
    debug_assert!(
      min.x <= max.x && min.y <= max.y && min.z <= max.z,
      "box min must be <= max on all axes"
    );
    Self { min, max }
  }

  /// Box centered at the origin with the given half-extents.
  pub fn from_half_extents(half: Vec3) -> Self {
    Self {
      min: -half,
      max: half,
    }
  }

  /// Smallest box containing both operands.
  #[inline]
  pub fn union(&self, other: &Aabb3) -> Self {
    Self {
      min: self.min.min(other.min),
      max: self.max.max(other.max),
    }
  }

  /// Overlap of both operands; collapses to a point at the midpoint of
  /// the two centers when the boxes are disjoint, so the result is always
  /// a valid (possibly empty) box.
  pub fn intersection(&self, other: &Aabb3) -> Self {
    let min = self.min.max(other.min);
    let max = self.max.min(other.max);
    if min.x <= max.x && min.y <= max.y && min.z <= max.z {
      Self { min, max }
    } else {
      let p = (self.center() + other.center()) * 0.5;
      Self { min: p, max: p }
    }
  }

  /// Grow (or shrink, for negative `margin`) by the same amount on all
  /// sides. Shrinking clamps at the center.
  pub fn inflate(&self, margin: f32) -> Self {
    let min = self.min - Vec3::splat(margin);
    let max = self.max + Vec3::splat(margin);
    if min.x <= max.x && min.y <= max.y && min.z <= max.z {
      Self { min, max }
    } else {
      let c = self.center();
      Self { min: c, max: c }
    }
  }

  /// Shift by an offset.
  #[inline]
  pub fn translate(&self, v: Vec3) -> Self {
    Self {
      min: self.min + v,
      max: self.max + v,
    }
  }

  /// Scale about the origin by a positive uniform factor.
  #[inline]
  pub fn scale(&self, s: f32) -> Self {
    Self {
      min: self.min * s,
      max: self.max * s,
    }
  }

  /// Scale about the box center.
  pub fn scale_centered(&self, s: f32) -> Self {
    let c = self.center();
    let h = self.size() * (0.5 * s);
    Self {
      min: c - h,
      max: c + h,
    }
  }

  /// Mirror through the coordinate planes selected by `axes` and union
  /// with the original extent.
  pub fn mirrored_union(&self, axes: [bool; 3]) -> Self {
    let mut min = self.min;
    let mut max = self.max;
    for i in 0..3 {
      if axes[i] {
        let lo = min[i].min(-max[i]);
        let hi = max[i].max(-min[i]);
        min[i] = lo;
        max[i] = hi;
      }
    }
    Self { min, max }
  }

  #[inline]
  pub fn center(&self) -> Vec3 {
    (self.min + self.max) * 0.5
  }

  #[inline]
  pub fn size(&self) -> Vec3 {
    self.max - self.min
  }

  /// Length of the main diagonal.
  #[inline]
  pub fn diagonal(&self) -> f32 {
    self.size().length()
  }

  #[inline]
  pub fn contains_point(&self, p: Vec3) -> bool {
    p.x >= self.min.x
      && p.x <= self.max.x
      && p.y >= self.min.y
      && p.y <= self.max.y
      && p.z >= self.min.z
      && p.z <= self.max.z
  }

  /// The 8 corners, z-major within y within x.
  pub fn corners(&self) -> [Vec3; 8] {
    let (a, b) = (self.min, self.max);
    [
      Vec3::new(a.x, a.y, a.z),
      Vec3::new(a.x, a.y, b.z),
      Vec3::new(a.x, b.y, a.z),
      Vec3::new(a.x, b.y, b.z),
      Vec3::new(b.x, a.y, a.z),
      Vec3::new(b.x, a.y, b.z),
      Vec3::new(b.x, b.y, a.z),
      Vec3::new(b.x, b.y, b.z),
    ]
  }

  /// Smallest box containing a set of points.
  pub fn from_points(points: &[Vec3]) -> Self {
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for &p in points {
      min = min.min(p);
      max = max.max(p);
    }
    Self { min, max }
  }

  pub fn is_finite(&self) -> bool {
    self.min.is_finite() && self.max.is_finite()
  }
}

/// Axis-aligned box in 2D.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb2 {
  pub min: Vec2,
  pub max: Vec2,
}

impl Aabb2 {
  pub fn new(min: Vec2, max: Vec2) -> Self {
    debug_assert!(
      min.x <= max.x && min.y <= max.y,
      "box min must be <= max on all axes"
    );
    Self { min, max }
  }

  pub fn from_half_extents(half: Vec2) -> Self {
    Self {
      min: -half,
      max: half,
    }
  }

  #[inline]
  pub fn union(&self, other: &Aabb2) -> Self {
    Self {
      min: self.min.min(other.min),
      max: self.max.max(other.max),
    }
  }

  pub fn intersection(&self, other: &Aabb2) -> Self {
    let min = self.min.max(other.min);
    let max = self.max.min(other.max);
    if min.x <= max.x && min.y <= max.y {
      Self { min, max }
    } else {
      let p = (self.center() + other.center()) * 0.5;
      Self { min: p, max: p }
    }
  }

  pub fn inflate(&self, margin: f32) -> Self {
    let min = self.min - Vec2::splat(margin);
    let max = self.max + Vec2::splat(margin);
    if min.x <= max.x && min.y <= max.y {
      Self { min, max }
    } else {
      let c = self.center();
      Self { min: c, max: c }
    }
  }

  #[inline]
  pub fn translate(&self, v: Vec2) -> Self {
    Self {
      min: self.min + v,
      max: self.max + v,
    }
  }

  #[inline]
  pub fn scale(&self, s: f32) -> Self {
    Self {
      min: self.min * s,
      max: self.max * s,
    }
  }

  pub fn mirrored_union(&self, axes: [bool; 2]) -> Self {
    let mut min = self.min;
    let mut max = self.max;
    for i in 0..2 {
      if axes[i] {
        let lo = min[i].min(-max[i]);
        let hi = max[i].max(-min[i]);
        min[i] = lo;
        max[i] = hi;
      }
    }
    Self { min, max }
  }

  #[inline]
  pub fn center(&self) -> Vec2 {
    (self.min + self.max) * 0.5
  }

  #[inline]
  pub fn size(&self) -> Vec2 {
    self.max - self.min
  }

  #[inline]
  pub fn diagonal(&self) -> f32 {
    self.size().length()
  }

  pub fn corners(&self) -> [Vec2; 4] {
    let (a, b) = (self.min, self.max);
    [
      Vec2::new(a.x, a.y),
      Vec2::new(a.x, b.y),
      Vec2::new(b.x, a.y),
      Vec2::new(b.x, b.y),
    ]
  }

  pub fn from_points(points: &[Vec2]) -> Self {
    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    for &p in points {
      min = min.min(p);
      max = max.max(p);
    }
    Self { min, max }
  }

  /// Largest |coordinate| over the four corners; used for revolved and
  /// twisted bounds.
  pub fn max_radius(&self) -> f32 {
    self
      .corners()
      .iter()
      .map(|c| c.length())
      .fold(0.0f32, f32::max)
  }

  pub fn is_finite(&self) -> bool {
    self.min.is_finite() && self.max.is_finite()
  }
}
