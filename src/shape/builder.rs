//! Validated shape construction with latched errors.
//!
//! Modeling code is call-chain heavy, so constructors never return
//! `Result`. The first invalid parameter latches on the builder and every
//! later constructor hands back a harmless placeholder node; `err()`
//! reports the original failure once the chain is done.

use std::sync::Arc;

use glam::{Mat3, Quat, Vec2, Vec3};

use crate::error::Error;
use crate::shape::op2::{Op2, Shape2};
use crate::shape::op3::{screw_params, Op3, Shape3};

/// Unit-length tolerance for rotation axes.
const AXIS_UNIT_EPS: f32 = 1e-4;

/// Shape constructor with sticky error state.
#[derive(Default)]
pub struct Builder {
  err: Option<Error>,
}

impl Builder {
  pub fn new() -> Self {
    Self::default()
  }

  /// First latched failure, if any. Sticky until [`Builder::reset_err`].
  pub fn err(&self) -> Option<&Error> {
    self.err.as_ref()
  }

  /// Take the latched failure, clearing the builder.
  pub fn take_err(&mut self) -> Option<Error> {
    self.err.take()
  }

  /// Clear the latched failure.
  pub fn reset_err(&mut self) {
    self.err = None;
  }

  fn latch(&mut self, node: &'static str, reason: String) {
    if self.err.is_none() {
      self.err = Some(Error::invalid(node, reason));
    }
  }

  /// Placeholder returned after a failure so chains never observe null.
  fn placeholder3(&self) -> Shape3 {
    Shape3::from_op(Op3::Sphere { r: 1.0 })
  }

  fn placeholder2(&self) -> Shape2 {
    Shape2::from_op(Op2::Circle { r: 1.0 })
  }

  fn check_finite(&mut self, node: &'static str, what: &str, values: &[f32]) -> bool {
    for v in values {
      if !v.is_finite() {
        self.latch(node, format!("{what} must be finite, got {v}"));
        return false;
      }
    }
    true
  }

  fn check_positive(&mut self, node: &'static str, what: &str, values: &[f32]) -> bool {
    if !self.check_finite(node, what, values) {
      return false;
    }
    for v in values {
      if *v <= 0.0 {
        self.latch(node, format!("{what} must be positive, got {v}"));
        return false;
      }
    }
    true
  }

  fn check_non_negative(&mut self, node: &'static str, what: &str, values: &[f32]) -> bool {
    if !self.check_finite(node, what, values) {
      return false;
    }
    for v in values {
      if *v < 0.0 {
        self.latch(node, format!("{what} must be non-negative, got {v}"));
        return false;
      }
    }
    true
  }

  // ===========================================================================
  // 3D primitives
  // ===========================================================================

  pub fn sphere(&mut self, r: f32) -> Shape3 {
    if !self.check_positive("sphere", "radius", &[r]) {
      return self.placeholder3();
    }
    Shape3::from_op(Op3::Sphere { r })
  }

  /// Box with side lengths `lx, ly, lz` and edge rounding `round`.
  pub fn cuboid(&mut self, lx: f32, ly: f32, lz: f32, round: f32) -> Shape3 {
    if !self.check_positive("cuboid", "side length", &[lx, ly, lz])
      || !self.check_non_negative("cuboid", "rounding", &[round])
    {
      return self.placeholder3();
    }
    let half = Vec3::new(lx, ly, lz) * 0.5;
    if round > half.min_element() {
      self.latch("cuboid", format!("rounding {round} exceeds half extent"));
      return self.placeholder3();
    }
    Shape3::from_op(Op3::Cuboid { half, round })
  }

  /// Hollow box wireframe with strut thickness `thick`.
  pub fn box_frame(&mut self, lx: f32, ly: f32, lz: f32, thick: f32) -> Shape3 {
    if !self.check_positive("box_frame", "side length", &[lx, ly, lz])
      || !self.check_positive("box_frame", "thickness", &[thick])
    {
      return self.placeholder3();
    }
    let half = Vec3::new(lx, ly, lz) * 0.5;
    Shape3::from_op(Op3::BoxFrame { half, thick })
  }

  /// Capped cylinder along z with edge rounding `round`.
  pub fn cylinder(&mut self, r: f32, h: f32, round: f32) -> Shape3 {
    if !self.check_positive("cylinder", "radius/height", &[r, h])
      || !self.check_non_negative("cylinder", "rounding", &[round])
    {
      return self.placeholder3();
    }
    if round > r.min(h * 0.5) {
      self.latch("cylinder", format!("rounding {round} exceeds radius or half height"));
      return self.placeholder3();
    }
    Shape3::from_op(Op3::Cylinder {
      r,
      half_h: h * 0.5,
      round,
    })
  }

  /// Hexagonal prism along z; `r` is the apothem (center to face).
  pub fn hex_prism(&mut self, r: f32, h: f32) -> Shape3 {
    if !self.check_positive("hex_prism", "radius/height", &[r, h]) {
      return self.placeholder3();
    }
    Shape3::from_op(Op3::HexPrism { r, half_h: h * 0.5 })
  }

  /// Equilateral triangular prism along z with edge length `side`.
  pub fn tri_prism(&mut self, side: f32, h: f32) -> Shape3 {
    if !self.check_positive("tri_prism", "side/height", &[side, h]) {
      return self.placeholder3();
    }
    Shape3::from_op(Op3::TriPrism {
      c: side / 3.0f32.sqrt(),
      half_h: h * 0.5,
    })
  }

  /// Torus in the xy plane around z.
  pub fn torus(&mut self, ring_r: f32, tube_r: f32) -> Shape3 {
    if !self.check_positive("torus", "radius", &[ring_r, tube_r]) {
      return self.placeholder3();
    }
    if tube_r >= ring_r {
      self.latch("torus", format!("tube radius {tube_r} must be below ring radius {ring_r}"));
      return self.placeholder3();
    }
    Shape3::from_op(Op3::Torus {
      ring: ring_r,
      tube: tube_r,
    })
  }

  /// Helical extrusion: the 2D profile rotates one full turn per `pitch`
  /// of height while extruding over `height`.
  pub fn screw(&mut self, profile: &Shape2, height: f32, pitch: f32) -> Shape3 {
    if !self.check_positive("screw", "height/pitch", &[height, pitch]) {
      return self.placeholder3();
    }
    let (omega, atten) = screw_params(profile, pitch);
    Shape3::from_op(Op3::Screw {
      profile: profile.clone(),
      half_h: height * 0.5,
      omega,
      atten,
    })
  }

  // ===========================================================================
  // 3D combinators
  // ===========================================================================

  pub fn union(&mut self, a: &Shape3, b: &Shape3) -> Shape3 {
    Shape3::from_op(Op3::Union {
      a: a.clone(),
      b: b.clone(),
    })
  }

  pub fn intersect(&mut self, a: &Shape3, b: &Shape3) -> Shape3 {
    Shape3::from_op(Op3::Intersect {
      a: a.clone(),
      b: b.clone(),
    })
  }

  /// `a` minus `b`.
  pub fn difference(&mut self, a: &Shape3, b: &Shape3) -> Shape3 {
    Shape3::from_op(Op3::Difference {
      a: a.clone(),
      b: b.clone(),
    })
  }

  pub fn xor(&mut self, a: &Shape3, b: &Shape3) -> Shape3 {
    Shape3::from_op(Op3::Xor {
      a: a.clone(),
      b: b.clone(),
    })
  }

  /// Left-associated union chain over any number of shapes.
  pub fn union_all(&mut self, shapes: &[Shape3]) -> Shape3 {
    let Some((first, rest)) = shapes.split_first() else {
      self.latch("union_all", "at least one shape required".into());
      return self.placeholder3();
    };
    let mut acc = first.clone();
    for s in rest {
      acc = self.union(&acc, s);
    }
    acc
  }

  /// Union of `child` repeated at every offset; one node backed by an
  /// offset SSBO on the GPU.
  pub fn union_array(&mut self, child: &Shape3, offsets: &[Vec3]) -> Shape3 {
    if offsets.is_empty() {
      self.latch("union_array", "at least one offset required".into());
      return self.placeholder3();
    }
    for off in offsets {
      if !self.check_finite("union_array", "offset", &[off.x, off.y, off.z]) {
        return self.placeholder3();
      }
    }
    Shape3::from_op(Op3::UnionArray {
      child: child.clone(),
      offsets: Arc::new(offsets.to_vec()),
    })
  }

  pub fn smooth_union(&mut self, a: &Shape3, b: &Shape3, k: f32) -> Shape3 {
    if !self.check_non_negative("smooth_union", "blend", &[k]) {
      return self.placeholder3();
    }
    if k == 0.0 {
      return self.union(a, b);
    }
    Shape3::from_op(Op3::SmoothUnion {
      k,
      a: a.clone(),
      b: b.clone(),
    })
  }

  pub fn smooth_intersect(&mut self, a: &Shape3, b: &Shape3, k: f32) -> Shape3 {
    if !self.check_non_negative("smooth_intersect", "blend", &[k]) {
      return self.placeholder3();
    }
    if k == 0.0 {
      return self.intersect(a, b);
    }
    Shape3::from_op(Op3::SmoothIntersect {
      k,
      a: a.clone(),
      b: b.clone(),
    })
  }

  pub fn smooth_difference(&mut self, a: &Shape3, b: &Shape3, k: f32) -> Shape3 {
    if !self.check_non_negative("smooth_difference", "blend", &[k]) {
      return self.placeholder3();
    }
    if k == 0.0 {
      return self.difference(a, b);
    }
    Shape3::from_op(Op3::SmoothDifference {
      k,
      a: a.clone(),
      b: b.clone(),
    })
  }

  // ===========================================================================
  // 3D transforms
  // ===========================================================================

  pub fn translate(&mut self, child: &Shape3, v: Vec3) -> Shape3 {
    if !self.check_finite("translate", "offset", &[v.x, v.y, v.z]) {
      return self.placeholder3();
    }
    Shape3::from_op(Op3::Translate {
      v,
      child: child.clone(),
    })
  }

  /// Uniform scale; the distance field is scaled exactly.
  pub fn scale(&mut self, child: &Shape3, s: f32) -> Shape3 {
    if !self.check_positive("scale", "factor", &[s]) {
      return self.placeholder3();
    }
    Shape3::from_op(Op3::Scale {
      s,
      child: child.clone(),
    })
  }

  /// Rotate around a unit axis by `angle` radians.
  pub fn rotate(&mut self, child: &Shape3, axis: Vec3, angle: f32) -> Shape3 {
    if !self.check_finite("rotate", "axis/angle", &[axis.x, axis.y, axis.z, angle]) {
      return self.placeholder3();
    }
    let len = axis.length();
    if (len - 1.0).abs() > AXIS_UNIT_EPS {
      self.latch("rotate", format!("axis must be unit length, |axis| = {len}"));
      return self.placeholder3();
    }
    let inv = Mat3::from_quat(Quat::from_axis_angle(axis, -angle));
    Shape3::from_op(Op3::Rotate {
      inv,
      child: child.clone(),
    })
  }

  /// Mirror the evaluation domain through the selected coordinate
  /// planes.
  pub fn symmetry(&mut self, child: &Shape3, x: bool, y: bool, z: bool) -> Shape3 {
    Shape3::from_op(Op3::Symmetry {
      axes: [x, y, z],
      child: child.clone(),
    })
  }

  /// Finite lattice repeat with per-axis pitch and counts.
  pub fn array(&mut self, child: &Shape3, pitch: Vec3, nx: u32, ny: u32, nz: u32) -> Shape3 {
    if !self.check_positive("array", "pitch", &[pitch.x, pitch.y, pitch.z]) {
      return self.placeholder3();
    }
    if nx == 0 || ny == 0 || nz == 0 {
      self.latch("array", format!("counts must be at least 1, got ({nx}, {ny}, {nz})"));
      return self.placeholder3();
    }
    Shape3::from_op(Op3::Array {
      pitch,
      count: [nx, ny, nz],
      child: child.clone(),
    })
  }

  /// Stretch the interior by inserting a box-shaped core.
  pub fn elongate(&mut self, child: &Shape3, dx: f32, dy: f32, dz: f32) -> Shape3 {
    if !self.check_non_negative("elongate", "amount", &[dx, dy, dz]) {
      return self.placeholder3();
    }
    Shape3::from_op(Op3::Elongate {
      h: Vec3::new(dx, dy, dz) * 0.5,
      child: child.clone(),
    })
  }

  /// Erode by `d` (negative values inflate).
  pub fn offset(&mut self, child: &Shape3, d: f32) -> Shape3 {
    if !self.check_finite("offset", "distance", &[d]) {
      return self.placeholder3();
    }
    Shape3::from_op(Op3::Offset {
      d,
      child: child.clone(),
    })
  }

  /// Keep a shell of total thickness `t` around the surface.
  pub fn shell(&mut self, child: &Shape3, t: f32) -> Shape3 {
    if !self.check_positive("shell", "thickness", &[t]) {
      return self.placeholder3();
    }
    Shape3::from_op(Op3::Shell {
      half_t: t * 0.5,
      child: child.clone(),
    })
  }

  /// Round edges by growing the surface outward by `r`; equivalent to
  /// `offset(-r)`.
  pub fn round(&mut self, child: &Shape3, r: f32) -> Shape3 {
    if !self.check_positive("round", "radius", &[r]) {
      return self.placeholder3();
    }
    Shape3::from_op(Op3::Round {
      r,
      child: child.clone(),
    })
  }

  /// Extrude a 2D profile along z to total height `h`.
  pub fn extrude(&mut self, profile: &Shape2, h: f32) -> Shape3 {
    if !self.check_positive("extrude", "height", &[h]) {
      return self.placeholder3();
    }
    Shape3::from_op(Op3::Extrude {
      half_h: h * 0.5,
      profile: profile.clone(),
    })
  }

  /// Revolve a 2D profile around z at radial offset `offset_r`.
  pub fn revolve(&mut self, profile: &Shape2, offset_r: f32) -> Shape3 {
    if !self.check_non_negative("revolve", "offset", &[offset_r]) {
      return self.placeholder3();
    }
    Shape3::from_op(Op3::Revolve {
      offset: offset_r,
      profile: profile.clone(),
    })
  }

  // ===========================================================================
  // 2D primitives
  // ===========================================================================

  pub fn circle(&mut self, r: f32) -> Shape2 {
    if !self.check_positive("circle", "radius", &[r]) {
      return self.placeholder2();
    }
    Shape2::from_op(Op2::Circle { r })
  }

  pub fn rectangle(&mut self, lx: f32, ly: f32) -> Shape2 {
    if !self.check_positive("rectangle", "side length", &[lx, ly]) {
      return self.placeholder2();
    }
    Shape2::from_op(Op2::Rectangle {
      half: Vec2::new(lx, ly) * 0.5,
    })
  }

  /// Regular hexagon; `r` is the apothem.
  pub fn hexagon(&mut self, r: f32) -> Shape2 {
    if !self.check_positive("hexagon", "radius", &[r]) {
      return self.placeholder2();
    }
    Shape2::from_op(Op2::Hexagon { r })
  }

  /// Circular arc of radius `r` spanning `angle` radians to either side
  /// of +y, with stroke thickness `thick`.
  pub fn arc(&mut self, r: f32, angle: f32, thick: f32) -> Shape2 {
    if !self.check_positive("arc", "radius/thickness", &[r, thick])
      || !self.check_positive("arc", "angle", &[angle])
    {
      return self.placeholder2();
    }
    if angle > std::f32::consts::PI {
      self.latch("arc", format!("aperture {angle} exceeds pi"));
      return self.placeholder2();
    }
    Shape2::from_op(Op2::Arc {
      r,
      sc: Vec2::new(angle.sin(), angle.cos()),
      half_t: thick * 0.5,
    })
  }

  /// Line segment from `p0` to `p1` with total stroke width `width`.
  pub fn segment(&mut self, p0: Vec2, p1: Vec2, width: f32) -> Shape2 {
    if !self.check_finite("segment", "endpoint", &[p0.x, p0.y, p1.x, p1.y])
      || !self.check_positive("segment", "width", &[width])
    {
      return self.placeholder2();
    }
    if p0 == p1 {
      self.latch("segment", "endpoints coincide".into());
      return self.placeholder2();
    }
    Shape2::from_op(Op2::Segment {
      a: p0,
      b: p1,
      half_w: width * 0.5,
    })
  }

  /// Closed polygon from at least three vertices with nonzero area.
  pub fn polygon(&mut self, vertices: &[Vec2]) -> Shape2 {
    if vertices.len() < 3 {
      self.latch("polygon", format!("{} vertices, need at least 3", vertices.len()));
      return self.placeholder2();
    }
    for v in vertices {
      if !self.check_finite("polygon", "vertex", &[v.x, v.y]) {
        return self.placeholder2();
      }
    }
    // Shoelace area; zero means degenerate.
    let mut area2 = 0.0f64;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
      area2 += (vertices[j].x as f64) * (vertices[i].y as f64)
        - (vertices[i].x as f64) * (vertices[j].y as f64);
      j = i;
    }
    if area2.abs() < 1e-12 {
      self.latch("polygon", "zero area".into());
      return self.placeholder2();
    }
    Shape2::from_op(Op2::Polygon {
      verts: Arc::new(vertices.to_vec()),
    })
  }

  /// Ellipse with semi-axes `a` (x) and `b` (y).
  pub fn ellipse(&mut self, a: f32, b: f32) -> Shape2 {
    if !self.check_positive("ellipse", "semi-axis", &[a, b]) {
      return self.placeholder2();
    }
    Shape2::from_op(Op2::Ellipse { ab: Vec2::new(a, b) })
  }

  // ===========================================================================
  // 2D combinators and transforms
  // ===========================================================================

  pub fn union2(&mut self, a: &Shape2, b: &Shape2) -> Shape2 {
    Shape2::from_op(Op2::Union {
      a: a.clone(),
      b: b.clone(),
    })
  }

  pub fn intersect2(&mut self, a: &Shape2, b: &Shape2) -> Shape2 {
    Shape2::from_op(Op2::Intersect {
      a: a.clone(),
      b: b.clone(),
    })
  }

  pub fn difference2(&mut self, a: &Shape2, b: &Shape2) -> Shape2 {
    Shape2::from_op(Op2::Difference {
      a: a.clone(),
      b: b.clone(),
    })
  }

  pub fn xor2(&mut self, a: &Shape2, b: &Shape2) -> Shape2 {
    Shape2::from_op(Op2::Xor {
      a: a.clone(),
      b: b.clone(),
    })
  }

  pub fn union_all2(&mut self, shapes: &[Shape2]) -> Shape2 {
    let Some((first, rest)) = shapes.split_first() else {
      self.latch("union_all2", "at least one shape required".into());
      return self.placeholder2();
    };
    let mut acc = first.clone();
    for s in rest {
      acc = self.union2(&acc, s);
    }
    acc
  }

  pub fn union_array2(&mut self, child: &Shape2, offsets: &[Vec2]) -> Shape2 {
    if offsets.is_empty() {
      self.latch("union_array2", "at least one offset required".into());
      return self.placeholder2();
    }
    for off in offsets {
      if !self.check_finite("union_array2", "offset", &[off.x, off.y]) {
        return self.placeholder2();
      }
    }
    Shape2::from_op(Op2::UnionArray {
      child: child.clone(),
      offsets: Arc::new(offsets.to_vec()),
    })
  }

  pub fn smooth_union2(&mut self, a: &Shape2, b: &Shape2, k: f32) -> Shape2 {
    if !self.check_non_negative("smooth_union2", "blend", &[k]) {
      return self.placeholder2();
    }
    if k == 0.0 {
      return self.union2(a, b);
    }
    Shape2::from_op(Op2::SmoothUnion {
      k,
      a: a.clone(),
      b: b.clone(),
    })
  }

  pub fn smooth_intersect2(&mut self, a: &Shape2, b: &Shape2, k: f32) -> Shape2 {
    if !self.check_non_negative("smooth_intersect2", "blend", &[k]) {
      return self.placeholder2();
    }
    if k == 0.0 {
      return self.intersect2(a, b);
    }
    Shape2::from_op(Op2::SmoothIntersect {
      k,
      a: a.clone(),
      b: b.clone(),
    })
  }

  pub fn smooth_difference2(&mut self, a: &Shape2, b: &Shape2, k: f32) -> Shape2 {
    if !self.check_non_negative("smooth_difference2", "blend", &[k]) {
      return self.placeholder2();
    }
    if k == 0.0 {
      return self.difference2(a, b);
    }
    Shape2::from_op(Op2::SmoothDifference {
      k,
      a: a.clone(),
      b: b.clone(),
    })
  }

  pub fn translate2(&mut self, child: &Shape2, v: Vec2) -> Shape2 {
    if !self.check_finite("translate2", "offset", &[v.x, v.y]) {
      return self.placeholder2();
    }
    Shape2::from_op(Op2::Translate {
      v,
      child: child.clone(),
    })
  }

  pub fn scale2(&mut self, child: &Shape2, s: f32) -> Shape2 {
    if !self.check_positive("scale2", "factor", &[s]) {
      return self.placeholder2();
    }
    Shape2::from_op(Op2::Scale {
      s,
      child: child.clone(),
    })
  }

  /// Rotate counterclockwise by `angle` radians.
  pub fn rotate2(&mut self, child: &Shape2, angle: f32) -> Shape2 {
    if !self.check_finite("rotate2", "angle", &[angle]) {
      return self.placeholder2();
    }
    Shape2::from_op(Op2::Rotate {
      cs: Vec2::new(angle.cos(), angle.sin()),
      child: child.clone(),
    })
  }

  pub fn symmetry2(&mut self, child: &Shape2, x: bool, y: bool) -> Shape2 {
    Shape2::from_op(Op2::Symmetry {
      axes: [x, y],
      child: child.clone(),
    })
  }

  pub fn array2(&mut self, child: &Shape2, pitch: Vec2, nx: u32, ny: u32) -> Shape2 {
    if !self.check_positive("array2", "pitch", &[pitch.x, pitch.y]) {
      return self.placeholder2();
    }
    if nx == 0 || ny == 0 {
      self.latch("array2", format!("counts must be at least 1, got ({nx}, {ny})"));
      return self.placeholder2();
    }
    Shape2::from_op(Op2::Array {
      pitch,
      count: [nx, ny],
      child: child.clone(),
    })
  }

  pub fn elongate2(&mut self, child: &Shape2, dx: f32, dy: f32) -> Shape2 {
    if !self.check_non_negative("elongate2", "amount", &[dx, dy]) {
      return self.placeholder2();
    }
    Shape2::from_op(Op2::Elongate {
      h: Vec2::new(dx, dy) * 0.5,
      child: child.clone(),
    })
  }

  pub fn offset2(&mut self, child: &Shape2, d: f32) -> Shape2 {
    if !self.check_finite("offset2", "distance", &[d]) {
      return self.placeholder2();
    }
    Shape2::from_op(Op2::Offset {
      d,
      child: child.clone(),
    })
  }

  pub fn shell2(&mut self, child: &Shape2, t: f32) -> Shape2 {
    if !self.check_positive("shell2", "thickness", &[t]) {
      return self.placeholder2();
    }
    Shape2::from_op(Op2::Shell {
      half_t: t * 0.5,
      child: child.clone(),
    })
  }

  pub fn round2(&mut self, child: &Shape2, r: f32) -> Shape2 {
    if !self.check_positive("round2", "radius", &[r]) {
      return self.placeholder2();
    }
    Shape2::from_op(Op2::Round {
      r,
      child: child.clone(),
    })
  }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod builder_test;
