//! Host-side distance evaluation for 3D nodes.
//!
//! Mirrors `emit::glsl3`; keep both sides in lockstep when touching any
//! formula.

use glam::{Vec2, Vec3};

use crate::error::Result;
use crate::eval::dist2::{self, smooth_difference, smooth_intersect, smooth_union};
use crate::eval::ScratchPool;
use crate::shape::op3::{Node3, Op3};

#[inline]
pub(crate) fn sd_sphere(p: Vec3, r: f32) -> f32 {
  p.length() - r
}

#[inline]
pub(crate) fn sd_cuboid(p: Vec3, half: Vec3, round: f32) -> f32 {
  let q = p.abs() - (half - Vec3::splat(round));
  q.max(Vec3::ZERO).length() + q.max_element().min(0.0) - round
}

#[inline]
pub(crate) fn sd_box_frame(p: Vec3, half: Vec3, e: f32) -> f32 {
  let p = p.abs() - half;
  let q = (p + Vec3::splat(e)).abs() - Vec3::splat(e);
  let part = |v: Vec3, m: f32| v.max(Vec3::ZERO).length() + m.min(0.0);
  let d1 = part(Vec3::new(p.x, q.y, q.z), p.x.max(q.y.max(q.z)));
  let d2 = part(Vec3::new(q.x, p.y, q.z), q.x.max(p.y.max(q.z)));
  let d3 = part(Vec3::new(q.x, q.y, p.z), q.x.max(q.y.max(p.z)));
  d1.min(d2).min(d3)
}

#[inline]
pub(crate) fn sd_cylinder(p: Vec3, r: f32, half_h: f32, round: f32) -> f32 {
  let d = Vec2::new(p.truncate().length(), p.z).abs() - Vec2::new(r - round, half_h - round);
  d.x.max(d.y).min(0.0) + d.max(Vec2::ZERO).length() - round
}

#[inline]
pub(crate) fn sd_hex_prism(p: Vec3, r: f32, half_h: f32) -> f32 {
  const KX: f32 = -0.866_025_4;
  const KY: f32 = 0.5;
  const KZ: f32 = 0.577_350_27;
  let mut q = p.abs();
  let d = 2.0 * (KX * q.x + KY * q.y).min(0.0);
  q.x -= d * KX;
  q.y -= d * KY;
  let dx = (Vec2::new(q.x, q.y) - Vec2::new(q.x.clamp(-KZ * r, KZ * r), r)).length()
    * dist2::glsl_sign(q.y - r);
  let dy = q.z - half_h;
  dx.max(dy).min(0.0) + Vec2::new(dx, dy).max(Vec2::ZERO).length()
}

#[inline]
pub(crate) fn sd_tri_prism(p: Vec3, c: f32, half_h: f32) -> f32 {
  let q = p.abs();
  (q.z - half_h).max((q.x * 0.866_025_4 + p.y * 0.5).max(-p.y) - c * 0.5)
}

#[inline]
pub(crate) fn sd_torus(p: Vec3, ring: f32, tube: f32) -> f32 {
  let q = Vec2::new(p.truncate().length() - ring, p.z);
  q.length() - tube
}

#[inline]
pub(crate) fn sd_extrude(d2: f32, z: f32, half_h: f32) -> f32 {
  let w = Vec2::new(d2, z.abs() - half_h);
  w.x.max(w.y).min(0.0) + w.max(Vec2::ZERO).length()
}

/// Evaluate `node` at every position. `out.len() == pos.len()` is
/// guaranteed by the callers.
pub(crate) fn eval3(
  node: &Node3,
  pos: &[Vec3],
  out: &mut [f32],
  scratch: &mut ScratchPool,
) -> Result<()> {
  match &node.op {
    Op3::Sphere { r } => {
      for (p, d) in pos.iter().zip(out.iter_mut()) {
        *d = sd_sphere(*p, *r);
      }
    }
    Op3::Cuboid { half, round } => {
      for (p, d) in pos.iter().zip(out.iter_mut()) {
        *d = sd_cuboid(*p, *half, *round);
      }
    }
    Op3::BoxFrame { half, thick } => {
      for (p, d) in pos.iter().zip(out.iter_mut()) {
        *d = sd_box_frame(*p, *half, *thick);
      }
    }
    Op3::Cylinder { r, half_h, round } => {
      for (p, d) in pos.iter().zip(out.iter_mut()) {
        *d = sd_cylinder(*p, *r, *half_h, *round);
      }
    }
    Op3::HexPrism { r, half_h } => {
      for (p, d) in pos.iter().zip(out.iter_mut()) {
        *d = sd_hex_prism(*p, *r, *half_h);
      }
    }
    Op3::TriPrism { c, half_h } => {
      for (p, d) in pos.iter().zip(out.iter_mut()) {
        *d = sd_tri_prism(*p, *c, *half_h);
      }
    }
    Op3::Torus { ring, tube } => {
      for (p, d) in pos.iter().zip(out.iter_mut()) {
        *d = sd_torus(*p, *ring, *tube);
      }
    }
    Op3::Screw {
      profile,
      half_h,
      omega,
      atten,
    } => {
      let mut q = scratch.take_vec2s(pos.len());
      for (dst, p) in q.iter_mut().zip(pos) {
        let a = omega * p.z;
        let (s, c) = a.sin_cos();
        *dst = Vec2::new(c * p.x + s * p.y, -s * p.x + c * p.y);
      }
      dist2::eval2(profile.node(), &q, out, scratch)?;
      for (d, p) in out.iter_mut().zip(pos) {
        *d = (*d * atten).max(p.z.abs() - half_h);
      }
      scratch.put_vec2s(q);
    }
    Op3::Union { a, b } => {
      eval3(a.node(), pos, out, scratch)?;
      let mut tmp = scratch.take_floats(pos.len());
      eval3(b.node(), pos, &mut tmp, scratch)?;
      for (d, t) in out.iter_mut().zip(&tmp) {
        *d = d.min(*t);
      }
      scratch.put_floats(tmp);
    }
    Op3::Intersect { a, b } => {
      eval3(a.node(), pos, out, scratch)?;
      let mut tmp = scratch.take_floats(pos.len());
      eval3(b.node(), pos, &mut tmp, scratch)?;
      for (d, t) in out.iter_mut().zip(&tmp) {
        *d = d.max(*t);
      }
      scratch.put_floats(tmp);
    }
    Op3::Difference { a, b } => {
      eval3(a.node(), pos, out, scratch)?;
      let mut tmp = scratch.take_floats(pos.len());
      eval3(b.node(), pos, &mut tmp, scratch)?;
      for (d, t) in out.iter_mut().zip(&tmp) {
        *d = d.max(-*t);
      }
      scratch.put_floats(tmp);
    }
    Op3::Xor { a, b } => {
      eval3(a.node(), pos, out, scratch)?;
      let mut tmp = scratch.take_floats(pos.len());
      eval3(b.node(), pos, &mut tmp, scratch)?;
      for (d, t) in out.iter_mut().zip(&tmp) {
        *d = d.min(*t).max(-d.max(*t));
      }
      scratch.put_floats(tmp);
    }
    Op3::SmoothUnion { k, a, b } => {
      eval3(a.node(), pos, out, scratch)?;
      let mut tmp = scratch.take_floats(pos.len());
      eval3(b.node(), pos, &mut tmp, scratch)?;
      for (d, t) in out.iter_mut().zip(&tmp) {
        *d = smooth_union(*d, *t, *k);
      }
      scratch.put_floats(tmp);
    }
    Op3::SmoothIntersect { k, a, b } => {
      eval3(a.node(), pos, out, scratch)?;
      let mut tmp = scratch.take_floats(pos.len());
      eval3(b.node(), pos, &mut tmp, scratch)?;
      for (d, t) in out.iter_mut().zip(&tmp) {
        *d = smooth_intersect(*d, *t, *k);
      }
      scratch.put_floats(tmp);
    }
    Op3::SmoothDifference { k, a, b } => {
      eval3(a.node(), pos, out, scratch)?;
      let mut tmp = scratch.take_floats(pos.len());
      eval3(b.node(), pos, &mut tmp, scratch)?;
      for (d, t) in out.iter_mut().zip(&tmp) {
        *d = smooth_difference(*d, *t, *k);
      }
      scratch.put_floats(tmp);
    }
    Op3::UnionArray { child, offsets } => {
      let mut q = scratch.take_vec3s(pos.len());
      let mut tmp = scratch.take_floats(pos.len());
      out.fill(f32::INFINITY);
      for off in offsets.iter() {
        for (dst, p) in q.iter_mut().zip(pos) {
          *dst = *p - *off;
        }
        eval3(child.node(), &q, &mut tmp, scratch)?;
        for (d, t) in out.iter_mut().zip(&tmp) {
          *d = d.min(*t);
        }
      }
      scratch.put_floats(tmp);
      scratch.put_vec3s(q);
    }
    Op3::Translate { v, child } => {
      let mut q = scratch.take_vec3s(pos.len());
      for (dst, p) in q.iter_mut().zip(pos) {
        *dst = *p - *v;
      }
      eval3(child.node(), &q, out, scratch)?;
      scratch.put_vec3s(q);
    }
    Op3::Scale { s, child } => {
      let mut q = scratch.take_vec3s(pos.len());
      let inv = 1.0 / s;
      for (dst, p) in q.iter_mut().zip(pos) {
        *dst = *p * inv;
      }
      eval3(child.node(), &q, out, scratch)?;
      for d in out.iter_mut() {
        *d *= s;
      }
      scratch.put_vec3s(q);
    }
    Op3::Rotate { inv, child } => {
      let mut q = scratch.take_vec3s(pos.len());
      for (dst, p) in q.iter_mut().zip(pos) {
        *dst = *inv * *p;
      }
      eval3(child.node(), &q, out, scratch)?;
      scratch.put_vec3s(q);
    }
    Op3::Symmetry { axes, child } => {
      let mut q = scratch.take_vec3s(pos.len());
      for (dst, p) in q.iter_mut().zip(pos) {
        *dst = Vec3::new(
          if axes[0] { p.x.abs() } else { p.x },
          if axes[1] { p.y.abs() } else { p.y },
          if axes[2] { p.z.abs() } else { p.z },
        );
      }
      eval3(child.node(), &q, out, scratch)?;
      scratch.put_vec3s(q);
    }
    Op3::Array {
      pitch,
      count,
      child,
    } => {
      let nmax = Vec3::new(
        (count[0] - 1) as f32,
        (count[1] - 1) as f32,
        (count[2] - 1) as f32,
      );
      let mut q = scratch.take_vec3s(pos.len());
      for (dst, p) in q.iter_mut().zip(pos) {
        let id = (*p / *pitch).round().clamp(Vec3::ZERO, nmax);
        *dst = *p - *pitch * id;
      }
      eval3(child.node(), &q, out, scratch)?;
      scratch.put_vec3s(q);
    }
    Op3::Elongate { h, child } => {
      let mut q = scratch.take_vec3s(pos.len());
      for (dst, p) in q.iter_mut().zip(pos) {
        *dst = *p - p.clamp(-*h, *h);
      }
      eval3(child.node(), &q, out, scratch)?;
      scratch.put_vec3s(q);
    }
    Op3::Offset { d, child } => {
      eval3(child.node(), pos, out, scratch)?;
      for v in out.iter_mut() {
        *v += d;
      }
    }
    Op3::Shell { half_t, child } => {
      eval3(child.node(), pos, out, scratch)?;
      for v in out.iter_mut() {
        *v = v.abs() - half_t;
      }
    }
    Op3::Round { r, child } => {
      eval3(child.node(), pos, out, scratch)?;
      for v in out.iter_mut() {
        *v -= r;
      }
    }
    Op3::Extrude { half_h, profile } => {
      let mut q = scratch.take_vec2s(pos.len());
      for (dst, p) in q.iter_mut().zip(pos) {
        *dst = p.truncate();
      }
      dist2::eval2(profile.node(), &q, out, scratch)?;
      for (d, p) in out.iter_mut().zip(pos) {
        *d = sd_extrude(*d, p.z, *half_h);
      }
      scratch.put_vec2s(q);
    }
    Op3::Revolve { offset, profile } => {
      let mut q = scratch.take_vec2s(pos.len());
      for (dst, p) in q.iter_mut().zip(pos) {
        *dst = Vec2::new(p.truncate().length() - offset, p.z);
      }
      dist2::eval2(profile.node(), &q, out, scratch)?;
      scratch.put_vec2s(q);
    }
  }
  Ok(())
}
