//! Host-side distance evaluation for 2D nodes.
//!
//! Scalar formulas mirror the GLSL bodies in `emit::glsl2` exactly; the
//! backend-agreement tolerance depends on both sides computing the same
//! expressions in the same order.

use glam::Vec2;

use crate::error::Result;
use crate::eval::ScratchPool;
use crate::shape::op2::{Node2, Op2};

/// `sign` with GLSL semantics: zero at zero.
#[inline]
pub(crate) fn glsl_sign(x: f32) -> f32 {
  if x > 0.0 {
    1.0
  } else if x < 0.0 {
    -1.0
  } else {
    0.0
  }
}

#[inline]
pub(crate) fn mix(a: f32, b: f32, t: f32) -> f32 {
  a + (b - a) * t
}

#[inline]
pub(crate) fn sd_circle(p: Vec2, r: f32) -> f32 {
  p.length() - r
}

#[inline]
pub(crate) fn sd_rectangle(p: Vec2, half: Vec2) -> f32 {
  let q = p.abs() - half;
  q.max(Vec2::ZERO).length() + q.max_element().min(0.0)
}

#[inline]
pub(crate) fn sd_hexagon(p: Vec2, r: f32) -> f32 {
  const KX: f32 = -0.866_025_4;
  const KY: f32 = 0.5;
  const KZ: f32 = 0.577_350_27;
  let mut q = p.abs();
  let d = 2.0 * (KX * q.x + KY * q.y).min(0.0);
  q.x -= d * KX;
  q.y -= d * KY;
  q -= Vec2::new(q.x.clamp(-KZ * r, KZ * r), r);
  q.length() * glsl_sign(q.y)
}

#[inline]
pub(crate) fn sd_arc(p: Vec2, r: f32, sc: Vec2, half_t: f32) -> f32 {
  let p = Vec2::new(p.x.abs(), p.y);
  let d = if sc.y * p.x > sc.x * p.y {
    (p - sc * r).length()
  } else {
    (p.length() - r).abs()
  };
  d - half_t
}

#[inline]
pub(crate) fn sd_segment(p: Vec2, a: Vec2, b: Vec2, half_w: f32) -> f32 {
  let pa = p - a;
  let ba = b - a;
  let h = (pa.dot(ba) / ba.dot(ba)).clamp(0.0, 1.0);
  (pa - ba * h).length() - half_w
}

pub(crate) fn sd_polygon(p: Vec2, verts: &[Vec2]) -> f32 {
  let mut d = (p - verts[0]).length_squared();
  let mut s = 1.0f32;
  let mut j = verts.len() - 1;
  for i in 0..verts.len() {
    let e = verts[j] - verts[i];
    let w = p - verts[i];
    let b = w - e * (w.dot(e) / e.dot(e)).clamp(0.0, 1.0);
    d = d.min(b.length_squared());
    let c1 = p.y >= verts[i].y;
    let c2 = p.y < verts[j].y;
    let c3 = e.x * w.y > e.y * w.x;
    if (c1 && c2 && c3) || (!c1 && !c2 && !c3) {
      s = -s;
    }
    j = i;
  }
  s * d.sqrt()
}

#[inline]
pub(crate) fn sd_ellipse(p: Vec2, ab: Vec2) -> f32 {
  let k1 = (p / (ab * ab)).length();
  if k1 == 0.0 {
    return -ab.min_element();
  }
  let k0 = (p / ab).length();
  k0 * (k0 - 1.0) / k1
}

#[inline]
pub(crate) fn smooth_union(a: f32, b: f32, k: f32) -> f32 {
  let h = (0.5 + 0.5 * (b - a) / k).clamp(0.0, 1.0);
  mix(b, a, h) - k * h * (1.0 - h)
}

#[inline]
pub(crate) fn smooth_intersect(a: f32, b: f32, k: f32) -> f32 {
  let h = (0.5 - 0.5 * (b - a) / k).clamp(0.0, 1.0);
  mix(b, a, h) + k * h * (1.0 - h)
}

#[inline]
pub(crate) fn smooth_difference(a: f32, b: f32, k: f32) -> f32 {
  let h = (0.5 - 0.5 * (b + a) / k).clamp(0.0, 1.0);
  mix(a, -b, h) + k * h * (1.0 - h)
}

/// Evaluate `node` at every position. `out.len() == pos.len()` is
/// guaranteed by the callers.
pub(crate) fn eval2(
  node: &Node2,
  pos: &[Vec2],
  out: &mut [f32],
  scratch: &mut ScratchPool,
) -> Result<()> {
  match &node.op {
    Op2::Circle { r } => {
      for (p, d) in pos.iter().zip(out.iter_mut()) {
        *d = sd_circle(*p, *r);
      }
    }
    Op2::Rectangle { half } => {
      for (p, d) in pos.iter().zip(out.iter_mut()) {
        *d = sd_rectangle(*p, *half);
      }
    }
    Op2::Hexagon { r } => {
      for (p, d) in pos.iter().zip(out.iter_mut()) {
        *d = sd_hexagon(*p, *r);
      }
    }
    Op2::Arc { r, sc, half_t } => {
      for (p, d) in pos.iter().zip(out.iter_mut()) {
        *d = sd_arc(*p, *r, *sc, *half_t);
      }
    }
    Op2::Segment { a, b, half_w } => {
      for (p, d) in pos.iter().zip(out.iter_mut()) {
        *d = sd_segment(*p, *a, *b, *half_w);
      }
    }
    Op2::Polygon { verts } => {
      for (p, d) in pos.iter().zip(out.iter_mut()) {
        *d = sd_polygon(*p, verts);
      }
    }
    Op2::Ellipse { ab } => {
      for (p, d) in pos.iter().zip(out.iter_mut()) {
        *d = sd_ellipse(*p, *ab);
      }
    }
    Op2::Union { a, b } => {
      eval2(a.node(), pos, out, scratch)?;
      let mut tmp = scratch.take_floats(pos.len());
      eval2(b.node(), pos, &mut tmp, scratch)?;
      for (d, t) in out.iter_mut().zip(&tmp) {
        *d = d.min(*t);
      }
      scratch.put_floats(tmp);
    }
    Op2::Intersect { a, b } => {
      eval2(a.node(), pos, out, scratch)?;
      let mut tmp = scratch.take_floats(pos.len());
      eval2(b.node(), pos, &mut tmp, scratch)?;
      for (d, t) in out.iter_mut().zip(&tmp) {
        *d = d.max(*t);
      }
      scratch.put_floats(tmp);
    }
    Op2::Difference { a, b } => {
      eval2(a.node(), pos, out, scratch)?;
      let mut tmp = scratch.take_floats(pos.len());
      eval2(b.node(), pos, &mut tmp, scratch)?;
      for (d, t) in out.iter_mut().zip(&tmp) {
        *d = d.max(-*t);
      }
      scratch.put_floats(tmp);
    }
    Op2::Xor { a, b } => {
      eval2(a.node(), pos, out, scratch)?;
      let mut tmp = scratch.take_floats(pos.len());
      eval2(b.node(), pos, &mut tmp, scratch)?;
      for (d, t) in out.iter_mut().zip(&tmp) {
        *d = d.min(*t).max(-d.max(*t));
      }
      scratch.put_floats(tmp);
    }
    Op2::SmoothUnion { k, a, b } => {
      eval2(a.node(), pos, out, scratch)?;
      let mut tmp = scratch.take_floats(pos.len());
      eval2(b.node(), pos, &mut tmp, scratch)?;
      for (d, t) in out.iter_mut().zip(&tmp) {
        *d = smooth_union(*d, *t, *k);
      }
      scratch.put_floats(tmp);
    }
    Op2::SmoothIntersect { k, a, b } => {
      eval2(a.node(), pos, out, scratch)?;
      let mut tmp = scratch.take_floats(pos.len());
      eval2(b.node(), pos, &mut tmp, scratch)?;
      for (d, t) in out.iter_mut().zip(&tmp) {
        *d = smooth_intersect(*d, *t, *k);
      }
      scratch.put_floats(tmp);
    }
    Op2::SmoothDifference { k, a, b } => {
      eval2(a.node(), pos, out, scratch)?;
      let mut tmp = scratch.take_floats(pos.len());
      eval2(b.node(), pos, &mut tmp, scratch)?;
      for (d, t) in out.iter_mut().zip(&tmp) {
        *d = smooth_difference(*d, *t, *k);
      }
      scratch.put_floats(tmp);
    }
    Op2::UnionArray { child, offsets } => {
      let mut q = scratch.take_vec2s(pos.len());
      let mut tmp = scratch.take_floats(pos.len());
      out.fill(f32::INFINITY);
      for off in offsets.iter() {
        for (dst, p) in q.iter_mut().zip(pos) {
          *dst = *p - *off;
        }
        eval2(child.node(), &q, &mut tmp, scratch)?;
        for (d, t) in out.iter_mut().zip(&tmp) {
          *d = d.min(*t);
        }
      }
      scratch.put_floats(tmp);
      scratch.put_vec2s(q);
    }
    Op2::Translate { v, child } => {
      let mut q = scratch.take_vec2s(pos.len());
      for (dst, p) in q.iter_mut().zip(pos) {
        *dst = *p - *v;
      }
      eval2(child.node(), &q, out, scratch)?;
      scratch.put_vec2s(q);
    }
    Op2::Scale { s, child } => {
      let mut q = scratch.take_vec2s(pos.len());
      let inv = 1.0 / s;
      for (dst, p) in q.iter_mut().zip(pos) {
        *dst = *p * inv;
      }
      eval2(child.node(), &q, out, scratch)?;
      for d in out.iter_mut() {
        *d *= s;
      }
      scratch.put_vec2s(q);
    }
    Op2::Rotate { cs, child } => {
      let mut q = scratch.take_vec2s(pos.len());
      for (dst, p) in q.iter_mut().zip(pos) {
        // Inverse of the forward rotation (cs.x, cs.y) = (cos, sin).
        *dst = Vec2::new(cs.x * p.x + cs.y * p.y, -cs.y * p.x + cs.x * p.y);
      }
      eval2(child.node(), &q, out, scratch)?;
      scratch.put_vec2s(q);
    }
    Op2::Symmetry { axes, child } => {
      let mut q = scratch.take_vec2s(pos.len());
      for (dst, p) in q.iter_mut().zip(pos) {
        *dst = Vec2::new(
          if axes[0] { p.x.abs() } else { p.x },
          if axes[1] { p.y.abs() } else { p.y },
        );
      }
      eval2(child.node(), &q, out, scratch)?;
      scratch.put_vec2s(q);
    }
    Op2::Array {
      pitch,
      count,
      child,
    } => {
      let nmax = Vec2::new((count[0] - 1) as f32, (count[1] - 1) as f32);
      let mut q = scratch.take_vec2s(pos.len());
      for (dst, p) in q.iter_mut().zip(pos) {
        let id = (*p / *pitch).round().clamp(Vec2::ZERO, nmax);
        *dst = *p - *pitch * id;
      }
      eval2(child.node(), &q, out, scratch)?;
      scratch.put_vec2s(q);
    }
    Op2::Elongate { h, child } => {
      let mut q = scratch.take_vec2s(pos.len());
      for (dst, p) in q.iter_mut().zip(pos) {
        *dst = *p - p.clamp(-*h, *h);
      }
      eval2(child.node(), &q, out, scratch)?;
      scratch.put_vec2s(q);
    }
    Op2::Offset { d, child } => {
      eval2(child.node(), pos, out, scratch)?;
      for v in out.iter_mut() {
        *v += d;
      }
    }
    Op2::Shell { half_t, child } => {
      eval2(child.node(), pos, out, scratch)?;
      for v in out.iter_mut() {
        *v = v.abs() - half_t;
      }
    }
    Op2::Round { r, child } => {
      eval2(child.node(), pos, out, scratch)?;
      for v in out.iter_mut() {
        *v -= r;
      }
    }
  }
  Ok(())
}
