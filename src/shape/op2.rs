//! 2D shape nodes. Mirrors `op3` for the planar kind.

use std::sync::Arc;

use glam::Vec2;

use crate::math::Aabb2;
use crate::shape::{structural_hash, NameCell};

#[derive(Debug)]
pub(crate) enum Op2 {
  Circle {
    r: f32,
  },
  Rectangle {
    half: Vec2,
  },
  Hexagon {
    /// Apothem (center to face distance).
    r: f32,
  },
  Arc {
    r: f32,
    /// (sin, cos) of the aperture half-angle.
    sc: Vec2,
    half_t: f32,
  },
  Segment {
    a: Vec2,
    b: Vec2,
    half_w: f32,
  },
  /// Closed polygon; emitted through a shader-object vertex SSBO.
  Polygon {
    verts: Arc<Vec<Vec2>>,
  },
  /// First-order gradient-normalized approximation; not exact far from
  /// the surface.
  Ellipse {
    ab: Vec2,
  },
  Union {
    a: Shape2,
    b: Shape2,
  },
  Intersect {
    a: Shape2,
    b: Shape2,
  },
  Difference {
    a: Shape2,
    b: Shape2,
  },
  Xor {
    a: Shape2,
    b: Shape2,
  },
  SmoothUnion {
    k: f32,
    a: Shape2,
    b: Shape2,
  },
  SmoothIntersect {
    k: f32,
    a: Shape2,
    b: Shape2,
  },
  SmoothDifference {
    k: f32,
    a: Shape2,
    b: Shape2,
  },
  UnionArray {
    child: Shape2,
    offsets: Arc<Vec<Vec2>>,
  },
  Translate {
    v: Vec2,
    child: Shape2,
  },
  Scale {
    s: f32,
    child: Shape2,
  },
  Rotate {
    /// (cos, sin) of the forward angle; evaluation applies the inverse.
    cs: Vec2,
    child: Shape2,
  },
  Symmetry {
    axes: [bool; 2],
    child: Shape2,
  },
  Array {
    pitch: Vec2,
    count: [u32; 2],
    child: Shape2,
  },
  Elongate {
    h: Vec2,
    child: Shape2,
  },
  Offset {
    d: f32,
    child: Shape2,
  },
  Shell {
    half_t: f32,
    child: Shape2,
  },
  Round {
    r: f32,
    child: Shape2,
  },
}

#[derive(Debug)]
pub(crate) struct Node2 {
  pub(crate) op: Op2,
  pub(crate) bounds: Aabb2,
  pub(crate) hash: u64,
  pub(crate) name: NameCell,
}

/// Handle to an immutable 2D shape node.
#[derive(Clone, Debug)]
pub struct Shape2 {
  node: Arc<Node2>,
}

impl Shape2 {
  pub(crate) fn from_op(op: Op2) -> Self {
    let bounds = op_bounds(&op);
    let hash = op_hash(&op);
    Self {
      node: Arc::new(Node2 {
        op,
        bounds,
        hash,
        name: NameCell::default(),
      }),
    }
  }

  pub(crate) fn node(&self) -> &Node2 {
    &self.node
  }

  /// Conservative bounds: every point with non-positive distance lies
  /// inside this box.
  pub fn bounds(&self) -> Aabb2 {
    self.node.bounds
  }

  pub fn kind(&self) -> &'static str {
    op_kind(&self.node.op)
  }

  pub fn structural_id(&self) -> u64 {
    self.node.hash
  }

  pub fn name(&self) -> String {
    self
      .node
      .name
      .get()
      .unwrap_or_else(|| format!("{}_{:016x}", self.kind(), self.node.hash))
  }

  pub fn set_name(&self, name: impl Into<String>) {
    self.node.name.set(name.into());
  }

  /// Visit the children left to right.
  pub fn for_each_child(&self, visit: &mut dyn FnMut(&Shape2)) {
    match &self.node.op {
      Op2::Circle { .. }
      | Op2::Rectangle { .. }
      | Op2::Hexagon { .. }
      | Op2::Arc { .. }
      | Op2::Segment { .. }
      | Op2::Polygon { .. }
      | Op2::Ellipse { .. } => {}
      Op2::Union { a, b }
      | Op2::Intersect { a, b }
      | Op2::Difference { a, b }
      | Op2::Xor { a, b }
      | Op2::SmoothUnion { a, b, .. }
      | Op2::SmoothIntersect { a, b, .. }
      | Op2::SmoothDifference { a, b, .. } => {
        visit(a);
        visit(b);
      }
      Op2::UnionArray { child, .. }
      | Op2::Translate { child, .. }
      | Op2::Scale { child, .. }
      | Op2::Rotate { child, .. }
      | Op2::Symmetry { child, .. }
      | Op2::Array { child, .. }
      | Op2::Elongate { child, .. }
      | Op2::Offset { child, .. }
      | Op2::Shell { child, .. }
      | Op2::Round { child, .. } => visit(child),
    }
  }
}

fn op_kind(op: &Op2) -> &'static str {
  match op {
    Op2::Circle { .. } => "circle",
    Op2::Rectangle { .. } => "rect",
    Op2::Hexagon { .. } => "hex",
    Op2::Arc { .. } => "arc",
    Op2::Segment { .. } => "seg",
    Op2::Polygon { .. } => "poly",
    Op2::Ellipse { .. } => "ellipse",
    Op2::Union { .. } => "uni2",
    Op2::Intersect { .. } => "inter2",
    Op2::Difference { .. } => "diff2",
    Op2::Xor { .. } => "xor2",
    Op2::SmoothUnion { .. } => "suni2",
    Op2::SmoothIntersect { .. } => "sinter2",
    Op2::SmoothDifference { .. } => "sdiff2",
    Op2::UnionArray { .. } => "uarr2",
    Op2::Translate { .. } => "xlate2",
    Op2::Scale { .. } => "scale2",
    Op2::Rotate { .. } => "rot2",
    Op2::Symmetry { .. } => "sym2",
    Op2::Array { .. } => "arr2",
    Op2::Elongate { .. } => "elong2",
    Op2::Offset { .. } => "offset2",
    Op2::Shell { .. } => "shell2",
    Op2::Round { .. } => "rnd2",
  }
}

fn op_bounds(op: &Op2) -> Aabb2 {
  match op {
    Op2::Circle { r } => Aabb2::from_half_extents(Vec2::splat(*r)),
    Op2::Rectangle { half } => Aabb2::from_half_extents(*half),
    Op2::Hexagon { r } => Aabb2::from_half_extents(Vec2::splat(super::op3::HEX_CIRCUM * r)),
    Op2::Arc { r, half_t, .. } => Aabb2::from_half_extents(Vec2::splat(r + half_t)),
    Op2::Segment { a, b, half_w } => {
      Aabb2::new(a.min(*b), a.max(*b)).inflate(*half_w)
    }
    Op2::Polygon { verts } => Aabb2::from_points(verts),
    Op2::Ellipse { ab } => Aabb2::from_half_extents(*ab),
    Op2::Union { a, b } | Op2::Xor { a, b } => a.bounds().union(&b.bounds()),
    Op2::Intersect { a, b } => a.bounds().intersection(&b.bounds()),
    Op2::Difference { a, .. } => a.bounds(),
    Op2::SmoothUnion { k, a, b } => a.bounds().union(&b.bounds()).inflate(*k),
    Op2::SmoothIntersect { k, a, b } => a.bounds().intersection(&b.bounds()).inflate(*k),
    Op2::SmoothDifference { k, a, .. } => a.bounds().inflate(*k),
    Op2::UnionArray { child, offsets } => {
      let cb = child.bounds();
      let mut out = cb.translate(offsets[0]);
      for off in offsets.iter().skip(1) {
        out = out.union(&cb.translate(*off));
      }
      out
    }
    Op2::Translate { v, child } => child.bounds().translate(*v),
    Op2::Scale { s, child } => child.bounds().scale(*s),
    Op2::Rotate { cs, child } => {
      let rot = |p: Vec2| Vec2::new(cs.x * p.x - cs.y * p.y, cs.y * p.x + cs.x * p.y);
      let corners = child.bounds().corners().map(rot);
      Aabb2::from_points(&corners)
    }
    Op2::Symmetry { axes, child } => child.bounds().mirrored_union(*axes),
    Op2::Array {
      pitch,
      count,
      child,
    } => {
      let cb = child.bounds();
      let span = Vec2::new(pitch.x * (count[0] - 1) as f32, pitch.y * (count[1] - 1) as f32);
      cb.union(&cb.translate(span))
    }
    Op2::Elongate { h, child } => {
      let cb = child.bounds();
      Aabb2::new(cb.min - *h, cb.max + *h)
    }
    Op2::Offset { d, child } => child.bounds().inflate((-*d).max(0.0)),
    Op2::Shell { half_t, child } => child.bounds().inflate(*half_t),
    Op2::Round { r, child } => child.bounds().inflate(*r),
  }
}

fn op_hash(op: &Op2) -> u64 {
  let tag = op_kind(op);
  match op {
    Op2::Circle { r } => structural_hash(tag, &[*r], &[], &[]),
    Op2::Rectangle { half } => structural_hash(tag, &[half.x, half.y], &[], &[]),
    Op2::Hexagon { r } => structural_hash(tag, &[*r], &[], &[]),
    Op2::Arc { r, sc, half_t } => structural_hash(tag, &[*r, sc.x, sc.y, *half_t], &[], &[]),
    Op2::Segment { a, b, half_w } => {
      structural_hash(tag, &[a.x, a.y, b.x, b.y, *half_w], &[], &[])
    }
    Op2::Polygon { verts } => {
      let floats: Vec<f32> = verts.iter().flat_map(|v| [v.x, v.y]).collect();
      structural_hash(tag, &floats, &[], &[])
    }
    Op2::Ellipse { ab } => structural_hash(tag, &[ab.x, ab.y], &[], &[]),
    Op2::Union { a, b }
    | Op2::Intersect { a, b }
    | Op2::Difference { a, b }
    | Op2::Xor { a, b } => {
      structural_hash(tag, &[], &[], &[a.structural_id(), b.structural_id()])
    }
    Op2::SmoothUnion { k, a, b }
    | Op2::SmoothIntersect { k, a, b }
    | Op2::SmoothDifference { k, a, b } => {
      structural_hash(tag, &[*k], &[], &[a.structural_id(), b.structural_id()])
    }
    Op2::UnionArray { child, offsets } => {
      let floats: Vec<f32> = offsets.iter().flat_map(|o| [o.x, o.y]).collect();
      structural_hash(tag, &floats, &[], &[child.structural_id()])
    }
    Op2::Translate { v, child } => {
      structural_hash(tag, &[v.x, v.y], &[], &[child.structural_id()])
    }
    Op2::Scale { s, child } => structural_hash(tag, &[*s], &[], &[child.structural_id()]),
    Op2::Rotate { cs, child } => {
      structural_hash(tag, &[cs.x, cs.y], &[], &[child.structural_id()])
    }
    Op2::Symmetry { axes, child } => {
      let bits = axes[0] as u32 | (axes[1] as u32) << 1;
      structural_hash(tag, &[], &[bits], &[child.structural_id()])
    }
    Op2::Array {
      pitch,
      count,
      child,
    } => structural_hash(tag, &[pitch.x, pitch.y], count, &[child.structural_id()]),
    Op2::Elongate { h, child } => {
      structural_hash(tag, &[h.x, h.y], &[], &[child.structural_id()])
    }
    Op2::Offset { d, child } => structural_hash(tag, &[*d], &[], &[child.structural_id()]),
    Op2::Shell { half_t, child } => {
      structural_hash(tag, &[*half_t], &[], &[child.structural_id()])
    }
    Op2::Round { r, child } => structural_hash(tag, &[*r], &[], &[child.structural_id()]),
  }
}
