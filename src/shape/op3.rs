//! 3D shape nodes.
//!
//! `Shape3` is a handle over an immutable node; the node stores its op,
//! its conservative bounds and its structural hash. Distance semantics
//! live in `eval::dist3` (host) and `emit::glsl3` (GPU); this module owns
//! construction, bounds propagation and traversal.

use std::sync::Arc;

use glam::{Mat3, Vec2, Vec3};

use crate::math::Aabb3;
use crate::shape::op2::Shape2;
use crate::shape::{structural_hash, NameCell};

/// Circumradius over apothem for a regular hexagon.
pub(crate) const HEX_CIRCUM: f32 = 1.154_700_6;

/// 3D node operation. Parameters are stored pre-baked for evaluation
/// (half extents, half heights, inverse rotations).
#[derive(Debug)]
pub(crate) enum Op3 {
  Sphere {
    r: f32,
  },
  Cuboid {
    half: Vec3,
    round: f32,
  },
  BoxFrame {
    half: Vec3,
    thick: f32,
  },
  Cylinder {
    r: f32,
    half_h: f32,
    round: f32,
  },
  HexPrism {
    r: f32,
    half_h: f32,
  },
  TriPrism {
    /// IQ size parameter; `side / sqrt(3)`.
    c: f32,
    half_h: f32,
  },
  Torus {
    ring: f32,
    tube: f32,
  },
  /// Twisted extrusion of a 2D profile: the profile rotates by
  /// `omega * z` radians while extruding over the height. The 2D
  /// distance is attenuated by the twist Lipschitz bound so pruning
  /// stays conservative.
  Screw {
    profile: Shape2,
    half_h: f32,
    omega: f32,
    atten: f32,
  },
  Union {
    a: Shape3,
    b: Shape3,
  },
  Intersect {
    a: Shape3,
    b: Shape3,
  },
  Difference {
    a: Shape3,
    b: Shape3,
  },
  Xor {
    a: Shape3,
    b: Shape3,
  },
  SmoothUnion {
    k: f32,
    a: Shape3,
    b: Shape3,
  },
  SmoothIntersect {
    k: f32,
    a: Shape3,
    b: Shape3,
  },
  SmoothDifference {
    k: f32,
    a: Shape3,
    b: Shape3,
  },
  /// Union of one child repeated at many offsets; emitted as a single
  /// function looping over an offset SSBO.
  UnionArray {
    child: Shape3,
    offsets: Arc<Vec<Vec3>>,
  },
  Translate {
    v: Vec3,
    child: Shape3,
  },
  Scale {
    s: f32,
    child: Shape3,
  },
  Rotate {
    /// Inverse (world-to-local) rotation.
    inv: Mat3,
    child: Shape3,
  },
  Symmetry {
    axes: [bool; 3],
    child: Shape3,
  },
  Array {
    pitch: Vec3,
    count: [u32; 3],
    child: Shape3,
  },
  Elongate {
    h: Vec3,
    child: Shape3,
  },
  Offset {
    d: f32,
    child: Shape3,
  },
  Shell {
    half_t: f32,
    child: Shape3,
  },
  Round {
    r: f32,
    child: Shape3,
  },
  Extrude {
    half_h: f32,
    profile: Shape2,
  },
  Revolve {
    offset: f32,
    profile: Shape2,
  },
}

#[derive(Debug)]
pub(crate) struct Node3 {
  pub(crate) op: Op3,
  pub(crate) bounds: Aabb3,
  pub(crate) hash: u64,
  pub(crate) name: NameCell,
}

/// Handle to an immutable 3D shape node. Cloning is cheap and shares the
/// underlying subexpression.
#[derive(Clone, Debug)]
pub struct Shape3 {
  node: Arc<Node3>,
}

impl Shape3 {
  pub(crate) fn from_op(op: Op3) -> Self {
    let bounds = op_bounds(&op);
    let hash = op_hash(&op);
    Self {
      node: Arc::new(Node3 {
        op,
        bounds,
        hash,
        name: NameCell::default(),
      }),
    }
  }

  pub(crate) fn node(&self) -> &Node3 {
    &self.node
  }

  /// Conservative bounds: every point with non-positive distance lies
  /// inside this box.
  pub fn bounds(&self) -> Aabb3 {
    self.node.bounds
  }

  /// Short kind tag, also the prefix of the default emission name.
  pub fn kind(&self) -> &'static str {
    op_kind(&self.node.op)
  }

  /// Structural identity used for emission dedup. Equal for
  /// structurally identical subexpressions.
  pub fn structural_id(&self) -> u64 {
    self.node.hash
  }

  /// Emission name: the shortener override if set, otherwise a stable
  /// identifier derived from the structural hash.
  pub fn name(&self) -> String {
    self
      .node
      .name
      .get()
      .unwrap_or_else(|| format!("{}_{:016x}", self.kind(), self.node.hash))
  }

  /// Override the emission name. Used by the name shortener.
  pub fn set_name(&self, name: impl Into<String>) {
    self.node.name.set(name.into());
  }

  /// Visit the 3D children left to right.
  pub fn for_each_child(&self, visit: &mut dyn FnMut(&Shape3)) {
    match &self.node.op {
      Op3::Sphere { .. }
      | Op3::Cuboid { .. }
      | Op3::BoxFrame { .. }
      | Op3::Cylinder { .. }
      | Op3::HexPrism { .. }
      | Op3::TriPrism { .. }
      | Op3::Torus { .. }
      | Op3::Screw { .. }
      | Op3::Extrude { .. }
      | Op3::Revolve { .. } => {}
      Op3::Union { a, b }
      | Op3::Intersect { a, b }
      | Op3::Difference { a, b }
      | Op3::Xor { a, b }
      | Op3::SmoothUnion { a, b, .. }
      | Op3::SmoothIntersect { a, b, .. }
      | Op3::SmoothDifference { a, b, .. } => {
        visit(a);
        visit(b);
      }
      Op3::UnionArray { child, .. }
      | Op3::Translate { child, .. }
      | Op3::Scale { child, .. }
      | Op3::Rotate { child, .. }
      | Op3::Symmetry { child, .. }
      | Op3::Array { child, .. }
      | Op3::Elongate { child, .. }
      | Op3::Offset { child, .. }
      | Op3::Shell { child, .. }
      | Op3::Round { child, .. } => visit(child),
    }
  }

  /// Visit the 2D children of kind-boundary nodes (extrude, revolve,
  /// screw).
  pub fn for_each_child_2d(&self, visit: &mut dyn FnMut(&Shape2)) {
    match &self.node.op {
      Op3::Screw { profile, .. } | Op3::Extrude { profile, .. } | Op3::Revolve { profile, .. } => {
        visit(profile)
      }
      _ => {}
    }
  }
}

fn op_kind(op: &Op3) -> &'static str {
  match op {
    Op3::Sphere { .. } => "sphere",
    Op3::Cuboid { .. } => "cuboid",
    Op3::BoxFrame { .. } => "boxframe",
    Op3::Cylinder { .. } => "cyl",
    Op3::HexPrism { .. } => "hexprism",
    Op3::TriPrism { .. } => "triprism",
    Op3::Torus { .. } => "torus",
    Op3::Screw { .. } => "screw",
    Op3::Union { .. } => "uni",
    Op3::Intersect { .. } => "inter",
    Op3::Difference { .. } => "diff",
    Op3::Xor { .. } => "xor",
    Op3::SmoothUnion { .. } => "suni",
    Op3::SmoothIntersect { .. } => "sinter",
    Op3::SmoothDifference { .. } => "sdiff",
    Op3::UnionArray { .. } => "uarr",
    Op3::Translate { .. } => "xlate",
    Op3::Scale { .. } => "scale",
    Op3::Rotate { .. } => "rot",
    Op3::Symmetry { .. } => "sym",
    Op3::Array { .. } => "arr",
    Op3::Elongate { .. } => "elong",
    Op3::Offset { .. } => "offset",
    Op3::Shell { .. } => "shell",
    Op3::Round { .. } => "rnd",
    Op3::Extrude { .. } => "extrude",
    Op3::Revolve { .. } => "revolve",
  }
}

fn op_bounds(op: &Op3) -> Aabb3 {
  match op {
    Op3::Sphere { r } => Aabb3::from_half_extents(Vec3::splat(*r)),
    Op3::Cuboid { half, .. } => Aabb3::from_half_extents(*half),
    Op3::BoxFrame { half, .. } => Aabb3::from_half_extents(*half),
    Op3::Cylinder { r, half_h, .. } => Aabb3::from_half_extents(Vec3::new(*r, *r, *half_h)),
    Op3::HexPrism { r, half_h } => {
      Aabb3::from_half_extents(Vec3::new(HEX_CIRCUM * r, HEX_CIRCUM * r, *half_h))
    }
    Op3::TriPrism { c, half_h } => {
      let hx = 0.866_025_4 * c;
      Aabb3::new(Vec3::new(-hx, -0.5 * c, -half_h), Vec3::new(hx, *c, *half_h))
    }
    Op3::Torus { ring, tube } => {
      Aabb3::from_half_extents(Vec3::new(ring + tube, ring + tube, *tube))
    }
    Op3::Screw {
      profile, half_h, ..
    } => {
      let rmax = profile.bounds().max_radius();
      Aabb3::from_half_extents(Vec3::new(rmax, rmax, *half_h))
    }
    Op3::Union { a, b } | Op3::Xor { a, b } => a.bounds().union(&b.bounds()),
    Op3::Intersect { a, b } => a.bounds().intersection(&b.bounds()),
    Op3::Difference { a, .. } => a.bounds(),
    Op3::SmoothUnion { k, a, b } => a.bounds().union(&b.bounds()).inflate(*k),
    Op3::SmoothIntersect { k, a, b } => a.bounds().intersection(&b.bounds()).inflate(*k),
    Op3::SmoothDifference { k, a, .. } => a.bounds().inflate(*k),
    Op3::UnionArray { child, offsets } => {
      let cb = child.bounds();
      let mut out = cb.translate(offsets[0]);
      for off in offsets.iter().skip(1) {
        out = out.union(&cb.translate(*off));
      }
      out
    }
    Op3::Translate { v, child } => child.bounds().translate(*v),
    Op3::Scale { s, child } => child.bounds().scale(*s),
    Op3::Rotate { inv, child } => {
      // Bounds corners map through the forward rotation.
      let fwd = inv.transpose();
      let corners = child.bounds().corners().map(|c| fwd * c);
      Aabb3::from_points(&corners)
    }
    Op3::Symmetry { axes, child } => child.bounds().mirrored_union(*axes),
    Op3::Array {
      pitch,
      count,
      child,
    } => {
      let cb = child.bounds();
      let span = Vec3::new(
        pitch.x * (count[0] - 1) as f32,
        pitch.y * (count[1] - 1) as f32,
        pitch.z * (count[2] - 1) as f32,
      );
      cb.union(&cb.translate(span))
    }
    Op3::Elongate { h, child } => {
      let cb = child.bounds();
      Aabb3::new(cb.min - *h, cb.max + *h)
    }
    Op3::Offset { d, child } => child.bounds().inflate((-*d).max(0.0)),
    Op3::Shell { half_t, child } => child.bounds().inflate(*half_t),
    Op3::Round { r, child } => child.bounds().inflate(*r),
    Op3::Extrude { half_h, profile } => {
      let pb = profile.bounds();
      Aabb3::new(
        Vec3::new(pb.min.x, pb.min.y, -half_h),
        Vec3::new(pb.max.x, pb.max.y, *half_h),
      )
    }
    Op3::Revolve { offset, profile } => {
      let pb = profile.bounds();
      let rmax = (offset + pb.max.x.max(-pb.min.x)).max(0.0);
      Aabb3::new(
        Vec3::new(-rmax, -rmax, pb.min.y),
        Vec3::new(rmax, rmax, pb.max.y),
      )
    }
  }
}

fn op_hash(op: &Op3) -> u64 {
  let tag = op_kind(op);
  match op {
    Op3::Sphere { r } => structural_hash(tag, &[*r], &[], &[]),
    Op3::Cuboid { half, round } => {
      structural_hash(tag, &[half.x, half.y, half.z, *round], &[], &[])
    }
    Op3::BoxFrame { half, thick } => {
      structural_hash(tag, &[half.x, half.y, half.z, *thick], &[], &[])
    }
    Op3::Cylinder { r, half_h, round } => structural_hash(tag, &[*r, *half_h, *round], &[], &[]),
    Op3::HexPrism { r, half_h } => structural_hash(tag, &[*r, *half_h], &[], &[]),
    Op3::TriPrism { c, half_h } => structural_hash(tag, &[*c, *half_h], &[], &[]),
    Op3::Torus { ring, tube } => structural_hash(tag, &[*ring, *tube], &[], &[]),
    Op3::Screw {
      profile,
      half_h,
      omega,
      atten,
    } => structural_hash(
      tag,
      &[*half_h, *omega, *atten],
      &[],
      &[profile.structural_id()],
    ),
    Op3::Union { a, b }
    | Op3::Intersect { a, b }
    | Op3::Difference { a, b }
    | Op3::Xor { a, b } => {
      structural_hash(tag, &[], &[], &[a.structural_id(), b.structural_id()])
    }
    Op3::SmoothUnion { k, a, b }
    | Op3::SmoothIntersect { k, a, b }
    | Op3::SmoothDifference { k, a, b } => {
      structural_hash(tag, &[*k], &[], &[a.structural_id(), b.structural_id()])
    }
    Op3::UnionArray { child, offsets } => {
      let floats: Vec<f32> = offsets.iter().flat_map(|o| [o.x, o.y, o.z]).collect();
      structural_hash(tag, &floats, &[], &[child.structural_id()])
    }
    Op3::Translate { v, child } => {
      structural_hash(tag, &[v.x, v.y, v.z], &[], &[child.structural_id()])
    }
    Op3::Scale { s, child } => structural_hash(tag, &[*s], &[], &[child.structural_id()]),
    Op3::Rotate { inv, child } => structural_hash(
      tag,
      &inv.to_cols_array(),
      &[],
      &[child.structural_id()],
    ),
    Op3::Symmetry { axes, child } => {
      let bits = axes[0] as u32 | (axes[1] as u32) << 1 | (axes[2] as u32) << 2;
      structural_hash(tag, &[], &[bits], &[child.structural_id()])
    }
    Op3::Array {
      pitch,
      count,
      child,
    } => structural_hash(
      tag,
      &[pitch.x, pitch.y, pitch.z],
      count,
      &[child.structural_id()],
    ),
    Op3::Elongate { h, child } => {
      structural_hash(tag, &[h.x, h.y, h.z], &[], &[child.structural_id()])
    }
    Op3::Offset { d, child } => structural_hash(tag, &[*d], &[], &[child.structural_id()]),
    Op3::Shell { half_t, child } => {
      structural_hash(tag, &[*half_t], &[], &[child.structural_id()])
    }
    Op3::Round { r, child } => structural_hash(tag, &[*r], &[], &[child.structural_id()]),
    Op3::Extrude { half_h, profile } => {
      structural_hash(tag, &[*half_h], &[], &[profile.structural_id()])
    }
    Op3::Revolve { offset, profile } => {
      structural_hash(tag, &[*offset], &[], &[profile.structural_id()])
    }
  }
}

/// Twist rate and Lipschitz attenuation for a screw over `profile`.
pub(crate) fn screw_params(profile: &Shape2, pitch: f32) -> (f32, f32) {
  let omega = std::f32::consts::TAU / pitch;
  let rmax = profile.bounds().max_radius();
  let atten = 1.0 / (1.0 + (omega * rmax).powi(2)).sqrt();
  (omega, atten)
}

#[cfg(test)]
#[path = "op3_test.rs"]
mod op3_test;
