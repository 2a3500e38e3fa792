//! Isosurface extraction.
//!
//! Two meshers share the evaluator seam: a streaming octree mesher with
//! empty-space pruning and marching cubes, and a single-pass
//! dual-contouring mesher with a pluggable vertex placer.

pub mod dual;
pub mod icube;
pub mod marching;
pub mod octree;
pub mod tables;

pub use dual::{DualContourMesher, EdgeCrossing, LeastSquaresPlacer, VertexPlacer};
pub use octree::OctreeMesher;

use glam::Vec3;

/// Result of one streaming read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
  /// More triangles remain; call again.
  More,
  /// All cubes, prune queues and position buffers are drained.
  Eof,
}

/// One output triangle. Winding follows the inside-negative convention:
/// `normal()` points away from the solid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
  pub a: Vec3,
  pub b: Vec3,
  pub c: Vec3,
}

impl Triangle {
  pub const ZERO: Triangle = Triangle {
    a: Vec3::ZERO,
    b: Vec3::ZERO,
    c: Vec3::ZERO,
  };

  pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
    Self { a, b, c }
  }

  /// Unnormalized face normal (right-hand rule).
  #[inline]
  pub fn normal(&self) -> Vec3 {
    (self.b - self.a).cross(self.c - self.a)
  }

  #[inline]
  pub fn centroid(&self) -> Vec3 {
    (self.a + self.b + self.c) / 3.0
  }

  /// True when two vertices coincide or the area vanishes.
  pub fn is_degenerate(&self) -> bool {
    self.a == self.b
      || self.b == self.c
      || self.a == self.c
      || self.normal().length_squared() < 1e-18
  }
}

/// Buffer sizing for the octree mesher.
#[derive(Clone, Copy, Debug)]
pub struct MesherConfig {
  /// Corner positions evaluated per inner-SDF call. Must hold at least
  /// one decomposed leaf (64 positions).
  pub eval_batch: usize,
  /// Queued cubes per pruning pass; larger batches amortize SDF
  /// overhead.
  pub prune_batch: usize,
}

impl Default for MesherConfig {
  fn default() -> Self {
    Self {
      eval_batch: 4096,
      prune_batch: 1024,
    }
  }
}

/// Minimum caller buffer for `read_triangles`: marching cubes emits up
/// to five triangles per cell.
pub const MIN_TRIANGLE_CAPACITY: usize = 5;
