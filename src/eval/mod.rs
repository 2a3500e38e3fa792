//! Batched point-to-distance evaluation.
//!
//! The [`Sdf3`]/[`Sdf2`] traits are the seam between shape expressions
//! and their consumers (meshers, caches, tests). The CPU evaluator walks
//! the expression recursively, leasing temporaries from a
//! [`ScratchPool`]; the GPU evaluator in [`crate::gpu`] implements the
//! same traits over a compiled compute program.

pub mod cache;
pub mod dist2;
pub mod dist3;
pub mod scratch;

pub use cache::{BlockCache3, CacheStats};
pub use scratch::ScratchPool;

use glam::{Vec2, Vec3};

use crate::error::{Error, Result};
use crate::math::{Aabb2, Aabb3};
use crate::shape::{Shape2, Shape3};

/// Batched 3D signed distance field.
///
/// `distances[i]` corresponds to `positions[i]`; order is preserved by
/// every implementation.
pub trait Sdf3 {
  fn evaluate(
    &mut self,
    positions: &[Vec3],
    distances: &mut [f32],
    scratch: &mut ScratchPool,
  ) -> Result<()>;

  fn bounds(&self) -> Aabb3;
}

/// Batched 2D signed distance field.
pub trait Sdf2 {
  fn evaluate(
    &mut self,
    positions: &[Vec2],
    distances: &mut [f32],
    scratch: &mut ScratchPool,
  ) -> Result<()>;

  fn bounds(&self) -> Aabb2;
}

impl<T: Sdf3 + ?Sized> Sdf3 for &mut T {
  fn evaluate(
    &mut self,
    positions: &[Vec3],
    distances: &mut [f32],
    scratch: &mut ScratchPool,
  ) -> Result<()> {
    (**self).evaluate(positions, distances, scratch)
  }

  fn bounds(&self) -> Aabb3 {
    (**self).bounds()
  }
}

impl<T: Sdf3 + ?Sized> Sdf3 for Box<T> {
  fn evaluate(
    &mut self,
    positions: &[Vec3],
    distances: &mut [f32],
    scratch: &mut ScratchPool,
  ) -> Result<()> {
    (**self).evaluate(positions, distances, scratch)
  }

  fn bounds(&self) -> Aabb3 {
    (**self).bounds()
  }
}

impl<T: Sdf2 + ?Sized> Sdf2 for &mut T {
  fn evaluate(
    &mut self,
    positions: &[Vec2],
    distances: &mut [f32],
    scratch: &mut ScratchPool,
  ) -> Result<()> {
    (**self).evaluate(positions, distances, scratch)
  }

  fn bounds(&self) -> Aabb2 {
    (**self).bounds()
  }
}

pub(crate) fn check_batch(positions: usize, distances: usize) -> Result<()> {
  if positions != distances {
    return Err(Error::BufferLengthMismatch {
      positions,
      distances,
    });
  }
  if positions == 0 {
    return Err(Error::EmptyBuffer);
  }
  Ok(())
}

/// Host-side evaluator over a 3D shape expression.
#[derive(Clone, Debug)]
pub struct CpuSdf3 {
  root: Shape3,
}

impl CpuSdf3 {
  pub fn new(root: Shape3) -> Self {
    Self { root }
  }

  pub fn root(&self) -> &Shape3 {
    &self.root
  }
}

impl Sdf3 for CpuSdf3 {
  fn evaluate(
    &mut self,
    positions: &[Vec3],
    distances: &mut [f32],
    scratch: &mut ScratchPool,
  ) -> Result<()> {
    check_batch(positions.len(), distances.len())?;
    let entry_leases = scratch.outstanding();
    match dist3::eval3(self.root.node(), positions, distances, scratch) {
      Ok(()) => {
        let now = scratch.outstanding();
        if now != entry_leases {
          scratch.reset();
          return Err(Error::LeakedScratch {
            count: now.saturating_sub(entry_leases),
          });
        }
        Ok(())
      }
      Err(e) => {
        // Leased buffers on the error path were dropped, not returned.
        scratch.reset();
        Err(e)
      }
    }
  }

  fn bounds(&self) -> Aabb3 {
    self.root.bounds()
  }
}

/// Host-side evaluator over a 2D shape expression.
#[derive(Clone)]
pub struct CpuSdf2 {
  root: Shape2,
}

impl CpuSdf2 {
  pub fn new(root: Shape2) -> Self {
    Self { root }
  }

  pub fn root(&self) -> &Shape2 {
    &self.root
  }
}

impl Sdf2 for CpuSdf2 {
  fn evaluate(
    &mut self,
    positions: &[Vec2],
    distances: &mut [f32],
    scratch: &mut ScratchPool,
  ) -> Result<()> {
    check_batch(positions.len(), distances.len())?;
    let entry_leases = scratch.outstanding();
    match dist2::eval2(self.root.node(), positions, distances, scratch) {
      Ok(()) => {
        let now = scratch.outstanding();
        if now != entry_leases {
          scratch.reset();
          return Err(Error::LeakedScratch {
            count: now.saturating_sub(entry_leases),
          });
        }
        Ok(())
      }
      Err(e) => {
        scratch.reset();
        Err(e)
      }
    }
  }

  fn bounds(&self) -> Aabb2 {
    self.root.bounds()
  }
}

#[cfg(test)]
#[path = "eval_test.rs"]
mod eval_test;
