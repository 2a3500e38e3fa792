//! Lattice sample-point generation.

use glam::{Vec2, Vec3};

use crate::math::{Aabb2, Aabb3};

/// Append an `nx * ny * nz` lattice of sample points covering `bounds`.
///
/// Element spacing is `bounds.size() / (nx, ny, nz)` and the first point
/// sits on `bounds.min`. Points are emitted z-fastest, then y, then x, so
/// consecutive points walk along the z axis.
pub fn append_grid_3d(dst: &mut Vec<Vec3>, bounds: &Aabb3, nx: usize, ny: usize, nz: usize) {
  let size = bounds.size();
  let step = Vec3::new(
    size.x / nx as f32,
    size.y / ny as f32,
    size.z / nz as f32,
  );
  dst.reserve(nx * ny * nz);
  for xi in 0..nx {
    for yi in 0..ny {
      for zi in 0..nz {
        dst.push(
          bounds.min + Vec3::new(xi as f32 * step.x, yi as f32 * step.y, zi as f32 * step.z),
        );
      }
    }
  }
}

/// Append an `nx * ny` lattice of 2D sample points covering `bounds`.
///
/// Points are emitted x-fastest, then y.
pub fn append_grid_2d(dst: &mut Vec<Vec2>, bounds: &Aabb2, nx: usize, ny: usize) {
  let size = bounds.size();
  let step = Vec2::new(size.x / nx as f32, size.y / ny as f32);
  dst.reserve(nx * ny);
  for yi in 0..ny {
    for xi in 0..nx {
      dst.push(bounds.min + Vec2::new(xi as f32 * step.x, yi as f32 * step.y));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_grid_3d_count_and_origin() {
    let b = Aabb3::new(Vec3::splat(-1.0), Vec3::splat(1.0));
    let mut pts = Vec::new();
    append_grid_3d(&mut pts, &b, 4, 3, 2);
    assert_eq!(pts.len(), 24);
    assert_eq!(pts[0], b.min);
    // z varies fastest
    assert_eq!(pts[1], b.min + Vec3::new(0.0, 0.0, 1.0));
  }

  #[test]
  fn test_grid_2d_x_major() {
    let b = Aabb2::new(Vec2::ZERO, Vec2::new(4.0, 2.0));
    let mut pts = Vec::new();
    append_grid_2d(&mut pts, &b, 4, 2);
    assert_eq!(pts.len(), 8);
    assert_eq!(pts[1], Vec2::new(1.0, 0.0));
    assert_eq!(pts[4], Vec2::new(0.0, 1.0));
  }
}
