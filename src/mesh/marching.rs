//! Cell polygonization via the 256-case table.

use glam::Vec3;

use crate::mesh::tables::{EDGE_CORNERS, TRIANGLE_TABLE};
use crate::mesh::Triangle;

/// Triangulate one cell at threshold zero.
///
/// `corners` and `dists` follow the table's corner order. Interpolation
/// is linear (`t = d0 / (d0 - d1)`); edges with nearly equal endpoint
/// distances fall back to the midpoint and triangles that collapse are
/// dropped. Returns the number of triangles written into `out`.
pub(crate) fn polygonize(corners: &[Vec3; 8], dists: &[f32; 8], out: &mut [Triangle; 5]) -> usize {
  let mut case = 0usize;
  for (i, d) in dists.iter().enumerate() {
    if *d > 0.0 {
      case |= 1 << i;
    }
  }
  let row = &TRIANGLE_TABLE[case];
  if row[0] < 0 {
    return 0;
  }

  let mut verts = [Vec3::ZERO; 12];
  let mut have = [false; 12];
  let mut n = 0;
  let mut t = 0;
  while t < 15 && row[t] >= 0 {
    let edges = [row[t] as usize, row[t + 1] as usize, row[t + 2] as usize];
    for &e in &edges {
      if !have[e] {
        verts[e] = interpolate_edge(corners, dists, e);
        have[e] = true;
      }
    }
    let tri = Triangle::new(verts[edges[0]], verts[edges[1]], verts[edges[2]]);
    if !tri.is_degenerate() {
      out[n] = tri;
      n += 1;
    }
    t += 3;
  }
  n
}

#[inline]
fn interpolate_edge(corners: &[Vec3; 8], dists: &[f32; 8], edge: usize) -> Vec3 {
  let (i, j) = EDGE_CORNERS[edge];
  let (d0, d1) = (dists[i], dists[j]);
  let denom = d0 - d1;
  let t = if denom.abs() < f32::EPSILON {
    0.5
  } else {
    (d0 / denom).clamp(0.0, 1.0)
  };
  corners[i] + (corners[j] - corners[i]) * t
}
