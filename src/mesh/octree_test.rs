use glam::Vec3;

use super::*;
use crate::eval::CpuSdf3;
use crate::shape::Builder;

fn sphere_sdf(r: f32) -> CpuSdf3 {
  let mut b = Builder::new();
  let s = b.sphere(r);
  CpuSdf3::new(s)
}

#[test]
fn test_rejects_bad_resolution() {
  let err = OctreeMesher::new(sphere_sdf(1.0), 0.0, MesherConfig::default()).unwrap_err();
  assert!(matches!(err, Error::InvalidParameter { .. }));
}

#[test]
fn test_rejects_tiny_eval_batch() {
  let cfg = MesherConfig {
    eval_batch: 32,
    prune_batch: 64,
  };
  let err = OctreeMesher::new(sphere_sdf(1.0), 0.1, cfg).unwrap_err();
  assert!(matches!(err, Error::DecomposeExceedsBuffer(_)));
}

#[test]
fn test_rejects_overdeep_decomposition() {
  let err = OctreeMesher::new(sphere_sdf(1.0), 1e-7, MesherConfig::default()).unwrap_err();
  assert!(matches!(err, Error::DecomposeExceedsBuffer(_)));
}

#[test]
fn test_short_destination_is_error() {
  let mut mesher = OctreeMesher::new(sphere_sdf(1.0), 0.25, MesherConfig::default()).unwrap();
  let mut buf = [Triangle::ZERO; 4];
  let err = mesher.read_triangles(&mut buf).unwrap_err();
  assert!(matches!(err, Error::ShortBuffer { min: 5 }));
}

#[test]
fn test_sphere_mesh_is_plausible() {
  let mut mesher = OctreeMesher::new(sphere_sdf(1.0), 0.1, MesherConfig::default()).unwrap();
  let mut tris = Vec::new();
  mesher.render_all(&mut tris).unwrap();
  assert!(!tris.is_empty());

  for tri in &tris {
    // Vertices sit near the unit sphere surface.
    for v in [tri.a, tri.b, tri.c] {
      let r = v.length();
      assert!(
        (0.8..1.2).contains(&r),
        "vertex {v} too far from the surface (r = {r})"
      );
    }
    // Outward winding: the face normal agrees with the radial direction.
    let n = tri.normal();
    if n.length_squared() > 1e-12 {
      assert!(
        n.dot(tri.centroid()) > 0.0,
        "triangle normal points into the sphere"
      );
    }
  }
}

#[test]
fn test_eof_is_sticky() {
  let mut mesher = OctreeMesher::new(sphere_sdf(1.0), 0.25, MesherConfig::default()).unwrap();
  let mut tris = Vec::new();
  mesher.render_all(&mut tris).unwrap();

  let mut buf = [Triangle::ZERO; 8];
  let (n, status) = mesher.read_triangles(&mut buf).unwrap();
  assert_eq!(n, 0);
  assert_eq!(status, Status::Eof);
}

/// Property 6: chunked streaming equals the one-shot accumulation.
#[test]
fn test_streaming_matches_render_all() {
  let mut all = Vec::new();
  OctreeMesher::new(sphere_sdf(1.0), 0.15, MesherConfig::default())
    .unwrap()
    .render_all(&mut all)
    .unwrap();

  let mut streamed = Vec::new();
  let mut mesher = OctreeMesher::new(sphere_sdf(1.0), 0.15, MesherConfig::default()).unwrap();
  let mut buf = [Triangle::ZERO; 7];
  loop {
    let (n, status) = mesher.read_triangles(&mut buf).unwrap();
    streamed.extend_from_slice(&buf[..n]);
    if status == Status::Eof {
      break;
    }
  }
  assert_eq!(streamed, all, "stream must reproduce render_all exactly");
}

/// S6: most far-away cubes are pruned instead of decomposed.
#[test]
fn test_pruning_discards_empty_space() {
  let res = 1.0 / 16.0;
  let mut mesher = OctreeMesher::new(sphere_sdf(1.0), res, MesherConfig::default()).unwrap();
  let mut tris = Vec::new();
  mesher.render_all(&mut tris).unwrap();

  // Top cube is 32 cells per side with the sphere inscribed. Deep
  // interior and far exterior prune away; what survives is the shell
  // around the surface at level-2 granularity (2-cell cubes), so well
  // over a third of the smallest cells never get corner-evaluated.
  let total_cells = 32u64 * 32 * 32;
  assert!(
    mesher.pruned() > total_cells / 3,
    "only {} of {total_cells} cells pruned",
    mesher.pruned()
  );
  // Without pruning, corner evaluation alone would cost 8 points per
  // cell; pruning must keep the total comfortably below that.
  assert!(
    mesher.evaluations() < total_cells * 8 * 3 / 4,
    "{} evaluations for {total_cells} cells",
    mesher.evaluations()
  );
  assert!(!tris.is_empty());
}

/// Triangle volume of the unit-sphere mesh scales with resolution; the
/// count quadruples (within slack) per halving of the cell size.
#[test]
fn test_triangle_count_scales_with_resolution() {
  let count_at = |res: f32| {
    let mut mesher = OctreeMesher::new(sphere_sdf(1.0), res, MesherConfig::default()).unwrap();
    let mut tris = Vec::new();
    mesher.render_all(&mut tris).unwrap();
    tris.len() as f64
  };
  let coarse = count_at(0.125);
  let fine = count_at(0.0625);
  let ratio = fine / coarse;
  assert!(
    (2.5..6.0).contains(&ratio),
    "expected roughly 4x triangles after halving the cell size, got {ratio}"
  );
}

#[test]
fn test_translated_shape_meshes_in_its_bounds() {
  let mut b = Builder::new();
  let s = b.sphere(0.5);
  let t = b.translate(&s, Vec3::new(10.0, -3.0, 7.0));
  let mut mesher =
    OctreeMesher::new(CpuSdf3::new(t.clone()), 0.05, MesherConfig::default()).unwrap();
  let mut tris = Vec::new();
  mesher.render_all(&mut tris).unwrap();
  assert!(!tris.is_empty());
  let bounds = t.bounds().inflate(0.1);
  for tri in &tris {
    for v in [tri.a, tri.b, tri.c] {
      assert!(bounds.contains_point(v), "vertex {v} escaped the bounds");
    }
  }
}
