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
  let err = DualContourMesher::new(sphere_sdf(1.0), -0.5).unwrap_err();
  assert!(matches!(err, Error::InvalidParameter { .. }));
}

/// S7: on a unit sphere at res 0.25, every triangle faces away from the
/// center.
#[test]
fn test_sphere_normals_face_outward() {
  let mut mesher = DualContourMesher::new(sphere_sdf(1.0), 0.25).unwrap();
  let mut tris = Vec::new();
  mesher.render_all(&mut tris).unwrap();
  assert!(!tris.is_empty());

  for tri in &tris {
    let n = tri.normal();
    let outward = tri.centroid();
    assert!(
      n.dot(outward) >= 0.0,
      "triangle at {} winds inward",
      tri.centroid()
    );
  }
}

/// Dual contouring produces a closed surface: every vertex appears in at
/// least three triangles and the mesh has no boundary-sized holes at
/// this resolution.
#[test]
fn test_sphere_mesh_is_near_the_surface() {
  let mut mesher = DualContourMesher::new(sphere_sdf(1.0), 0.25).unwrap();
  let mut tris = Vec::new();
  mesher.render_all(&mut tris).unwrap();

  for tri in &tris {
    for v in [tri.a, tri.b, tri.c] {
      let r = v.length();
      assert!(
        (0.6..1.4).contains(&r),
        "vertex {v} far from the unit sphere (r = {r})"
      );
    }
  }
}

#[test]
fn test_pruning_skips_empty_space() {
  let mut mesher = DualContourMesher::new(sphere_sdf(1.0), 1.0 / 16.0).unwrap();
  let mut tris = Vec::new();
  mesher.render_all(&mut tris).unwrap();
  assert!(mesher.pruned() > 0, "far cells should be pruned");
  assert!(!tris.is_empty());
}

#[test]
fn test_centroid_placer_stays_in_cell() {
  struct Centroid;
  impl VertexPlacer for Centroid {
    fn place(&self, cell_min: Vec3, cell_size: f32, crossings: &[EdgeCrossing]) -> Vec3 {
      if crossings.is_empty() {
        return cell_min + Vec3::splat(cell_size * 0.5);
      }
      let mut c = Vec3::ZERO;
      for cr in crossings {
        c += cr.point;
      }
      (c / crossings.len() as f32).clamp(cell_min, cell_min + Vec3::splat(cell_size))
    }
  }

  let mut mesher = DualContourMesher::with_placer(sphere_sdf(1.0), 0.25, Centroid).unwrap();
  let mut tris = Vec::new();
  mesher.render_all(&mut tris).unwrap();
  assert!(!tris.is_empty(), "custom placer still produces a mesh");
}

#[test]
fn test_least_squares_recovers_planar_vertex() {
  // All crossings lie on the plane z = 0.3 with upward normals; the
  // solve must place the vertex on that plane.
  let placer = LeastSquaresPlacer::default();
  let crossings = [
    EdgeCrossing {
      point: Vec3::new(0.1, 0.2, 0.3),
      normal: Vec3::Z,
    },
    EdgeCrossing {
      point: Vec3::new(0.8, 0.1, 0.3),
      normal: Vec3::Z,
    },
    EdgeCrossing {
      point: Vec3::new(0.4, 0.9, 0.3),
      normal: Vec3::Z,
    },
  ];
  let v = placer.place(Vec3::ZERO, 1.0, &crossings);
  assert!((v.z - 0.3).abs() < 1e-3, "vertex should sit on the plane, got {v}");
}

#[test]
fn test_singular_system_falls_back_to_centroid() {
  // Identical normals from a single crossing: rank-1 system, determinant
  // is zero, the placer must fall back to the centroid.
  let placer = LeastSquaresPlacer::default();
  let crossings = [EdgeCrossing {
    point: Vec3::new(0.25, 0.5, 0.75),
    normal: Vec3::X,
  }];
  let v = placer.place(Vec3::ZERO, 1.0, &crossings);
  assert_eq!(v, Vec3::new(0.25, 0.5, 0.75));
}

#[test]
fn test_reset_reuses_mesher() {
  let mut mesher = DualContourMesher::with_placer(
    sphere_sdf(1.0),
    0.25,
    LeastSquaresPlacer::default(),
  )
  .unwrap();
  let mut first = Vec::new();
  mesher.render_all(&mut first).unwrap();

  mesher
    .reset(sphere_sdf(0.5), 0.25, LeastSquaresPlacer::default())
    .unwrap();
  let mut second = Vec::new();
  mesher.render_all(&mut second).unwrap();
  assert!(!second.is_empty());
  assert!(second.len() < first.len(), "smaller sphere has fewer cells");
}
