use glam::{Vec2, Vec3};

use super::*;
use crate::shape::Builder;

fn eval_one(sdf: &mut impl Sdf3, p: Vec3) -> f32 {
  let mut scratch = ScratchPool::new();
  let mut out = [0.0f32];
  sdf.evaluate(&[p], &mut out, &mut scratch).unwrap();
  out[0]
}

fn eval_one_2d(sdf: &mut impl Sdf2, p: Vec2) -> f32 {
  let mut scratch = ScratchPool::new();
  let mut out = [0.0f32];
  sdf.evaluate(&[p], &mut out, &mut scratch).unwrap();
  out[0]
}

// =========================================================================
// Batch contract
// =========================================================================

#[test]
fn test_length_mismatch_is_error() {
  let mut b = Builder::new();
  let mut sdf = CpuSdf3::new(b.sphere(1.0));
  let mut scratch = ScratchPool::new();
  let mut out = [0.0f32; 2];
  let err = sdf
    .evaluate(&[Vec3::ZERO], &mut out, &mut scratch)
    .unwrap_err();
  assert!(matches!(err, Error::BufferLengthMismatch { .. }));
}

#[test]
fn test_empty_batch_is_error() {
  let mut b = Builder::new();
  let mut sdf = CpuSdf3::new(b.sphere(1.0));
  let mut scratch = ScratchPool::new();
  let err = sdf.evaluate(&[], &mut [], &mut scratch).unwrap_err();
  assert!(matches!(err, Error::EmptyBuffer));
}

#[test]
fn test_output_order_matches_input() {
  let mut b = Builder::new();
  let mut sdf = CpuSdf3::new(b.sphere(1.0));
  let mut scratch = ScratchPool::new();
  let pts = vec![
    Vec3::ZERO,
    Vec3::new(2.0, 0.0, 0.0),
    Vec3::new(0.0, 3.0, 0.0),
  ];
  let mut out = vec![0.0; 3];
  sdf.evaluate(&pts, &mut out, &mut scratch).unwrap();
  assert_eq!(out[0], -1.0);
  assert_eq!(out[1], 1.0);
  assert_eq!(out[2], 2.0);
}

/// Property 5: no scratch buffer survives a top-level evaluate.
#[test]
fn test_no_scratch_leak_across_deep_expression() {
  let mut b = Builder::new();
  let profile = b.polygon(&[
    Vec2::new(-0.5, -0.5),
    Vec2::new(0.6, -0.4),
    Vec2::new(0.0, 0.7),
  ]);
  let solid = b.extrude(&profile, 1.0);
  let ball = b.sphere(0.8);
  let blend = b.smooth_union(&solid, &ball, 0.2);
  let rot = b.rotate(&blend, Vec3::Y, 0.3);
  let root = b.array(&rot, Vec3::splat(2.0), 2, 2, 2);
  assert!(b.err().is_none());

  let mut sdf = CpuSdf3::new(root);
  let mut scratch = ScratchPool::new();
  let pts: Vec<Vec3> = (0..100)
    .map(|i| Vec3::splat(i as f32 * 0.05) - Vec3::splat(1.0))
    .collect();
  let mut out = vec![0.0; pts.len()];
  sdf.evaluate(&pts, &mut out, &mut scratch).unwrap();
  assert_eq!(scratch.outstanding(), 0);
  assert!(scratch.peak() > 0, "combinators should lease buffers");
}

// =========================================================================
// Distance semantics
// =========================================================================

/// S4: symmetry evaluates as the mirrored point, exactly.
#[test]
fn test_symmetry_matches_abs_evaluation() {
  let mut b = Builder::new();
  let s = b.sphere(1.0);
  let off = b.translate(&s, Vec3::new(0.5, 0.25, -0.125));
  let sym = b.symmetry(&off, true, true, true);
  let mut plain = CpuSdf3::new(off);
  let mut mirrored = CpuSdf3::new(sym);

  for p in [
    Vec3::new(-0.7, 0.3, -0.2),
    Vec3::new(0.7, -0.3, 0.2),
    Vec3::new(-1.1, -0.9, -0.4),
  ] {
    let expect = eval_one(&mut plain, p.abs());
    let got = eval_one(&mut mirrored, p);
    assert_eq!(got, expect, "symmetry must equal evaluation at |p|");
  }
}

/// S5: scale composes exactly with the child field.
#[test]
fn test_scale_composition() {
  let mut b = Builder::new();
  let s = b.sphere(1.0);
  let scaled = b.scale(&s, 2.0);
  let mut unit = CpuSdf3::new(s);
  let mut big = CpuSdf3::new(scaled);

  for p in [
    Vec3::new(1.0, 2.0, -0.5),
    Vec3::new(3.0, 0.0, 0.0),
    Vec3::splat(0.1),
  ] {
    let expect = 2.0 * eval_one(&mut unit, p / 2.0);
    let got = eval_one(&mut big, p);
    assert_eq!(got, expect);
  }
}

#[test]
fn test_difference_carves() {
  let mut b = Builder::new();
  let cube = b.cuboid(2.0, 2.0, 2.0, 0.0);
  let ball = b.sphere(0.5);
  let carved = b.difference(&cube, &ball);
  let mut sdf = CpuSdf3::new(carved);

  // Center is inside the removed ball: positive.
  assert!(eval_one(&mut sdf, Vec3::ZERO) > 0.0);
  // Near a cube corner: still solid.
  assert!(eval_one(&mut sdf, Vec3::splat(0.8)) < 0.0);
}

#[test]
fn test_shell_hollows() {
  let mut b = Builder::new();
  let ball = b.sphere(1.0);
  let hollow = b.shell(&ball, 0.1);
  let mut sdf = CpuSdf3::new(hollow);

  assert!(eval_one(&mut sdf, Vec3::ZERO) > 0.0, "core is empty");
  assert!(
    eval_one(&mut sdf, Vec3::new(1.0, 0.0, 0.0)) < 0.0,
    "surface band is solid"
  );
}

#[test]
fn test_round_grows_surface() {
  let mut b = Builder::new();
  let cube = b.cuboid(1.0, 1.0, 1.0, 0.0);
  let rounded = b.round(&cube, 0.25);
  let mut sdf = CpuSdf3::new(rounded);
  // A face point just outside the sharp cube is inside the rounded one.
  assert!(eval_one(&mut sdf, Vec3::new(0.6, 0.0, 0.0)) < 0.0);
}

#[test]
fn test_array_repeats_copies() {
  let mut b = Builder::new();
  let ball = b.sphere(0.3);
  let grid = b.array(&ball, Vec3::splat(1.0), 3, 1, 1);
  let mut sdf = CpuSdf3::new(grid);

  for i in 0..3 {
    let center = Vec3::new(i as f32, 0.0, 0.0);
    assert!(
      (eval_one(&mut sdf, center) + 0.3).abs() < 1e-6,
      "copy {i} missing"
    );
  }
  // One pitch past the last copy there is no fourth instance.
  assert!(eval_one(&mut sdf, Vec3::new(3.0, 0.0, 0.0)) > 0.0);
}

#[test]
fn test_union_array_matches_explicit_unions() {
  let mut b = Builder::new();
  let ball = b.sphere(0.4);
  let offsets = [
    Vec3::ZERO,
    Vec3::new(1.5, 0.0, 0.0),
    Vec3::new(0.0, 2.0, 0.5),
  ];
  let packed = b.union_array(&ball, &offsets);

  let shifted: Vec<_> = offsets.iter().map(|&o| b.translate(&ball, o)).collect();
  let chained = b.union_all(&shifted);
  assert!(b.err().is_none());

  let mut packed = CpuSdf3::new(packed);
  let mut chained = CpuSdf3::new(chained);
  for p in [Vec3::ZERO, Vec3::new(1.0, 1.0, 0.2), Vec3::splat(-0.6)] {
    let got = eval_one(&mut packed, p);
    let expect = eval_one(&mut chained, p);
    assert!((got - expect).abs() < 1e-6);
  }
}

#[test]
fn test_extrude_slab() {
  let mut b = Builder::new();
  let c = b.circle(1.0);
  let solid = b.extrude(&c, 2.0);
  let mut sdf = CpuSdf3::new(solid);

  assert!((eval_one(&mut sdf, Vec3::ZERO) + 1.0).abs() < 1e-6);
  // Directly above the top cap.
  assert!((eval_one(&mut sdf, Vec3::new(0.0, 0.0, 1.5)) - 0.5).abs() < 1e-6);
}

#[test]
fn test_revolve_makes_torus() {
  let mut b = Builder::new();
  let c = b.circle(0.25);
  let ring = b.revolve(&c, 1.0);
  let torus = b.torus(1.0, 0.25);
  let mut a = CpuSdf3::new(ring);
  let mut t = CpuSdf3::new(torus);

  for p in [
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.2, 0.1),
    Vec3::new(-0.8, 0.3, -0.1),
  ] {
    assert!((eval_one(&mut a, p) - eval_one(&mut t, p)).abs() < 1e-6);
  }
}

#[test]
fn test_polygon_square_matches_rectangle_inside() {
  let mut b = Builder::new();
  let poly = b.polygon(&[
    Vec2::new(-1.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(-1.0, 1.0),
  ]);
  let rect = b.rectangle(2.0, 2.0);
  let mut poly = CpuSdf2::new(poly);
  let mut rect = CpuSdf2::new(rect);

  for p in [
    Vec2::ZERO,
    Vec2::new(0.5, -0.25),
    Vec2::new(2.0, 0.0),
    Vec2::new(-1.5, 1.5),
  ] {
    let a = eval_one_2d(&mut poly, p);
    let e = eval_one_2d(&mut rect, p);
    assert!((a - e).abs() < 1e-5, "polygon vs rectangle at {p}: {a} vs {e}");
  }
}

#[test]
fn test_screw_respects_height_slab() {
  let mut b = Builder::new();
  let profile = b.rectangle(1.0, 0.5);
  let screw = b.screw(&profile, 2.0, 4.0);
  let mut sdf = CpuSdf3::new(screw);

  assert!(eval_one(&mut sdf, Vec3::ZERO) < 0.0);
  assert!(eval_one(&mut sdf, Vec3::new(0.0, 0.0, 1.5)) > 0.0);
}
