use glam::Vec3;

use crate::shape::Builder;

#[test]
fn test_for_each_child_order() {
  let mut b = Builder::new();
  let s = b.sphere(1.0);
  let c = b.cuboid(1.0, 1.0, 1.0, 0.0);
  let d = b.difference(&s, &c);

  let mut kinds = Vec::new();
  d.for_each_child(&mut |child| kinds.push(child.kind()));
  assert_eq!(kinds, vec!["sphere", "cuboid"]);
}

#[test]
fn test_kind_boundary_child_is_2d() {
  let mut b = Builder::new();
  let profile = b.circle(1.0);
  let e = b.extrude(&profile, 2.0);

  let mut n3 = 0;
  e.for_each_child(&mut |_| n3 += 1);
  assert_eq!(n3, 0, "extrude has no 3D children");

  let mut n2 = 0;
  e.for_each_child_2d(&mut |c| {
    assert_eq!(c.kind(), "circle");
    n2 += 1;
  });
  assert_eq!(n2, 1);
}

#[test]
fn test_shared_subexpression_visits() {
  let mut b = Builder::new();
  let s = b.sphere(1.0);
  let u = b.union(&s, &s);

  let mut visits = 0;
  u.for_each_child(&mut |c| {
    assert_eq!(c.structural_id(), s.structural_id());
    visits += 1;
  });
  assert_eq!(visits, 2, "shared child is yielded under each parent slot");
}

#[test]
fn test_smooth_union_bounds_inflated_by_k() {
  // S3 scenario: bounds equal the sharp union inflated by the blend.
  let mut b = Builder::new();
  let cube = b.cuboid(1.0, 1.2, 2.2, 0.3);
  let ball = b.sphere(1.0);
  let sharp = b.union(&cube, &ball);
  let smooth = b.smooth_union(&cube, &ball, 0.1);

  let expect = sharp.bounds().inflate(0.1);
  assert_eq!(smooth.bounds(), expect);
}

#[test]
fn test_rotate_bounds_cover_rotated_corners() {
  let mut b = Builder::new();
  let cube = b.cuboid(2.0, 2.0, 2.0, 0.0);
  let r = b.rotate(&cube, Vec3::Z, std::f32::consts::FRAC_PI_4);
  let bounds = r.bounds();
  // A unit half-extent cube rotated 45 degrees spans sqrt(2) on x/y.
  let expect = 2.0f32.sqrt();
  assert!((bounds.max.x - expect).abs() < 1e-5);
  assert!((bounds.max.y - expect).abs() < 1e-5);
  assert!((bounds.max.z - 1.0).abs() < 1e-6);
}

#[test]
fn test_symmetry_bounds_mirror() {
  let mut b = Builder::new();
  let s = b.sphere(1.0);
  let t = b.translate(&s, Vec3::new(3.0, 0.0, 0.0));
  let m = b.symmetry(&t, true, false, false);
  assert_eq!(m.bounds().min.x, -4.0);
  assert_eq!(m.bounds().max.x, 4.0);
}

#[test]
fn test_offset_inflates_only_when_negative() {
  let mut b = Builder::new();
  let s = b.sphere(1.0);
  let eroded = b.offset(&s, 0.2);
  assert_eq!(eroded.bounds().max, Vec3::splat(1.0));
  let inflated = b.offset(&s, -0.2);
  assert!((inflated.bounds().max.x - 1.2).abs() < 1e-6);
}

#[test]
fn test_name_override_round_trip() {
  let mut b = Builder::new();
  let s = b.sphere(1.0);
  assert!(s.name().starts_with("sphere_"));
  s.set_name("tiny");
  assert_eq!(s.name(), "tiny");
}
