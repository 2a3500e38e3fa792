//! Bounds conservatism and outward-gradient checks over the shape
//! catalog.
//!
//! For every catalog entry, points outside the bounds box (sampled on a
//! grid over the inflated box, keeping only points outside the original
//! box) must have non-negative distance, and the central-difference
//! gradient must roughly agree with the direction away from the bounds
//! center. A few shapes are exempt from the gradient check where their
//! field is legitimately not radial near the box (torus around its
//! axis, smooth difference, the twisted screw).

use glam::{Vec2, Vec3};
use sdfkit::eval::{CpuSdf3, ScratchPool, Sdf3};
use sdfkit::math::append_grid_3d;
use sdfkit::shape::{Builder, Shape3};

struct Entry {
  name: &'static str,
  shape: Shape3,
  check_gradient: bool,
}

fn catalog() -> Vec<Entry> {
  let mut b = Builder::new();
  let mut out = Vec::new();

  let mut push = |name: &'static str, shape: Shape3, check_gradient: bool| {
    out.push(Entry {
      name,
      shape,
      check_gradient,
    });
  };

  push("sphere", b.sphere(1.0), true);
  push("cuboid", b.cuboid(1.0, 1.4, 0.8, 0.1), true);
  push("box_frame", b.box_frame(1.0, 1.0, 1.0, 0.1), true);
  push("cylinder", b.cylinder(0.7, 1.8, 0.05), true);
  push("hex_prism", b.hex_prism(0.8, 1.2), true);
  push("tri_prism", b.tri_prism(1.0, 1.5), true);
  push("torus", b.torus(1.0, 0.3), false);

  let profile = b.circle(0.6);
  push("extrude", b.extrude(&profile, 1.4), true);
  push("revolve", b.revolve(&profile, 1.5), false);

  let poly = b.polygon(&[
    Vec2::new(-0.8, -0.6),
    Vec2::new(0.9, -0.5),
    Vec2::new(0.7, 0.8),
    Vec2::new(-0.5, 0.7),
  ]);
  push("extruded_polygon", b.extrude(&poly, 1.0), true);

  let ell = b.ellipse(0.9, 0.5);
  push("extruded_ellipse", b.extrude(&ell, 0.8), true);

  let s = b.sphere(1.0);
  let c = b.cuboid(1.2, 1.2, 1.2, 0.0);
  push("union", b.union(&s, &c), true);
  push("smooth_union", b.smooth_union(&s, &c, 0.2), true);
  push("smooth_difference", b.smooth_difference(&c, &s, 0.15), false);
  push("translated", b.translate(&s, Vec3::new(2.0, -1.0, 0.5)), true);
  push("rotated_cuboid", b.rotate(&c, Vec3::Z, 0.6), true);
  push("scaled", b.scale(&s, 1.7), true);
  let off_center = b.translate(&s, Vec3::new(1.5, 0.0, 0.0));
  push("symmetric", b.symmetry(&off_center, true, false, false), true);
  push("elongated", b.elongate(&s, 0.8, 0.0, 0.4), true);
  push("inflated", b.offset(&s, -0.2), true);
  push("shelled", b.shell(&s, 0.15), true);
  push("rounded", b.round(&c, 0.2), true);
  push("arrayed", b.array(&s, Vec3::splat(2.5), 2, 2, 1), true);
  push(
    "union_array",
    b.union_array(&s, &[Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)]),
    true,
  );

  let thread = b.rectangle(0.8, 0.3);
  push("screw", b.screw(&thread, 1.6, 2.0), false);

  assert!(b.err().is_none(), "catalog construction failed: {:?}", b.err());
  out
}

/// Grid points on the inflated bounds that fall outside the original
/// box.
fn outside_samples(shape: &Shape3) -> Vec<Vec3> {
  let bounds = shape.bounds();
  let margin = bounds.size().max_element() * 0.5;
  let inflated = bounds.inflate(margin);
  let mut grid = Vec::new();
  append_grid_3d(&mut grid, &inflated, 8, 8, 8);
  grid
    .into_iter()
    .filter(|p| !bounds.contains_point(*p))
    .collect()
}

/// Property 2: nothing outside the bounds box is inside the shape.
#[test]
fn test_bounds_are_conservative() {
  for entry in catalog() {
    let samples = outside_samples(&entry.shape);
    assert!(
      !samples.is_empty(),
      "{}: no outside samples generated",
      entry.name
    );
    let mut sdf = CpuSdf3::new(entry.shape.clone());
    let mut scratch = ScratchPool::new();
    let mut dist = vec![0.0; samples.len()];
    sdf.evaluate(&samples, &mut dist, &mut scratch).unwrap();
    for (p, d) in samples.iter().zip(&dist) {
      assert!(
        *d >= -1e-4,
        "{}: point {p} outside bounds has negative distance {d}",
        entry.name
      );
    }
  }
}

/// Property 3: outside the box, the field gradient points broadly away
/// from the shape.
#[test]
fn test_outward_gradient_direction() {
  let cos_limit = std::f32::consts::FRAC_1_SQRT_2;
  for entry in catalog() {
    if !entry.check_gradient {
      continue;
    }
    let bounds = entry.shape.bounds();
    let center = bounds.center();
    let samples = outside_samples(&entry.shape);
    let h = bounds.size().max_element() * 1e-3;

    let mut probes = Vec::with_capacity(samples.len() * 6);
    for p in &samples {
      for axis in 0..3 {
        let mut step = Vec3::ZERO;
        step[axis] = h;
        probes.push(*p + step);
        probes.push(*p - step);
      }
    }
    let mut sdf = CpuSdf3::new(entry.shape.clone());
    let mut scratch = ScratchPool::new();
    let mut dist = vec![0.0; probes.len()];
    sdf.evaluate(&probes, &mut dist, &mut scratch).unwrap();

    for (i, p) in samples.iter().enumerate() {
      let base = i * 6;
      let grad = Vec3::new(
        dist[base] - dist[base + 1],
        dist[base + 2] - dist[base + 3],
        dist[base + 4] - dist[base + 5],
      );
      let outward = *p - center;
      if grad.length_squared() < 1e-12 || outward.length_squared() < 1e-12 {
        continue;
      }
      let cos = grad.normalize().dot(outward.normalize());
      assert!(
        cos >= cos_limit - 0.35,
        "{}: gradient at {p} points inward (cos = {cos})",
        entry.name
      );
    }
  }
}
