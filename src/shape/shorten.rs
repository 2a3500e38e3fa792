//! Emission-name shortening.
//!
//! Default emission names carry a 16-hex-digit structural hash; some GPU
//! compilers limit identifier length, so the shortener rewrites every
//! name longer than `max_len` to a compact enumerated identifier. The
//! numbering follows first-visit post-order over unique subexpressions,
//! so identical DAGs shorten identically.

use fxhash::FxHashSet;

use crate::shape::{Shape2, Shape3};

/// Rewrite over-long emission names below a 3D root, including the 2D
/// profiles of kind-boundary nodes.
pub fn shorten_names_3d(root: &Shape3, max_len: usize) {
  let mut seen = FxHashSet::default();
  let mut counter = 0usize;
  walk3(root, max_len, &mut seen, &mut counter);
}

/// Rewrite over-long emission names below a 2D root.
pub fn shorten_names_2d(root: &Shape2, max_len: usize) {
  let mut seen = FxHashSet::default();
  let mut counter = 0usize;
  walk2(root, max_len, &mut seen, &mut counter);
}

fn walk3(shape: &Shape3, max_len: usize, seen: &mut FxHashSet<u64>, counter: &mut usize) {
  if !seen.insert(shape.structural_id()) {
    return;
  }
  shape.for_each_child_2d(&mut |c| walk2(c, max_len, seen, counter));
  shape.for_each_child(&mut |c| walk3(c, max_len, seen, counter));
  assign(shape.name(), max_len, counter, |n| shape.set_name(n));
}

fn walk2(shape: &Shape2, max_len: usize, seen: &mut FxHashSet<u64>, counter: &mut usize) {
  if !seen.insert(shape.structural_id()) {
    return;
  }
  shape.for_each_child(&mut |c| walk2(c, max_len, seen, counter));
  assign(shape.name(), max_len, counter, |n| shape.set_name(n));
}

fn assign(current: String, max_len: usize, counter: &mut usize, set: impl FnOnce(String)) {
  // The counter advances for every unique node so numbering does not
  // depend on which names happened to exceed the limit.
  let id = *counter;
  *counter += 1;
  if current.len() > max_len {
    set(format!("s{id}"));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::shape::Builder;

  #[test]
  fn test_shorten_rewrites_long_names() {
    let mut b = Builder::new();
    let s = b.sphere(1.0);
    let c = b.cuboid(1.0, 1.0, 1.0, 0.0);
    let u = b.union(&s, &c);
    assert!(u.name().len() > 8);

    shorten_names_3d(&u, 8);
    assert!(u.name().len() <= 8);
    assert!(s.name().len() <= 8);
    assert!(c.name().len() <= 8);
  }

  #[test]
  fn test_shorten_stable_for_identical_dags() {
    let build = || {
      let mut b = Builder::new();
      let s = b.sphere(1.0);
      let c = b.cylinder(0.5, 2.0, 0.0);
      let u = b.smooth_union(&s, &c, 0.2);
      (s, c, u)
    };
    let (s1, c1, u1) = build();
    let (s2, c2, u2) = build();
    shorten_names_3d(&u1, 6);
    shorten_names_3d(&u2, 6);
    assert_eq!(s1.name(), s2.name());
    assert_eq!(c1.name(), c2.name());
    assert_eq!(u1.name(), u2.name());
  }

  #[test]
  fn test_shared_subexpression_named_once() {
    let mut b = Builder::new();
    let s = b.sphere(1.0);
    let u = b.union(&s, &s);
    shorten_names_3d(&u, 4);
    // The shared child takes one slot, the parent the next.
    assert_eq!(s.name(), "s0");
    assert_eq!(u.name(), "s1");
  }
}
