//! Reusable per-evaluation buffers.
//!
//! Combinators and transforms lease temporary distance and position
//! buffers for every batch. The pool is a freelist keyed by element
//! type; `take_*` hands ownership out and `put_*` returns it. The
//! outstanding-lease counter doubles as a leak detector: the top-level
//! evaluator records the count on entry and requires it restored on
//! exit.

use glam::{Vec2, Vec3};

/// Typed buffer freelists with lease accounting.
#[derive(Default, Debug)]
pub struct ScratchPool {
  floats: Vec<Vec<f32>>,
  vec3s: Vec<Vec<Vec3>>,
  vec2s: Vec<Vec<Vec2>>,
  outstanding: usize,
  peak: usize,
}

impl ScratchPool {
  pub fn new() -> Self {
    Self::default()
  }

  /// Lease a zero-filled f32 buffer of exactly `len` elements.
  pub fn take_floats(&mut self, len: usize) -> Vec<f32> {
    self.lease();
    let mut buf = self.floats.pop().unwrap_or_default();
    buf.clear();
    buf.resize(len, 0.0);
    buf
  }

  /// Return a leased f32 buffer.
  pub fn put_floats(&mut self, buf: Vec<f32>) {
    self.release();
    self.floats.push(buf);
  }

  pub fn take_vec3s(&mut self, len: usize) -> Vec<Vec3> {
    self.lease();
    let mut buf = self.vec3s.pop().unwrap_or_default();
    buf.clear();
    buf.resize(len, Vec3::ZERO);
    buf
  }

  pub fn put_vec3s(&mut self, buf: Vec<Vec3>) {
    self.release();
    self.vec3s.push(buf);
  }

  pub fn take_vec2s(&mut self, len: usize) -> Vec<Vec2> {
    self.lease();
    let mut buf = self.vec2s.pop().unwrap_or_default();
    buf.clear();
    buf.resize(len, Vec2::ZERO);
    buf
  }

  pub fn put_vec2s(&mut self, buf: Vec<Vec2>) {
    self.release();
    self.vec2s.push(buf);
  }

  /// Buffers currently leased out.
  pub fn outstanding(&self) -> usize {
    self.outstanding
  }

  /// Highest simultaneous lease count observed.
  pub fn peak(&self) -> usize {
    self.peak
  }

  /// Drop all accounting and cached storage. Called after a failed
  /// evaluation, where leased buffers were dropped instead of returned.
  pub fn reset(&mut self) {
    self.floats.clear();
    self.vec3s.clear();
    self.vec2s.clear();
    self.outstanding = 0;
  }

  fn lease(&mut self) {
    self.outstanding += 1;
    self.peak = self.peak.max(self.outstanding);
  }

  fn release(&mut self) {
    debug_assert!(self.outstanding > 0, "release without matching lease");
    self.outstanding = self.outstanding.saturating_sub(1);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lease_accounting() {
    let mut pool = ScratchPool::new();
    assert_eq!(pool.outstanding(), 0);

    let a = pool.take_floats(16);
    let b = pool.take_vec3s(16);
    assert_eq!(pool.outstanding(), 2);
    assert_eq!(pool.peak(), 2);

    pool.put_floats(a);
    pool.put_vec3s(b);
    assert_eq!(pool.outstanding(), 0);
    assert_eq!(pool.peak(), 2);
  }

  #[test]
  fn test_buffers_are_reused() {
    let mut pool = ScratchPool::new();
    let mut a = pool.take_floats(8);
    a[0] = 42.0;
    let ptr = a.as_ptr();
    pool.put_floats(a);

    let b = pool.take_floats(4);
    assert_eq!(b.as_ptr(), ptr, "freelist should hand back the same allocation");
    assert_eq!(b[0], 0.0, "leased buffers are zeroed");
    pool.put_floats(b);
  }

  #[test]
  fn test_reset_clears_outstanding() {
    let mut pool = ScratchPool::new();
    let _leaked = pool.take_floats(8);
    assert_eq!(pool.outstanding(), 1);
    pool.reset();
    assert_eq!(pool.outstanding(), 0);
  }
}
