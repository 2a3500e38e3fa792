//! Block-level memoization over a quantization lattice.
//!
//! Wraps an inner SDF and quantizes every query to a per-axis cell;
//! repeated queries for the same cell are served from a map. Misses are
//! deduplicated within the batch and submitted to the inner SDF in one
//! call at exact lattice positions, so queries that already sit on the
//! lattice are cached without error.

use fxhash::FxHashMap;
use glam::{IVec3, Vec3};

use crate::error::{Error, Result};
use crate::eval::{check_batch, ScratchPool, Sdf3};
use crate::math::Aabb3;

/// Hit/evaluation counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
  /// Total points evaluated through the wrapper.
  pub evaluations: u64,
  /// Points served from the map.
  pub hits: u64,
}

/// Memoizing wrapper around an inner [`Sdf3`].
pub struct BlockCache3<S> {
  inner: S,
  cell: Vec3,
  map: FxHashMap<IVec3, f32>,
  stats: CacheStats,
  miss_keys: Vec<IVec3>,
  miss_pos: Vec<Vec3>,
  miss_dist: Vec<f32>,
}

impl<S: Sdf3> BlockCache3<S> {
  /// `cell` is the quantization cell size per axis; distances are keyed
  /// on `round(p / cell)`.
  pub fn new(inner: S, cell: Vec3) -> Result<Self> {
    if !cell.is_finite() || cell.min_element() <= 0.0 {
      return Err(Error::invalid(
        "block_cache",
        format!("cell size must be finite and positive, got {cell}"),
      ));
    }
    Ok(Self {
      inner,
      cell,
      map: FxHashMap::default(),
      stats: CacheStats::default(),
      miss_keys: Vec::new(),
      miss_pos: Vec::new(),
      miss_dist: Vec::new(),
    })
  }

  pub fn stats(&self) -> CacheStats {
    self.stats
  }

  /// Cached cell count.
  pub fn len(&self) -> usize {
    self.map.len()
  }

  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }

  /// Drop all cached distances (required when the wrapped expression
  /// changes).
  pub fn clear(&mut self) {
    self.map.clear();
  }

  pub fn into_inner(self) -> S {
    self.inner
  }

  #[inline]
  fn key_of(&self, p: Vec3) -> IVec3 {
    IVec3::new(
      (p.x / self.cell.x).round() as i32,
      (p.y / self.cell.y).round() as i32,
      (p.z / self.cell.z).round() as i32,
    )
  }
}

impl<S: Sdf3> Sdf3 for BlockCache3<S> {
  fn evaluate(
    &mut self,
    positions: &[Vec3],
    distances: &mut [f32],
    scratch: &mut ScratchPool,
  ) -> Result<()> {
    check_batch(positions.len(), distances.len())?;
    self.stats.evaluations += positions.len() as u64;

    self.miss_keys.clear();
    self.miss_pos.clear();
    // Batch-local index of each pending key, to dedup within the call.
    let mut pending: FxHashMap<IVec3, usize> = FxHashMap::default();

    for &p in positions {
      let key = self.key_of(p);
      if self.map.contains_key(&key) {
        self.stats.hits += 1;
      } else if !pending.contains_key(&key) {
        pending.insert(key, self.miss_keys.len());
        self.miss_keys.push(key);
        self.miss_pos.push(key.as_vec3() * self.cell);
      }
    }

    if !self.miss_pos.is_empty() {
      self.miss_dist.clear();
      self.miss_dist.resize(self.miss_pos.len(), 0.0);
      self
        .inner
        .evaluate(&self.miss_pos, &mut self.miss_dist, scratch)?;
      for (key, d) in self.miss_keys.iter().zip(&self.miss_dist) {
        self.map.insert(*key, *d);
      }
    }

    for (p, out) in positions.iter().zip(distances.iter_mut()) {
      let key = self.key_of(*p);
      // Every key is now present: it was either a hit or a filled miss.
      *out = self.map[&key];
    }
    Ok(())
  }

  fn bounds(&self) -> Aabb3 {
    self.inner.bounds()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::eval::CpuSdf3;
  use crate::shape::Builder;

  fn sphere_sdf() -> CpuSdf3 {
    let mut b = Builder::new();
    let s = b.sphere(1.0);
    CpuSdf3::new(s)
  }

  #[test]
  fn test_exact_lattice_points_are_exact() {
    let cell = Vec3::splat(0.25);
    let mut cache = BlockCache3::new(sphere_sdf(), cell).unwrap();
    let mut scratch = ScratchPool::new();

    let pts: Vec<Vec3> = (0..8).map(|i| Vec3::splat(0.25 * i as f32)).collect();
    let mut got = vec![0.0; pts.len()];
    cache.evaluate(&pts, &mut got, &mut scratch).unwrap();

    let mut inner = sphere_sdf();
    let mut expect = vec![0.0; pts.len()];
    inner.evaluate(&pts, &mut expect, &mut scratch).unwrap();
    for (g, e) in got.iter().zip(&expect) {
      assert!((g - e).abs() < 1e-6, "lattice point should be cached exactly");
    }
  }

  #[test]
  fn test_hit_accounting() {
    let mut cache = BlockCache3::new(sphere_sdf(), Vec3::splat(0.5)).unwrap();
    let mut scratch = ScratchPool::new();
    let pts = vec![Vec3::ZERO, Vec3::ZERO, Vec3::new(0.5, 0.0, 0.0)];
    let mut out = vec![0.0; 3];

    cache.evaluate(&pts, &mut out, &mut scratch).unwrap();
    let s = cache.stats();
    // First call: first zero misses, second zero is deduplicated within
    // the batch (neither a map hit nor a second inner evaluation).
    assert_eq!(s.evaluations, 3);
    assert_eq!(s.hits, 0);
    assert_eq!(cache.len(), 2);

    cache.evaluate(&pts, &mut out, &mut scratch).unwrap();
    let s = cache.stats();
    assert_eq!(s.evaluations, 6);
    assert_eq!(s.hits, 3, "second pass is all hits");
  }

  #[test]
  fn test_quantization_error_is_bounded() {
    let cell = Vec3::splat(0.1);
    let mut cache = BlockCache3::new(sphere_sdf(), cell).unwrap();
    let mut scratch = ScratchPool::new();

    let pts = vec![Vec3::new(0.43, 0.21, -0.37)];
    let mut got = vec![0.0];
    cache.evaluate(&pts, &mut got, &mut scratch).unwrap();

    let mut inner = sphere_sdf();
    let mut expect = vec![0.0];
    inner.evaluate(&pts, &mut expect, &mut scratch).unwrap();
    // Quantization moves the query by at most half a cell diagonal, and
    // the sphere field is 1-Lipschitz.
    let max_err = cell.length() * 0.5 + 1e-6;
    assert!((got[0] - expect[0]).abs() <= max_err);
  }
}
