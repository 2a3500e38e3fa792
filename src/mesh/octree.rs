//! Streaming octree mesher.
//!
//! Depth-first decomposition of an oversized power-of-two top cube down
//! to smallest cells, with breadth-batched empty-space pruning: a cube
//! whose center distance satisfies `|d| >= (sqrt(3)/2) * side` cannot
//! contain surface and is discarded along with all of its descendants.
//! Surviving smallest cells are corner-evaluated in batches and
//! triangulated with marching cubes; triangles stream out through
//! `read_triangles` without re-running finished work.

use std::collections::VecDeque;

use glam::{IVec3, Vec3};

use crate::error::{Error, Result};
use crate::eval::{ScratchPool, Sdf3};
use crate::mesh::icube::Icube;
use crate::mesh::tables::CORNER_OFFSETS;
use crate::mesh::{marching, MesherConfig, Status, Triangle, MIN_TRIANGLE_CAPACITY};

const SQRT_3: f32 = 1.732_050_8;

/// Lattice coordinates above this level would overflow `i32`.
const MAX_TOP_LEVEL: u32 = 21;

/// Streaming octree mesher over any [`Sdf3`].
#[derive(Debug)]
pub struct OctreeMesher<S> {
  sdf: S,
  res: f32,
  origin: Vec3,
  top_level: u32,
  config: MesherConfig,
  /// DFS stack of cubes being decomposed, largest at the bottom.
  cubes: Vec<Icube>,
  /// Cubes queued for the next center-distance prune pass.
  prune_queue: Vec<Icube>,
  /// Pending leaf corner positions (8 per smallest cube).
  posbuf: Vec<Vec3>,
  distbuf: Vec<f32>,
  centers: Vec<Vec3>,
  center_dists: Vec<f32>,
  /// Triangles produced but not yet handed to the caller.
  carry: VecDeque<Triangle>,
  scratch: ScratchPool,
  pruned: u64,
  evaluations: u64,
}

impl<S: Sdf3> OctreeMesher<S> {
  /// Set up the decomposition for `sdf` at cell size `res`.
  ///
  /// The top cube side is the smallest power-of-two multiple of `res`
  /// covering the largest bounds extent, so the surface lies strictly
  /// inside the top cube.
  pub fn new(sdf: S, res: f32, config: MesherConfig) -> Result<Self> {
    if !res.is_finite() || res <= 0.0 {
      return Err(Error::invalid(
        "octree_mesher",
        format!("resolution must be finite and positive, got {res}"),
      ));
    }
    if config.eval_batch < 64 {
      return Err(Error::DecomposeExceedsBuffer(format!(
        "eval_batch {} cannot hold one decomposed leaf (64 corners)",
        config.eval_batch
      )));
    }
    let bounds = sdf.bounds();
    let max_dim = bounds.size().max_element();
    let cells = (max_dim / res).ceil().max(1.0) as u64;
    let side = cells.next_power_of_two();
    let top_level = (side.trailing_zeros() + 1).max(2);
    if top_level > MAX_TOP_LEVEL {
      return Err(Error::DecomposeExceedsBuffer(format!(
        "top cube of {side} cells per axis (level {top_level}) exceeds the lattice"
      )));
    }
    log::debug!(
      "octree mesher: res {res}, top level {top_level} ({side}^3 cells), origin {}",
      bounds.min
    );

    Ok(Self {
      sdf,
      res,
      origin: bounds.min,
      top_level,
      config,
      cubes: vec![Icube::new(IVec3::ZERO, top_level)],
      prune_queue: Vec::new(),
      posbuf: Vec::with_capacity(config.eval_batch),
      distbuf: vec![0.0; config.eval_batch],
      centers: Vec::with_capacity(config.prune_batch),
      center_dists: vec![0.0; config.prune_batch],
      carry: VecDeque::new(),
      scratch: ScratchPool::new(),
      pruned: 0,
      evaluations: 0,
    })
  }

  /// Smallest cubes discarded by pruning, counted per descendant.
  pub fn pruned(&self) -> u64 {
    self.pruned
  }

  /// Points submitted to the inner SDF so far.
  pub fn evaluations(&self) -> u64 {
    self.evaluations
  }

  pub fn into_inner(self) -> S {
    self.sdf
  }

  /// Fill `dst` with up to `dst.len()` triangles.
  ///
  /// Returns the count written and [`Status::Eof`] once all work is
  /// drained; `dst` must hold at least [`MIN_TRIANGLE_CAPACITY`]
  /// triangles.
  pub fn read_triangles(&mut self, dst: &mut [Triangle]) -> Result<(usize, Status)> {
    if dst.len() < MIN_TRIANGLE_CAPACITY {
      return Err(Error::ShortBuffer {
        min: MIN_TRIANGLE_CAPACITY,
      });
    }

    let mut n = self.drain_carry(dst, 0);
    while n < dst.len() && !self.exhausted() {
      if self.carry.is_empty() {
        self.pump()?;
      }
      n = self.drain_carry(dst, n);
    }
    let status = if self.exhausted() {
      Status::Eof
    } else {
      Status::More
    };
    Ok((n, status))
  }

  /// Run the stream to completion, appending everything to `dst`.
  pub fn render_all(&mut self, dst: &mut Vec<Triangle>) -> Result<()> {
    let mut buf = vec![Triangle::ZERO; self.config.eval_batch.max(64)];
    loop {
      let (n, status) = self.read_triangles(&mut buf)?;
      dst.extend_from_slice(&buf[..n]);
      if status == Status::Eof {
        return Ok(());
      }
    }
  }

  fn exhausted(&self) -> bool {
    self.carry.is_empty()
      && self.cubes.is_empty()
      && self.prune_queue.is_empty()
      && self.posbuf.is_empty()
  }

  fn drain_carry(&mut self, dst: &mut [Triangle], mut n: usize) -> usize {
    while n < dst.len() {
      match self.carry.pop_front() {
        Some(t) => {
          dst[n] = t;
          n += 1;
        }
        None => break,
      }
    }
    n
  }

  /// One unit of work: decompose until the position buffer holds a full
  /// batch (or nothing is left to decompose), then evaluate and march.
  fn pump(&mut self) -> Result<()> {
    while self.posbuf.len() + 64 <= self.config.eval_batch {
      if let Some(cube) = self.cubes.pop() {
        if cube.lvl == 2 {
          self.decompose_leaf(cube);
        } else {
          for child in cube.children() {
            self.prune_queue.push(child);
          }
          if self.prune_queue.len() >= self.config.prune_batch {
            self.run_prune()?;
          }
        }
      } else if !self.prune_queue.is_empty() {
        self.run_prune()?;
      } else {
        break;
      }
    }

    if self.posbuf.is_empty() {
      return Ok(());
    }
    self.evaluate_and_march()
  }

  /// Append the 64 corner positions of a level-2 cube's eight smallest
  /// children.
  fn decompose_leaf(&mut self, cube: Icube) {
    debug_assert_eq!(cube.lvl, 2);
    for child in cube.children() {
      let base = child.origin(self.origin, self.res);
      for offset in CORNER_OFFSETS {
        self.posbuf.push(
          base
            + Vec3::new(
              offset[0] as f32 * self.res,
              offset[1] as f32 * self.res,
              offset[2] as f32 * self.res,
            ),
        );
      }
    }
  }

  /// Center-evaluate the queued cubes in one batch; empty cubes are
  /// counted into `pruned`, survivors return to the DFS stack.
  fn run_prune(&mut self) -> Result<()> {
    if self.prune_queue.is_empty() {
      return Ok(());
    }
    self.centers.clear();
    for cube in &self.prune_queue {
      self.centers.push(cube.center(self.origin, self.res));
    }
    let count = self.centers.len();
    if self.center_dists.len() < count {
      self.center_dists.resize(count, 0.0);
    }
    self
      .sdf
      .evaluate(&self.centers, &mut self.center_dists[..count], &mut self.scratch)?;
    self.evaluations += count as u64;

    let mut kept = 0usize;
    for i in 0..count {
      let cube = self.prune_queue[i];
      let d = self.center_dists[i];
      if cube.lvl >= 3 && d.abs() >= SQRT_3 * 0.5 * cube.side(self.res) {
        self.pruned += cube.leaf_count();
      } else {
        self.cubes.push(cube);
        kept += 1;
      }
    }
    log::trace!("prune pass: {count} cubes tested, {kept} kept");
    self.prune_queue.clear();
    Ok(())
  }

  /// Evaluate every pending full corner group and triangulate the cells
  /// near the surface.
  fn evaluate_and_march(&mut self) -> Result<()> {
    let groups = self.posbuf.len() / 8;
    let used = groups * 8;
    debug_assert_eq!(self.posbuf.len(), used, "positions arrive in whole groups");
    if self.distbuf.len() < used {
      self.distbuf.resize(used, 0.0);
    }
    self
      .sdf
      .evaluate(&self.posbuf[..used], &mut self.distbuf[..used], &mut self.scratch)?;
    self.evaluations += used as u64;

    let diag = self.res * SQRT_3;
    let mut tris = [Triangle::ZERO; 5];
    for g in 0..groups {
      let base = g * 8;
      let corners: [Vec3; 8] = std::array::from_fn(|i| self.posbuf[base + i]);
      let dists: [f32; 8] = std::array::from_fn(|i| self.distbuf[base + i]);
      let min_abs = dists.iter().fold(f32::INFINITY, |m, d| m.min(d.abs()));
      if min_abs > diag {
        continue;
      }
      let n = marching::polygonize(&corners, &dists, &mut tris);
      for tri in &tris[..n] {
        self.carry.push_back(*tri);
      }
    }
    self.posbuf.clear();
    Ok(())
  }
}

#[cfg(test)]
#[path = "octree_test.rs"]
mod octree_test;
