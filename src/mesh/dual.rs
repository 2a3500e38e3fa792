//! Dual-contouring mesher.
//!
//! One vertex per surface-crossing cell, placed from the cell's active
//! edge crossings; neighboring vertices join into a quad across every
//! active edge. Non-streaming: `render_all` runs the whole pipeline.

use fxhash::FxHashMap;
use glam::{IVec3, Mat3, Vec3};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::eval::{ScratchPool, Sdf3};
use crate::mesh::icube::Icube;
use crate::mesh::{Triangle, MesherConfig};

const SQRT_3: f32 = 1.732_050_8;

/// Central-difference step as a fraction of the cell size.
const NORMAL_STEP: f32 = 1e-2;

/// One surface crossing on a cell edge.
#[derive(Clone, Copy, Debug)]
pub struct EdgeCrossing {
  /// Crossing point in world units.
  pub point: Vec3,
  /// Unit surface normal at the crossing (central differences).
  pub normal: Vec3,
}

/// Places the cell vertex from its participating edge crossings.
pub trait VertexPlacer {
  fn place(&self, cell_min: Vec3, cell_size: f32, crossings: &[EdgeCrossing]) -> Vec3;
}

/// Least-squares placement: solves the normal-equation system
/// `(sum n n^T) x = sum n (n^T q)` with Tikhonov regularization anchored
/// at the crossing centroid, falling back to the centroid when the
/// system is near-singular. The result is clamped into the cell.
#[derive(Clone, Copy, Debug)]
pub struct LeastSquaresPlacer {
  pub lambda: f32,
  pub det_epsilon: f32,
}

impl Default for LeastSquaresPlacer {
  fn default() -> Self {
    Self {
      lambda: 3e-3,
      det_epsilon: 1e-5,
    }
  }
}

impl VertexPlacer for LeastSquaresPlacer {
  fn place(&self, cell_min: Vec3, cell_size: f32, crossings: &[EdgeCrossing]) -> Vec3 {
    let cell_max = cell_min + Vec3::splat(cell_size);
    if crossings.is_empty() {
      return (cell_min + cell_max) * 0.5;
    }

    let mut centroid = Vec3::ZERO;
    for c in crossings {
      centroid += c.point;
    }
    centroid /= crossings.len() as f32;

    let mut ata = Mat3::ZERO;
    let mut atb = Vec3::ZERO;
    for c in crossings {
      let n = c.normal;
      ata += Mat3::from_cols(n * n.x, n * n.y, n * n.z);
      atb += n * n.dot(c.point - centroid);
    }

    if ata.determinant().abs() < self.det_epsilon {
      return centroid.clamp(cell_min, cell_max);
    }

    let reg = ata + Mat3::from_diagonal(Vec3::splat(self.lambda));
    let x = centroid + reg.inverse() * atb;
    x.clamp(cell_min, cell_max)
  }
}

/// Per-cell sample state: distance at the origin corner and at the three
/// axis neighbors sharing its origin edges.
#[derive(Clone, Copy, Debug)]
struct DualCell {
  d0: f32,
  dx: f32,
  dy: f32,
  dz: f32,
}

impl DualCell {
  #[inline]
  fn axis(&self, a: usize) -> f32 {
    match a {
      0 => self.dx,
      1 => self.dy,
      _ => self.dz,
    }
  }
}

#[derive(Clone, Copy, Debug)]
struct ActiveEdge {
  pos: IVec3,
  axis: usize,
  /// `t` along the edge where the surface crosses.
  t: f32,
  /// True when the distance decreases along +axis (`d_a < d0`).
  flip: bool,
}

/// Dual-contouring mesher over any [`Sdf3`].
#[derive(Debug)]
pub struct DualContourMesher<S, P = LeastSquaresPlacer> {
  sdf: S,
  res: f32,
  placer: P,
  config: MesherConfig,
  scratch: ScratchPool,
  evaluations: u64,
  pruned: u64,
}

impl<S: Sdf3> DualContourMesher<S> {
  pub fn new(sdf: S, res: f32) -> Result<Self> {
    Self::with_placer(sdf, res, LeastSquaresPlacer::default())
  }
}

impl<S: Sdf3, P: VertexPlacer> DualContourMesher<S, P> {
  pub fn with_placer(sdf: S, res: f32, placer: P) -> Result<Self> {
    if !res.is_finite() || res <= 0.0 {
      return Err(Error::invalid(
        "dual_contour",
        format!("resolution must be finite and positive, got {res}"),
      ));
    }
    Ok(Self {
      sdf,
      res,
      placer,
      config: MesherConfig::default(),
      scratch: ScratchPool::new(),
      evaluations: 0,
      pruned: 0,
    })
  }

  /// Swap in a new field, resolution and placer, keeping buffers.
  pub fn reset(&mut self, sdf: S, res: f32, placer: P) -> Result<()> {
    if !res.is_finite() || res <= 0.0 {
      return Err(Error::invalid(
        "dual_contour",
        format!("resolution must be finite and positive, got {res}"),
      ));
    }
    self.sdf = sdf;
    self.res = res;
    self.placer = placer;
    self.evaluations = 0;
    self.pruned = 0;
    Ok(())
  }

  pub fn evaluations(&self) -> u64 {
    self.evaluations
  }

  pub fn pruned(&self) -> u64 {
    self.pruned
  }

  /// Mesh the whole surface into `dst`.
  pub fn render_all(&mut self, dst: &mut Vec<Triangle>) -> Result<()> {
    let bounds = self.sdf.bounds();
    // Oversize the min side by half a cell so lattice corners do not sit
    // exactly on typical surfaces.
    let origin = bounds.min - Vec3::splat(self.res * 0.5);
    let max_dim = (bounds.size() + Vec3::splat(self.res * 0.5)).max_element();
    let cells = (max_dim / self.res).ceil().max(1.0) as u64;
    let side = cells.next_power_of_two();
    let top_level = (side.trailing_zeros() + 1).max(2);
    if top_level > 21 {
      return Err(Error::DecomposeExceedsBuffer(format!(
        "top cube of {side} cells per axis exceeds the lattice"
      )));
    }

    let survivors = self.decompose(origin, top_level)?;
    log::debug!(
      "dual contour: {} surviving cells at level 1 (pruned {})",
      survivors.len(),
      self.pruned
    );
    if survivors.is_empty() {
      return Ok(());
    }

    let cells = self.sample_cells(origin, &survivors)?;
    let edges = collect_active_edges(&cells);
    if edges.is_empty() {
      return Ok(());
    }
    let crossings = self.crossing_normals(&edges, origin)?;

    // Every cell sharing an active edge participates in a vertex, even
    // when it holds no active edge of its own.
    let mut participation: FxHashMap<IVec3, SmallVec<[u32; 12]>> = FxHashMap::default();
    for (i, edge) in edges.iter().enumerate() {
      let (u, v) = plane_axes(edge.axis);
      for cell in [
        edge.pos,
        edge.pos - u,
        edge.pos - v,
        edge.pos - u - v,
      ] {
        participation.entry(cell).or_default().push(i as u32);
      }
    }

    let mut vertices: FxHashMap<IVec3, Vec3> = FxHashMap::default();
    let mut cell_crossings: SmallVec<[EdgeCrossing; 12]> = SmallVec::new();
    for (cell, edge_ids) in &participation {
      cell_crossings.clear();
      for &i in edge_ids {
        cell_crossings.push(crossings[i as usize]);
      }
      let cell_min = origin + cell.as_vec3() * self.res;
      let v = self.placer.place(cell_min, self.res, &cell_crossings);
      vertices.insert(*cell, v);
    }

    // One quad per active edge, wound so normals leave the solid.
    for edge in &edges {
      let (u, v) = plane_axes(edge.axis);
      let quad = [
        edge.pos - u - v,
        edge.pos - v,
        edge.pos,
        edge.pos - u,
      ];
      let [q0, q1, q2, q3] = quad.map(|c| vertices.get(&c).copied());
      let (Some(q0), Some(q1), Some(q2), Some(q3)) = (q0, q1, q2, q3) else {
        continue;
      };
      let (t1, t2) = if edge.flip {
        (
          Triangle::new(q0, q2, q1),
          Triangle::new(q0, q3, q2),
        )
      } else {
        (
          Triangle::new(q0, q1, q2),
          Triangle::new(q0, q2, q3),
        )
      };
      for t in [t1, t2] {
        if !t.is_degenerate() {
          dst.push(t);
        }
      }
    }
    Ok(())
  }

  /// Breadth-first decomposition to smallest cells with half-diagonal
  /// pruning.
  fn decompose(&mut self, origin: Vec3, top_level: u32) -> Result<Vec<Icube>> {
    let mut current = vec![Icube::new(IVec3::ZERO, top_level)];
    let mut centers = Vec::new();
    let mut dists = Vec::new();

    while current.first().map(|c| c.lvl).unwrap_or(1) > 1 {
      let mut children = Vec::with_capacity(current.len() * 8);
      for cube in &current {
        children.extend_from_slice(&cube.children());
      }
      centers.clear();
      centers.extend(children.iter().map(|c| c.center(origin, self.res)));
      dists.clear();
      dists.resize(centers.len(), 0.0);
      for (chunk_p, chunk_d) in centers
        .chunks(self.config.eval_batch)
        .zip(dists.chunks_mut(self.config.eval_batch))
      {
        self.sdf.evaluate(chunk_p, chunk_d, &mut self.scratch)?;
      }
      self.evaluations += centers.len() as u64;

      current = children
        .into_iter()
        .zip(&dists)
        .filter_map(|(cube, d)| {
          if cube.lvl >= 2 && d.abs() >= SQRT_3 * 0.5 * cube.side(self.res) {
            self.pruned += cube.leaf_count();
            None
          } else {
            Some(cube)
          }
        })
        .collect();
      if current.is_empty() {
        break;
      }
    }
    Ok(current)
  }

  /// Evaluate the four per-cell sample points (origin corner plus the
  /// three axis neighbors).
  fn sample_cells(
    &mut self,
    origin: Vec3,
    survivors: &[Icube],
  ) -> Result<FxHashMap<IVec3, DualCell>> {
    let mut positions = Vec::with_capacity(survivors.len() * 4);
    for cube in survivors {
      let o = cube.origin(origin, self.res);
      positions.push(o);
      positions.push(o + Vec3::new(self.res, 0.0, 0.0));
      positions.push(o + Vec3::new(0.0, self.res, 0.0));
      positions.push(o + Vec3::new(0.0, 0.0, self.res));
    }
    let mut dists = vec![0.0f32; positions.len()];
    for (chunk_p, chunk_d) in positions
      .chunks(self.config.eval_batch)
      .zip(dists.chunks_mut(self.config.eval_batch))
    {
      self.sdf.evaluate(chunk_p, chunk_d, &mut self.scratch)?;
    }
    self.evaluations += positions.len() as u64;

    let mut cells = FxHashMap::default();
    for (cube, d) in survivors.iter().zip(dists.chunks_exact(4)) {
      cells.insert(
        cube.pos,
        DualCell {
          d0: d[0],
          dx: d[1],
          dy: d[2],
          dz: d[3],
        },
      );
    }
    Ok(cells)
  }

  /// Central-difference normals at every edge crossing, batched.
  fn crossing_normals(&mut self, edges: &[ActiveEdge], origin: Vec3) -> Result<Vec<EdgeCrossing>> {
    let h = self.res * NORMAL_STEP;
    let mut probes = Vec::with_capacity(edges.len() * 6);
    let mut points = Vec::with_capacity(edges.len());
    for edge in edges {
      let mut p = origin + edge.pos.as_vec3() * self.res;
      p[edge.axis] += edge.t * self.res;
      points.push(p);
      for axis in 0..3 {
        let mut step = Vec3::ZERO;
        step[axis] = h;
        probes.push(p + step);
        probes.push(p - step);
      }
    }
    let mut dists = vec![0.0f32; probes.len()];
    for (chunk_p, chunk_d) in probes
      .chunks(self.config.eval_batch)
      .zip(dists.chunks_mut(self.config.eval_batch))
    {
      self.sdf.evaluate(chunk_p, chunk_d, &mut self.scratch)?;
    }
    self.evaluations += probes.len() as u64;

    let mut out = Vec::with_capacity(edges.len());
    for (i, point) in points.iter().enumerate() {
      let base = i * 6;
      let g = Vec3::new(
        dists[base] - dists[base + 1],
        dists[base + 2] - dists[base + 3],
        dists[base + 4] - dists[base + 5],
      );
      let normal = g.normalize_or_zero();
      out.push(EdgeCrossing {
        point: *point,
        normal,
      });
    }
    Ok(out)
  }
}

/// The two lattice axes spanning the plane perpendicular to `axis`,
/// in right-handed (cyclic) order.
fn plane_axes(axis: usize) -> (IVec3, IVec3) {
  match axis {
    0 => (IVec3::Y, IVec3::Z),
    1 => (IVec3::Z, IVec3::X),
    _ => (IVec3::X, IVec3::Y),
  }
}

/// An edge is active when the sign of the distance differs between the
/// cell origin and the axis neighbor; zero counts as inside.
fn collect_active_edges(cells: &FxHashMap<IVec3, DualCell>) -> Vec<ActiveEdge> {
  let mut keys: Vec<IVec3> = cells.keys().copied().collect();
  keys.sort_by_key(|k| (k.z, k.y, k.x));

  let mut edges = Vec::new();
  for pos in keys {
    let cell = cells[&pos];
    for axis in 0..3 {
      let da = cell.axis(axis);
      let out0 = cell.d0 > 0.0;
      let outa = da > 0.0;
      if out0 == outa {
        continue;
      }
      let denom = da - cell.d0;
      let t = if denom.abs() < f32::EPSILON {
        0.5
      } else {
        (-cell.d0 / denom).clamp(0.0, 1.0)
      };
      edges.push(ActiveEdge {
        pos,
        axis,
        t,
        flip: da < cell.d0,
      });
    }
  }
  edges
}

#[cfg(test)]
#[path = "dual_test.rs"]
mod dual_test;
