//! Integer-lattice octree cells.
//!
//! An `Icube` addresses the axis-aligned cube of side `res * 2^(lvl-1)`
//! whose minimum corner sits at `origin + pos * res`; `lvl == 1` is the
//! smallest cube. Parent/child relationships are pure coordinate math,
//! no tree nodes are stored.

use glam::{IVec3, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Icube {
  /// Lattice coordinates of the minimum corner, in smallest-cube units.
  pub pos: IVec3,
  /// Level in `[1, top]`; 1 is the smallest cube.
  pub lvl: u32,
}

impl Icube {
  pub fn new(pos: IVec3, lvl: u32) -> Self {
    debug_assert!(lvl >= 1);
    Self { pos, lvl }
  }

  /// Side length in smallest-cube units.
  #[inline]
  pub fn lattice_side(&self) -> i32 {
    1 << (self.lvl - 1)
  }

  /// Side length in world units.
  #[inline]
  pub fn side(&self, res: f32) -> f32 {
    res * self.lattice_side() as f32
  }

  /// Minimum corner in world units.
  #[inline]
  pub fn origin(&self, base: Vec3, res: f32) -> Vec3 {
    base + self.pos.as_vec3() * res
  }

  /// Cube center in world units.
  #[inline]
  pub fn center(&self, base: Vec3, res: f32) -> Vec3 {
    self.origin(base, res) + Vec3::splat(self.side(res) * 0.5)
  }

  /// The eight sub-cubes at `lvl - 1`, octant bits x/y/z.
  ///
  /// # Panics
  /// Debug-asserts that the cube is divisible (`lvl >= 2`).
  pub fn children(&self) -> [Icube; 8] {
    debug_assert!(self.lvl >= 2, "smallest cubes do not decompose");
    let step = 1 << (self.lvl - 2);
    std::array::from_fn(|octant| {
      let off = IVec3::new(
        (octant as i32 & 1) * step,
        ((octant as i32 >> 1) & 1) * step,
        ((octant as i32 >> 2) & 1) * step,
      );
      Icube::new(self.pos + off, self.lvl - 1)
    })
  }

  /// Number of smallest cubes covered: `8^(lvl-1)`.
  #[inline]
  pub fn leaf_count(&self) -> u64 {
    1u64 << (3 * (self.lvl - 1))
  }
}
