//! Math primitives: bounding boxes, lattice grids, spline flattening.

pub mod aabb;
pub mod grid;
pub mod spline;

pub use aabb::{Aabb2, Aabb3};
pub use grid::{append_grid_2d, append_grid_3d};
pub use spline::Spline3Sampler;
