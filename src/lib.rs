//! sdfkit - constructive signed-distance-field modeling kernel
//!
//! This crate models parametric 2D and 3D geometry as signed distance
//! fields. Primitives, transforms and boolean/smooth combinators compose
//! into an immutable expression DAG; the kernel evaluates the resulting
//! distance function on batches of points (host CPU, or a GPU compute
//! program produced by shader code generation) and extracts triangle
//! meshes of the implicit surface.
//!
//! # Features
//!
//! - **Expression DAG**: shared, immutable shape nodes with conservative
//!   bounds propagation
//! - **Latched builder**: fluent construction without per-call error
//!   handling; the first invalid parameter is reported at the end
//! - **Dual backends**: a recursive CPU evaluator and a deduplicating
//!   GLSL compute emitter + wgpu dispatcher that agree to 5e-3
//! - **Meshing**: a streaming octree mesher with empty-space pruning and
//!   marching cubes, and a single-pass dual-contouring mesher
//!
//! # Example
//!
//! ```
//! use sdfkit::shape::Builder;
//! use sdfkit::eval::CpuSdf3;
//! use sdfkit::mesh::{MesherConfig, OctreeMesher};
//!
//! let mut b = Builder::new();
//! let ball = b.sphere(1.0);
//! let cut = b.cuboid(1.5, 1.5, 1.5, 0.1);
//! let part = b.difference(&cut, &ball);
//! assert!(b.err().is_none());
//!
//! let sdf = CpuSdf3::new(part);
//! let mut mesher = OctreeMesher::new(sdf, 0.05, MesherConfig::default()).unwrap();
//! let mut triangles = Vec::new();
//! mesher.render_all(&mut triangles).unwrap();
//! assert!(!triangles.is_empty());
//! ```

pub mod error;
pub mod math;

// Expression DAG, builder and name shortener
pub mod shape;

// Evaluation substrate: scratch pool, CPU evaluator, block cache
pub mod eval;

// GLSL compute emission
pub mod emit;

// wgpu compute backend
pub mod gpu;

// Octree and dual-contouring meshers
pub mod mesh;

// Binary STL byte sink/source
pub mod io;

pub use error::{Error, Result};
pub use eval::{BlockCache3, CpuSdf2, CpuSdf3, ScratchPool, Sdf2, Sdf3};
pub use mesh::{DualContourMesher, MesherConfig, OctreeMesher, Status, Triangle};
pub use shape::{Builder, Shape2, Shape3};
