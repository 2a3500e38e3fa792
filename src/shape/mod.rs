//! Expression DAG: typed shape nodes, the latched builder and the
//! emission-name shortener.
//!
//! Shapes are cheap `Clone` handles over immutable, reference-counted
//! nodes; subexpressions may be shared between parents and live until the
//! last parent drops. Bounds are computed once at construction and every
//! node carries a structural hash so the shader emitter can deduplicate
//! identical subexpressions deterministically.

pub mod builder;
pub mod op2;
pub mod op3;
pub mod shorten;

pub use builder::Builder;
pub use op2::Shape2;
pub use op3::Shape3;
pub use shorten::{shorten_names_2d, shorten_names_3d};

use fxhash::FxHasher;
use std::hash::Hasher;

/// Interior cell for the per-node emission-name override.
///
/// The only mutable facet of a constructed node; everything else is
/// frozen at build time.
#[derive(Default)]
pub(crate) struct NameCell(parking_lot::RwLock<Option<String>>);

impl NameCell {
  pub(crate) fn get(&self) -> Option<String> {
    self.0.read().clone()
  }

  pub(crate) fn set(&self, name: String) {
    *self.0.write() = Some(name);
  }
}

impl std::fmt::Debug for NameCell {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &*self.0.read() {
      Some(n) => write!(f, "{n:?}"),
      None => write!(f, "-"),
    }
  }
}

/// Deterministic structural hash over an op tag, parameter bits and the
/// already-computed hashes of the children.
pub(crate) fn structural_hash(tag: &str, floats: &[f32], ints: &[u32], children: &[u64]) -> u64 {
  let mut h = FxHasher::default();
  h.write(tag.as_bytes());
  h.write_u8(0xfe);
  for f in floats {
    h.write_u32(f.to_bits());
  }
  for i in ints {
    h.write_u32(*i);
  }
  for c in children {
    h.write_u64(*c);
  }
  h.finish()
}
