//! Error type shared by construction, evaluation and meshing.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All failure modes surfaced by the kernel.
///
/// Builder errors are latched (see [`crate::shape::Builder`]); evaluator
/// and mesher errors are returned at the call site. Meshers never panic on
/// data and surface backend errors verbatim.
#[derive(Debug, Error)]
pub enum Error {
  /// A constructor rejected a non-finite, non-positive or degenerate
  /// argument.
  #[error("invalid parameter for {node}: {reason}")]
  InvalidParameter {
    /// Node kind whose constructor failed.
    node: &'static str,
    /// Human-readable rejection reason.
    reason: String,
  },

  /// `positions` and `distances` slices differ in length.
  #[error("buffer length mismatch: {positions} positions vs {distances} distances")]
  BufferLengthMismatch { positions: usize, distances: usize },

  /// Evaluation was requested on a zero-length batch.
  #[error("evaluation requested on an empty batch")]
  EmptyBuffer,

  /// The end-of-call pool check found buffers still leased out.
  #[error("{count} scratch buffers still acquired after evaluation")]
  LeakedScratch { count: usize },

  /// GPU evaluation requested on a host without a usable compute adapter.
  #[error("gpu backend unavailable: {0}")]
  BackendUnavailable(String),

  /// The generated compute program failed to compile.
  #[error("shader compilation failed: {log}")]
  ShaderCompile {
    /// Compiler diagnostics.
    log: String,
    /// The full generated source, for inspection.
    generated_source: String,
  },

  /// The top-level cube cannot be decomposed within the configured
  /// scratch capacities.
  #[error("octree decomposition exceeds configured buffers: {0}")]
  DecomposeExceedsBuffer(String),

  /// The caller's triangle buffer cannot hold even one cell's output.
  #[error("triangle buffer too small: need capacity for at least {min} triangles")]
  ShortBuffer { min: usize },
}

impl Error {
  pub(crate) fn invalid(node: &'static str, reason: impl Into<String>) -> Self {
    Error::InvalidParameter {
      node,
      reason: reason.into(),
    }
  }
}
