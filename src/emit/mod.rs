//! GLSL compute emission.
//!
//! Translates a shape DAG into a GLSL 430 compute program: one pure
//! `float <name>(vec3 p)` (or `vec2`) function per unique subexpression,
//! a dispatch trailer reading positions from binding 0 and writing
//! distances to binding 1, and shader-object SSBO declarations for
//! variadic nodes (offset tables, polygon vertices) at bindings 2 and
//! up.
//!
//! Emission is deterministic: names derive from structural hashes, the
//! walk is first-visit post-order, and identical DAGs produce
//! byte-identical source.

pub mod glsl2;
pub mod glsl3;

use std::fmt::{self, Write};

use fxhash::FxHashMap;

use crate::shape::{Shape2, Shape3};

/// Compute invocations per workgroup, fixed at emission time.
pub const INVOC_X: u32 = 64;

/// Emission options.
#[derive(Clone, Copy, Debug)]
pub struct EmitConfig {
  /// `local_size_x` of the generated program. Callers pad batches to a
  /// multiple of this so the kernel needs no bounds check.
  pub invoc_x: u32,
}

impl Default for EmitConfig {
  fn default() -> Self {
    Self { invoc_x: INVOC_X }
  }
}

/// Host data behind an SSBO declaration in the generated source.
///
/// The emitter declares the buffer at `binding`; the GPU backend uploads
/// `data` before dispatch.
#[derive(Clone, Debug)]
pub struct ShaderObject {
  pub binding: u32,
  /// The `layout(std430, ...) buffer` declaration emitted into the
  /// source, kept for inspection.
  pub declaration: String,
  /// Byte snapshot of the host data, already laid out for std430.
  pub data: Vec<u8>,
}

/// Format an f32 as a GLSL literal with round-trip precision.
pub(crate) fn glf(v: f32) -> String {
  format!("{v:?}")
}

pub(crate) struct Emitter<'w> {
  out: &'w mut String,
  emitted: FxHashMap<u64, String>,
  objects: Vec<ShaderObject>,
  next_binding: u32,
}

impl<'w> Emitter<'w> {
  fn new(out: &'w mut String) -> Self {
    Self {
      out,
      emitted: FxHashMap::default(),
      objects: Vec::new(),
      next_binding: 2,
    }
  }

  pub(crate) fn out(&mut self) -> &mut String {
    self.out
  }

  /// Declare a shader-object SSBO and record its host data. Returns the
  /// SSBO array identifier to reference from the body.
  pub(crate) fn alloc_object(&mut self, element_type: &str, data: Vec<u8>) -> fmt::Result {
    let binding = self.next_binding;
    self.next_binding += 1;
    let ident = format!("ssbo{binding}");
    let declaration = format!(
      "layout(std430, binding = {binding}) readonly buffer Ssbo{binding} {{ {element_type} {ident}[]; }};"
    );
    writeln!(self.out, "{declaration}")?;
    self.objects.push(ShaderObject {
      binding,
      declaration,
      data,
    });
    Ok(())
  }

  /// Identifier of the most recently allocated shader object.
  pub(crate) fn last_object_ident(&self) -> String {
    format!("ssbo{}", self.next_binding - 1)
  }

  /// Emit the function for a 3D node (and everything below it) exactly
  /// once; returns its name.
  pub(crate) fn emit3(&mut self, shape: &Shape3) -> Result<String, fmt::Error> {
    if let Some(name) = self.emitted.get(&shape.structural_id()) {
      return Ok(name.clone());
    }

    let mut names2 = Vec::new();
    let mut walk_err = Ok(());
    shape.for_each_child_2d(&mut |c| {
      if walk_err.is_ok() {
        match self.emit2(c) {
          Ok(n) => names2.push(n),
          Err(e) => walk_err = Err(e),
        }
      }
    });
    walk_err?;

    let mut names3 = Vec::new();
    let mut walk_err = Ok(());
    shape.for_each_child(&mut |c| {
      if walk_err.is_ok() {
        match self.emit3(c) {
          Ok(n) => names3.push(n),
          Err(e) => walk_err = Err(e),
        }
      }
    });
    walk_err?;

    let name = shape.name();
    self.body3(shape, &name, &names3, &names2)?;
    self.emitted.insert(shape.structural_id(), name.clone());
    Ok(name)
  }

  /// 2D counterpart of [`Emitter::emit3`].
  pub(crate) fn emit2(&mut self, shape: &Shape2) -> Result<String, fmt::Error> {
    if let Some(name) = self.emitted.get(&shape.structural_id()) {
      return Ok(name.clone());
    }

    let mut names = Vec::new();
    let mut walk_err = Ok(());
    shape.for_each_child(&mut |c| {
      if walk_err.is_ok() {
        match self.emit2(c) {
          Ok(n) => names.push(n),
          Err(e) => walk_err = Err(e),
        }
      }
    });
    walk_err?;

    let name = shape.name();
    self.body2(shape, &name, &names)?;
    self.emitted.insert(shape.structural_id(), name.clone());
    Ok(name)
  }
}

fn emit_compute_3d_inner(
  w: &mut String,
  root: &Shape3,
  cfg: &EmitConfig,
) -> Result<(String, Vec<ShaderObject>), fmt::Error> {
  writeln!(w, "#version 430")?;
  writeln!(w, "layout(local_size_x = {}) in;", cfg.invoc_x)?;
  writeln!(
    w,
    "layout(std430, binding = 0) readonly buffer InPositions {{ vec4 in_positions[]; }};"
  )?;
  writeln!(
    w,
    "layout(std430, binding = 1) writeonly buffer OutDistances {{ float out_distances[]; }};"
  )?;

  let mut emitter = Emitter::new(w);
  let root_name = emitter.emit3(root)?;
  let objects = emitter.objects;

  writeln!(w, "void main() {{")?;
  writeln!(w, "  uint gid = gl_GlobalInvocationID.x;")?;
  writeln!(w, "  out_distances[gid] = {root_name}(in_positions[gid].xyz);")?;
  writeln!(w, "}}")?;
  Ok((root_name, objects))
}

fn emit_compute_2d_inner(
  w: &mut String,
  root: &Shape2,
  cfg: &EmitConfig,
) -> Result<(String, Vec<ShaderObject>), fmt::Error> {
  writeln!(w, "#version 430")?;
  writeln!(w, "layout(local_size_x = {}) in;", cfg.invoc_x)?;
  writeln!(
    w,
    "layout(std430, binding = 0) readonly buffer InPositions {{ vec2 in_positions[]; }};"
  )?;
  writeln!(
    w,
    "layout(std430, binding = 1) writeonly buffer OutDistances {{ float out_distances[]; }};"
  )?;

  let mut emitter = Emitter::new(w);
  let root_name = emitter.emit2(root)?;
  let objects = emitter.objects;

  writeln!(w, "void main() {{")?;
  writeln!(w, "  uint gid = gl_GlobalInvocationID.x;")?;
  writeln!(w, "  out_distances[gid] = {root_name}(in_positions[gid]);")?;
  writeln!(w, "}}")?;
  Ok((root_name, objects))
}

/// Emit the full compute program for a 3D expression. Returns the root
/// function name and the shader objects the GPU backend must bind.
pub fn emit_compute_3d(
  w: &mut String,
  root: &Shape3,
  cfg: &EmitConfig,
) -> (String, Vec<ShaderObject>) {
  emit_compute_3d_inner(w, root, cfg).expect("String formatting does not fail")
}

/// Emit the full compute program for a 2D expression.
pub fn emit_compute_2d(
  w: &mut String,
  root: &Shape2,
  cfg: &EmitConfig,
) -> (String, Vec<ShaderObject>) {
  emit_compute_2d_inner(w, root, cfg).expect("String formatting does not fail")
}

#[cfg(test)]
#[path = "emit_test.rs"]
mod emit_test;
