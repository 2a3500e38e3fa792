//! GLSL bodies for 3D nodes.
//!
//! Every body is a pure function of `p` and already-emitted child
//! names. Formulas mirror `eval::dist3`; keep both in lockstep.

use std::fmt::{self, Write};

use bytemuck::cast_slice;

use crate::emit::{glf, Emitter};
use crate::shape::op3::{Op3, Shape3};

impl Emitter<'_> {
  pub(crate) fn body3(
    &mut self,
    shape: &Shape3,
    name: &str,
    c3: &[String],
    c2: &[String],
  ) -> fmt::Result {
    match &shape.node().op {
      Op3::Sphere { r } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(self.out(), "  return length(p) - {};", glf(*r))?;
      }
      Op3::Cuboid { half, round } => {
        let inner = *half - glam::Vec3::splat(*round);
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(
          self.out(),
          "  vec3 q = abs(p) - vec3({}, {}, {});",
          glf(inner.x),
          glf(inner.y),
          glf(inner.z)
        )?;
        writeln!(
          self.out(),
          "  return length(max(q, vec3(0.0))) + min(max(q.x, max(q.y, q.z)), 0.0) - {};",
          glf(*round)
        )?;
      }
      Op3::BoxFrame { half, thick } => {
        writeln!(self.out(), "float {name}(vec3 p0) {{")?;
        writeln!(
          self.out(),
          "  vec3 p = abs(p0) - vec3({}, {}, {});",
          glf(half.x),
          glf(half.y),
          glf(half.z)
        )?;
        writeln!(
          self.out(),
          "  vec3 q = abs(p + vec3({e})) - vec3({e});",
          e = glf(*thick)
        )?;
        writeln!(
          self.out(),
          "  float d1 = length(max(vec3(p.x, q.y, q.z), vec3(0.0))) + min(max(p.x, max(q.y, q.z)), 0.0);"
        )?;
        writeln!(
          self.out(),
          "  float d2 = length(max(vec3(q.x, p.y, q.z), vec3(0.0))) + min(max(q.x, max(p.y, q.z)), 0.0);"
        )?;
        writeln!(
          self.out(),
          "  float d3 = length(max(vec3(q.x, q.y, p.z), vec3(0.0))) + min(max(q.x, max(q.y, p.z)), 0.0);"
        )?;
        writeln!(self.out(), "  return min(d1, min(d2, d3));")?;
      }
      Op3::Cylinder { r, half_h, round } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(
          self.out(),
          "  vec2 d = abs(vec2(length(p.xy), p.z)) - vec2({}, {});",
          glf(r - round),
          glf(half_h - round)
        )?;
        writeln!(
          self.out(),
          "  return min(max(d.x, d.y), 0.0) + length(max(d, vec2(0.0))) - {};",
          glf(*round)
        )?;
      }
      Op3::HexPrism { r, half_h } => {
        writeln!(self.out(), "float {name}(vec3 p0) {{")?;
        writeln!(
          self.out(),
          "  const vec3 k = vec3(-0.8660254, 0.5, 0.57735027);"
        )?;
        writeln!(self.out(), "  vec3 q = abs(p0);")?;
        writeln!(self.out(), "  float d = 2.0 * min(dot(k.xy, q.xy), 0.0);")?;
        writeln!(self.out(), "  q.x -= d * k.x;")?;
        writeln!(self.out(), "  q.y -= d * k.y;")?;
        writeln!(
          self.out(),
          "  float dx = length(q.xy - vec2(clamp(q.x, -k.z * {r}, k.z * {r}), {r})) * sign(q.y - {r});",
          r = glf(*r)
        )?;
        writeln!(self.out(), "  float dy = q.z - {};", glf(*half_h))?;
        writeln!(
          self.out(),
          "  return min(max(dx, dy), 0.0) + length(max(vec2(dx, dy), vec2(0.0)));"
        )?;
      }
      Op3::TriPrism { c, half_h } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(self.out(), "  vec3 q = abs(p);")?;
        writeln!(
          self.out(),
          "  return max(q.z - {}, max(q.x * 0.8660254 + p.y * 0.5, -p.y) - {} * 0.5);",
          glf(*half_h),
          glf(*c)
        )?;
      }
      Op3::Torus { ring, tube } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(
          self.out(),
          "  vec2 q = vec2(length(p.xy) - {}, p.z);",
          glf(*ring)
        )?;
        writeln!(self.out(), "  return length(q) - {};", glf(*tube))?;
      }
      Op3::Screw {
        half_h,
        omega,
        atten,
        ..
      } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(self.out(), "  float a = {} * p.z;", glf(*omega))?;
        writeln!(self.out(), "  float c = cos(a);")?;
        writeln!(self.out(), "  float s = sin(a);")?;
        writeln!(
          self.out(),
          "  vec2 q = vec2(c * p.x + s * p.y, -s * p.x + c * p.y);"
        )?;
        writeln!(
          self.out(),
          "  return max({}(q) * {}, abs(p.z) - {});",
          c2[0],
          glf(*atten),
          glf(*half_h)
        )?;
      }
      Op3::Union { .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(self.out(), "  return min({}(p), {}(p));", c3[0], c3[1])?;
      }
      Op3::Intersect { .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(self.out(), "  return max({}(p), {}(p));", c3[0], c3[1])?;
      }
      Op3::Difference { .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(self.out(), "  return max({}(p), -{}(p));", c3[0], c3[1])?;
      }
      Op3::Xor { .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(self.out(), "  float da = {}(p);", c3[0])?;
        writeln!(self.out(), "  float db = {}(p);", c3[1])?;
        writeln!(self.out(), "  return max(min(da, db), -max(da, db));")?;
      }
      Op3::SmoothUnion { k, .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(self.out(), "  float da = {}(p);", c3[0])?;
        writeln!(self.out(), "  float db = {}(p);", c3[1])?;
        writeln!(
          self.out(),
          "  float h = clamp(0.5 + 0.5 * (db - da) / {}, 0.0, 1.0);",
          glf(*k)
        )?;
        writeln!(
          self.out(),
          "  return mix(db, da, h) - {} * h * (1.0 - h);",
          glf(*k)
        )?;
      }
      Op3::SmoothIntersect { k, .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(self.out(), "  float da = {}(p);", c3[0])?;
        writeln!(self.out(), "  float db = {}(p);", c3[1])?;
        writeln!(
          self.out(),
          "  float h = clamp(0.5 - 0.5 * (db - da) / {}, 0.0, 1.0);",
          glf(*k)
        )?;
        writeln!(
          self.out(),
          "  return mix(db, da, h) + {} * h * (1.0 - h);",
          glf(*k)
        )?;
      }
      Op3::SmoothDifference { k, .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(self.out(), "  float da = {}(p);", c3[0])?;
        writeln!(self.out(), "  float db = {}(p);", c3[1])?;
        writeln!(
          self.out(),
          "  float h = clamp(0.5 - 0.5 * (db + da) / {}, 0.0, 1.0);",
          glf(*k)
        )?;
        writeln!(
          self.out(),
          "  return mix(da, -db, h) + {} * h * (1.0 - h);",
          glf(*k)
        )?;
      }
      Op3::UnionArray { offsets, .. } => {
        let padded: Vec<[f32; 4]> = offsets.iter().map(|o| [o.x, o.y, o.z, 0.0]).collect();
        self.alloc_object("vec4", cast_slice(&padded).to_vec())?;
        let ssbo = self.last_object_ident();
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(self.out(), "  float d = {}(p - {ssbo}[0].xyz);", c3[0])?;
        writeln!(self.out(), "  for (int i = 1; i < {}; ++i) {{", offsets.len())?;
        writeln!(self.out(), "    d = min(d, {}(p - {ssbo}[i].xyz));", c3[0])?;
        writeln!(self.out(), "  }}")?;
        writeln!(self.out(), "  return d;")?;
      }
      Op3::Translate { v, .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(
          self.out(),
          "  return {}(p - vec3({}, {}, {}));",
          c3[0],
          glf(v.x),
          glf(v.y),
          glf(v.z)
        )?;
      }
      Op3::Scale { s, .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(
          self.out(),
          "  return {}(p * {}) * {};",
          c3[0],
          glf(1.0 / s),
          glf(*s)
        )?;
      }
      Op3::Rotate { inv, .. } => {
        let m = inv.to_cols_array();
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        write!(self.out(), "  mat3 m = mat3(")?;
        for (i, v) in m.iter().enumerate() {
          if i > 0 {
            write!(self.out(), ", ")?;
          }
          write!(self.out(), "{}", glf(*v))?;
        }
        writeln!(self.out(), ");")?;
        writeln!(self.out(), "  return {}(m * p);", c3[0])?;
      }
      Op3::Symmetry { axes, .. } => {
        let comp = |on: bool, c: &str| {
          if on {
            format!("abs(p.{c})")
          } else {
            format!("p.{c}")
          }
        };
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(
          self.out(),
          "  return {}(vec3({}, {}, {}));",
          c3[0],
          comp(axes[0], "x"),
          comp(axes[1], "y"),
          comp(axes[2], "z")
        )?;
      }
      Op3::Array { pitch, count, .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(
          self.out(),
          "  vec3 pitch = vec3({}, {}, {});",
          glf(pitch.x),
          glf(pitch.y),
          glf(pitch.z)
        )?;
        writeln!(
          self.out(),
          "  vec3 id = clamp(round(p / pitch), vec3(0.0), vec3({}, {}, {}));",
          glf((count[0] - 1) as f32),
          glf((count[1] - 1) as f32),
          glf((count[2] - 1) as f32)
        )?;
        writeln!(self.out(), "  return {}(p - pitch * id);", c3[0])?;
      }
      Op3::Elongate { h, .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(
          self.out(),
          "  vec3 h = vec3({}, {}, {});",
          glf(h.x),
          glf(h.y),
          glf(h.z)
        )?;
        writeln!(self.out(), "  return {}(p - clamp(p, -h, h));", c3[0])?;
      }
      Op3::Offset { d, .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(self.out(), "  return {}(p) + {};", c3[0], glf(*d))?;
      }
      Op3::Shell { half_t, .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(self.out(), "  return abs({}(p)) - {};", c3[0], glf(*half_t))?;
      }
      Op3::Round { r, .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(self.out(), "  return {}(p) - {};", c3[0], glf(*r))?;
      }
      Op3::Extrude { half_h, .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(
          self.out(),
          "  vec2 w = vec2({}(p.xy), abs(p.z) - {});",
          c2[0],
          glf(*half_h)
        )?;
        writeln!(
          self.out(),
          "  return min(max(w.x, w.y), 0.0) + length(max(w, vec2(0.0)));"
        )?;
      }
      Op3::Revolve { offset, .. } => {
        writeln!(self.out(), "float {name}(vec3 p) {{")?;
        writeln!(
          self.out(),
          "  return {}(vec2(length(p.xy) - {}, p.z));",
          c2[0],
          glf(*offset)
        )?;
      }
    }
    writeln!(self.out(), "}}")
  }
}
