//! GLSL bodies for 2D nodes. Mirrors `eval::dist2`.

use std::fmt::{self, Write};

use bytemuck::cast_slice;

use crate::emit::{glf, Emitter};
use crate::shape::op2::{Op2, Shape2};

impl Emitter<'_> {
  pub(crate) fn body2(&mut self, shape: &Shape2, name: &str, c: &[String]) -> fmt::Result {
    match &shape.node().op {
      Op2::Circle { r } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(self.out(), "  return length(p) - {};", glf(*r))?;
      }
      Op2::Rectangle { half } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(
          self.out(),
          "  vec2 q = abs(p) - vec2({}, {});",
          glf(half.x),
          glf(half.y)
        )?;
        writeln!(
          self.out(),
          "  return length(max(q, vec2(0.0))) + min(max(q.x, q.y), 0.0);"
        )?;
      }
      Op2::Hexagon { r } => {
        writeln!(self.out(), "float {name}(vec2 p0) {{")?;
        writeln!(
          self.out(),
          "  const vec3 k = vec3(-0.8660254, 0.5, 0.57735027);"
        )?;
        writeln!(self.out(), "  vec2 q = abs(p0);")?;
        writeln!(self.out(), "  float d = 2.0 * min(dot(k.xy, q), 0.0);")?;
        writeln!(self.out(), "  q -= d * k.xy;")?;
        writeln!(
          self.out(),
          "  q -= vec2(clamp(q.x, -k.z * {r}, k.z * {r}), {r});",
          r = glf(*r)
        )?;
        writeln!(self.out(), "  return length(q) * sign(q.y);")?;
      }
      Op2::Arc { r, sc, half_t } => {
        writeln!(self.out(), "float {name}(vec2 p0) {{")?;
        writeln!(self.out(), "  vec2 p = vec2(abs(p0.x), p0.y);")?;
        writeln!(
          self.out(),
          "  vec2 sc = vec2({}, {});",
          glf(sc.x),
          glf(sc.y)
        )?;
        writeln!(
          self.out(),
          "  float d = (sc.y * p.x > sc.x * p.y) ? length(p - sc * {r}) : abs(length(p) - {r});",
          r = glf(*r)
        )?;
        writeln!(self.out(), "  return d - {};", glf(*half_t))?;
      }
      Op2::Segment { a, b, half_w } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(
          self.out(),
          "  vec2 pa = p - vec2({}, {});",
          glf(a.x),
          glf(a.y)
        )?;
        writeln!(
          self.out(),
          "  vec2 ba = vec2({}, {});",
          glf(b.x - a.x),
          glf(b.y - a.y)
        )?;
        writeln!(
          self.out(),
          "  float h = clamp(dot(pa, ba) / dot(ba, ba), 0.0, 1.0);"
        )?;
        writeln!(
          self.out(),
          "  return length(pa - ba * h) - {};",
          glf(*half_w)
        )?;
      }
      Op2::Polygon { verts } => {
        let data: Vec<[f32; 2]> = verts.iter().map(|v| [v.x, v.y]).collect();
        self.alloc_object("vec2", cast_slice(&data).to_vec())?;
        let ssbo = self.last_object_ident();
        let n = verts.len();
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(self.out(), "  vec2 w0 = p - {ssbo}[0];")?;
        writeln!(self.out(), "  float d = dot(w0, w0);")?;
        writeln!(self.out(), "  float s = 1.0;")?;
        writeln!(self.out(), "  int j = {};", n - 1)?;
        writeln!(self.out(), "  for (int i = 0; i < {n}; ++i) {{")?;
        writeln!(self.out(), "    vec2 e = {ssbo}[j] - {ssbo}[i];")?;
        writeln!(self.out(), "    vec2 w = p - {ssbo}[i];")?;
        writeln!(
          self.out(),
          "    vec2 b = w - e * clamp(dot(w, e) / dot(e, e), 0.0, 1.0);"
        )?;
        writeln!(self.out(), "    d = min(d, dot(b, b));")?;
        writeln!(self.out(), "    bool c1 = p.y >= {ssbo}[i].y;")?;
        writeln!(self.out(), "    bool c2 = p.y < {ssbo}[j].y;")?;
        writeln!(self.out(), "    bool c3 = e.x * w.y > e.y * w.x;")?;
        writeln!(
          self.out(),
          "    if ((c1 && c2 && c3) || (!c1 && !c2 && !c3)) {{"
        )?;
        writeln!(self.out(), "      s = -s;")?;
        writeln!(self.out(), "    }}")?;
        writeln!(self.out(), "    j = i;")?;
        writeln!(self.out(), "  }}")?;
        writeln!(self.out(), "  return s * sqrt(d);")?;
      }
      Op2::Ellipse { ab } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(
          self.out(),
          "  vec2 ab = vec2({}, {});",
          glf(ab.x),
          glf(ab.y)
        )?;
        writeln!(self.out(), "  float k1 = length(p / (ab * ab));")?;
        writeln!(self.out(), "  if (k1 == 0.0) {{")?;
        writeln!(self.out(), "    return -min(ab.x, ab.y);")?;
        writeln!(self.out(), "  }}")?;
        writeln!(self.out(), "  float k0 = length(p / ab);")?;
        writeln!(self.out(), "  return k0 * (k0 - 1.0) / k1;")?;
      }
      Op2::Union { .. } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(self.out(), "  return min({}(p), {}(p));", c[0], c[1])?;
      }
      Op2::Intersect { .. } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(self.out(), "  return max({}(p), {}(p));", c[0], c[1])?;
      }
      Op2::Difference { .. } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(self.out(), "  return max({}(p), -{}(p));", c[0], c[1])?;
      }
      Op2::Xor { .. } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(self.out(), "  float da = {}(p);", c[0])?;
        writeln!(self.out(), "  float db = {}(p);", c[1])?;
        writeln!(self.out(), "  return max(min(da, db), -max(da, db));")?;
      }
      Op2::SmoothUnion { k, .. } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(self.out(), "  float da = {}(p);", c[0])?;
        writeln!(self.out(), "  float db = {}(p);", c[1])?;
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
      Op2::SmoothIntersect { k, .. } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(self.out(), "  float da = {}(p);", c[0])?;
        writeln!(self.out(), "  float db = {}(p);", c[1])?;
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
      Op2::SmoothDifference { k, .. } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(self.out(), "  float da = {}(p);", c[0])?;
        writeln!(self.out(), "  float db = {}(p);", c[1])?;
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
      Op2::UnionArray { offsets, .. } => {
        let data: Vec<[f32; 2]> = offsets.iter().map(|o| [o.x, o.y]).collect();
        self.alloc_object("vec2", cast_slice(&data).to_vec())?;
        let ssbo = self.last_object_ident();
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(self.out(), "  float d = {}(p - {ssbo}[0]);", c[0])?;
        writeln!(self.out(), "  for (int i = 1; i < {}; ++i) {{", offsets.len())?;
        writeln!(self.out(), "    d = min(d, {}(p - {ssbo}[i]));", c[0])?;
        writeln!(self.out(), "  }}")?;
        writeln!(self.out(), "  return d;")?;
      }
      Op2::Translate { v, .. } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(
          self.out(),
          "  return {}(p - vec2({}, {}));",
          c[0],
          glf(v.x),
          glf(v.y)
        )?;
      }
      Op2::Scale { s, .. } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(
          self.out(),
          "  return {}(p * {}) * {};",
          c[0],
          glf(1.0 / s),
          glf(*s)
        )?;
      }
      Op2::Rotate { cs, .. } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(
          self.out(),
          "  return {}(vec2({c0} * p.x + {s0} * p.y, -{s0} * p.x + {c0} * p.y));",
          c[0],
          c0 = glf(cs.x),
          s0 = glf(cs.y)
        )?;
      }
      Op2::Symmetry { axes, .. } => {
        let comp = |on: bool, ax: &str| {
          if on {
            format!("abs(p.{ax})")
          } else {
            format!("p.{ax}")
          }
        };
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(
          self.out(),
          "  return {}(vec2({}, {}));",
          c[0],
          comp(axes[0], "x"),
          comp(axes[1], "y")
        )?;
      }
      Op2::Array { pitch, count, .. } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(
          self.out(),
          "  vec2 pitch = vec2({}, {});",
          glf(pitch.x),
          glf(pitch.y)
        )?;
        writeln!(
          self.out(),
          "  vec2 id = clamp(round(p / pitch), vec2(0.0), vec2({}, {}));",
          glf((count[0] - 1) as f32),
          glf((count[1] - 1) as f32)
        )?;
        writeln!(self.out(), "  return {}(p - pitch * id);", c[0])?;
      }
      Op2::Elongate { h, .. } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(
          self.out(),
          "  vec2 h = vec2({}, {});",
          glf(h.x),
          glf(h.y)
        )?;
        writeln!(self.out(), "  return {}(p - clamp(p, -h, h));", c[0])?;
      }
      Op2::Offset { d, .. } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(self.out(), "  return {}(p) + {};", c[0], glf(*d))?;
      }
      Op2::Shell { half_t, .. } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(self.out(), "  return abs({}(p)) - {};", c[0], glf(*half_t))?;
      }
      Op2::Round { r, .. } => {
        writeln!(self.out(), "float {name}(vec2 p) {{")?;
        writeln!(self.out(), "  return {}(p) - {};", c[0], glf(*r))?;
      }
    }
    writeln!(self.out(), "}}")
  }
}
