use glam::{Vec2, Vec3};

use super::*;
use crate::shape::{shorten_names_3d, Builder, Shape3};

fn emit_source(root: &Shape3) -> (String, String, Vec<ShaderObject>) {
  let mut src = String::new();
  let (name, objects) = emit_compute_3d(&mut src, root, &EmitConfig::default());
  (src, name, objects)
}

/// Property 4: emitting the same DAG twice yields byte-identical source.
#[test]
fn test_emit_is_deterministic() {
  let build = || {
    let mut b = Builder::new();
    let s = b.sphere(1.0);
    let c = b.cylinder(0.4, 2.0, 0.05);
    let r = b.rotate(&c, Vec3::X, 0.7);
    b.smooth_union(&s, &r, 0.15)
  };
  let (src1, name1, _) = emit_source(&build());
  let (src2, name2, _) = emit_source(&build());
  assert_eq!(name1, name2);
  assert_eq!(src1, src2);
}

#[test]
fn test_shared_subexpression_emitted_once() {
  let mut b = Builder::new();
  let s = b.sphere(1.0);
  let left = b.translate(&s, Vec3::new(-1.0, 0.0, 0.0));
  let right = b.translate(&s, Vec3::new(1.0, 0.0, 0.0));
  let u = b.union(&left, &right);

  let (src, _, _) = emit_source(&u);
  let defs = src.matches(&format!("float {}(", s.name())).count();
  assert_eq!(defs, 1, "shared sphere body must be emitted exactly once");
}

#[test]
fn test_structurally_identical_nodes_share_a_body() {
  let mut b = Builder::new();
  // Two separately constructed but identical spheres.
  let s1 = b.sphere(1.0);
  let s2 = b.sphere(1.0);
  let u = b.union(&s1, &s2);

  let (src, _, _) = emit_source(&u);
  let defs = src.matches("float sphere_").count();
  assert_eq!(defs, 1);
}

#[test]
fn test_program_shape() {
  let mut b = Builder::new();
  let s = b.sphere(1.0);
  let (src, name, objects) = emit_source(&s);

  assert!(src.starts_with("#version 430\n"));
  assert!(src.contains("layout(local_size_x = 64) in;"));
  assert!(src.contains("binding = 0) readonly buffer InPositions"));
  assert!(src.contains("binding = 1) writeonly buffer OutDistances"));
  assert!(src.contains(&format!("out_distances[gid] = {name}(in_positions[gid].xyz);")));
  assert!(objects.is_empty());
}

#[test]
fn test_union_array_emits_shader_object() {
  let mut b = Builder::new();
  let s = b.sphere(0.5);
  let offsets: Vec<Vec3> = (0..10).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
  let u = b.union_array(&s, &offsets);

  let (src, _, objects) = emit_source(&u);
  assert_eq!(objects.len(), 1);
  let obj = &objects[0];
  assert_eq!(obj.binding, 2);
  // vec4-padded offsets.
  assert_eq!(obj.data.len(), 10 * 16);
  assert!(src.contains(&obj.declaration));
  // One loop instead of ten emitted calls.
  assert!(src.contains("for (int i = 1; i < 10; ++i)"));
}

#[test]
fn test_polygon_emits_vertex_object() {
  let mut b = Builder::new();
  let poly = b.polygon(&[
    Vec2::new(-1.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(0.0, 1.0),
  ]);
  let solid = b.extrude(&poly, 1.0);

  let (src, _, objects) = emit_source(&solid);
  assert_eq!(objects.len(), 1);
  assert_eq!(objects[0].data.len(), 3 * 8);
  assert!(src.contains("vec2 ssbo2[];"));
}

#[test]
fn test_object_bindings_are_sequential() {
  let mut b = Builder::new();
  let poly = b.polygon(&[
    Vec2::new(-1.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(0.0, 1.0),
  ]);
  let solid = b.extrude(&poly, 1.0);
  let spread = b.union_array(&solid, &[Vec3::ZERO, Vec3::X]);

  let (_, _, objects) = emit_source(&spread);
  let bindings: Vec<u32> = objects.iter().map(|o| o.binding).collect();
  assert_eq!(bindings, vec![2, 3]);
}

#[test]
fn test_kind_boundary_emits_2d_body_first() {
  let mut b = Builder::new();
  let c = b.circle(1.0);
  let e = b.extrude(&c, 2.0);

  let (src, _, _) = emit_source(&e);
  let circle_at = src.find("float circle_").expect("circle body present");
  let extrude_at = src.find("float extrude_").expect("extrude body present");
  assert!(circle_at < extrude_at, "child body must precede the parent");
  assert!(src.contains("(vec2 p)"), "2D bodies take vec2");
}

#[test]
fn test_shortened_names_appear_in_source() {
  let mut b = Builder::new();
  let s = b.sphere(1.0);
  let c = b.cuboid(1.0, 1.0, 1.0, 0.0);
  let u = b.union(&s, &c);
  shorten_names_3d(&u, 4);

  let (src, name, _) = emit_source(&u);
  assert_eq!(name, u.name());
  assert!(name.len() <= 4);
  assert!(src.contains(&format!("float {name}(vec3 p)")));
  assert!(!src.contains("sphere_"), "long default names are gone");
}
