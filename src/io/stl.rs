//! Binary STL over arbitrary byte sinks and sources.
//!
//! 80-byte header, little-endian u32 triangle count, then per triangle:
//! facet normal, three vertices (f32 each) and a zero attribute word.
//! No filesystem coupling; callers bring their own `Read`/`Write`.

use std::io::{self, Read, Write};

use glam::Vec3;

use crate::mesh::Triangle;

fn header() -> [u8; 80] {
  let mut header = [0u8; 80];
  let tag = b"sdfkit binary stl";
  header[..tag.len()].copy_from_slice(tag);
  header
}

fn write_vec3(w: &mut impl Write, v: Vec3) -> io::Result<()> {
  w.write_all(&v.x.to_le_bytes())?;
  w.write_all(&v.y.to_le_bytes())?;
  w.write_all(&v.z.to_le_bytes())
}

fn read_vec3(r: &mut impl Read) -> io::Result<Vec3> {
  let mut buf = [0u8; 12];
  r.read_exact(&mut buf)?;
  Ok(Vec3::new(
    f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
    f32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
    f32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
  ))
}

/// Write `triangles` as binary STL. Facet normals are recomputed from
/// the winding.
pub fn write_stl(w: &mut impl Write, triangles: &[Triangle]) -> io::Result<()> {
  if triangles.len() > u32::MAX as usize {
    return Err(io::Error::new(
      io::ErrorKind::InvalidInput,
      "too many triangles for STL",
    ));
  }
  w.write_all(&header())?;
  w.write_all(&(triangles.len() as u32).to_le_bytes())?;
  for tri in triangles {
    write_vec3(w, tri.normal().normalize_or_zero())?;
    write_vec3(w, tri.a)?;
    write_vec3(w, tri.b)?;
    write_vec3(w, tri.c)?;
    w.write_all(&0u16.to_le_bytes())?;
  }
  Ok(())
}

/// Read a binary STL stream back into triangles. Stored facet normals
/// are discarded (the winding carries the orientation).
pub fn read_stl(r: &mut impl Read) -> io::Result<Vec<Triangle>> {
  let mut header = [0u8; 80];
  r.read_exact(&mut header)?;
  let mut count_bytes = [0u8; 4];
  r.read_exact(&mut count_bytes)?;
  let count = u32::from_le_bytes(count_bytes) as usize;

  let mut out = Vec::with_capacity(count.min(1 << 20));
  for _ in 0..count {
    let _normal = read_vec3(r)?;
    let a = read_vec3(r)?;
    let b = read_vec3(r)?;
    let c = read_vec3(r)?;
    let mut attr = [0u8; 2];
    r.read_exact(&mut attr)?;
    out.push(Triangle::new(a, b, c));
  }
  Ok(out)
}
