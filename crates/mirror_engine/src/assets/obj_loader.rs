//! OBJ file loader for 3D models
//!
//! Faces are fan-triangulated and de-indexed into flat arrays so entities can
//! be drawn with a plain `draw_arrays`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::assets::{AssetError, AssetResult};
use crate::scene::{Geometry, SecondaryStream};

/// Loader for Wavefront OBJ geometry
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file
    pub fn load_obj<P: AsRef<Path>>(path: P) -> AssetResult<Geometry> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound(path.to_path_buf()),
            _ => AssetError::Io(e),
        })?;
        let geometry = Self::parse(BufReader::new(file), path)?;
        log::debug!("Loaded {} vertices from {:?}", geometry.vertex_count(), path);
        Ok(geometry)
    }

    /// Parse OBJ text; `origin` only labels errors
    pub fn parse<R: BufRead>(reader: R, origin: &Path) -> AssetResult<Geometry> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();

        let mut out_positions = Vec::new();
        let mut out_uvs = Vec::new();
        let mut out_normals = Vec::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parse_error = |message: String| AssetError::Parse {
                path: origin.to_path_buf(),
                line: number + 1,
                message,
            };

            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else { continue };
            let rest: Vec<&str> = parts.collect();

            match keyword {
                "v" => positions.push(parse_floats::<3>(&rest).map_err(parse_error)?),
                "vn" => normals.push(parse_floats::<3>(&rest).map_err(parse_error)?),
                "vt" => tex_coords.push(parse_floats::<2>(&rest).map_err(parse_error)?),
                "f" => {
                    if rest.len() < 3 {
                        return Err(parse_error(format!("face needs 3 vertices, got {}", rest.len())));
                    }

                    let mut corners = Vec::with_capacity(rest.len());
                    for token in &rest {
                        let mut indices = token.split('/');
                        let position = indices
                            .next()
                            .and_then(|i| resolve_index(i, positions.len()))
                            .and_then(|i| positions.get(i))
                            .ok_or_else(|| parse_error(format!("bad position index in '{token}'")))?;
                        let tex_coord = indices
                            .next()
                            .and_then(|i| resolve_index(i, tex_coords.len()))
                            .and_then(|i| tex_coords.get(i))
                            .unwrap_or(&[0.0, 0.0]);
                        let normal = indices
                            .next()
                            .and_then(|i| resolve_index(i, normals.len()))
                            .and_then(|i| normals.get(i))
                            .unwrap_or(&[0.0, 1.0, 0.0]);
                        corners.push((*position, *tex_coord, *normal));
                    }

                    // fan triangulation
                    for i in 1..corners.len() - 1 {
                        for (position, tex_coord, normal) in [corners[0], corners[i], corners[i + 1]] {
                            out_positions.extend_from_slice(&position);
                            out_uvs.extend_from_slice(&tex_coord);
                            out_normals.extend_from_slice(&normal);
                        }
                    }
                }
                _ => {}
            }
        }

        if out_positions.is_empty() {
            return Err(AssetError::InvalidData(format!("no faces found in {}", origin.display())));
        }

        Ok(Geometry {
            positions: out_positions,
            secondary: (!tex_coords.is_empty()).then_some(SecondaryStream::Uv(out_uvs)),
            normals: (!normals.is_empty()).then_some(out_normals),
        })
    }
}

fn parse_floats<const N: usize>(parts: &[&str]) -> Result<[f32; N], String> {
    if parts.len() < N {
        return Err(format!("expected {N} components, got {}", parts.len()));
    }
    let mut values = [0.0; N];
    for (value, part) in values.iter_mut().zip(parts) {
        *value = part.parse().map_err(|_| format!("invalid number '{part}'"))?;
    }
    Ok(values)
}

/// 1-based or negative (relative) OBJ index to a 0-based one
fn resolve_index(token: &str, count: usize) -> Option<usize> {
    if token.is_empty() {
        return None;
    }
    let index: i64 = token.parse().ok()?;
    match index {
        0 => None,
        i if i > 0 => Some(i as usize - 1),
        i => count.checked_sub(i.unsigned_abs() as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let geometry = ObjLoader::parse(Cursor::new(QUAD), Path::new("quad.obj")).unwrap();
        assert_eq!(geometry.vertex_count(), 6);
        assert_eq!(&geometry.positions[9..12], &[0.0, 0.0, 0.0]);
        assert_eq!(&geometry.positions[15..18], &[0.0, 1.0, 0.0]);

        match &geometry.secondary {
            Some(SecondaryStream::Uv(uvs)) => assert_eq!(uvs.len(), 12),
            other => panic!("expected uv stream, got {other:?}"),
        }
        assert_eq!(geometry.normals.as_ref().map(Vec::len), Some(18));
    }

    #[test]
    fn test_negative_indices() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let geometry = ObjLoader::parse(Cursor::new(source), Path::new("tri.obj")).unwrap();
        assert_eq!(geometry.positions, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert!(geometry.secondary.is_none());
        assert!(geometry.normals.is_none());
    }

    #[test]
    fn test_out_of_range_index_reports_line() {
        let source = "v 0 0 0\nf 1 2 3\n";
        let error = ObjLoader::parse(Cursor::new(source), Path::new("bad.obj")).unwrap_err();
        assert!(matches!(error, AssetError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_missing_file() {
        let error = ObjLoader::load_obj("definitely/not/here.obj").unwrap_err();
        assert!(matches!(error, AssetError::NotFound(_)));
    }
}
