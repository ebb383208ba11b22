//! Procedural geometry
//!
//! Built-in shapes for the skybox, the axis gizmo and the light marker, and
//! stand-ins for models whose files are missing.

use crate::foundation::math::constants::{PI, TAU};
use crate::scene::{Geometry, SecondaryStream};

/// Inward-facing unit cube drawn as the skybox, 36 vertices
pub fn skybox_cube() -> Geometry {
    #[rustfmt::skip]
    let positions = vec![
        -1.0,  1.0, -1.0,  -1.0, -1.0, -1.0,   1.0, -1.0, -1.0,
         1.0, -1.0, -1.0,   1.0,  1.0, -1.0,  -1.0,  1.0, -1.0,

        -1.0, -1.0,  1.0,  -1.0, -1.0, -1.0,  -1.0,  1.0, -1.0,
        -1.0,  1.0, -1.0,  -1.0,  1.0,  1.0,  -1.0, -1.0,  1.0,

         1.0, -1.0, -1.0,   1.0, -1.0,  1.0,   1.0,  1.0,  1.0,
         1.0,  1.0,  1.0,   1.0,  1.0, -1.0,   1.0, -1.0, -1.0,

        -1.0, -1.0,  1.0,  -1.0,  1.0,  1.0,   1.0,  1.0,  1.0,
         1.0,  1.0,  1.0,   1.0, -1.0,  1.0,  -1.0, -1.0,  1.0,

        -1.0,  1.0, -1.0,   1.0,  1.0, -1.0,   1.0,  1.0,  1.0,
         1.0,  1.0,  1.0,  -1.0,  1.0,  1.0,  -1.0,  1.0, -1.0,

        -1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0, -1.0,
         1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0,  1.0,
    ];
    Geometry::from_positions(positions)
}

/// Three colored axis lines of half-length `extent` (X red, Y green, Z blue)
pub fn axis_lines(extent: f32) -> Geometry {
    #[rustfmt::skip]
    let positions = vec![
        extent, 0.0, 0.0,  -extent, 0.0, 0.0,
        0.0, extent, 0.0,   0.0, -extent, 0.0,
        0.0, 0.0, extent,   0.0, 0.0, -extent,
    ];
    #[rustfmt::skip]
    let colors = vec![
        1.0, 0.0, 0.0,  1.0, 0.0, 0.0,
        0.0, 1.0, 0.0,  0.0, 1.0, 0.0,
        0.0, 0.0, 1.0,  0.0, 0.0, 1.0,
    ];
    Geometry {
        positions,
        secondary: Some(SecondaryStream::Color(colors)),
        normals: None,
    }
}

/// A single vertex at the origin
pub fn point() -> Geometry {
    Geometry::from_positions(vec![0.0, 0.0, 0.0])
}

/// Outward-facing cube of half-size `half` with UVs and normals
pub fn cube(half: f32) -> Geometry {
    // (normal, tangent u, tangent v) per face
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    let corners = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0), (1.0, 1.0), (0.0, 1.0)];

    let mut geometry = Geometry::default();
    let mut uvs = Vec::with_capacity(36 * 2);
    let mut normals = Vec::with_capacity(36 * 3);
    for (normal, u_axis, v_axis) in faces {
        for (u, v) in corners {
            let (su, sv) = (u * 2.0 - 1.0, v * 2.0 - 1.0);
            for axis in 0..3 {
                geometry.positions.push((normal[axis] + u_axis[axis] * su + v_axis[axis] * sv) * half);
            }
            uvs.extend_from_slice(&[u, v]);
            normals.extend_from_slice(&normal);
        }
    }
    geometry.secondary = Some(SecondaryStream::Uv(uvs));
    geometry.normals = Some(normals);
    geometry
}

/// UV sphere of `radius` as a triangle list with UVs and normals
pub fn uv_sphere(radius: f32, stacks: u32, slices: u32) -> Geometry {
    let stacks = stacks.max(2);
    let slices = slices.max(3);
    let vertex_at = |stack: u32, slice: u32| {
        let v = stack as f32 / stacks as f32;
        let u = slice as f32 / slices as f32;
        let (theta, phi) = (v * PI, u * TAU);
        let normal = [theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()];
        (normal, [u, 1.0 - v])
    };

    let mut geometry = Geometry::default();
    let mut uvs = Vec::new();
    let mut normals = Vec::new();
    for stack in 0..stacks {
        for slice in 0..slices {
            let quad = [
                vertex_at(stack, slice),
                vertex_at(stack + 1, slice),
                vertex_at(stack + 1, slice + 1),
                vertex_at(stack, slice),
                vertex_at(stack + 1, slice + 1),
                vertex_at(stack, slice + 1),
            ];
            for (normal, uv) in quad {
                geometry.positions.extend(normal.iter().map(|n| n * radius));
                normals.extend_from_slice(&normal);
                uvs.extend_from_slice(&uv);
            }
        }
    }
    geometry.secondary = Some(SecondaryStream::Uv(uvs));
    geometry.normals = Some(normals);
    geometry
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_skybox_has_twelve_triangles() {
        assert_eq!(skybox_cube().vertex_count(), 36);
    }

    #[test]
    fn test_axis_colors_match_vertices() {
        let axis = axis_lines(100.0);
        assert_eq!(axis.vertex_count(), 6);
        assert_eq!(axis.secondary.map(|s| s.data().len()), Some(18));
    }

    #[test]
    fn test_cube_vertices_on_surface() {
        let cube = cube(2.0);
        assert_eq!(cube.vertex_count(), 36);
        for vertex in cube.positions.chunks_exact(3) {
            let extent = vertex.iter().fold(0.0_f32, |acc, v| acc.max(v.abs()));
            assert_relative_eq!(extent, 2.0);
        }
    }

    #[test]
    fn test_sphere_vertices_at_radius() {
        let sphere = uv_sphere(3.0, 8, 12);
        assert_eq!(sphere.vertex_count(), 8 * 12 * 6);
        for vertex in sphere.positions.chunks_exact(3) {
            let length = (vertex[0].powi(2) + vertex[1].powi(2) + vertex[2].powi(2)).sqrt();
            assert_relative_eq!(length, 3.0, epsilon = 1e-4);
        }
    }
}
