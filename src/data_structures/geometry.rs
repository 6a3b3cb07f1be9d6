//! Tessellation of the primitive shapes used by the scene.
//!
//! All generators emit counter-clockwise front faces, unit normals and
//! texture coordinates in wgpu's convention (v grows downwards). Tangents
//! and bitangents are derived from the uv layout afterwards so normal maps
//! work on every shape.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Vector2, Vector3, Zero};

use crate::data_structures::model::ModelVertex;

/// Indexed triangle mesh on the CPU, ready to be uploaded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Texture coordinate with a bottom-up v (as authored) flipped to wgpu's
/// top-down rows.
fn uv(u: f32, v_up: f32) -> [f32; 2] {
    [u, 1.0 - v_up]
}

fn vertex(position: Vector3<f32>, normal: Vector3<f32>, tex_coords: [f32; 2]) -> ModelVertex {
    ModelVertex {
        position: position.into(),
        tex_coords,
        normal: normal.into(),
        tangent: [0.0; 3],
        bitangent: [0.0; 3],
    }
}

/// UV sphere centred on the origin.
///
/// The pole rows collapse into single points, so only one triangle per quad
/// is emitted there.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Geometry {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
    let mut grid = Vec::with_capacity((height_segments + 1) as usize);

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        // Centre the uv of the pole vertices between their neighbours.
        let u_offset = if iy == 0 {
            0.5 / width_segments as f32
        } else if iy == height_segments {
            -0.5 / width_segments as f32
        } else {
            0.0
        };

        let mut row = Vec::with_capacity((width_segments + 1) as usize);
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let (sin_theta, cos_theta) = (v * PI).sin_cos();
            let (sin_phi, cos_phi) = (u * 2.0 * PI).sin_cos();
            let position = Vector3::new(
                -radius * cos_phi * sin_theta,
                radius * cos_theta,
                radius * sin_phi * sin_theta,
            );
            let normal = if position.is_zero() {
                Vector3::unit_y()
            } else {
                position.normalize()
            };
            row.push(vertices.len() as u32);
            vertices.push(vertex(position, normal, uv(u + u_offset, 1.0 - v)));
        }
        grid.push(row);
    }

    let mut indices = Vec::new();
    for iy in 0..height_segments as usize {
        for ix in 0..width_segments as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments as usize - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    let mut geometry = Geometry { vertices, indices };
    compute_tangents(&mut geometry);
    geometry
}

/// Plane in the XY plane facing +Z.
pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Geometry {
    let grid_x = width_segments.max(1);
    let grid_y = height_segments.max(1);
    let grid_x1 = grid_x + 1;
    let segment_width = width / grid_x as f32;
    let segment_height = height / grid_y as f32;

    let mut vertices = Vec::with_capacity((grid_x1 * (grid_y + 1)) as usize);
    for iy in 0..=grid_y {
        let y = iy as f32 * segment_height - height / 2.0;
        for ix in 0..=grid_x {
            let x = ix as f32 * segment_width - width / 2.0;
            vertices.push(vertex(
                Vector3::new(x, -y, 0.0),
                Vector3::unit_z(),
                uv(ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32),
            ));
        }
    }

    let mut indices = Vec::with_capacity((grid_x * grid_y * 6) as usize);
    for iy in 0..grid_y {
        for ix in 0..grid_x {
            let a = ix + grid_x1 * iy;
            let b = ix + grid_x1 * (iy + 1);
            let c = (ix + 1) + grid_x1 * (iy + 1);
            let d = (ix + 1) + grid_x1 * iy;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    let mut geometry = Geometry { vertices, indices };
    compute_tangents(&mut geometry);
    geometry
}

/// Torus around the Z axis. `radius` is the distance from the centre to the
/// middle of the tube, `tube` the tube radius.
pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Geometry {
    let radial_segments = radial_segments.max(2);
    let tubular_segments = tubular_segments.max(3);

    let mut vertices =
        Vec::with_capacity(((radial_segments + 1) * (tubular_segments + 1)) as usize);
    for j in 0..=radial_segments {
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * 2.0 * PI;
            let v = j as f32 / radial_segments as f32 * 2.0 * PI;

            let position = Vector3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let centre = Vector3::new(radius * u.cos(), radius * u.sin(), 0.0);
            let normal = (position - centre).normalize();
            vertices.push(vertex(
                position,
                normal,
                uv(
                    i as f32 / tubular_segments as f32,
                    j as f32 / radial_segments as f32,
                ),
            ));
        }
    }

    let stride = tubular_segments + 1;
    let mut indices = Vec::with_capacity((radial_segments * tubular_segments * 6) as usize);
    for j in 1..=radial_segments {
        for i in 1..=tubular_segments {
            let a = stride * j + i - 1;
            let b = stride * (j - 1) + i - 1;
            let c = stride * (j - 1) + i;
            let d = stride * j + i;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    let mut geometry = Geometry { vertices, indices };
    compute_tangents(&mut geometry);
    geometry
}

/// Accumulate per-triangle tangents and bitangents into the vertices and
/// average them.
///
/// Triangles whose uvs are degenerate (zero area in uv space, e.g. at the
/// sphere poles) carry no direction and are skipped.
pub fn compute_tangents(geometry: &mut Geometry) {
    let vertices = &mut geometry.vertices;
    let mut triangles_included = vec![0u32; vertices.len()];

    for c in geometry.indices.chunks_exact(3) {
        let [i0, i1, i2] = [c[0] as usize, c[1] as usize, c[2] as usize];
        let v0 = vertices[i0];
        let v1 = vertices[i1];
        let v2 = vertices[i2];

        let pos0: Vector3<f32> = v0.position.into();
        let pos1: Vector3<f32> = v1.position.into();
        let pos2: Vector3<f32> = v2.position.into();

        let uv0: Vector2<f32> = v0.tex_coords.into();
        let uv1: Vector2<f32> = v1.tex_coords.into();
        let uv2: Vector2<f32> = v2.tex_coords.into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // Flipped to keep right-handed normal maps with top-down uv rows.
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        for i in [i0, i1, i2] {
            let v = &mut vertices[i];
            v.tangent = (tangent + Vector3::from(v.tangent)).into();
            v.bitangent = (bitangent + Vector3::from(v.bitangent)).into();
            triangles_included[i] += 1;
        }
    }

    for (v, n) in vertices.iter_mut().zip(triangles_included) {
        if n == 0 {
            continue;
        }
        let denom = 1.0 / n as f32;
        v.tangent = (Vector3::from(v.tangent) * denom).into();
        v.bitangent = (Vector3::from(v.bitangent) * denom).into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(geometry: &Geometry) {
        assert_eq!(geometry.indices.len() % 3, 0);
        let len = geometry.vertices.len() as u32;
        assert!(geometry.indices.iter().all(|&i| i < len));
        for v in &geometry.vertices {
            let n = Vector3::from(v.normal);
            assert!((n.magnitude() - 1.0).abs() < 1e-4, "normal {:?}", v.normal);
            // Sphere pole vertices are shifted by half a segment.
            assert!(v.tex_coords.iter().all(|c| (-0.01..=1.01).contains(c)));
            assert!(v.tangent.iter().chain(&v.bitangent).all(|c| c.is_finite()));
        }
    }

    #[test]
    fn sphere_counts_match_segments() {
        let sphere = sphere(0.5, 64, 64);
        assert_eq!(sphere.vertices.len(), 65 * 65);
        // Both pole rows lose one triangle per quad.
        assert_eq!(sphere.triangle_count(), 64 * 64 * 2 - 2 * 64);
        assert_well_formed(&sphere);
    }

    #[test]
    fn sphere_vertices_lie_on_the_radius() {
        let sphere = sphere(0.5, 16, 8);
        for v in &sphere.vertices {
            assert!((Vector3::from(v.position).magnitude() - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn plane_counts_and_extent() {
        let plane = plane(1.0, 1.0, 100, 100);
        assert_eq!(plane.vertices.len(), 101 * 101);
        assert_eq!(plane.indices.len(), 100 * 100 * 6);
        assert_well_formed(&plane);
        let xs = plane.vertices.iter().map(|v| v.position[0]);
        let (min, max) = xs.fold((f32::MAX, f32::MIN), |(lo, hi), x| (lo.min(x), hi.max(x)));
        assert!((min + 0.5).abs() < 1e-6 && (max - 0.5).abs() < 1e-6);
    }

    #[test]
    fn plane_triangles_face_the_normal() {
        let plane = plane(2.0, 2.0, 1, 1);
        for tri in plane.indices.chunks(3) {
            let p = |i: u32| Vector3::from(plane.vertices[i as usize].position);
            let face = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(face.z > 0.0, "clockwise triangle {tri:?}");
        }
    }

    #[test]
    fn plane_tangent_follows_u() {
        let plane = plane(1.0, 1.0, 2, 2);
        for v in &plane.vertices {
            let t = Vector3::from(v.tangent).normalize();
            assert!((t - Vector3::unit_x()).magnitude() < 1e-4);
        }
    }

    #[test]
    fn torus_counts_match_segments() {
        let torus = torus(0.3, 0.2, 64, 128);
        assert_eq!(torus.vertices.len(), 65 * 129);
        assert_eq!(torus.indices.len(), 64 * 128 * 6);
        assert_well_formed(&torus);
    }

    #[test]
    fn torus_vertices_stay_within_the_tube() {
        let torus = torus(0.3, 0.2, 8, 16);
        for v in &torus.vertices {
            let p = Vector3::from(v.position);
            let ring = Vector2::new(p.x, p.y).magnitude();
            let tube = Vector2::new(ring - 0.3, p.z).magnitude();
            assert!((tube - 0.2).abs() < 1e-5);
        }
    }
}
