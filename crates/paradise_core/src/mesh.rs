use std::fmt;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub texcoord: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Half the diagonal of the box after scaling each axis by `axis_filter`.
    pub fn radius(&self, axis_filter: Vec3) -> f32 {
        (self.extent() * axis_filter).length() * 0.5
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MeshError {
    Empty,
    PositionStride(usize),
    AttributeCount {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    IndexOutOfRange { index: u32, vertex_count: usize },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "mesh has no vertices"),
            Self::PositionStride(len) => {
                write!(f, "position array length {len} is not a multiple of 3")
            }
            Self::AttributeCount {
                attribute,
                expected,
                actual,
            } => write!(f, "{attribute} array has {actual} values, expected {expected}"),
            Self::IndexOutOfRange {
                index,
                vertex_count,
            } => write!(f, "index {index} is out of range for {vertex_count} vertices"),
        }
    }
}

impl std::error::Error for MeshError {}

/// Decoded triangle-list geometry, resident in memory before upload.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Option<Vec<u32>>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Option<Vec<u32>>) -> Result<Self, MeshError> {
        if vertices.is_empty() {
            return Err(MeshError::Empty);
        }
        if let Some(indices) = &indices {
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
                return Err(MeshError::IndexOutOfRange {
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }
        Ok(Self { vertices, indices })
    }

    /// Builds a mesh from flat attribute arrays. Normals and texcoords may be empty.
    pub fn from_arrays(
        positions: &[f32],
        normals: &[f32],
        texcoords: &[f32],
        indices: Option<Vec<u32>>,
    ) -> Result<Self, MeshError> {
        if positions.len() % 3 != 0 {
            return Err(MeshError::PositionStride(positions.len()));
        }
        let count = positions.len() / 3;
        if !normals.is_empty() && normals.len() != count * 3 {
            return Err(MeshError::AttributeCount {
                attribute: "normal",
                expected: count * 3,
                actual: normals.len(),
            });
        }
        if !texcoords.is_empty() && texcoords.len() != count * 2 {
            return Err(MeshError::AttributeCount {
                attribute: "texcoord",
                expected: count * 2,
                actual: texcoords.len(),
            });
        }

        let vertices = (0..count)
            .map(|i| Vertex {
                position: [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
                normal: if normals.is_empty() {
                    [0.0, 0.0, 1.0]
                } else {
                    [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]]
                },
                texcoord: if texcoords.is_empty() {
                    [0.0, 0.0]
                } else {
                    [texcoords[i * 2], texcoords[i * 2 + 1]]
                },
            })
            .collect();

        Self::new(vertices, indices)
    }

    /// Quad in the local XY plane facing +Z, centred on the origin.
    pub fn quad(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let normal = [0.0, 0.0, 1.0];
        let vertices = vec![
            Vertex {
                position: [-hw, -hh, 0.0],
                normal,
                texcoord: [0.0, 1.0],
            },
            Vertex {
                position: [hw, -hh, 0.0],
                normal,
                texcoord: [1.0, 1.0],
            },
            Vertex {
                position: [hw, hh, 0.0],
                normal,
                texcoord: [1.0, 0.0],
            },
            Vertex {
                position: [-hw, hh, 0.0],
                normal,
                texcoord: [0.0, 0.0],
            },
        ];
        Self {
            vertices,
            indices: Some(vec![0, 1, 2, 0, 2, 3]),
        }
    }

    pub fn cube(size: f32) -> Self {
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];

        let half = size * 0.5;
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, right, up) in FACES {
            let (n, r, u) = (Vec3::from(normal), Vec3::from(right), Vec3::from(up));
            let base = vertices.len() as u32;
            for (x, y, texcoord) in [
                (-1.0, -1.0, [0.0, 1.0]),
                (1.0, -1.0, [1.0, 1.0]),
                (1.0, 1.0, [1.0, 0.0]),
                (-1.0, 1.0, [0.0, 0.0]),
            ] {
                let position = (n + r * x + u * y) * half;
                vertices.push(Vertex {
                    position: position.to_array(),
                    normal,
                    texcoord,
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            vertices,
            indices: Some(indices),
        }
    }

    pub fn draw_count(&self) -> u32 {
        match &self.indices {
            Some(indices) => indices.len() as u32,
            None => self.vertices.len() as u32,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for vertex in &self.vertices {
            let p = Vec3::from(vertex.position);
            min = min.min(p);
            max = max.max(p);
        }
        if self.vertices.is_empty() {
            min = Vec3::ZERO;
            max = Vec3::ZERO;
        }
        BoundingBox { min, max }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::{MeshData, MeshError};

    #[test]
    fn quad_bounds_lie_in_xy_plane() {
        let quad = MeshData::quad(4.0, 2.0);
        let bounds = quad.bounding_box();
        assert_eq!(bounds.min, Vec3::new(-2.0, -1.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(2.0, 1.0, 0.0));
        assert_eq!(quad.draw_count(), 6);

        let radius = bounds.radius(Vec3::new(1.0, 1.0, 0.0));
        assert!((radius - 20.0_f32.sqrt() * 0.5).abs() < 1.0e-6);
    }

    #[test]
    fn cube_faces_point_outward() {
        let cube = MeshData::cube(2.0);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.draw_count(), 36);
        for vertex in &cube.vertices {
            let p = Vec3::from(vertex.position);
            let n = Vec3::from(vertex.normal);
            assert!((p.dot(n) - 1.0).abs() < 1.0e-6);
        }
        assert_eq!(cube.bounding_box().extent(), Vec3::splat(2.0));
    }

    #[test]
    fn from_arrays_validates_layout() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let mesh = MeshData::from_arrays(&positions, &[], &[], None).unwrap();
        assert_eq!(mesh.draw_count(), 3);
        assert_eq!(mesh.vertices[1].position, [1.0, 0.0, 0.0]);

        assert_eq!(
            MeshData::from_arrays(&positions[..4], &[], &[], None),
            Err(MeshError::PositionStride(4))
        );
        assert!(matches!(
            MeshData::from_arrays(&positions, &[0.0; 6], &[], None),
            Err(MeshError::AttributeCount { attribute: "normal", .. })
        ));
        assert_eq!(
            MeshData::from_arrays(&positions, &[], &[], Some(vec![0, 1, 3])),
            Err(MeshError::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            })
        );
        assert_eq!(MeshData::from_arrays(&[], &[], &[], None), Err(MeshError::Empty));
    }
}
