//! Geometry primitives shared by the load pipeline and the rasterizer

use nalgebra::{Point3, Vector2, Vector3};

use crate::error::DataError;

/// A 3D vertex with position, normal and texture coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position: Point3::new(position[0], position[1], position[2]),
            normal: Vector3::new(normal[0], normal[1], normal[2]),
            uv: Vector2::new(uv[0], uv[1]),
        }
    }
}

/// A triangle referencing three vertices by index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Face {
    pub v1: u32,
    pub v2: u32,
    pub v3: u32,
}

impl Face {
    pub fn new(v1: u32, v2: u32, v3: u32) -> Self {
        Self { v1, v2, v3 }
    }

    pub fn indices(&self) -> [usize; 3] {
        [self.v1 as usize, self.v2 as usize, self.v3 as usize]
    }

    pub(crate) fn max_index(&self) -> u32 {
        self.v1.max(self.v2).max(self.v3)
    }
}

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const MID_GREY: Color = Color::rgb(128, 128, 128);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from linear float channels as stored in a material's base color factor.
    pub fn from_factor(factor: [f32; 4]) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self {
            r: channel(factor[0]),
            g: channel(factor[1]),
            b: channel(factor[2]),
            a: channel(factor[3]),
        }
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    /// Perceived luminance in [0, 1]
    pub fn luminance(&self) -> f32 {
        (0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32) / 255.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::MID_GREY
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl BoundingBox {
    /// Compute the box around a set of vertices. An empty set yields a
    /// degenerate box at the origin.
    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        let Some(first) = vertices.first() else {
            return Self {
                min: Point3::origin(),
                max: Point3::origin(),
            };
        };

        let mut min = first.position;
        let mut max = first.position;
        for vertex in &vertices[1..] {
            min = min.inf(&vertex.position);
            max = max.sup(&vertex.position);
        }
        Self { min, max }
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Largest half-extent along any axis
    pub fn radius(&self) -> f32 {
        self.extent().max() * 0.5
    }
}

/// Geometry as read from a container, before level-of-detail reduction.
///
/// Attributes are flat arrays: three floats per vertex for positions and
/// normals, two for texture coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMesh {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
    pub faces: Vec<Face>,
    pub colors: Vec<Color>,
}

impl RawMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Assemble typed vertices from the flat attribute arrays.
    pub fn vertices(&self) -> Vec<Vertex> {
        let count = self.vertex_count();
        (0..count)
            .map(|i| {
                let p = &self.positions[i * 3..i * 3 + 3];
                let n = self.normals.get(i * 3..i * 3 + 3).unwrap_or(&[0.0f32; 3][..]);
                let t = self.uvs.get(i * 2..i * 2 + 2).unwrap_or(&[0.0f32; 2][..]);
                Vertex::new([p[0], p[1], p[2]], [n[0], n[1], n[2]], [t[0], t[1]])
            })
            .collect()
    }
}

/// A finished, immutable mesh ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    name: String,
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
    colors: Vec<Color>,
    bounds: BoundingBox,
    original_vertex_count: usize,
    original_face_count: usize,
}

impl ModelAsset {
    /// Build a model, checking that every face index addresses a vertex and
    /// that there is exactly one color per face.
    pub fn from_parts(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        faces: Vec<Face>,
        colors: Vec<Color>,
        original_vertex_count: usize,
        original_face_count: usize,
    ) -> Result<Self, DataError> {
        if colors.len() != faces.len() {
            return Err(DataError::ColorMismatch {
                faces: faces.len(),
                colors: colors.len(),
            });
        }
        if let Some(face) = faces
            .iter()
            .find(|face| face.max_index() as usize >= vertices.len())
        {
            return Err(DataError::IndexOutOfRange {
                index: face.max_index(),
                vertex_count: vertices.len(),
            });
        }

        Ok(Self::assemble(
            name.into(),
            vertices,
            faces,
            colors,
            original_vertex_count,
            original_face_count,
        ))
    }

    fn assemble(
        name: String,
        vertices: Vec<Vertex>,
        faces: Vec<Face>,
        colors: Vec<Color>,
        original_vertex_count: usize,
        original_face_count: usize,
    ) -> Self {
        let bounds = BoundingBox::from_vertices(&vertices);
        Self {
            name,
            vertices,
            faces,
            colors,
            bounds,
            original_vertex_count,
            original_face_count,
        }
    }

    /// Skips index and color checks so render-time validation can be tested
    #[cfg(test)]
    pub(crate) fn unchecked(vertices: Vec<Vertex>, faces: Vec<Face>) -> Self {
        let colors = vec![Color::MID_GREY; faces.len()];
        let (vertex_count, face_count) = (vertices.len(), faces.len());
        Self::assemble("unchecked".into(), vertices, faces, colors, vertex_count, face_count)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn original_vertex_count(&self) -> usize {
        self.original_vertex_count
    }

    pub fn original_face_count(&self) -> usize {
        self.original_face_count
    }
}
