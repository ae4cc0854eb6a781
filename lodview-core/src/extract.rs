//! Resolves scene accessors against the binary chunk into flat geometry.

use gltf::json::accessor::ComponentType;
use gltf::json::mesh::Semantic;
use tracing::{debug, warn};

use crate::container::Container;
use crate::error::DataError;
use crate::geometry::{Color, Face, RawMesh};
use crate::scene::{self, Accessor, Primitive, SceneDescription};

/// A validated, strided window onto the binary chunk
struct AccessorView<'a> {
    data: &'a [u8],
    stride: usize,
    count: usize,
    component_type: ComponentType,
    components: usize,
}

impl<'a> AccessorView<'a> {
    fn element(&self, index: usize) -> &'a [u8] {
        let start = index * self.stride;
        &self.data[start..]
    }
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_bits(read_u32(bytes, at))
}

/// Walks a scene's meshes and pulls out triangle geometry
pub struct MeshExtractor<'a> {
    scene: &'a SceneDescription,
    binary: &'a [u8],
}

impl<'a> MeshExtractor<'a> {
    pub fn new(scene: &'a SceneDescription, binary: &'a [u8]) -> Self {
        Self { scene, binary }
    }

    fn accessor(&self, index: usize) -> Result<&'a Accessor, DataError> {
        self.scene
            .accessors
            .get(index)
            .ok_or_else(|| DataError::InvalidReference(format!("accessor {index} does not exist")))
    }

    /// Resolve an accessor to its bytes, checking type, stride and bounds
    fn view(&self, index: usize) -> Result<AccessorView<'a>, DataError> {
        let accessor = self.accessor(index)?;

        let component_type = scene::component_type(accessor).ok_or_else(|| {
            DataError::UnsupportedFormat(format!("accessor {index} has an unknown component type"))
        })?;
        let components = scene::components(accessor).ok_or_else(|| {
            DataError::UnsupportedFormat(format!("accessor {index} has an unknown type"))
        })?;
        if accessor.sparse.is_some() {
            return Err(DataError::UnsupportedFormat(format!(
                "accessor {index} is sparse"
            )));
        }
        let element = component_type.size() * components;

        let view_index = accessor
            .buffer_view
            .ok_or_else(|| {
                DataError::InvalidReference(format!("accessor {index} has no bufferView"))
            })?
            .value();
        let view = self.scene.buffer_views.get(view_index).ok_or_else(|| {
            DataError::InvalidReference(format!("bufferView {view_index} does not exist"))
        })?;

        let buffer_index = view.buffer.value();
        let buffer = self.scene.buffers.get(buffer_index).ok_or_else(|| {
            DataError::InvalidReference(format!(
                "bufferView {view_index} uses buffer {buffer_index}, which does not exist"
            ))
        })?;
        if buffer_index != 0 {
            return Err(DataError::InvalidReference(format!(
                "bufferView {view_index} uses buffer {buffer_index}, only the binary chunk is supported"
            )));
        }
        if let Some(uri) = buffer.uri.as_deref() {
            return Err(DataError::UnsupportedFormat(format!(
                "external buffer '{uri}'"
            )));
        }

        let view_offset = view.byte_offset.map_or(0, scene::size);
        let view_end = view_offset.saturating_add(scene::size(view.byte_length));
        if view_end > self.binary.len() {
            return Err(DataError::OutOfBounds {
                accessor: index,
                needed: view_end,
                available: self.binary.len(),
            });
        }
        let view_bytes = &self.binary[view_offset..view_end];

        let stride = match view.byte_stride.map(|stride| stride.0) {
            Some(stride) if stride > element => stride,
            Some(stride) if stride != 0 && stride < element => {
                return Err(DataError::InvalidStride {
                    accessor: index,
                    stride,
                    element,
                })
            }
            _ => element,
        };

        let byte_offset = accessor.byte_offset.map_or(0, scene::size);
        let count = scene::size(accessor.count);
        let needed = if count == 0 {
            byte_offset
        } else {
            (count - 1)
                .saturating_mul(stride)
                .saturating_add(element)
                .saturating_add(byte_offset)
        };
        if needed > view_bytes.len() {
            return Err(DataError::OutOfBounds {
                accessor: index,
                needed,
                available: view_bytes.len(),
            });
        }

        Ok(AccessorView {
            data: &view_bytes[byte_offset..],
            stride,
            count,
            component_type,
            components,
        })
    }

    /// Read a float accessor with exactly `components` per element into a flat array
    fn read_floats(&self, index: usize, components: usize) -> Result<Vec<f32>, DataError> {
        let view = self.view(index)?;
        if view.component_type != ComponentType::F32 || view.components != components {
            return Err(DataError::UnsupportedFormat(format!(
                "accessor {index} must be {components} x F32, found {} x {:?}",
                view.components, view.component_type
            )));
        }

        let mut out = Vec::with_capacity(view.count * components);
        for i in 0..view.count {
            let element = view.element(i);
            for c in 0..components {
                out.push(read_f32(element, c * 4));
            }
        }
        Ok(out)
    }

    fn read_indices(&self, index: usize) -> Result<Vec<u32>, DataError> {
        let view = self.view(index)?;
        if view.components != 1 {
            return Err(DataError::UnsupportedFormat(format!(
                "index accessor {index} must be SCALAR"
            )));
        }

        let read: fn(&[u8]) -> u32 = match view.component_type {
            ComponentType::U8 => |b| b[0] as u32,
            ComponentType::U16 => |b| read_u16(b, 0) as u32,
            ComponentType::U32 => |b| read_u32(b, 0),
            other => {
                return Err(DataError::UnsupportedFormat(format!(
                    "index accessor {index} has component type {other:?}"
                )))
            }
        };

        Ok((0..view.count).map(|i| read(view.element(i))).collect())
    }

    fn base_color(&self, primitive: &Primitive) -> Result<Color, DataError> {
        let Some(index) = primitive.material.map(|material| material.value()) else {
            return Ok(Color::MID_GREY);
        };
        let material = self.scene.materials.get(index).ok_or_else(|| {
            DataError::InvalidReference(format!("material {index} does not exist"))
        })?;
        Ok(Color::from_factor(scene::base_color_factor(material)))
    }

    /// Append one primitive's geometry to `mesh`
    fn extract_primitive(&self, primitive: &Primitive, mesh: &mut RawMesh) -> Result<(), DataError> {
        let position = scene::attribute(primitive, Semantic::Positions)
            .ok_or(DataError::MissingAttribute("POSITION"))?;
        let positions = self.read_floats(position, 3)?;
        let vertex_count = positions.len() / 3;

        let normals = match scene::attribute(primitive, Semantic::Normals) {
            Some(index) => {
                let normals = self.read_floats(index, 3)?;
                check_count("NORMAL", vertex_count, normals.len() / 3)?;
                normals
            }
            None => vec![0.0; vertex_count * 3],
        };
        let uvs = match scene::attribute(primitive, Semantic::TexCoords(0)) {
            Some(index) => {
                let uvs = self.read_floats(index, 2)?;
                check_count("TEXCOORD_0", vertex_count, uvs.len() / 2)?;
                uvs
            }
            None => vec![0.0; vertex_count * 2],
        };

        let indices = match primitive.indices {
            Some(index) => self.read_indices(index.value())?,
            None => (0..vertex_count as u32).collect(),
        };
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(DataError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        if indices.len() % 3 != 0 {
            warn!(
                "dropping {} trailing indices that do not form a triangle",
                indices.len() % 3
            );
        }

        let color = self.base_color(primitive)?;
        let base = mesh.vertex_count() as u32;
        let before = mesh.faces.len();
        mesh.faces.extend(
            indices
                .chunks_exact(3)
                .map(|t| Face::new(base + t[0], base + t[1], base + t[2])),
        );
        let added = mesh.faces.len() - before;
        mesh.colors.extend(std::iter::repeat(color).take(added));

        mesh.positions.extend_from_slice(&positions);
        mesh.normals.extend_from_slice(&normals);
        mesh.uvs.extend_from_slice(&uvs);

        debug!(vertices = vertex_count, faces = added, "extracted primitive");
        Ok(())
    }

    /// Extract every triangle primitive of every mesh, in scene order
    pub fn extract(&self) -> Result<RawMesh, DataError> {
        let mut mesh = RawMesh::default();

        for (mesh_index, scene_mesh) in self.scene.meshes.iter().enumerate() {
            for (primitive_index, primitive) in scene_mesh.primitives.iter().enumerate() {
                if !scene::is_triangle_list(primitive) {
                    warn!(
                        mesh = mesh_index,
                        primitive = primitive_index,
                        mode = ?primitive.mode,
                        "skipping non-triangle primitive"
                    );
                    continue;
                }
                self.extract_primitive(primitive, &mut mesh)?;
            }
        }

        if mesh.faces.is_empty() {
            return Err(DataError::NoGeometry);
        }

        debug!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "extracted mesh"
        );
        Ok(mesh)
    }
}

fn check_count(attribute: &'static str, expected: usize, found: usize) -> Result<(), DataError> {
    if expected == found {
        Ok(())
    } else {
        Err(DataError::CountMismatch {
            attribute,
            expected,
            found,
        })
    }
}

/// Extract the geometry referenced by a decoded container
pub fn extract(container: &Container<'_>) -> Result<RawMesh, DataError> {
    MeshExtractor::new(&container.scene, container.binary).extract()
}
