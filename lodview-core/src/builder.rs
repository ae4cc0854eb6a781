//! Writes containers from in-memory geometry.
//!
//! Used by the terminal frontend for its built-in demo model and by tests
//! that need well-formed (or deliberately malformed) input bytes.

use gltf::json::accessor::ComponentType;
use serde_json::{json, Value};

use crate::container::{CHUNK_BIN, CHUNK_JSON, HEADER_LEN, MAGIC, VERSION};

/// Frame a JSON document and a binary payload as a container.
///
/// Chunks are padded to 4-byte alignment (JSON with spaces, BIN with zeros).
/// An empty `bin` produces a container without a BIN chunk.
pub fn encode_container(json: &[u8], bin: &[u8]) -> Vec<u8> {
    let json_len = json.len().next_multiple_of(4);
    let bin_len = bin.len().next_multiple_of(4);
    let mut total = HEADER_LEN + 8 + json_len;
    if !bin.is_empty() {
        total += 8 + bin_len;
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&MAGIC.to_le_bytes());
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());

    out.extend_from_slice(&(json_len as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(json);
    out.resize(out.len() + json_len - json.len(), b' ');

    if !bin.is_empty() {
        out.extend_from_slice(&(bin_len as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(bin);
        out.resize(out.len() + bin_len - bin.len(), 0);
    }

    out
}

/// Index storage width for built primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWidth {
    U16,
    U32,
}

/// Geometry for one primitive
#[derive(Debug, Clone, Default)]
pub struct PrimitiveData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub indices: Option<Vec<u32>>,
    pub base_color: Option<[f32; 4]>,
}

/// Accumulates primitives into a single-mesh container
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    name: String,
    index_width: IndexWidth,
    bin: Vec<u8>,
    accessors: Vec<Value>,
    buffer_views: Vec<Value>,
    materials: Vec<Value>,
    primitives: Vec<Value>,
}

impl ContainerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index_width: IndexWidth::U32,
            bin: Vec::new(),
            accessors: Vec::new(),
            buffer_views: Vec::new(),
            materials: Vec::new(),
            primitives: Vec::new(),
        }
    }

    pub fn index_width(mut self, width: IndexWidth) -> Self {
        self.index_width = width;
        self
    }

    /// Append raw bytes as a new bufferView and return its index
    fn push_view(&mut self, bytes: &[u8]) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        self.buffer_views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
        }));
        self.buffer_views.len() - 1
    }

    fn push_accessor(&mut self, view: usize, component_type: ComponentType, count: usize, kind: &str) -> usize {
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": component_type.as_gl_enum(),
            "count": count,
            "type": kind,
        }));
        self.accessors.len() - 1
    }

    fn push_floats<const N: usize>(&mut self, items: &[[f32; N]], kind: &str) -> usize {
        let bytes: Vec<u8> = items
            .iter()
            .flat_map(|item| item.iter().flat_map(|v| v.to_le_bytes()))
            .collect();
        let view = self.push_view(&bytes);
        self.push_accessor(view, ComponentType::F32, items.len(), kind)
    }

    fn push_indices(&mut self, indices: &[u32]) -> usize {
        let (bytes, component_type): (Vec<u8>, ComponentType) = match self.index_width {
            IndexWidth::U16 => (
                indices
                    .iter()
                    .flat_map(|&i| (i as u16).to_le_bytes())
                    .collect(),
                ComponentType::U16,
            ),
            IndexWidth::U32 => (
                indices.iter().flat_map(|i| i.to_le_bytes()).collect(),
                ComponentType::U32,
            ),
        };
        let view = self.push_view(&bytes);
        self.push_accessor(view, component_type, indices.len(), "SCALAR")
    }

    pub fn primitive(mut self, data: PrimitiveData) -> Self {
        let mut attributes = serde_json::Map::new();
        let position = self.push_floats(&data.positions, "VEC3");
        attributes.insert("POSITION".into(), position.into());
        if let Some(normals) = &data.normals {
            let normal = self.push_floats(normals, "VEC3");
            attributes.insert("NORMAL".into(), normal.into());
        }
        if let Some(uvs) = &data.uvs {
            let uv = self.push_floats(uvs, "VEC2");
            attributes.insert("TEXCOORD_0".into(), uv.into());
        }

        let mut primitive = json!({ "attributes": attributes });
        if let Some(indices) = &data.indices {
            primitive["indices"] = self.push_indices(indices).into();
        }
        if let Some(color) = data.base_color {
            self.materials.push(json!({
                "pbrMetallicRoughness": { "baseColorFactor": color },
            }));
            primitive["material"] = (self.materials.len() - 1).into();
        }
        self.primitives.push(primitive);
        self
    }

    /// The scene document this builder would write
    pub fn scene_json(&self) -> Value {
        json!({
            "asset": { "version": "2.0", "generator": "lodview" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "name": self.name, "mesh": 0 }],
            "meshes": [{ "name": self.name, "primitives": self.primitives }],
            "accessors": self.accessors,
            "bufferViews": self.buffer_views,
            "buffers": [{ "byteLength": self.bin.len() }],
            "materials": self.materials,
        })
    }

    pub fn build(&self) -> Vec<u8> {
        let json = self.scene_json().to_string();
        encode_container(json.as_bytes(), &self.bin)
    }
}

/// A cube of the given edge length, one colored primitive per side
pub fn cube(size: f32) -> Vec<u8> {
    let h = size / 2.0;
    // (normal, corner positions counter-clockwise seen from outside, color)
    let sides: [([f32; 3], [[f32; 3]; 4], [f32; 4]); 6] = [
        ([0.0, 0.0, 1.0], [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]], [0.90, 0.20, 0.20, 1.0]),
        ([0.0, 0.0, -1.0], [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]], [0.20, 0.75, 0.30, 1.0]),
        ([0.0, 1.0, 0.0], [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]], [0.25, 0.40, 0.90, 1.0]),
        ([0.0, -1.0, 0.0], [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]], [0.95, 0.85, 0.20, 1.0]),
        ([1.0, 0.0, 0.0], [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]], [0.85, 0.35, 0.85, 1.0]),
        ([-1.0, 0.0, 0.0], [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]], [0.20, 0.85, 0.85, 1.0]),
    ];

    let mut builder = ContainerBuilder::new("cube").index_width(IndexWidth::U16);
    for (normal, corners, color) in sides {
        builder = builder.primitive(PrimitiveData {
            positions: corners.to_vec(),
            normals: Some(vec![normal; 4]),
            uvs: Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
            indices: Some(vec![0, 1, 2, 0, 2, 3]),
            base_color: Some(color),
        });
    }
    builder.build()
}

/// A flat grid of `cols * rows * 2` triangles in the XY plane
pub fn grid(cols: usize, rows: usize) -> Vec<u8> {
    let mut positions = Vec::with_capacity((cols + 1) * (rows + 1));
    for y in 0..=rows {
        for x in 0..=cols {
            positions.push([x as f32, y as f32, 0.0]);
        }
    }

    let stride = (cols + 1) as u32;
    let mut indices = Vec::with_capacity(cols * rows * 6);
    for y in 0..rows as u32 {
        for x in 0..cols as u32 {
            let a = y * stride + x;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            indices.extend_from_slice(&[a, b, d, a, d, c]);
        }
    }

    ContainerBuilder::new("grid")
        .primitive(PrimitiveData {
            positions,
            indices: Some(indices),
            base_color: Some([0.6, 0.6, 0.6, 1.0]),
            ..Default::default()
        })
        .build()
}
