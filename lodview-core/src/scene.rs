//! Scene description carried in a container's JSON chunk.
//!
//! The document is deserialized into `gltf-json`'s schema types. The helpers
//! here unwrap its checked enums and 64-bit sizes into what the extractor
//! works with; anything `gltf-json` could not recognise comes back as `None`.

use gltf::json::{
    self,
    accessor::{ComponentType, GenericComponentType},
    mesh::{Mode, Semantic},
    validation::{Checked, USize64},
};

pub use gltf::json::buffer::View as BufferView;
pub use gltf::json::mesh::Primitive;
pub use gltf::json::{Accessor, Buffer, Material, Mesh};

/// Parsed JSON scene document
pub type SceneDescription = json::Root;

pub fn parse(json: &[u8]) -> Result<SceneDescription, json::Error> {
    json::deserialize::from_slice(json)
}

/// Byte counts are 64-bit in the document; clamp rather than wrap on narrow targets
pub fn size(value: USize64) -> usize {
    usize::try_from(value.0).unwrap_or(usize::MAX)
}

pub fn is_triangle_list(primitive: &Primitive) -> bool {
    matches!(primitive.mode, Checked::Valid(Mode::Triangles))
}

pub fn component_type(accessor: &Accessor) -> Option<ComponentType> {
    match accessor.component_type {
        Checked::Valid(GenericComponentType(component)) => Some(component),
        Checked::Invalid => None,
    }
}

/// Number of components per element for the accessor's type
pub fn components(accessor: &Accessor) -> Option<usize> {
    match accessor.type_ {
        Checked::Valid(kind) => Some(kind.multiplicity()),
        Checked::Invalid => None,
    }
}

/// Accessor index bound to `semantic`, if the primitive has it
pub fn attribute(primitive: &Primitive, semantic: Semantic) -> Option<usize> {
    primitive
        .attributes
        .get(&Checked::Valid(semantic))
        .map(|index| index.value())
}

pub fn base_color_factor(material: &Material) -> [f32; 4] {
    material.pbr_metallic_roughness.base_color_factor.0
}
