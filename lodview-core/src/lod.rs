//! Level-of-detail reduction by uniform-stride face sampling.
//!
//! The vertex buffer is kept as-is; only the face list (and its parallel
//! color list) is thinned, so retained faces still address the original
//! vertices.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DataError;
use crate::geometry::{ModelAsset, RawMesh};

const MIB: usize = 1024 * 1024;

/// One size tier: sources larger than `min_bytes` get `faces` faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LodTier {
    pub min_bytes: usize,
    pub faces: usize,
}

/// Maps a source asset's byte size to a target face count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodTiers {
    pub tiers: Vec<LodTier>,
    pub default_faces: usize,
    /// Overrides the tier table when set
    pub fixed_faces: Option<usize>,
}

impl Default for LodTiers {
    fn default() -> Self {
        Self {
            tiers: vec![
                LodTier { min_bytes: 5 * MIB, faces: 2_000 },
                LodTier { min_bytes: 2 * MIB, faces: 5_000 },
                LodTier { min_bytes: MIB, faces: 10_000 },
            ],
            default_faces: 15_000,
            fixed_faces: None,
        }
    }
}

impl LodTiers {
    /// Target face count for a source of `byte_len` bytes. The tier with the
    /// largest threshold below `byte_len` wins, regardless of table order.
    pub fn target_for(&self, byte_len: usize) -> usize {
        if let Some(faces) = self.fixed_faces {
            return faces;
        }
        self.tiers
            .iter()
            .filter(|tier| byte_len > tier.min_bytes)
            .max_by_key(|tier| tier.min_bytes)
            .map_or(self.default_faces, |tier| tier.faces)
    }
}

/// Indices of the faces kept when reducing `face_count` faces to `target`
pub fn sample_indices(face_count: usize, target: usize) -> impl Iterator<Item = usize> {
    let target = target.max(1);
    let (keep, stride) = if face_count <= target {
        (face_count, 1.0)
    } else {
        (target, face_count as f64 / target as f64)
    };
    (0..keep).map(move |i| ((i as f64 * stride) as usize).min(face_count - 1))
}

/// Reduce `raw` to at most `target_face_count` faces and finish it as a
/// model. Colors must parallel faces and every retained index must address
/// a vertex.
pub fn simplify(
    raw: RawMesh,
    target_face_count: usize,
    name: impl Into<String>,
) -> Result<ModelAsset, DataError> {
    let name = name.into();
    let original_faces = raw.face_count();
    let original_vertices = raw.vertex_count();
    if raw.colors.len() != original_faces {
        return Err(DataError::ColorMismatch {
            faces: original_faces,
            colors: raw.colors.len(),
        });
    }
    let vertices = raw.vertices();

    let (faces, colors): (Vec<_>, Vec<_>) = if original_faces <= target_face_count.max(1) {
        (raw.faces, raw.colors)
    } else {
        sample_indices(original_faces, target_face_count)
            .map(|i| (raw.faces[i], raw.colors[i]))
            .unzip()
    };

    debug!(
        model = %name,
        original_faces,
        kept_faces = faces.len(),
        target = target_face_count,
        "simplified mesh"
    );

    ModelAsset::from_parts(
        name,
        vertices,
        faces,
        colors,
        original_vertices,
        original_faces,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Color, Face};

    fn strip(face_count: usize) -> RawMesh {
        let vertex_count = face_count + 2;
        RawMesh {
            positions: (0..vertex_count)
                .flat_map(|i| [i as f32, (i % 2) as f32, 0.0])
                .collect(),
            normals: vec![0.0; vertex_count * 3],
            uvs: vec![0.0; vertex_count * 2],
            faces: (0..face_count as u32).map(|i| Face::new(i, i + 1, i + 2)).collect(),
            colors: (0..face_count).map(|i| Color::rgb((i % 256) as u8, 0, 0)).collect(),
        }
    }

    #[test]
    fn test_pass_through_when_under_target() {
        let raw = strip(10);
        let model = simplify(raw.clone(), 10, "strip").unwrap();
        assert_eq!(model.faces(), raw.faces.as_slice());
        assert_eq!(model.colors(), raw.colors.as_slice());
        assert_eq!(model.original_face_count(), 10);
    }

    #[test]
    fn test_uniform_stride() {
        let model = simplify(strip(100), 10, "strip").unwrap();
        assert_eq!(model.face_count(), 10);
        assert_eq!(model.faces()[0], Face::new(0, 1, 2));
        assert_eq!(model.faces()[1], Face::new(10, 11, 12));
        assert_eq!(model.colors()[1], Color::rgb(10, 0, 0));
        assert_eq!(model.vertex_count(), 102);
        assert_eq!(model.original_vertex_count(), 102);
    }

    #[test]
    fn test_fractional_stride_hits_target() {
        let model = simplify(strip(3_999), 2_000, "strip").unwrap();
        assert_eq!(model.face_count(), 2_000);
        // Sampled faces stay in source order and never repeat
        let firsts: Vec<u32> = model.faces().iter().map(|f| f.v1).collect();
        assert!(firsts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_zero_target_keeps_one_face() {
        let model = simplify(strip(5), 0, "strip").unwrap();
        assert_eq!(model.face_count(), 1);
    }

    #[test]
    fn test_rejects_index_past_vertices() {
        let mut raw = strip(3);
        raw.faces[1] = Face::new(0, 1, 9);
        let err = simplify(raw, 10, "bad").unwrap_err();
        assert!(matches!(
            err,
            DataError::IndexOutOfRange { index: 9, vertex_count: 5 }
        ));
    }

    #[test]
    fn test_rejects_missing_colors() {
        let mut raw = strip(40);
        raw.colors.clear();
        // Sampling would index the empty color list
        let err = simplify(raw, 10, "bad").unwrap_err();
        assert!(matches!(err, DataError::ColorMismatch { faces: 40, colors: 0 }));
    }

    #[test]
    fn test_tier_selection() {
        let tiers = LodTiers::default();
        assert_eq!(tiers.target_for(6 * MIB), 2_000);
        assert_eq!(tiers.target_for(5 * MIB), 5_000);
        assert_eq!(tiers.target_for(3 * MIB), 5_000);
        assert_eq!(tiers.target_for(MIB + 1), 10_000);
        assert_eq!(tiers.target_for(MIB), 15_000);
        assert_eq!(tiers.target_for(0), 15_000);
    }

    #[test]
    fn test_fixed_faces_override() {
        let tiers = LodTiers {
            fixed_faces: Some(123),
            ..LodTiers::default()
        };
        assert_eq!(tiers.target_for(10 * MIB), 123);
    }

    #[test]
    fn test_sample_indices_bounds() {
        for (faces, target) in [(7, 3), (1000, 999), (50, 1), (5, 5)] {
            let picked: Vec<usize> = sample_indices(faces, target).collect();
            assert_eq!(picked.len(), faces.min(target));
            assert!(picked.iter().all(|&i| i < faces));
        }
    }
}
