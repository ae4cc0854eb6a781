//! Error taxonomy for loading and rendering models

use std::path::PathBuf;

/// Failures from an asset loader collaborator.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error reading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),
}

/// The byte buffer is not a well-formed container.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("invalid container header: {0}")]
    InvalidHeader(String),

    #[error("truncated chunk at byte {offset}: needs {declared} bytes, {available} available")]
    TruncatedChunk {
        offset: usize,
        declared: usize,
        available: usize,
    },

    #[error("container has no {0} chunk")]
    MissingChunk(&'static str),

    #[error("scene JSON could not be parsed: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

/// The scene parsed, but its geometry cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("primitive is missing required attribute {0}")]
    MissingAttribute(&'static str),

    #[error("unsupported data format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("accessor {accessor} reads past the end of its data ({needed} > {available} bytes)")]
    OutOfBounds {
        accessor: usize,
        needed: usize,
        available: usize,
    },

    #[error("accessor {accessor} has stride {stride} smaller than its {element}-byte element")]
    InvalidStride {
        accessor: usize,
        stride: usize,
        element: usize,
    },

    #[error("attribute {attribute} has {found} elements, POSITION has {expected}")]
    CountMismatch {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("{colors} face colors for {faces} faces")]
    ColorMismatch { faces: usize, colors: usize },

    #[error("scene contains no triangle geometry")]
    NoGeometry,
}

/// A single frame could not be drawn.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("model has no drawable geometry")]
    EmptyModel,

    #[error("face {face} addresses vertex {index} of {vertex_count}")]
    IndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("render surface has invalid size {width}x{height}")]
    InvalidSurface { width: f32, height: f32 },

    #[error("camera state is not renderable: {0}")]
    InvalidCamera(&'static str),
}

/// Terminal failure of one load attempt.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("load task ended without reporting a result")]
    Interrupted,
}

/// Configuration file problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
