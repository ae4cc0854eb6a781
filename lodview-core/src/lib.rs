//! lodview core library - container decoding, LOD and software rendering
//!
//! This library turns binary 3D-model containers into simplified, immutable
//! meshes and paints them with a painter's-algorithm rasterizer driven by a
//! gesture camera. It has no UI framework dependency: hosts provide a
//! [`Surface`] and forward their input events to the [`CameraController`].

pub mod builder;
pub mod camera;
pub mod config;
pub mod container;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod loader;
pub mod lod;
pub mod pipeline;
pub mod projection;
pub mod raster;
pub mod scene;
pub mod viewer;

// Re-export commonly used types
pub use camera::{CameraConfig, CameraController, CameraState, GestureUpdate};
pub use config::ViewerConfig;
pub use container::{decode, Container};
pub use error::{AssetError, ConfigError, DataError, FormatError, LoadError, RuntimeError};
pub use extract::{extract, MeshExtractor};
pub use geometry::{BoundingBox, Color, Face, ModelAsset, RawMesh, Vertex};
pub use loader::{AssetLoader, BundleLoader, FsLoader};
pub use lod::{simplify, LodTier, LodTiers};
pub use pipeline::{build_model, load_model, spawn_load, PendingLoad};
pub use projection::Projection;
pub use raster::{FrameStats, Rasterizer, RecordingSurface, RenderConfig, Surface};
pub use scene::SceneDescription;
pub use viewer::{ModelView, ViewState};
