//! Decode, extract and simplify, either inline or on a background thread.
//!
//! Background loads report through a channel that the UI thread polls each
//! frame; nothing on the render path ever waits on it.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use tracing::{debug, info};

use crate::container;
use crate::error::LoadError;
use crate::extract;
use crate::geometry::ModelAsset;
use crate::loader::AssetLoader;
use crate::lod::{self, LodTiers};

pub type LoadResult = Result<ModelAsset, LoadError>;

/// Display name for an asset path: the file stem, or the path itself
pub fn display_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Run decode → extract → simplify over bytes already in memory
pub fn build_model(bytes: &[u8], name: &str, tiers: &LodTiers) -> LoadResult {
    let decoded = container::decode(bytes)?;
    let raw = extract::extract(&decoded)?;
    let target = tiers.target_for(bytes.len());
    debug!(bytes = bytes.len(), target, "selected LOD target");
    lod::simplify(raw, target, name).map_err(Into::into)
}

/// Fetch an asset through `loader` and build it
pub fn load_model(loader: &dyn AssetLoader, path: &str, tiers: &LodTiers) -> LoadResult {
    let bytes = loader.load_bytes(path)?;
    let model = build_model(&bytes, &display_name(path), tiers)?;
    info!(
        path,
        vertices = model.vertex_count(),
        faces = model.face_count(),
        original_faces = model.original_face_count(),
        "model loaded"
    );
    Ok(model)
}

/// A load running on a background thread
#[derive(Debug)]
pub struct PendingLoad {
    path: String,
    receiver: Receiver<LoadResult>,
}

impl PendingLoad {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Non-blocking check for completion. Once this yields `Some`, drop the
    /// handle; later polls report [`LoadError::Interrupted`].
    pub fn poll(&self) -> Option<LoadResult> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            // Worker died without sending
            Err(TryRecvError::Disconnected) => Some(Err(LoadError::Interrupted)),
        }
    }

    /// Block until the load finishes
    pub fn wait(self) -> LoadResult {
        self.receiver.recv().unwrap_or(Err(LoadError::Interrupted))
    }
}

/// Start loading `path` on a new thread. Dropping the returned handle
/// abandons the result; the worker still runs to completion.
pub fn spawn_load(loader: Arc<dyn AssetLoader>, path: impl Into<String>, tiers: LodTiers) -> PendingLoad {
    let path = path.into();
    let (sender, receiver) = bounded(1);
    let worker_path = path.clone();

    thread::spawn(move || {
        let result = load_model(loader.as_ref(), &worker_path, &tiers);
        // The receiver is gone if the load was superseded
        if sender.send(result).is_err() {
            debug!(path = %worker_path, "discarding superseded load result");
        }
    });

    PendingLoad { path, receiver }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder;
    use crate::error::AssetError;
    use crate::loader::BundleLoader;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("models/robot.glb"), "robot");
        assert_eq!(display_name("cube"), "cube");
    }

    #[test]
    fn test_load_model_sync() {
        let loader = BundleLoader::new().with("cube.glb", builder::cube(1.0));
        let model = load_model(&loader, "cube.glb", &LodTiers::default()).unwrap();
        assert_eq!(model.name(), "cube");
        assert_eq!(model.face_count(), 12);
        assert_eq!(model.vertex_count(), 24);
    }

    #[test]
    fn test_spawn_load_completes() {
        let loader: Arc<dyn AssetLoader> =
            Arc::new(BundleLoader::new().with("cube.glb", builder::cube(1.0)));
        let pending = spawn_load(loader, "cube.glb", LodTiers::default());
        assert_eq!(pending.path(), "cube.glb");
        let model = pending.wait().unwrap();
        assert_eq!(model.face_count(), 12);
    }

    #[test]
    fn test_spawn_load_not_found() {
        let loader: Arc<dyn AssetLoader> = Arc::new(BundleLoader::new());
        let result = spawn_load(loader, "missing.glb", LodTiers::default()).wait();
        assert!(matches!(
            result,
            Err(LoadError::Asset(AssetError::NotFound(_)))
        ));
    }

    #[test]
    fn test_poll_eventually_yields() {
        let loader: Arc<dyn AssetLoader> =
            Arc::new(BundleLoader::new().with("grid.glb", builder::grid(10, 10)));
        let pending = spawn_load(loader, "grid.glb", LodTiers::default());
        let result = loop {
            if let Some(result) = pending.poll() {
                break result;
            }
            thread::yield_now();
        };
        assert_eq!(result.unwrap().face_count(), 200);
    }

    struct PanickingLoader;

    impl AssetLoader for PanickingLoader {
        fn load_bytes(&self, path: &str) -> Result<Vec<u8>, AssetError> {
            panic!("loader crashed on {path}");
        }
    }

    #[test]
    fn test_dead_worker_is_interrupted() {
        let pending = spawn_load(Arc::new(PanickingLoader), "cube.glb", LodTiers::default());
        assert!(matches!(pending.wait(), Err(LoadError::Interrupted)));
    }

    #[test]
    fn test_poll_after_disconnect() {
        let (sender, receiver) = bounded::<LoadResult>(1);
        drop(sender);
        let pending = PendingLoad {
            path: "gone.glb".to_string(),
            receiver,
        };
        assert!(matches!(pending.poll(), Some(Err(LoadError::Interrupted))));
        assert!(matches!(pending.poll(), Some(Err(LoadError::Interrupted))));
    }

    /// Re-frame `data` with its binary chunk zero-padded to `len` bytes
    fn padded(data: &[u8], len: usize) -> Vec<u8> {
        let decoded = container::decode(data).unwrap();
        let json = serde_json::to_vec(&decoded.scene).unwrap();
        let mut bin = decoded.binary.to_vec();
        bin.resize(len, 0);
        builder::encode_container(&json, &bin)
    }

    #[test]
    fn test_target_follows_container_size() {
        const MIB: usize = 1024 * 1024;
        let grid = builder::grid(80, 80);
        assert!(grid.len() < MIB);

        let small = build_model(&grid, "grid", &LodTiers::default()).unwrap();
        assert_eq!(small.face_count(), 12_800);

        for (len, faces) in [(MIB + MIB / 2, 10_000), (3 * MIB, 5_000), (6 * MIB, 2_000)] {
            let data = padded(&grid, len);
            assert!(data.len() > len);
            let model = build_model(&data, "grid", &LodTiers::default()).unwrap();
            assert_eq!(model.face_count(), faces);
            assert_eq!(model.original_face_count(), 12_800);
        }
    }

    #[test]
    fn test_fixed_target() {
        let tiers = LodTiers {
            fixed_faces: Some(50),
            ..LodTiers::default()
        };
        let model = build_model(&builder::grid(10, 10), "grid", &tiers).unwrap();
        assert_eq!(model.face_count(), 50);
        assert_eq!(model.original_face_count(), 200);
        assert_eq!(model.vertex_count(), 121);
    }
}
