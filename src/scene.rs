//! Dataset scene layout.
//!
//! A scene is addressed by `(root, split, scene_index)` and owns the
//! directory `<root>/<split>/<scene:06>/` with `rgb/` and `depth/` beneath
//! it. Frame files are zero-padded 6-digit PNGs; the camera metadata file
//! sits at the scene root.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Resolved on-disk layout for one scene.
#[derive(Clone, Debug)]
pub struct SceneLayout {
    scene_dir: PathBuf,
    rgb_dir: PathBuf,
    depth_dir: PathBuf,
}

impl SceneLayout {
    pub fn new(root: &Path, split: &str, scene_index: u32) -> Self {
        let scene_dir = root.join(split).join(format!("{:06}", scene_index));
        let rgb_dir = scene_dir.join("rgb");
        let depth_dir = scene_dir.join("depth");
        Self {
            scene_dir,
            rgb_dir,
            depth_dir,
        }
    }

    /// Create the scene, rgb and depth directories. Idempotent: succeeds if
    /// they already exist and never touches previously captured files.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.rgb_dir)
            .with_context(|| format!("create {}", self.rgb_dir.display()))?;
        std::fs::create_dir_all(&self.depth_dir)
            .with_context(|| format!("create {}", self.depth_dir.display()))?;
        Ok(())
    }

    pub fn scene_dir(&self) -> &Path {
        &self.scene_dir
    }

    pub fn rgb_path(&self, frame_id: u32) -> PathBuf {
        self.rgb_dir.join(format!("{:06}.png", frame_id))
    }

    pub fn depth_path(&self, frame_id: u32) -> PathBuf {
        self.depth_dir.join(format!("{:06}.png", frame_id))
    }

    pub fn camera_json_path(&self) -> PathBuf {
        self.scene_dir.join("scene_camera.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_zero_padded() {
        let layout = SceneLayout::new(Path::new("/data/ds"), "train", 3);
        assert_eq!(
            layout.scene_dir(),
            Path::new("/data/ds/train/000003")
        );
        assert_eq!(
            layout.rgb_path(0),
            Path::new("/data/ds/train/000003/rgb/000000.png")
        );
        assert_eq!(
            layout.depth_path(12),
            Path::new("/data/ds/train/000003/depth/000012.png")
        );
        assert_eq!(
            layout.camera_json_path(),
            Path::new("/data/ds/train/000003/scene_camera.json")
        );
    }

    #[test]
    fn ensure_dirs_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = SceneLayout::new(tmp.path(), "val", 7);
        layout.ensure_dirs().unwrap();

        // A file captured between runs must survive the second setup.
        let marker = layout.rgb_path(0);
        std::fs::write(&marker, b"png").unwrap();

        layout.ensure_dirs().unwrap();
        assert_eq!(std::fs::read(&marker).unwrap(), b"png");
    }
}
