//! Scene camera metadata.
//!
//! `scene_camera.json` maps the decimal string frame id (not zero-padded)
//! to the camera matrix and depth scale valid for that frame. The mapping
//! is accumulated in memory across the session and flushed to disk exactly
//! once, at session end, only if at least one frame was captured.
//!
//! The dataset convention is millimeters per raw depth unit; depth sensors
//! report meters per unit, so the scale is converted once at session start.

use std::path::Path;

use anyhow::{Context, Result};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Convert a sensor-reported depth scale (meters per raw unit) to the
/// dataset convention (millimeters per raw unit):
/// `depth_in_mm = raw_pixel * depth_scale_mm`.
pub fn depth_scale_mm(meters_per_unit: f64) -> f64 {
    meters_per_unit * 1000.0
}

/// Per-frame camera record. All frames in a session share the same values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CameraRecord {
    #[serde(rename = "cam_K")]
    pub cam_k: [f64; 9],
    pub depth_scale: f64,
}

/// In-memory scene_camera.json contents, in capture order.
#[derive(Debug, Default)]
pub struct SceneCameraMeta {
    entries: Vec<(u32, CameraRecord)>,
}

impl SceneCameraMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame_id: u32, record: CameraRecord) {
        self.entries.push((frame_id, record));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the mapping as a pretty-printed JSON object. The caller is
    /// responsible for skipping the write when no frames were captured.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serialize scene camera")?;
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}

impl Serialize for SceneCameraMeta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Keys are decimal strings; insertion (capture) order is preserved.
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (frame_id, record) in &self.entries {
            map.serialize_entry(&frame_id.to_string(), record)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(scale: f64) -> CameraRecord {
        CameraRecord {
            cam_k: [615.0, 0.0, 320.0, 0.0, 615.0, 240.0, 0.0, 0.0, 1.0],
            depth_scale: scale,
        }
    }

    #[test]
    fn meters_to_millimeters() {
        assert_eq!(depth_scale_mm(0.001), 1.0);
        assert_eq!(depth_scale_mm(0.000125), 0.125);
    }

    #[test]
    fn keys_are_plain_decimal_strings() {
        let mut meta = SceneCameraMeta::new();
        meta.push(0, record(1.0));
        meta.push(1, record(1.0));
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&meta).unwrap()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj.contains_key("0"));
        assert!(obj.contains_key("1"));
        assert_eq!(obj["0"]["depth_scale"], 1.0);
        assert_eq!(obj["0"]["cam_K"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn serialization_preserves_capture_order_past_ten() {
        let mut meta = SceneCameraMeta::new();
        for id in 0..12 {
            meta.push(id, record(1.0));
        }
        let json = serde_json::to_string(&meta).unwrap();
        // "2" must come before "10" in the emitted object.
        assert!(json.find("\"2\"").unwrap() < json.find("\"10\"").unwrap());
    }

    #[test]
    fn written_file_is_pretty_printed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("scene_camera.json");
        let mut meta = SceneCameraMeta::new();
        meta.push(0, record(1.0));
        meta.write_to(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains('\n'));
        assert!(text.contains("\"cam_K\""));
    }
}
