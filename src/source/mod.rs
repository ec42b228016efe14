//! Frame source backends.
//!
//! A frame source yields aligned (color, depth) frame pairs plus the stream
//! intrinsics and depth scale valid for the whole session. Backends:
//! - Synthetic stub (`stub://` URLs, tests and demos)
//! - Intel RealSense (feature: source-realsense)
//!
//! The source is opened once at session start and exclusively owned by the
//! capture session for its duration. Open failure is fatal; a transient
//! missing frame is reported as `Ok(None)` and is not.

use anyhow::{anyhow, Result};

use crate::frame::{FramePair, Intrinsics};

pub mod align;
#[cfg(feature = "source-realsense")]
pub mod realsense;
pub mod synthetic;

pub use align::{align_depth_to_color, Extrinsics};
#[cfg(feature = "source-realsense")]
pub use realsense::RealSenseSource;
pub use synthetic::{SyntheticConfig, SyntheticSource};

/// Requested stream configuration, forwarded opaquely to the backend.
#[derive(Clone, Copy, Debug)]
pub struct StreamConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

/// A live source of aligned color + depth frame pairs.
///
/// Intrinsics and depth scale are assumed stable for the session and are
/// queried exactly once, at session start.
pub trait FrameSource {
    /// Color-stream intrinsics (depth is aligned to the color viewpoint).
    fn intrinsics(&self) -> Intrinsics;

    /// Depth scale as reported by the sensor, in meters per raw unit.
    fn depth_scale(&self) -> f64;

    /// Block until the next aligned frame pair is available.
    ///
    /// `Ok(None)` is the transient missing-frame condition: the caller skips
    /// the iteration and retries naturally on the next one. `Err` is a
    /// source fault and ends the session.
    fn next_frame(&mut self) -> Result<Option<FramePair>>;

    /// Release the underlying stream. Called once on every session exit
    /// path, normal or not.
    fn close(&mut self) -> Result<()>;
}

/// Open a frame source by URL scheme.
///
/// `stub://<name>` opens a deterministic synthetic source. `realsense://`
/// opens the first connected RealSense device (requires the
/// `source-realsense` feature).
pub fn open_source(url: &str, config: StreamConfig) -> Result<Box<dyn FrameSource>> {
    if config.width == 0 || config.height == 0 || config.fps == 0 {
        return Err(anyhow!(
            "invalid stream configuration {}x{} @ {} fps",
            config.width,
            config.height,
            config.fps
        ));
    }
    if let Some(name) = url.strip_prefix("stub://") {
        let source = SyntheticSource::new(SyntheticConfig::named(name), config);
        return Ok(Box::new(source));
    }
    if url.starts_with("realsense://") {
        #[cfg(feature = "source-realsense")]
        {
            return Ok(Box::new(RealSenseSource::open(config)?));
        }
        #[cfg(not(feature = "source-realsense"))]
        {
            return Err(anyhow!(
                "realsense:// sources require the source-realsense feature"
            ));
        }
    }
    Err(anyhow!(
        "unsupported source url '{}'; expected stub:// or realsense://",
        url
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_scheme_opens_synthetic_source() {
        let source = open_source("stub://wrist_cam", StreamConfig::default()).unwrap();
        assert!(source.depth_scale() > 0.0);
    }

    #[test]
    fn unknown_scheme_is_fatal() {
        assert!(open_source("rtsp://camera-1", StreamConfig::default()).is_err());
    }

    #[test]
    fn zero_sized_stream_config_is_rejected() {
        let config = StreamConfig {
            width: 0,
            height: 480,
            fps: 30,
        };
        assert!(open_source("stub://cam", config).is_err());
    }
}
