//! Intel RealSense frame source (feature: source-realsense).
//!
//! Thin wrapper over the vendor SDK for stream negotiation, frame delivery,
//! intrinsics and depth scale. The Rust binding does not expose the SDK's
//! align processing block, so depth-to-color reprojection is done here with
//! the sensor-reported intrinsics and extrinsics (`source::align`); the
//! frame pairs this source yields are aligned to the color viewpoint.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use realsense_rust::config::Config;
use realsense_rust::context::Context;
use realsense_rust::frame::{ColorFrame, DepthFrame, PixelKind};
use realsense_rust::kind::{Rs2CameraInfo, Rs2Format, Rs2StreamKind};
use realsense_rust::pipeline::{ActivePipeline, InactivePipeline};

use super::align::{align_depth_to_color, Extrinsics};
use super::{FrameSource, StreamConfig};
use crate::frame::{FramePair, Intrinsics};

const FRAME_WAIT: Duration = Duration::from_millis(5000);

/// Live RealSense device, opened via the SDK pipeline.
pub struct RealSenseSource {
    pipeline: Option<ActivePipeline>,
    stream: StreamConfig,
    color_intrinsics: Intrinsics,
    depth_intrinsics: Intrinsics,
    depth_to_color: Extrinsics,
    depth_scale: f64,
}

fn stream_intrinsics(intr: &realsense_rust::base::Rs2Intrinsics) -> Intrinsics {
    Intrinsics {
        fx: intr.fx() as f64,
        fy: intr.fy() as f64,
        cx: intr.ppx() as f64,
        cy: intr.ppy() as f64,
    }
}

impl RealSenseSource {
    /// Open the first connected device and negotiate the requested streams.
    /// Fails fast if no device is present or the configuration is
    /// unsupported; the session never starts in that case.
    pub fn open(stream: StreamConfig) -> Result<Self> {
        let context = Context::new().context("create realsense context")?;
        let devices = context.query_devices(HashSet::new());
        let device = devices
            .first()
            .ok_or_else(|| anyhow!("no realsense device connected"))?;
        if let Some(name) = device.info(Rs2CameraInfo::Name) {
            log::info!("connecting to {}", name.to_string_lossy());
        }

        let mut config = Config::new();
        config
            .enable_stream(
                Rs2StreamKind::Depth,
                None,
                stream.width as usize,
                stream.height as usize,
                Rs2Format::Z16,
                stream.fps as usize,
            )
            .context("enable depth stream")?
            .enable_stream(
                Rs2StreamKind::Color,
                None,
                stream.width as usize,
                stream.height as usize,
                Rs2Format::Rgb8,
                stream.fps as usize,
            )
            .context("enable color stream")?;

        let inactive = InactivePipeline::try_from(&context).context("create pipeline")?;
        let pipeline = inactive
            .start(Some(config))
            .context("start realsense pipeline")?;

        let profile = pipeline.profile();
        let find_stream = |kind: Rs2StreamKind| {
            profile
                .streams()
                .iter()
                .find(|s| s.kind() == kind)
                .ok_or_else(|| anyhow!("negotiated profile has no {:?} stream", kind))
        };
        let color_stream = find_stream(Rs2StreamKind::Color)?;
        let depth_stream = find_stream(Rs2StreamKind::Depth)?;

        let color_intrinsics =
            stream_intrinsics(&color_stream.intrinsics().context("color intrinsics")?);
        let depth_intrinsics =
            stream_intrinsics(&depth_stream.intrinsics().context("depth intrinsics")?);
        let extr = depth_stream
            .extrinsics(color_stream)
            .context("depth-to-color extrinsics")?;
        let depth_to_color = Extrinsics {
            rotation: extr.rotation(),
            translation: extr.translation(),
        };

        let depth_scale = profile
            .device()
            .sensors()
            .iter()
            .find_map(|sensor| sensor.depth_scale().ok())
            .ok_or_else(|| anyhow!("device reports no depth scale"))?
            as f64;

        Ok(Self {
            pipeline: Some(pipeline),
            stream,
            color_intrinsics,
            depth_intrinsics,
            depth_to_color,
            depth_scale,
        })
    }
}

impl FrameSource for RealSenseSource {
    fn intrinsics(&self) -> Intrinsics {
        self.color_intrinsics
    }

    fn depth_scale(&self) -> f64 {
        self.depth_scale
    }

    fn next_frame(&mut self) -> Result<Option<FramePair>> {
        let pipeline = self
            .pipeline
            .as_mut()
            .ok_or_else(|| anyhow!("realsense source already closed"))?;
        let frames = pipeline.wait(Some(FRAME_WAIT)).context("wait for frames")?;

        let color_frames = frames.frames_of_type::<ColorFrame>();
        let depth_frames = frames.frames_of_type::<DepthFrame>();
        let (Some(color), Some(depth)) = (color_frames.first(), depth_frames.first()) else {
            // Incomplete pair; the next iteration retries naturally.
            return Ok(None);
        };

        let mut rgb = Vec::with_capacity((self.stream.width * self.stream.height * 3) as usize);
        for pixel in color.iter() {
            if let PixelKind::Rgb8 { r, g, b } = pixel {
                rgb.extend_from_slice(&[*r, *g, *b]);
            }
        }
        let mut raw = Vec::with_capacity((self.stream.width * self.stream.height) as usize);
        for pixel in depth.iter() {
            if let PixelKind::Z16 { depth } = pixel {
                raw.push(*depth);
            }
        }

        let aligned = align_depth_to_color(
            &raw,
            (depth.width() as u32, depth.height() as u32),
            &self.depth_intrinsics,
            self.depth_scale,
            &self.depth_to_color,
            (color.width() as u32, color.height() as u32),
            &self.color_intrinsics,
        );

        FramePair::new(rgb, aligned, color.width() as u32, color.height() as u32).map(Some)
    }

    fn close(&mut self) -> Result<()> {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.stop();
            log::info!("realsense pipeline stopped");
        }
        Ok(())
    }
}
