//! scenecap - RGB-D scene capture for BOP-style 6D object-pose datasets.
//!
//! The crate is built around a single **capture session controller** that
//! consumes aligned (color, depth) frame pairs from a pluggable frame source
//! and, on user command, persists frames into the dataset layout:
//!
//! ```text
//! <root>/<split>/<scene:06>/
//!   rgb/<frame:06>.png      3-channel color
//!   depth/<frame:06>.png    raw 16-bit depth, untransformed
//!   scene_camera.json       written once at session end, only if >=1 capture
//! ```
//!
//! # Module Structure
//!
//! - `frame`: frame pairs, camera intrinsics, cam_K packing
//! - `source`: frame source backends (synthetic stub, RealSense behind a feature)
//! - `command`: polled capture/cancel command sources
//! - `scene`: dataset directory layout
//! - `metadata`: scene_camera.json accumulation and flush
//! - `session`: the capture loop and its finalization guarantees

pub mod command;
pub mod config;
pub mod frame;
pub mod metadata;
pub mod scene;
pub mod session;
pub mod source;

#[cfg(feature = "terminal-input")]
pub use command::TerminalCommands;
pub use command::{Command, CommandSource, FlagCommands, ScriptedCommands};
pub use config::{CaptureConfig, StreamSettings};
pub use frame::{FramePair, Intrinsics};
pub use metadata::{depth_scale_mm, CameraRecord, SceneCameraMeta};
pub use scene::SceneLayout;
pub use session::{CaptureSession, SessionSummary};
pub use source::{open_source, FrameSource, StreamConfig, SyntheticConfig, SyntheticSource};
