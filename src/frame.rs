//! Frame model.
//!
//! A `FramePair` is one observed instant from a frame source: a 3-channel
//! RGB8 color image and a single-channel 16-bit depth image at the same
//! resolution, with the depth image already reprojected into the color
//! camera's viewpoint by the source.
//!
//! Depth pixels are raw sensor units. They are persisted untransformed;
//! conversion to millimeters is recorded as metadata, never applied to
//! pixel data.

use anyhow::{anyhow, Result};

/// Camera intrinsics for the color stream: focal lengths and principal point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl Intrinsics {
    /// Pack into the fixed 3x3 row-major camera matrix
    /// `[fx, 0, cx, 0, fy, cy, 0, 0, 1]` used by scene_camera.json.
    pub fn cam_k(&self) -> [f64; 9] {
        [
            self.fx, 0.0, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        ]
    }
}

/// One aligned color + depth frame pair.
///
/// Frames are ephemeral: held only until the next frame arrives or the
/// session ends, unless explicitly captured.
#[derive(Clone, Debug)]
pub struct FramePair {
    color: Vec<u8>,
    depth: Vec<u16>,
    pub width: u32,
    pub height: u32,
}

impl FramePair {
    /// Create a frame pair, validating that both buffers match the stated
    /// resolution (color is RGB8, depth is one u16 per pixel).
    pub fn new(color: Vec<u8>, depth: Vec<u16>, width: u32, height: u32) -> Result<Self> {
        let pixels = (width as usize) * (height as usize);
        if color.len() != pixels * 3 {
            return Err(anyhow!(
                "color buffer is {} bytes, expected {} for {}x{} RGB8",
                color.len(),
                pixels * 3,
                width,
                height
            ));
        }
        if depth.len() != pixels {
            return Err(anyhow!(
                "depth buffer is {} values, expected {} for {}x{}",
                depth.len(),
                pixels,
                width,
                height
            ));
        }
        Ok(Self {
            color,
            depth,
            width,
            height,
        })
    }

    pub fn color(&self) -> &[u8] {
        &self.color
    }

    pub fn depth(&self) -> &[u16] {
        &self.depth
    }

    /// Color image as an owned `image` buffer for PNG encoding.
    pub fn to_color_image(&self) -> image::RgbImage {
        // Buffer length was validated in new(), from_raw cannot fail here.
        image::RgbImage::from_raw(self.width, self.height, self.color.clone())
            .unwrap_or_else(|| image::RgbImage::new(self.width, self.height))
    }

    /// Depth image as an owned 16-bit grayscale `image` buffer. Raw sensor
    /// units are preserved bit-for-bit.
    pub fn to_depth_image(&self) -> image::ImageBuffer<image::Luma<u16>, Vec<u16>> {
        image::ImageBuffer::from_raw(self.width, self.height, self.depth.clone())
            .unwrap_or_else(|| image::ImageBuffer::new(self.width, self.height))
    }

    /// False-color rendering of the depth image for live preview.
    ///
    /// Near is warm, far is cool, zero (no return) is black. Preview only;
    /// has no effect on persisted state.
    pub fn depth_false_color(&self) -> image::RgbImage {
        let mut out = image::RgbImage::new(self.width, self.height);
        for (pixel, raw) in out.pixels_mut().zip(self.depth.iter()) {
            *pixel = image::Rgb(false_color(*raw));
        }
        out
    }
}

fn false_color(raw: u16) -> [u8; 3] {
    if raw == 0 {
        return [0, 0, 0];
    }
    // Compress the 16-bit range into a byte the way the usual alpha=0.03
    // preview scaling does, then ramp red -> blue.
    let v = ((raw as f32) * 0.03).min(255.0) as u8;
    [255 - v, v / 2, v]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cam_k_packs_row_major() {
        let intr = Intrinsics {
            fx: 615.0,
            fy: 616.0,
            cx: 320.5,
            cy: 240.5,
        };
        assert_eq!(
            intr.cam_k(),
            [615.0, 0.0, 320.5, 0.0, 616.0, 240.5, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn frame_pair_validates_buffer_sizes() {
        assert!(FramePair::new(vec![0u8; 2 * 2 * 3], vec![0u16; 4], 2, 2).is_ok());
        assert!(FramePair::new(vec![0u8; 5], vec![0u16; 4], 2, 2).is_err());
        assert!(FramePair::new(vec![0u8; 12], vec![0u16; 3], 2, 2).is_err());
    }

    #[test]
    fn depth_round_trips_untransformed() {
        let depth = vec![0u16, 1, 1000, u16::MAX];
        let frame = FramePair::new(vec![0u8; 12], depth.clone(), 2, 2).unwrap();
        let img = frame.to_depth_image();
        assert_eq!(img.as_raw(), &depth);
    }

    #[test]
    fn false_color_maps_no_return_to_black() {
        let frame = FramePair::new(vec![0u8; 3], vec![0u16], 1, 1).unwrap();
        let img = frame.depth_false_color();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
    }
}
