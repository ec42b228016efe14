//! Depth-to-color alignment.
//!
//! Reprojects a raw depth image into the color camera's viewpoint so pixel
//! (x, y) addresses the same scene point in both images. Each depth pixel's
//! footprint (its two diagonal corners) is projected into the color image
//! and the covered rectangle takes the nearest depth value, so occluding
//! surfaces stay in front. Zero (no return) pixels contribute nothing;
//! color pixels covered by no depth pixel stay zero.
//!
//! Used by SDK-backed sources whose Rust binding does not expose the
//! vendor's align processing block. Distortion models are not applied; the
//! streams this crate negotiates report pinhole intrinsics.

use crate::frame::Intrinsics;

/// Rigid transform from the depth to the color camera, as reported by the
/// sensor. Rotation is column-major.
#[derive(Clone, Debug)]
pub struct Extrinsics {
    pub rotation: [f32; 9],
    pub translation: [f32; 3],
}

impl Extrinsics {
    /// Identity transform, for streams sharing a viewpoint.
    pub fn identity() -> Self {
        Self {
            rotation: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            translation: [0.0; 3],
        }
    }

    fn transform(&self, p: [f64; 3]) -> [f64; 3] {
        let r = &self.rotation;
        let t = &self.translation;
        [
            r[0] as f64 * p[0] + r[3] as f64 * p[1] + r[6] as f64 * p[2] + t[0] as f64,
            r[1] as f64 * p[0] + r[4] as f64 * p[1] + r[7] as f64 * p[2] + t[1] as f64,
            r[2] as f64 * p[0] + r[5] as f64 * p[1] + r[8] as f64 * p[2] + t[2] as f64,
        ]
    }
}

/// Reproject a raw depth image into the color viewpoint.
///
/// Depth values stay in raw sensor units; `depth_scale` (meters per unit)
/// is only used to place points metrically before the extrinsic transform.
pub fn align_depth_to_color(
    depth: &[u16],
    depth_dims: (u32, u32),
    depth_intr: &Intrinsics,
    depth_scale: f64,
    extrinsics: &Extrinsics,
    color_dims: (u32, u32),
    color_intr: &Intrinsics,
) -> Vec<u16> {
    let (dw, dh) = depth_dims;
    let (cw, ch) = color_dims;
    let mut out = vec![0u16; cw as usize * ch as usize];
    for y in 0..dh {
        for x in 0..dw {
            let d = depth[(y * dw + x) as usize];
            if d == 0 {
                continue;
            }
            let z = d as f64 * depth_scale;
            let corner = |px: f64, py: f64| -> Option<(i64, i64)> {
                let point = extrinsics.transform([
                    (px - depth_intr.cx) / depth_intr.fx * z,
                    (py - depth_intr.cy) / depth_intr.fy * z,
                    z,
                ]);
                if point[2] <= 0.0 {
                    return None;
                }
                let u = point[0] / point[2] * color_intr.fx + color_intr.cx;
                let v = point[1] / point[2] * color_intr.fy + color_intr.cy;
                Some(((u + 0.5).floor() as i64, (v + 0.5).floor() as i64))
            };
            let (Some((u0, v0)), Some((u1, v1))) = (
                corner(x as f64 - 0.5, y as f64 - 0.5),
                corner(x as f64 + 0.5, y as f64 + 0.5),
            ) else {
                continue;
            };
            // Footprints reaching outside the color image are dropped whole.
            if u0 < 0 || v0 < 0 || u1 >= cw as i64 || v1 >= ch as i64 {
                continue;
            }
            for v in v0..=v1 {
                for u in u0..=u1 {
                    let cell = &mut out[(v * cw as i64 + u) as usize];
                    if *cell == 0 || d < *cell {
                        *cell = d;
                    }
                }
            }
        }
    }
    out
}
