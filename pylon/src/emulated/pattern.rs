// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Test image generation.

use super::features::bytes_per_pixel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TestImage {
    /// Diagonal gradient that moves with every frame.
    Moving,
    /// Static horizontal gradient.
    HorizontalRamp,
    /// Static diagonal gradient.
    Diagonal,
    /// 32 pixel checkerboard.
    Checkerboard,
}

impl TestImage {
    pub(crate) fn from_selector(name: &str) -> Self {
        match name {
            "Testimage1" => TestImage::HorizontalRamp,
            "Testimage2" => TestImage::Diagonal,
            "Testimage3" => TestImage::Checkerboard,
            _ => TestImage::Moving,
        }
    }

    fn luma(&self, x: usize, y: usize, frame: u64) -> u8 {
        match self {
            TestImage::Moving => ((x + y) as u64).wrapping_add(frame) as u8,
            TestImage::HorizontalRamp => x as u8,
            TestImage::Diagonal => (x + y) as u8,
            TestImage::Checkerboard => {
                if ((x / 32) + (y / 32)) % 2 == 0 {
                    0xff
                } else {
                    0x00
                }
            }
        }
    }
}

/// Parameters of one generated frame.
#[derive(Debug, Clone)]
pub(crate) struct FrameSpec<'a> {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) pixel_format: &'a str,
    pub(crate) image: TestImage,
    pub(crate) reverse_x: bool,
    /// Linear gain applied to the luma, derived from exposure and gain.
    pub(crate) brightness: f64,
    pub(crate) frame: u64,
}

/// Renders a tightly packed frame, or `None` for an unknown pixel format.
pub(crate) fn render(spec: &FrameSpec<'_>) -> Option<Vec<u8>> {
    let bpp = bytes_per_pixel(spec.pixel_format)?;
    let mut out = vec![0u8; spec.width * spec.height * bpp];
    let row_len = spec.width * bpp;
    if row_len == 0 {
        return Some(out);
    }

    for (y, row) in out.chunks_exact_mut(row_len).enumerate() {
        for x in 0..spec.width {
            let sx = if spec.reverse_x {
                spec.width - 1 - x
            } else {
                x
            };
            let v = scale(spec.image.luma(sx, y, spec.frame), spec.brightness);
            let px = &mut row[x * bpp..(x + 1) * bpp];
            match spec.pixel_format {
                "Mono16" => px.copy_from_slice(&(u16::from(v) << 8).to_le_bytes()),
                "RGB8" => px.copy_from_slice(&[v, 255 - v, (sx * 255 / spec.width) as u8]),
                "BGR8" => px.copy_from_slice(&[(sx * 255 / spec.width) as u8, 255 - v, v]),
                // Y0 U Y1 V
                "YCbCr422_8" => {
                    px.copy_from_slice(&[v, 128]);
                }
                // U Y0 V Y1
                "YUV422_8" => {
                    px.copy_from_slice(&[128, v]);
                }
                _ => px[0] = v,
            }
        }
    }
    Some(out)
}

fn scale(v: u8, brightness: f64) -> u8 {
    (f64::from(v) * brightness).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(pixel_format: &str) -> FrameSpec<'_> {
        FrameSpec {
            width: 8,
            height: 2,
            pixel_format,
            image: TestImage::HorizontalRamp,
            reverse_x: false,
            brightness: 1.0,
            frame: 0,
        }
    }

    #[test]
    fn mono8_ramp() {
        let frame = render(&spec("Mono8")).unwrap();
        assert_eq!(frame.len(), 16);
        assert_eq!(&frame[..8], &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(&frame[8..], &[0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn reverse_x_mirrors_rows() {
        let mut s = spec("Mono8");
        s.reverse_x = true;
        let frame = render(&s).unwrap();
        assert_eq!(&frame[..8], &[7, 6, 5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn packed_sizes() {
        assert_eq!(render(&spec("RGB8")).unwrap().len(), 8 * 2 * 3);
        assert_eq!(render(&spec("Mono16")).unwrap().len(), 8 * 2 * 2);
        assert_eq!(render(&spec("YUV422_8")).unwrap().len(), 8 * 2 * 2);
        assert!(render(&spec("Coord3D_ABC32f")).is_none());
    }

    #[test]
    fn brightness_saturates() {
        let mut s = spec("Mono8");
        s.image = TestImage::Checkerboard;
        s.brightness = 4.0;
        let frame = render(&s).unwrap();
        assert!(frame.iter().all(|v| *v == 0xff));
    }

    #[test]
    fn moving_image_changes_between_frames() {
        let mut s = spec("Mono8");
        s.image = TestImage::Moving;
        let first = render(&s).unwrap();
        s.frame = 1;
        let second = render(&s).unwrap();
        assert_ne!(first, second);
    }
}
