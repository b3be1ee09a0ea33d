//! Conversion of network output into flat RGBA frames, and the seam through
//! which frames leave the core.

use anyhow::Result;
use image::RgbaImage;

use crate::error::{CppnError, CppnResult};
use crate::forward::OutputTensor;

pub const BYTES_PER_PIXEL: usize = 4;
const OPAQUE: u8 = 255;

/// Row-major RGBA bytes for a square frame. Alpha is always opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> CppnResult<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(CppnError::ShapeMismatch {
                context: "pixel buffer",
                expected: (expected, 1),
                actual: (data.len(), 1),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn rgba(&self, row: u32, col: u32) -> [u8; 4] {
        let offset = (row as usize * self.width as usize + col as usize) * BYTES_PER_PIXEL;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]
    }

    pub fn to_image(&self) -> CppnResult<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.clone()).ok_or(
            CppnError::ShapeMismatch {
                context: "rgba image",
                expected: (self.width as usize, self.height as usize),
                actual: (self.data.len() / BYTES_PER_PIXEL, 1),
            },
        )
    }
}

/// Writes every pixel once, in the tensor's row-major order.
pub fn render(output: &OutputTensor) -> PixelBuffer {
    let size = output.resolution() as u32;
    let values = output.values();
    let mut data = Vec::with_capacity(values.nrows() * BYTES_PER_PIXEL);
    for pixel in values.rows() {
        data.push(channel_byte(pixel[0]));
        data.push(channel_byte(pixel[1]));
        data.push(channel_byte(pixel[2]));
        data.push(OPAQUE);
    }
    PixelBuffer {
        width: size,
        height: size,
        data,
    }
}

/// `[0, 1]` to a byte, clamped so rounding at the ends cannot wrap. NaN maps to 0.
#[inline(always)]
fn channel_byte(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Anything that can show or store a rendered frame. The core hands each frame
/// over and does not keep it.
pub trait DisplaySurface {
    fn present(&mut self, frame: &PixelBuffer) -> Result<()>;

    fn label(&self) -> &'static str {
        "surface"
    }
}

impl<S: DisplaySurface + ?Sized> DisplaySurface for Box<S> {
    fn present(&mut self, frame: &PixelBuffer) -> Result<()> {
        (**self).present(frame)
    }

    fn label(&self) -> &'static str {
        (**self).label()
    }
}
