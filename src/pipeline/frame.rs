//! Frame type and the small pixel helpers shared by the leaf operations.

use image::{imageops, Rgba, RgbaImage};

/// One decoded frame flowing through the render graph.
pub type Frame = RgbaImage;

/// Create a frame filled with a single colour.
pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Frame {
    RgbaImage::from_pixel(width, height, Rgba(rgba))
}

/// Resize `frame` to match `like` when their dimensions differ.
///
/// Blend side inputs are scaled to the primary frame, the same way a blend
/// image is fitted to the sample image before compositing.
pub fn fit_to(frame: &Frame, like: &Frame) -> Option<Frame> {
    if frame.dimensions() == like.dimensions() {
        None
    } else {
        Some(imageops::resize(
            frame,
            like.width(),
            like.height(),
            imageops::FilterType::Triangle,
        ))
    }
}

/// Convert a pixel to normalized floating point channels.
#[inline]
pub fn to_unit(px: &Rgba<u8>) -> [f32; 4] {
    [
        px[0] as f32 / 255.0,
        px[1] as f32 / 255.0,
        px[2] as f32 / 255.0,
        px[3] as f32 / 255.0,
    ]
}

/// Convert normalized channels back to a pixel, clamping to [0, 1].
#[inline]
pub fn from_unit(c: [f32; 4]) -> Rgba<u8> {
    Rgba([
        quantize(c[0]),
        quantize(c[1]),
        quantize(c[2]),
        quantize(c[3]),
    ])
}

#[inline]
fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Rec. 709 luma of a normalized colour.
#[inline]
pub fn luminance(c: [f32; 4]) -> f32 {
    0.2125 * c[0] + 0.7154 * c[1] + 0.0721 * c[2]
}

/// Map every pixel through `f`, keeping dimensions.
pub fn map_pixels<F>(input: &Frame, mut f: F) -> Frame
where
    F: FnMut(u32, u32, [f32; 4]) -> [f32; 4],
{
    let mut out = input.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        *px = from_unit(f(x, y, to_unit(px)));
    }
    out
}
