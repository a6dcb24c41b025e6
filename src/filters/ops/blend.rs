//! Two-input compositing and the opacity adjunct.

use crate::filters::param::ParamValue;
use crate::pipeline::frame::{fit_to, map_pixels, to_unit, Frame};

/// How the overlay colour combines with the base colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    Add,
    Multiply,
    Screen,
    Overlay,
    Difference,
    Darken,
    Lighten,
    Subtract,
    /// Fixed-ratio mix controlled by the `mix` parameter.
    Dissolve,
    /// Like `Dissolve`, but the mix is scaled by the overlay alpha.
    Alpha,
}

impl BlendMode {
    fn combine(self, base: f32, overlay: f32, mix: f32) -> f32 {
        match self {
            BlendMode::Normal => overlay,
            BlendMode::Add => base + overlay,
            BlendMode::Multiply => base * overlay,
            BlendMode::Screen => 1.0 - (1.0 - base) * (1.0 - overlay),
            BlendMode::Overlay => {
                if base < 0.5 {
                    2.0 * base * overlay
                } else {
                    1.0 - 2.0 * (1.0 - base) * (1.0 - overlay)
                }
            }
            BlendMode::Difference => (base - overlay).abs(),
            BlendMode::Darken => base.min(overlay),
            BlendMode::Lighten => base.max(overlay),
            BlendMode::Subtract => base - overlay,
            BlendMode::Dissolve | BlendMode::Alpha => base + (overlay - base) * mix,
        }
    }
}

/// Composites the secondary (overlay) frame onto the primary (base) frame.
///
/// The blended colour is applied in proportion to the overlay alpha, so an
/// overlay that went through the opacity adjunct shows the base through it.
/// The base alpha is kept.
#[derive(Debug, Clone)]
pub struct BlendOp {
    mode: BlendMode,
    mix: f32,
}

impl BlendOp {
    pub fn new(mode: BlendMode) -> Self {
        Self { mode, mix: 0.5 }
    }

    pub fn mode(&self) -> BlendMode {
        self.mode
    }

    pub fn name(&self) -> &str {
        match self.mode {
            BlendMode::Normal => "NormalBlend",
            BlendMode::Add => "AddBlend",
            BlendMode::Multiply => "MultiplyBlend",
            BlendMode::Screen => "ScreenBlend",
            BlendMode::Overlay => "OverlayBlend",
            BlendMode::Difference => "DifferenceBlend",
            BlendMode::Darken => "DarkenBlend",
            BlendMode::Lighten => "LightenBlend",
            BlendMode::Subtract => "SubtractBlend",
            BlendMode::Dissolve => "DissolveBlend",
            BlendMode::Alpha => "AlphaBlend",
        }
    }

    pub fn apply(&self, base: &Frame, overlay: &Frame) -> Frame {
        let fitted = fit_to(overlay, base);
        let overlay = fitted.as_ref().unwrap_or(overlay);
        let mode = self.mode;
        let mix = self.mix;
        map_pixels(base, |x, y, b| {
            let o = to_unit(overlay.get_pixel(x, y));
            let coverage = match mode {
                BlendMode::Dissolve => 1.0,
                _ => o[3],
            };
            let mut out = b;
            for ch in 0..3 {
                let blended = mode.combine(b[ch], o[ch], mix);
                out[ch] = b[ch] + (blended - b[ch]) * coverage;
            }
            out
        })
    }

    pub fn set_parameter(&mut self, name: &str, value: &ParamValue) {
        if name == "mix" {
            if let Some(v) = value.as_float() {
                self.mix = v;
            }
        }
    }
}

/// Scales frame alpha. Used as the adjunct on the blend side input.
#[derive(Debug, Clone)]
pub struct OpacityOp {
    opacity: f32,
}

impl OpacityOp {
    pub fn new(opacity: f32) -> Self {
        Self { opacity }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn name(&self) -> &str {
        "OpacityAdjustment"
    }

    pub fn apply(&self, input: &Frame) -> Frame {
        let k = self.opacity;
        map_pixels(input, |_, _, c| [c[0], c[1], c[2], c[3] * k])
    }

    pub fn set_parameter(&mut self, name: &str, value: &ParamValue) {
        if name == "opacity" {
            if let Some(v) = value.as_float() {
                self.opacity = v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::frame::solid;
    use image::Rgba;

    #[test]
    fn test_normal_blend_respects_overlay_alpha() {
        let base = solid(2, 2, [255, 0, 0, 255]);
        let overlay = solid(2, 2, [0, 0, 255, 204]);
        let out = BlendOp::new(BlendMode::Normal).apply(&base, &overlay);
        assert_eq!(out.get_pixel(0, 0), &Rgba([51, 0, 204, 255]));
    }

    #[test]
    fn test_blend_is_order_sensitive() {
        let red = solid(1, 1, [255, 0, 0, 204]);
        let blue = solid(1, 1, [0, 0, 255, 204]);
        let op = BlendOp::new(BlendMode::Normal);
        assert_ne!(op.apply(&red, &blue), op.apply(&blue, &red));
    }

    #[test]
    fn test_multiply_with_white_is_identity() {
        let base = solid(1, 1, [120, 60, 30, 255]);
        let white = solid(1, 1, [255, 255, 255, 255]);
        let out = BlendOp::new(BlendMode::Multiply).apply(&base, &white);
        assert_eq!(out, base);
    }

    #[test]
    fn test_overlay_resized_to_base() {
        let base = solid(4, 4, [0, 0, 0, 255]);
        let overlay = solid(2, 2, [255, 255, 255, 255]);
        let out = BlendOp::new(BlendMode::Add).apply(&base, &overlay);
        assert_eq!(out.dimensions(), (4, 4));
        assert_eq!(out.get_pixel(3, 3), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_dissolve_mix_parameter() {
        let base = solid(1, 1, [0, 0, 0, 255]);
        let overlay = solid(1, 1, [200, 200, 200, 0]);
        let mut op = BlendOp::new(BlendMode::Dissolve);
        op.set_parameter("mix", &ParamValue::Float(1.0));
        assert_eq!(op.apply(&base, &overlay).get_pixel(0, 0), &Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn test_opacity_scales_alpha() {
        let out = OpacityOp::new(0.8).apply(&solid(1, 1, [10, 20, 30, 255]));
        assert_eq!(out.get_pixel(0, 0), &Rgba([10, 20, 30, 204]));
    }
}
