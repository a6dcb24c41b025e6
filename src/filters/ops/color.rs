//! Per-pixel colour adjustments.

use crate::filters::param::ParamValue;
use crate::pipeline::frame::{luminance, map_pixels, Frame};

/// The colour adjustments available as leaf operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorAdjust {
    Brightness { brightness: f32 },
    Contrast { contrast: f32 },
    Saturation { saturation: f32 },
    Exposure { exposure: f32 },
    Gamma { gamma: f32 },
    Grayscale,
    Sepia { intensity: f32 },
    Invert,
    Warmth { warmth: f32 },
    /// Hue rotation in degrees.
    Hue { hue: f32 },
    Posterize { levels: i32 },
    Solarize { threshold: f32 },
    LuminanceThreshold { threshold: f32 },
    Monochrome { intensity: f32, color: [f32; 3] },
    Rgb { red: f32, green: f32, blue: f32 },
}

/// A single-input colour operation.
#[derive(Debug, Clone)]
pub struct ColorOp {
    adjust: ColorAdjust,
}

impl ColorOp {
    pub fn new(adjust: ColorAdjust) -> Self {
        Self { adjust }
    }

    pub fn adjust(&self) -> &ColorAdjust {
        &self.adjust
    }

    pub fn name(&self) -> &str {
        match self.adjust {
            ColorAdjust::Brightness { .. } => "Brightness",
            ColorAdjust::Contrast { .. } => "Contrast",
            ColorAdjust::Saturation { .. } => "Saturation",
            ColorAdjust::Exposure { .. } => "Exposure",
            ColorAdjust::Gamma { .. } => "Gamma",
            ColorAdjust::Grayscale => "Grayscale",
            ColorAdjust::Sepia { .. } => "Sepia",
            ColorAdjust::Invert => "ColorInversion",
            ColorAdjust::Warmth { .. } => "Warmth",
            ColorAdjust::Hue { .. } => "Hue",
            ColorAdjust::Posterize { .. } => "Posterize",
            ColorAdjust::Solarize { .. } => "Solarize",
            ColorAdjust::LuminanceThreshold { .. } => "LuminanceThreshold",
            ColorAdjust::Monochrome { .. } => "Monochrome",
            ColorAdjust::Rgb { .. } => "RGB",
        }
    }

    pub fn apply(&self, input: &Frame) -> Frame {
        map_pixels(input, |_, _, c| {
            let [r, g, b] = self.pixel([c[0], c[1], c[2]], luminance(c));
            [r, g, b, c[3]]
        })
    }

    fn pixel(&self, c: [f32; 3], lum: f32) -> [f32; 3] {
        match self.adjust {
            ColorAdjust::Brightness { brightness } => c.map(|v| v + brightness),
            ColorAdjust::Contrast { contrast } => c.map(|v| (v - 0.5) * contrast + 0.5),
            ColorAdjust::Saturation { saturation } => c.map(|v| lum + (v - lum) * saturation),
            ColorAdjust::Exposure { exposure } => {
                let k = 2f32.powf(exposure);
                c.map(|v| v * k)
            }
            ColorAdjust::Gamma { gamma } => c.map(|v| v.max(0.0).powf(gamma)),
            ColorAdjust::Grayscale => [lum; 3],
            ColorAdjust::Sepia { intensity } => {
                let [r, g, b] = c;
                let sepia = [
                    0.393 * r + 0.769 * g + 0.189 * b,
                    0.349 * r + 0.686 * g + 0.168 * b,
                    0.272 * r + 0.534 * g + 0.131 * b,
                ];
                mix3(c, sepia, intensity)
            }
            ColorAdjust::Invert => c.map(|v| 1.0 - v),
            ColorAdjust::Warmth { warmth } => {
                [c[0] * (1.0 + 0.2 * warmth), c[1], c[2] * (1.0 - 0.2 * warmth)]
            }
            ColorAdjust::Hue { hue } => rotate_hue(c, hue),
            ColorAdjust::Posterize { levels } => {
                let n = levels.max(1) as f32;
                c.map(|v| (v * n + 0.5).floor() / n)
            }
            ColorAdjust::Solarize { threshold } => {
                if lum > threshold {
                    c.map(|v| 1.0 - v)
                } else {
                    c
                }
            }
            ColorAdjust::LuminanceThreshold { threshold } => {
                if lum >= threshold {
                    [1.0; 3]
                } else {
                    [0.0; 3]
                }
            }
            ColorAdjust::Monochrome { intensity, color } => {
                mix3(c, color.map(|v| v * lum), intensity)
            }
            ColorAdjust::Rgb { red, green, blue } => [c[0] * red, c[1] * green, c[2] * blue],
        }
    }

    pub fn set_parameter(&mut self, name: &str, value: &ParamValue) {
        match (&mut self.adjust, name) {
            (ColorAdjust::Brightness { brightness }, "brightness") => set_f32(brightness, value),
            (ColorAdjust::Contrast { contrast }, "contrast") => set_f32(contrast, value),
            (ColorAdjust::Saturation { saturation }, "saturation") => set_f32(saturation, value),
            (ColorAdjust::Exposure { exposure }, "exposure") => set_f32(exposure, value),
            (ColorAdjust::Gamma { gamma }, "gamma") => set_f32(gamma, value),
            (ColorAdjust::Sepia { intensity }, "intensity") => set_f32(intensity, value),
            (ColorAdjust::Warmth { warmth }, "warmth") => set_f32(warmth, value),
            (ColorAdjust::Hue { hue }, "hue") => set_f32(hue, value),
            (ColorAdjust::Posterize { levels }, "levels") => {
                if let Some(v) = value.as_int() {
                    *levels = v;
                }
            }
            (ColorAdjust::Solarize { threshold }, "threshold")
            | (ColorAdjust::LuminanceThreshold { threshold }, "threshold") => {
                set_f32(threshold, value)
            }
            (ColorAdjust::Monochrome { intensity, .. }, "intensity") => set_f32(intensity, value),
            (ColorAdjust::Monochrome { color, .. }, "color") => {
                if let Some(c) = value.as_color() {
                    *color = c;
                }
            }
            (ColorAdjust::Rgb { red, .. }, "red") => set_f32(red, value),
            (ColorAdjust::Rgb { green, .. }, "green") => set_f32(green, value),
            (ColorAdjust::Rgb { blue, .. }, "blue") => set_f32(blue, value),
            _ => {}
        }
    }
}

fn set_f32(slot: &mut f32, value: &ParamValue) {
    if let Some(v) = value.as_float() {
        *slot = v;
    }
}

fn mix3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Rotate hue in YIQ space.
fn rotate_hue(c: [f32; 3], degrees: f32) -> [f32; 3] {
    let [r, g, b] = c;
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let i = 0.595_716 * r - 0.274_453 * g - 0.321_263 * b;
    let q = 0.211_456 * r - 0.522_591 * g + 0.311_135 * b;

    let (sin, cos) = degrees.to_radians().sin_cos();
    let i2 = i * cos - q * sin;
    let q2 = i * sin + q * cos;

    [
        y + 0.9563 * i2 + 0.6210 * q2,
        y - 0.2721 * i2 - 0.6474 * q2,
        y - 1.1070 * i2 + 1.7046 * q2,
    ]
}
