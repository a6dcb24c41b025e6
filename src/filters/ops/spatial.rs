//! Position-dependent single-input effects.

use crate::filters::param::ParamValue;
use crate::pipeline::frame::{map_pixels, Frame};

/// Replaces each square block with the colour at its centre.
#[derive(Debug, Clone)]
pub struct PixellateOp {
    block: i32,
}

impl PixellateOp {
    pub fn new(block: i32) -> Self {
        Self { block }
    }

    pub fn name(&self) -> &str {
        "Pixellate"
    }

    pub fn apply(&self, input: &Frame) -> Frame {
        let block = self.block.max(1) as u32;
        let (w, h) = input.dimensions();
        let mut out = input.clone();
        for (x, y, px) in out.enumerate_pixels_mut() {
            let cx = ((x / block) * block + block / 2).min(w - 1);
            let cy = ((y / block) * block + block / 2).min(h - 1);
            *px = *input.get_pixel(cx, cy);
        }
        out
    }

    pub fn set_parameter(&mut self, name: &str, value: &ParamValue) {
        if name == "pixelSize" {
            if let Some(v) = value.as_int() {
                self.block = v;
            }
        }
    }
}

/// Darkens toward the corners between a start and end radius.
#[derive(Debug, Clone)]
pub struct VignetteOp {
    start: f32,
    end: f32,
}

impl VignetteOp {
    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    pub fn name(&self) -> &str {
        "Vignette"
    }

    pub fn apply(&self, input: &Frame) -> Frame {
        let (w, h) = input.dimensions();
        let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
        let norm = (cx * cx + cy * cy).sqrt().max(1.0);
        map_pixels(input, |x, y, c| {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt() / norm;
            let k = 1.0 - smoothstep(self.start, self.end, d);
            [c[0] * k, c[1] * k, c[2] * k, c[3]]
        })
    }

    pub fn set_parameter(&mut self, name: &str, value: &ParamValue) {
        match name {
            "start" => {
                if let Some(v) = value.as_float() {
                    self.start = v;
                }
            }
            "end" => {
                if let Some(v) = value.as_float() {
                    self.end = v;
                }
            }
            _ => {}
        }
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
