//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use image::{Rgba, RgbaImage};
use photofx::{FilterCatalog, Frame, MemoryStore};

/// Frame with a horizontal red ramp and a vertical green ramp.
pub fn gradient(width: u32, height: u32) -> Frame {
    let (w, h) = (width.saturating_sub(1).max(1), height.saturating_sub(1).max(1));
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / w) as u8,
            (y * 255 / h) as u8,
            96,
            255,
        ])
    })
}

/// Frame filled with one colour.
pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Frame {
    RgbaImage::from_pixel(width, height, Rgba(rgba))
}

/// Catalog over the two-category scenario baseline, backed by memory.
pub fn scenario_catalog() -> FilterCatalog {
    builders::CatalogBuilder::new()
        .baseline(builders::scenario_baseline())
        .store(MemoryStore::new())
        .build()
}

/// Assert two frames differ in at least one pixel
pub fn assert_frames_differ(a: &Frame, b: &Frame) {
    assert_eq!(a.dimensions(), b.dimensions(), "frames differ in size");
    assert!(
        a.pixels().zip(b.pixels()).any(|(p, q)| p != q),
        "Expected frames to differ"
    );
}
