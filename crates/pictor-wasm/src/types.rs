//! WASM-compatible wrapper types for rendered surfaces.
//!
//! This module provides JavaScript-friendly types that wrap the core pictor
//! types, handling the conversion between Rust and JavaScript data representations.

use pictor_core::render::RenderedSurface;
use pictor_core::SurfaceFormat;
use wasm_bindgen::prelude::*;

/// A rendered ARGB surface for JavaScript.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is made
/// to JavaScript memory as a `Uint8Array`.
#[wasm_bindgen]
pub struct JsSurface {
    width: u32,
    height: u32,
    stride: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsSurface {
    /// Get the surface width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the surface height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes between the starts of consecutive rows
    #[wasm_bindgen(getter)]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Get the number of bytes in the pixel buffer (stride * height)
    #[wasm_bindgen(getter, js_name = byteLength)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns B, G, R, A pixel data as Uint8Array (a copy).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsSurface {
    pub(crate) fn from_rendered(surface: RenderedSurface) -> Self {
        Self {
            width: surface.width,
            height: surface.height,
            stride: surface.stride as u32,
            pixels: surface.pixels,
        }
    }
}

/// Convert a u8 surface format value to the core SurfaceFormat enum.
///
/// Values:
/// - 0 = Argb32 (the only format the pipeline renders and encodes)
/// - 1 = Rgb24
/// - 2 = Alpha8
///
/// Any other value is `None`.
pub(crate) fn surface_format_from_u8(value: u8) -> Option<SurfaceFormat> {
    match value {
        0 => Some(SurfaceFormat::Argb32),
        1 => Some(SurfaceFormat::Rgb24),
        2 => Some(SurfaceFormat::Alpha8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rendered() {
        let surface = RenderedSurface {
            width: 20,
            height: 10,
            stride: 80,
            pixels: vec![0u8; 800],
        };
        let js = JsSurface::from_rendered(surface);
        assert_eq!(js.width(), 20);
        assert_eq!(js.height(), 10);
        assert_eq!(js.stride(), 80);
        assert_eq!(js.byte_length(), 800);
    }

    #[test]
    fn test_pixels_are_copied() {
        let js = JsSurface::from_rendered(RenderedSurface {
            width: 1,
            height: 1,
            stride: 4,
            pixels: vec![1, 2, 3, 4],
        });
        assert_eq!(js.pixels(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_surface_format_from_u8() {
        assert_eq!(surface_format_from_u8(0), Some(SurfaceFormat::Argb32));
        assert_eq!(surface_format_from_u8(1), Some(SurfaceFormat::Rgb24));
        assert_eq!(surface_format_from_u8(2), Some(SurfaceFormat::Alpha8));
        assert_eq!(surface_format_from_u8(3), None);
        assert_eq!(surface_format_from_u8(255), None);
    }
}
