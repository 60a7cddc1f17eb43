//! Image session WASM bindings.
//!
//! This module exposes the pictor-core `ImageSession` to JavaScript. Methods
//! return `true`/`false` or `undefined` on failure; the reason goes to the
//! `log` facade.
//!
//! # Example
//!
//! ```typescript
//! import { JsImageSession } from '@pictor/wasm';
//!
//! const session = new JsImageSession();
//! if (session.loadFromMemory(bytes, 'image/jpeg', 0, 0)) {
//!   const pixels = new Uint8Array(256 * 256 * 4);
//!   session.decodeInto(pixels, 256, 256, 256 * 4, 0);
//!   console.log(`Rendered ${session.width}x${session.height}`);
//! }
//! ```

use pictor_core::ImageSession;
use wasm_bindgen::prelude::*;

use crate::types::{surface_format_from_u8, JsSurface};

/// A decode/render/thumbnail session for JavaScript.
#[wasm_bindgen]
#[derive(Default)]
pub struct JsImageSession {
    inner: ImageSession,
}

#[wasm_bindgen]
impl JsImageSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsImageSession {
        JsImageSession {
            inner: ImageSession::new(),
        }
    }

    /// Decode an image held in `bytes`. The size hints are advisory.
    #[wasm_bindgen(js_name = loadFromMemory)]
    pub fn load_from_memory(
        &mut self,
        bytes: &[u8],
        mime_type: &str,
        width_hint: u32,
        height_hint: u32,
    ) -> bool {
        self.inner
            .load_from_memory(bytes, mime_type, width_hint, height_hint)
    }

    /// Render the loaded image into `pixels`, fitting `width` x `height`.
    ///
    /// `format` is 0 for 32-bit ARGB, the only supported layout.
    #[wasm_bindgen(js_name = decodeInto)]
    pub fn decode_into(
        &mut self,
        pixels: &mut [u8],
        width: u32,
        height: u32,
        pitch: u32,
        format: u8,
    ) -> bool {
        match surface_format_from_u8(format) {
            Some(format) => self.inner.decode_into(pixels, width, height, pitch, format),
            None => false,
        }
    }

    /// Render the loaded image into a new surface fitting `max_width` x `max_height`.
    #[wasm_bindgen(js_name = renderToSurface)]
    pub fn render_to_surface(&mut self, max_width: u32, max_height: u32) -> Option<JsSurface> {
        self.inner
            .render_to_surface(max_width, max_height)
            .map(JsSurface::from_rendered)
    }

    /// Encode an ARGB surface as `image/jpeg` or `image/png`.
    ///
    /// Returns a copy of the encoded bytes; the session keeps its own until
    /// `releaseThumbnailBuffer` or the next call.
    #[wasm_bindgen(js_name = createThumbnail)]
    #[allow(clippy::too_many_arguments)]
    pub fn create_thumbnail(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: u8,
        pitch: u32,
        mime_type: &str,
        dest_file: &str,
    ) -> Option<Vec<u8>> {
        let format = surface_format_from_u8(format)?;
        self.inner
            .create_thumbnail(pixels, width, height, format, pitch, mime_type, dest_file)
            .map(<[u8]>::to_vec)
    }

    #[wasm_bindgen(js_name = releaseThumbnailBuffer)]
    pub fn release_thumbnail_buffer(&mut self) {
        self.inner.release_thumbnail_buffer();
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    #[wasm_bindgen(getter, js_name = originalWidth)]
    pub fn original_width(&self) -> u32 {
        self.inner.original_width()
    }

    #[wasm_bindgen(getter, js_name = originalHeight)]
    pub fn original_height(&self) -> u32 {
        self.inner.original_height()
    }

    #[wasm_bindgen(getter, js_name = hasAlpha)]
    pub fn has_alpha(&self) -> bool {
        self.inner.has_alpha()
    }

    /// EXIF orientation 0..=8
    #[wasm_bindgen(getter)]
    pub fn orientation(&self) -> u8 {
        self.inner.orientation()
    }
}
