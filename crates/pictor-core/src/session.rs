//! Caller-facing image session.
//!
//! An [`ImageSession`] holds at most one decoded image and at most one encoded
//! thumbnail. Operations report plain success or failure; the reason is
//! logged through the `log` facade with the operation and destination.

use crate::config::{ConfigError, PipelineConfig};
use crate::decode::{decode_image, DecodedImage};
use crate::encode::{encode_thumbnail, OutputBuffer, ThumbnailRequest};
use crate::pixel::SurfaceFormat;
use crate::render::{render_into, render_to_surface, RenderRequest, RenderedSurface};

/// One decoded image plus one thumbnail buffer.
#[derive(Debug, Default)]
pub struct ImageSession {
    config: PipelineConfig,
    image: Option<DecodedImage>,
    thumbnail: Option<OutputBuffer>,
}

impl ImageSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with custom settings.
    pub fn with_config(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Decode `bytes` and keep the result.
    ///
    /// The size hints are advisory. On failure the previously loaded image,
    /// if any, is kept.
    pub fn load_from_memory(
        &mut self,
        bytes: &[u8],
        mime_type: &str,
        width_hint: u32,
        height_hint: u32,
    ) -> bool {
        log::trace!(
            "loading {} bytes as {:?} (hint {}x{})",
            bytes.len(),
            mime_type,
            width_hint,
            height_hint
        );

        match decode_image(bytes, mime_type, &self.config) {
            Ok(image) => {
                self.image = Some(image);
                true
            }
            Err(e) => {
                log::error!("load_from_memory({}): {}", mime_type, e);
                false
            }
        }
    }

    /// Render the loaded image into `pixels`, fitting `width` x `height`.
    pub fn decode_into(
        &mut self,
        pixels: &mut [u8],
        width: u32,
        height: u32,
        pitch: u32,
        format: SurfaceFormat,
    ) -> bool {
        let Some(image) = self.image.as_mut() else {
            log::error!("decode_into: no image loaded");
            return false;
        };

        let request = RenderRequest {
            pixels,
            width,
            height,
            pitch,
            format,
        };
        match render_into(image, request, self.config.scale_filter) {
            Ok(_) => true,
            Err(e) => {
                log::error!("decode_into({}x{}, pitch {}): {}", width, height, pitch, e);
                false
            }
        }
    }

    /// Render the loaded image into a new surface fitting `max_width` x `max_height`.
    pub fn render_to_surface(&mut self, max_width: u32, max_height: u32) -> Option<RenderedSurface> {
        let Some(image) = self.image.as_mut() else {
            log::error!("render_to_surface: no image loaded");
            return None;
        };

        render_to_surface(image, max_width, max_height, self.config.scale_filter)
            .map_err(|e| log::error!("render_to_surface({}x{}): {}", max_width, max_height, e))
            .ok()
    }

    /// Encode an ARGB surface and hold the result until the next call or release.
    ///
    /// Any thumbnail from a previous call is freed first, whether or not this
    /// one succeeds.
    #[allow(clippy::too_many_arguments)]
    pub fn create_thumbnail(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: SurfaceFormat,
        pitch: u32,
        mime_type: &str,
        dest_file: &str,
    ) -> Option<&[u8]> {
        self.release_thumbnail_buffer();

        let request = ThumbnailRequest {
            pixels,
            width,
            height,
            pitch,
            format,
            mime_type,
            dest_file,
        };
        match encode_thumbnail(&request, &self.config) {
            Ok(buffer) => Some(self.thumbnail.insert(buffer).as_bytes()),
            Err(e) => {
                log::error!("Could not create thumbnail {}: {}", dest_file, e);
                None
            }
        }
    }

    /// The currently held thumbnail bytes.
    pub fn thumbnail(&self) -> Option<&[u8]> {
        self.thumbnail.as_ref().map(OutputBuffer::as_bytes)
    }

    /// Free the held thumbnail. Safe to call repeatedly.
    pub fn release_thumbnail_buffer(&mut self) {
        if let Some(mut buffer) = self.thumbnail.take() {
            buffer.release();
        }
    }

    pub fn image(&self) -> Option<&DecodedImage> {
        self.image.as_ref()
    }

    /// Width of the last render, or of the decode before any render; 0 when empty.
    pub fn width(&self) -> u32 {
        self.image.as_ref().map_or(0, |image| image.width)
    }

    pub fn height(&self) -> u32 {
        self.image.as_ref().map_or(0, |image| image.height)
    }

    pub fn original_width(&self) -> u32 {
        self.image.as_ref().map_or(0, |image| image.original_width)
    }

    pub fn original_height(&self) -> u32 {
        self.image.as_ref().map_or(0, |image| image.original_height)
    }

    pub fn has_alpha(&self) -> bool {
        self.image.as_ref().is_some_and(|image| image.has_alpha)
    }

    /// EXIF orientation 0..=8; 0 when unknown or nothing is loaded.
    pub fn orientation(&self) -> u8 {
        self.image.as_ref().map_or(0, |image| image.orientation.value())
    }
}
