//! Rendering a decoded frame into a 32-bit ARGB surface.
//!
//! The output is the largest size that fits the requested bounding box while
//! keeping the decoded aspect ratio. When the caller's buffer has exactly the
//! stride the scaler would produce, the scaler writes straight into it;
//! otherwise a temporary surface is scaled into and copied row by row.

use thiserror::Error;

use crate::decode::DecodedImage;
use crate::pixel::{alloc_picture, ColorRange, PixelFormat, SurfaceFormat};
use crate::scale::{FilterType, PlaneMut, ScaleContext, ScaleError};

/// Bytes per output pixel.
const OUTPUT_BPP: usize = 4;

/// Errors raised while rendering.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// There is no decoded frame, or it has no pixels.
    #[error("No decoded frame to render")]
    EmptySource,

    /// Only [`SurfaceFormat::Argb32`] output is supported.
    #[error("Output format {0:?} is not supported")]
    UnsupportedOutputFormat(SurfaceFormat),

    /// The scale/convert context rejected the conversion.
    #[error("Could not set up scaling: {0}")]
    ScaleSetupFailed(#[from] ScaleError),

    /// The destination pitch and height do not describe the caller's buffer.
    #[error("Invalid copy bounds: pitch {pitch} x height {height} does not fit {len} bytes")]
    CopyBoundsInvalid { pitch: u32, height: u32, len: usize },

    /// The temporary surface could not be allocated.
    #[error("Could not allocate temp buffer of {0} bytes")]
    AllocationFailed(usize),
}

/// A caller-owned destination for [`render_into`].
#[derive(Debug)]
pub struct RenderRequest<'a> {
    /// Destination pixels, at least `pitch * height` bytes.
    pub pixels: &'a mut [u8],
    /// Bounding box width.
    pub width: u32,
    /// Bounding box height.
    pub height: u32,
    /// Bytes between the starts of consecutive destination rows.
    pub pitch: u32,
    /// Destination layout; must be `Argb32`.
    pub format: SurfaceFormat,
}

/// Geometry actually written by a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedGeometry {
    pub width: u32,
    pub height: u32,
    /// Stride the scaler produced for this width.
    pub stride: usize,
    /// The scaler wrote directly into the caller's buffer.
    pub zero_copy: bool,
}

/// A rendered surface owned by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSurface {
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    /// ARGB32 pixels, `stride * height` bytes.
    pub pixels: Vec<u8>,
}

/// Calculate the largest size within `max_width` x `max_height` that keeps
/// the aspect ratio of `width` x `height`.
///
/// The height is clamped first; the width is clamped second if it still does
/// not fit. Sizes are never enlarged. Rounding is `(x + 0.5)` truncation.
pub fn fit_geometry(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let ratio = width as f32 / height as f32;
    let (mut new_width, mut new_height) = (width, height);

    if new_height > max_height {
        new_height = max_height;
        new_width = (new_height as f32 * ratio + 0.5) as u32;
    }
    if new_width > max_width {
        new_width = max_width;
        new_height = (new_width as f32 / ratio + 0.5) as u32;
    }

    (new_width, new_height)
}

/// Render `image` into the caller's buffer.
///
/// On success the image's `width`/`height` are updated to the rendered
/// geometry; the original geometry is untouched.
pub fn render_into(
    image: &mut DecodedImage,
    request: RenderRequest<'_>,
    filter: FilterType,
) -> Result<RenderedGeometry, RenderError> {
    if image.is_empty() {
        log::error!("decoded frame not allocated");
        return Err(RenderError::EmptySource);
    }
    if request.format != SurfaceFormat::Argb32 {
        return Err(RenderError::UnsupportedOutputFormat(request.format));
    }

    let pitch = request.pitch as usize;
    let pixels_size = pitch.checked_mul(request.height as usize);
    let bounds_invalid = RenderError::CopyBoundsInvalid {
        pitch: request.pitch,
        height: request.height,
        len: request.pixels.len(),
    };
    let pixels_size = match pixels_size {
        Some(size) if pitch > 0 && size <= request.pixels.len() => size,
        _ => return Err(bounds_invalid),
    };

    let (width, height) = fit_geometry(
        image.original_width,
        image.original_height,
        request.width,
        request.height,
    );
    let context = scale_context(image, width, height, filter)?;
    let src = image.frame.plane_refs();

    let stride = width as usize * OUTPUT_BPP;
    let zero_copy = request.pixels.len() == pixels_size && pitch == stride;

    if zero_copy {
        let mut dst = [PlaneMut {
            data: request.pixels,
            stride: pitch,
        }];
        context.scale(&src, &mut dst)?;
    } else {
        let temp_size = stride * height as usize;
        let mut temp = alloc_picture(temp_size).ok_or(RenderError::AllocationFailed(temp_size))?;
        {
            let mut dst = [PlaneMut {
                data: &mut temp,
                stride,
            }];
            context.scale(&src, &mut dst)?;
        }

        let row_bytes = pitch.min(stride);
        for (src_row, dst_row) in temp
            .chunks_exact(stride)
            .zip(request.pixels.chunks_mut(pitch))
        {
            dst_row[..row_bytes].copy_from_slice(&src_row[..row_bytes]);
        }
    }

    // original dimensions are kept
    image.width = width;
    image.height = height;

    Ok(RenderedGeometry {
        width,
        height,
        stride,
        zero_copy,
    })
}

/// Render `image` into a freshly allocated surface fitting `max_width` x
/// `max_height`.
pub fn render_to_surface(
    image: &mut DecodedImage,
    max_width: u32,
    max_height: u32,
    filter: FilterType,
) -> Result<RenderedSurface, RenderError> {
    let (width, height) = fit_geometry(
        image.original_width,
        image.original_height,
        max_width,
        max_height,
    );
    let stride = width as usize * OUTPUT_BPP;
    let size = stride * height as usize;
    let mut pixels = alloc_picture(size).ok_or(RenderError::AllocationFailed(size))?;

    let geometry = render_into(
        image,
        RenderRequest {
            pixels: &mut pixels,
            width,
            height,
            pitch: stride as u32,
            format: SurfaceFormat::Argb32,
        },
        filter,
    )?;

    Ok(RenderedSurface {
        width: geometry.width,
        height: geometry.height,
        stride: geometry.stride,
        pixels,
    })
}

/// Set up the frame-to-ARGB context.
///
/// Full-range tagged YUV is handed over as its canonical format. If the frame
/// says it is full range, only the source range flag is forced on; the
/// destination keeps the scaler default.
fn scale_context(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<ScaleContext, RenderError> {
    let mut context = ScaleContext::new(
        image.frame.format.canonical(),
        image.original_width,
        image.original_height,
        PixelFormat::Bgra,
        width,
        height,
        filter,
    )
    .map_err(|e| {
        log::error!(
            "Could not set up scaling {}x{} -> {}x{}: {}",
            image.original_width,
            image.original_height,
            width,
            height,
            e
        );
        RenderError::ScaleSetupFailed(e)
    })?;

    if image.frame.color_range == ColorRange::Full {
        let mut details = context.colorspace_details();
        details.src_full_range = true;
        context.set_colorspace_details(details);
    }

    Ok(context)
}
