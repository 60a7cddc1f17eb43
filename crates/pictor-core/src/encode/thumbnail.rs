//! ARGB surface to thumbnail packet.
//!
//! The surface is converted to the codec's input format at the same geometry
//! and encoded as a single frame. The packet lands in a buffer sized for one
//! uncompressed picture of the target format; a packet that does not fit is
//! reported as an encode failure.

use super::buffer::OutputBuffer;
use super::codec::{
    scale_failed, EncodeError, EncoderContext, EncoderParams, FrameView, ThumbnailCodec,
};
use crate::config::PipelineConfig;
use crate::pixel::{alloc_picture, PixelFormat, SurfaceFormat};
use crate::scale::{split_planes, split_planes_mut, PlaneRef, ScaleContext};

/// A raw surface to encode.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailRequest<'a> {
    /// Surface pixels, rows `pitch` bytes apart.
    pub pixels: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
    pub format: SurfaceFormat,
    /// Output MIME type: `image/jpeg`, `image/jpg` or `image/png`.
    pub mime_type: &'a str,
    /// Where the caller intends to store the result. Only used in diagnostics.
    pub dest_file: &'a str,
}

/// Encode a 32-bit ARGB surface as a JPEG or PNG thumbnail.
///
/// # Errors
///
/// * `UnsupportedInputFormat` if the surface is not `Argb32`
/// * `UnsupportedOutputFormat` if the MIME type is not JPEG or PNG
/// * `InvalidSurface` for zero geometry or pixel data shorter than the pitch requires
/// * `AllocationFailed` if the picture buffers cannot be allocated
/// * `EncodeFailed` if no packet was produced or it does not fit
///
/// # Example
///
/// ```ignore
/// use pictor_core::encode::{encode_thumbnail, ThumbnailRequest};
/// use pictor_core::pixel::SurfaceFormat;
/// use pictor_core::PipelineConfig;
///
/// let pixels = vec![128u8; 64 * 64 * 4];
/// let request = ThumbnailRequest {
///     pixels: &pixels,
///     width: 64,
///     height: 64,
///     pitch: 256,
///     format: SurfaceFormat::Argb32,
///     mime_type: "image/jpeg",
///     dest_file: "thumb.jpg",
/// };
/// let thumb = encode_thumbnail(&request, &PipelineConfig::default()).unwrap();
/// assert_eq!(&thumb.as_bytes()[..2], &[0xFF, 0xD8]);
/// ```
pub fn encode_thumbnail(
    request: &ThumbnailRequest<'_>,
    config: &PipelineConfig,
) -> Result<OutputBuffer, EncodeError> {
    if request.format != SurfaceFormat::Argb32 {
        return Err(EncodeError::UnsupportedInputFormat(request.format));
    }
    let codec = ThumbnailCodec::from_mime(request.mime_type)
        .ok_or_else(|| EncodeError::UnsupportedOutputFormat(request.mime_type.to_string()))?;
    check_surface(request)?;

    let (width, height) = (request.width, request.height);
    let params = EncoderParams::thumbnail(
        codec,
        width,
        height,
        config.thumbnail_qmin,
        config.thumbnail_qmax,
    );
    let encoder = EncoderContext::open(params)?;

    let target = codec.target_format();
    let alloc_failed = || EncodeError::AllocationFailed { width, height };
    let size = target.picture_size(width, height).ok_or_else(alloc_failed)?;
    let mut output = alloc_picture(size).ok_or_else(alloc_failed)?;
    let mut scratch = alloc_picture(size).ok_or_else(alloc_failed)?;

    convert_surface(request, codec, config, &mut scratch)?;

    let frame = FrameView {
        format: target,
        width,
        height,
        planes: split_planes(&scratch, target, width, height).map_err(scale_failed)?,
        pts: 1,
        quality: params.global_quality,
    };
    let len = encoder.encode_packet(&frame, &mut output)?;

    log::debug!(
        "encoded {}x{} {} thumbnail for {}: {} of {} bytes",
        width,
        height,
        codec.name(),
        request.dest_file,
        len,
        size
    );

    Ok(OutputBuffer::from_packet(output, len))
}

fn check_surface(request: &ThumbnailRequest<'_>) -> Result<(), EncodeError> {
    let row = request.width as usize * 4;
    let pitch = request.pitch as usize;
    let required = (request.height as usize)
        .checked_sub(1)
        .and_then(|rows| pitch.checked_mul(rows))
        .and_then(|bytes| bytes.checked_add(row));

    match required {
        Some(required) if row > 0 && pitch >= row && request.pixels.len() >= required => Ok(()),
        _ => Err(EncodeError::InvalidSurface {
            width: request.width,
            height: request.height,
            pitch: request.pitch,
            len: request.pixels.len(),
        }),
    }
}

/// Convert the ARGB surface into `scratch` in the codec's input layout.
///
/// For JPEG the destination is written as full range and the source is read
/// as limited; RGB sources are unaffected by the source flag.
fn convert_surface(
    request: &ThumbnailRequest<'_>,
    codec: ThumbnailCodec,
    config: &PipelineConfig,
    scratch: &mut [u8],
) -> Result<(), EncodeError> {
    let (width, height) = (request.width, request.height);
    let dst_format = codec.target_format().canonical();

    let mut context = ScaleContext::new(
        PixelFormat::Bgra,
        width,
        height,
        dst_format,
        width,
        height,
        config.scale_filter,
    )
    .map_err(scale_failed)?;

    if codec == ThumbnailCodec::Mjpeg {
        let mut details = context.colorspace_details();
        details.dst_full_range = true;
        details.src_full_range = false;
        context.set_colorspace_details(details);
    }

    let src = [PlaneRef {
        data: request.pixels,
        stride: request.pitch as usize,
    }];
    let mut dst = split_planes_mut(scratch, dst_format, width, height).map_err(scale_failed)?;
    context.scale(&src, &mut dst).map_err(scale_failed)
}
