//! Single-frame decode from an in-memory buffer.

use std::io::BufReader;

use image::error::ImageError;
use image::{DynamicImage, ImageDecoder, ImageReader, Limits};

use super::metadata::read_orientation;
use super::{DecodeError, DecodedImage, Frame, Plane};
use crate::config::PipelineConfig;
use crate::pixel::{ColorRange, PixelFormat};
use crate::sniff::{sniff, SourceFormat, SNIFF_LEN};
use crate::stream::{BoundedMemoryStream, Whence};

/// Decode the first frame of `bytes`.
///
/// The format is taken from the magic bytes, falling back to `mime_type`.
/// Everything opened along the way (stream, reader, decoder) is dropped before
/// returning, whether the decode succeeded or not.
///
/// # Errors
///
/// * `UnsupportedFormat` if neither bytes nor MIME type name a known format
/// * `DecoderOpenFailed` if the container cannot be opened as that format
/// * `NoFrameDecoded` if the container opened but produced no frame
/// * `AllocationFailed` if the image exceeds the configured limits
pub fn decode_image(
    bytes: &[u8],
    mime_type: &str,
    config: &PipelineConfig,
) -> Result<DecodedImage, DecodeError> {
    let source_format = sniff(&bytes[..bytes.len().min(SNIFF_LEN)], mime_type);
    if source_format == SourceFormat::Unknown {
        return Err(DecodeError::UnsupportedFormat(mime_type.to_string()));
    }

    let mut stream = BoundedMemoryStream::new(bytes);

    let orientation = read_orientation(&mut BufReader::with_capacity(
        config.io_buffer_size,
        &mut stream,
    ));
    rewind(&mut stream)?;

    let image_format = source_format.image_format().ok_or_else(|| {
        DecodeError::DecoderOpenFailed(format!("no decoder available for {:?}", source_format))
    })?;

    let mut reader = ImageReader::with_format(
        BufReader::with_capacity(config.io_buffer_size, &mut stream),
        image_format,
    );
    reader.limits(decode_limits(config));

    let decoder = reader.into_decoder().map_err(|e| match e {
        ImageError::Limits(e) => DecodeError::AllocationFailed(e.to_string()),
        e => DecodeError::DecoderOpenFailed(e.to_string()),
    })?;

    let (width, height) = decoder.dimensions();
    let pixels = width as u64 * height as u64;
    if pixels > config.max_decoded_pixels {
        return Err(DecodeError::AllocationFailed(format!(
            "{}x{} exceeds {} pixels",
            width, height, config.max_decoded_pixels
        )));
    }

    let image = DynamicImage::from_decoder(decoder).map_err(|e| {
        log::debug!("Error while decoding {:?} frame: {}", source_format, e);
        match e {
            ImageError::Limits(e) => DecodeError::AllocationFailed(e.to_string()),
            e => DecodeError::NoFrameDecoded(e.to_string()),
        }
    })?;

    let range = match source_format {
        SourceFormat::Jpeg => ColorRange::Full,
        _ => ColorRange::Unspecified,
    };
    let frame = frame_from_image(image, range);
    if !frame.is_populated() {
        return Err(DecodeError::NoFrameDecoded("empty frame".to_string()));
    }

    log::debug!(
        "decoded {:?} {}x{} as {:?} (orientation {})",
        source_format,
        frame.width,
        frame.height,
        frame.format,
        orientation.value()
    );

    Ok(DecodedImage::new(frame, orientation))
}

fn rewind(stream: &mut BoundedMemoryStream<'_>) -> Result<(), DecodeError> {
    stream
        .seek_to(0, Whence::Set)
        .map(|_| ())
        .map_err(|e| DecodeError::DecoderOpenFailed(e.to_string()))
}

fn decode_limits(config: &PipelineConfig) -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(config.max_side());
    limits.max_image_height = Some(config.max_side());
    limits.max_alloc = Some(config.max_decoded_bytes);
    limits
}

/// Move decoded samples into an owned frame, reducing everything to 8 bits.
fn frame_from_image(image: DynamicImage, color_range: ColorRange) -> Frame {
    let (width, height) = (image.width(), image.height());
    let (format, data) = match image {
        DynamicImage::ImageLuma8(img) => (PixelFormat::Gray8, img.into_raw()),
        DynamicImage::ImageLumaA8(img) => (PixelFormat::GrayA8, img.into_raw()),
        DynamicImage::ImageRgb8(img) => (PixelFormat::Rgb24, img.into_raw()),
        DynamicImage::ImageRgba8(img) => (PixelFormat::Rgba, img.into_raw()),
        img @ DynamicImage::ImageLuma16(_) => (PixelFormat::Gray8, img.into_luma8().into_raw()),
        img @ DynamicImage::ImageLumaA16(_) => {
            (PixelFormat::GrayA8, img.into_luma_alpha8().into_raw())
        }
        img @ (DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgb32F(_)) => {
            (PixelFormat::Rgb24, img.into_rgb8().into_raw())
        }
        img => (PixelFormat::Rgba, img.into_rgba8().into_raw()),
    };

    Frame {
        format,
        color_range,
        width,
        height,
        planes: vec![Plane {
            stride: width as usize * format.bytes_per_pixel(),
            data,
        }],
    }
}
