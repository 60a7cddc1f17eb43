//! Single-frame still-image encoder.
//!
//! An [`EncoderContext`] is opened from [`EncoderParams`] and turns one
//! [`FrameView`] into one packet written into a caller-provided slice. JPEG
//! frames are planar full-range YUV 4:2:0; PNG frames are packed RGBA.

use std::borrow::Cow;
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::pixel::{alloc_picture, PixelFormat, SurfaceFormat};
use crate::scale::{split_planes_mut, FilterType, PlaneRef, ScaleContext, ScaleError};

/// Fixed-point factor between a quantizer scale and a lambda value.
pub const QP2LAMBDA: u32 = 118;

/// Largest quantizer scale.
const MAX_QSCALE: u32 = 31;

/// Errors that can occur during thumbnail encoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// The input surface is not 32-bit ARGB.
    #[error("Input surface format {0:?} is not supported")]
    UnsupportedInputFormat(SurfaceFormat),

    /// The requested MIME type has no thumbnail encoder.
    #[error("Unsupported thumbnail output format: {0}")]
    UnsupportedOutputFormat(String),

    /// Geometry is zero, or pitch and height do not fit the pixel data.
    #[error("Invalid surface: {width}x{height} with pitch {pitch} in {len} bytes")]
    InvalidSurface {
        width: u32,
        height: u32,
        pitch: u32,
        len: usize,
    },

    /// The output or intermediate picture could not be allocated.
    #[error("Could not allocate buffers for a {width}x{height} thumbnail")]
    AllocationFailed { width: u32, height: u32 },

    /// The encoder could not be opened, rejected the frame, or the packet did
    /// not fit the output buffer.
    #[error("Thumbnail encoding failed: {0}")]
    EncodeFailed(String),
}

pub(super) fn scale_failed(e: ScaleError) -> EncodeError {
    EncodeError::EncodeFailed(e.to_string())
}

/// Thumbnail codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailCodec {
    Mjpeg,
    Png,
}

impl ThumbnailCodec {
    /// Pick the codec for an output MIME type.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type {
            "image/jpeg" | "image/jpg" => Some(ThumbnailCodec::Mjpeg),
            "image/png" => Some(ThumbnailCodec::Png),
            _ => None,
        }
    }

    /// The pixel format the encoder consumes.
    pub fn target_format(self) -> PixelFormat {
        match self {
            ThumbnailCodec::Mjpeg => PixelFormat::Yuvj420p,
            ThumbnailCodec::Png => PixelFormat::Rgba,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ThumbnailCodec::Mjpeg => "mjpeg",
            ThumbnailCodec::Png => "png",
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderParams {
    pub codec: ThumbnailCodec,
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    /// `(numerator, denominator)`.
    pub time_base: (u32, u32),
    /// Constant-quality mode: each frame's `quality` picks the quantizer.
    pub qscale: bool,
    /// Lower lambda bound.
    pub mb_lmin: u32,
    /// Upper lambda bound.
    pub mb_lmax: u32,
    pub global_quality: u32,
}

impl EncoderParams {
    /// Settings for a single thumbnail frame with quantizer range `qmin..=qmax`.
    pub fn thumbnail(codec: ThumbnailCodec, width: u32, height: u32, qmin: u32, qmax: u32) -> Self {
        Self {
            codec,
            width,
            height,
            pixel_format: codec.target_format(),
            time_base: (1, 1),
            qscale: true,
            mb_lmin: qmin.saturating_mul(QP2LAMBDA),
            mb_lmax: qmax.saturating_mul(QP2LAMBDA),
            global_quality: qmin.saturating_mul(QP2LAMBDA),
        }
    }
}

/// A frame handed to the encoder. Planes are borrowed, not copied.
#[derive(Debug, Clone)]
pub struct FrameView<'a> {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub planes: Vec<PlaneRef<'a>>,
    pub pts: i64,
    /// Lambda used when the encoder runs in constant-quality mode.
    pub quality: u32,
}

/// An opened encoder.
#[derive(Debug)]
pub struct EncoderContext {
    params: EncoderParams,
}

impl EncoderContext {
    pub fn open(params: EncoderParams) -> Result<Self, EncodeError> {
        if params.width == 0 || params.height == 0 {
            return Err(EncodeError::EncodeFailed(format!(
                "could not open {} encoder for {}x{}",
                params.codec.name(),
                params.width,
                params.height
            )));
        }
        if params.pixel_format != params.codec.target_format() {
            return Err(EncodeError::EncodeFailed(format!(
                "{} encoder does not take {:?}",
                params.codec.name(),
                params.pixel_format
            )));
        }
        if params.time_base.0 == 0 || params.time_base.1 == 0 {
            return Err(EncodeError::EncodeFailed(format!(
                "invalid time base {}/{}",
                params.time_base.0, params.time_base.1
            )));
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &EncoderParams {
        &self.params
    }

    /// Encode `frame` into `out`, returning the packet length.
    ///
    /// A packet larger than `out` is an error, not a truncation.
    pub fn encode_packet(&self, frame: &FrameView<'_>, out: &mut [u8]) -> Result<usize, EncodeError> {
        let params = &self.params;
        if frame.format != params.pixel_format
            || (frame.width, frame.height) != (params.width, params.height)
        {
            return Err(EncodeError::EncodeFailed(format!(
                "frame {:?} {}x{} does not match encoder {:?} {}x{}",
                frame.format,
                frame.width,
                frame.height,
                params.pixel_format,
                params.width,
                params.height
            )));
        }

        let mut writer = Cursor::new(out);
        match params.codec {
            ThumbnailCodec::Mjpeg => self.write_jpeg(frame, &mut writer)?,
            ThumbnailCodec::Png => write_png(frame, &mut writer)?,
        }

        let len = writer.position() as usize;
        if len == 0 {
            return Err(EncodeError::EncodeFailed("no packet produced".to_string()));
        }
        log::trace!(
            "{} packet pts {}: {} bytes",
            params.codec.name(),
            frame.pts,
            len
        );
        Ok(len)
    }

    /// Quantizer scale for `frame`, kept inside the lambda bounds.
    fn qscale(&self, frame: &FrameView<'_>) -> u32 {
        let params = &self.params;
        let lambda = if params.qscale {
            frame.quality
        } else {
            params.global_quality
        };
        let lambda = lambda.clamp(params.mb_lmin, params.mb_lmax.max(params.mb_lmin));
        (lambda / QP2LAMBDA).clamp(1, MAX_QSCALE)
    }

    fn write_jpeg(&self, frame: &FrameView<'_>, writer: &mut Cursor<&mut [u8]>) -> Result<(), EncodeError> {
        let (width, height) = (frame.width, frame.height);

        // Yuvj input switches the source range to full
        let context = ScaleContext::new(
            frame.format,
            width,
            height,
            PixelFormat::Rgb24,
            width,
            height,
            FilterType::Nearest,
        )
        .map_err(scale_failed)?;

        let size = width as usize * 3 * height as usize;
        let mut rgb =
            alloc_picture(size).ok_or(EncodeError::AllocationFailed { width, height })?;
        context
            .scale(
                &frame.planes,
                &mut split_planes_mut(&mut rgb, PixelFormat::Rgb24, width, height)
                    .map_err(scale_failed)?,
            )
            .map_err(scale_failed)?;

        JpegEncoder::new_with_quality(writer, jpeg_quality(self.qscale(frame)))
            .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
            .map_err(|e| EncodeError::EncodeFailed(e.to_string()))
    }
}

fn write_png(frame: &FrameView<'_>, writer: &mut Cursor<&mut [u8]>) -> Result<(), EncodeError> {
    let (width, height) = (frame.width, frame.height);
    let row = width as usize * 4;
    let rows = height as usize;
    let short_plane = || EncodeError::EncodeFailed("RGBA plane is too small".to_string());

    let plane = frame.planes.first().ok_or_else(short_plane)?;
    let pixels: Cow<'_, [u8]> = if plane.stride == row {
        Cow::Borrowed(plane.data.get(..row * rows).ok_or_else(short_plane)?)
    } else {
        let mut tight = Vec::with_capacity(row * rows);
        for y in 0..rows {
            let start = y * plane.stride;
            tight.extend_from_slice(plane.data.get(start..start + row).ok_or_else(short_plane)?);
        }
        Cow::Owned(tight)
    };

    PngEncoder::new(&mut *writer)
        .write_image(&pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodeFailed(e.to_string()))?;

    // the trailer is written on drop, where a full buffer goes unreported
    let written = &writer.get_ref()[..writer.position() as usize];
    if !written.ends_with(&PNG_IEND) {
        return Err(EncodeError::EncodeFailed(
            "PNG trailer does not fit the output buffer".to_string(),
        ));
    }
    Ok(())
}

/// `IEND` chunk type followed by its CRC.
const PNG_IEND: [u8; 8] = [0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82];

/// Map a quantizer scale (1 best, 31 worst) onto a 1-100 JPEG quality.
fn jpeg_quality(qscale: u32) -> u8 {
    let qscale = qscale.clamp(1, MAX_QSCALE);
    (100 - (qscale - 1) * 99 / (MAX_QSCALE - 1)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::split_planes;

    fn rgba_frame_buffer(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
        pixel
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect()
    }

    fn yuvj_buffer(width: u32, height: u32, luma: u8) -> Vec<u8> {
        let size = PixelFormat::Yuvj420p.picture_size(width, height).unwrap();
        let mut buf = vec![128u8; size];
        buf[..(width * height) as usize].fill(luma);
        buf
    }

    #[test]
    fn test_codec_from_mime() {
        assert_eq!(ThumbnailCodec::from_mime("image/jpeg"), Some(ThumbnailCodec::Mjpeg));
        assert_eq!(ThumbnailCodec::from_mime("image/jpg"), Some(ThumbnailCodec::Mjpeg));
        assert_eq!(ThumbnailCodec::from_mime("image/png"), Some(ThumbnailCodec::Png));
        assert_eq!(ThumbnailCodec::from_mime("image/gif"), None);
        assert_eq!(ThumbnailCodec::from_mime("IMAGE/PNG"), None);
    }

    #[test]
    fn test_thumbnail_params() {
        let params = EncoderParams::thumbnail(ThumbnailCodec::Mjpeg, 64, 48, 2, 31);
        assert_eq!(params.pixel_format, PixelFormat::Yuvj420p);
        assert_eq!(params.time_base, (1, 1));
        assert!(params.qscale);
        assert_eq!(params.mb_lmin, 236);
        assert_eq!(params.mb_lmax, 31 * 118);
        assert_eq!(params.global_quality, 236);

        let params = EncoderParams::thumbnail(ThumbnailCodec::Png, 1, 1, 2, 31);
        assert_eq!(params.pixel_format, PixelFormat::Rgba);
    }

    #[test]
    fn test_jpeg_quality_mapping() {
        assert_eq!(jpeg_quality(1), 100);
        assert_eq!(jpeg_quality(2), 97);
        assert_eq!(jpeg_quality(31), 1);
        assert_eq!(jpeg_quality(0), 100);
        assert_eq!(jpeg_quality(99), 1);
    }

    #[test]
    fn test_qscale_clamped_to_lambda_range() {
        let encoder =
            EncoderContext::open(EncoderParams::thumbnail(ThumbnailCodec::Mjpeg, 8, 8, 4, 10))
                .unwrap();
        let buf = yuvj_buffer(8, 8, 0);
        let mut frame = FrameView {
            format: PixelFormat::Yuvj420p,
            width: 8,
            height: 8,
            planes: split_planes(&buf, PixelFormat::Yuvj420p, 8, 8).unwrap(),
            pts: 1,
            quality: 0,
        };
        assert_eq!(encoder.qscale(&frame), 4);
        frame.quality = 7 * QP2LAMBDA;
        assert_eq!(encoder.qscale(&frame), 7);
        frame.quality = u32::MAX;
        assert_eq!(encoder.qscale(&frame), 10);
    }

    #[test]
    fn test_open_rejects_bad_params() {
        let mut params = EncoderParams::thumbnail(ThumbnailCodec::Mjpeg, 0, 8, 2, 31);
        assert!(matches!(
            EncoderContext::open(params),
            Err(EncodeError::EncodeFailed(_))
        ));

        params.width = 8;
        params.pixel_format = PixelFormat::Rgba;
        assert!(matches!(
            EncoderContext::open(params),
            Err(EncodeError::EncodeFailed(_))
        ));

        params.pixel_format = PixelFormat::Yuvj420p;
        params.time_base = (1, 0);
        assert!(matches!(
            EncoderContext::open(params),
            Err(EncodeError::EncodeFailed(_))
        ));
    }

    #[test]
    fn test_encode_jpeg_packet() {
        let encoder =
            EncoderContext::open(EncoderParams::thumbnail(ThumbnailCodec::Mjpeg, 64, 64, 2, 31))
                .unwrap();
        let buf = yuvj_buffer(64, 64, 200);
        let frame = FrameView {
            format: PixelFormat::Yuvj420p,
            width: 64,
            height: 64,
            planes: split_planes(&buf, PixelFormat::Yuvj420p, 64, 64).unwrap(),
            pts: 1,
            quality: encoder.params().global_quality,
        };

        let mut out = vec![0u8; buf.len()];
        let len = encoder.encode_packet(&frame, &mut out).unwrap();

        assert!(len > 0 && len <= out.len());
        assert_eq!(&out[..2], &[0xFF, 0xD8]);
        assert_eq!(&out[len - 2..len], &[0xFF, 0xD9]);

        let decoded = image::load_from_memory(&out[..len]).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (64, 64));
        let luma = decoded.get_pixel(32, 32).0[0];
        assert!(luma.abs_diff(200) <= 3, "luma {}", luma);
    }

    #[test]
    fn test_encode_png_packet_roundtrip() {
        let encoder =
            EncoderContext::open(EncoderParams::thumbnail(ThumbnailCodec::Png, 16, 16, 2, 31))
                .unwrap();
        let buf = rgba_frame_buffer(16, 16, [10, 20, 30, 40]);
        let frame = FrameView {
            format: PixelFormat::Rgba,
            width: 16,
            height: 16,
            planes: split_planes(&buf, PixelFormat::Rgba, 16, 16).unwrap(),
            pts: 1,
            quality: 236,
        };

        let mut out = vec![0u8; buf.len()];
        let len = encoder.encode_packet(&frame, &mut out).unwrap();

        let decoded = image::load_from_memory(&out[..len]).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (16, 16));
        assert!(decoded.pixels().all(|px| px.0 == [10, 20, 30, 40]));
    }

    #[test]
    fn test_png_with_padded_stride() {
        let encoder =
            EncoderContext::open(EncoderParams::thumbnail(ThumbnailCodec::Png, 8, 8, 2, 31))
                .unwrap();
        // 8 bytes of padding per row
        let mut buf = vec![0u8; 40 * 8];
        for row in buf.chunks_mut(40) {
            for px in row[..32].chunks_mut(4) {
                px.copy_from_slice(&[1, 2, 3, 255]);
            }
        }
        let frame = FrameView {
            format: PixelFormat::Rgba,
            width: 8,
            height: 8,
            planes: vec![PlaneRef { data: &buf, stride: 40 }],
            pts: 1,
            quality: 236,
        };

        let mut out = vec![0u8; 1024];
        let len = encoder.encode_packet(&frame, &mut out).unwrap();
        let decoded = image::load_from_memory(&out[..len]).unwrap().to_rgba8();
        assert!(decoded.pixels().all(|px| px.0 == [1, 2, 3, 255]));
    }

    #[test]
    fn test_packet_overflow_is_error() {
        let encoder =
            EncoderContext::open(EncoderParams::thumbnail(ThumbnailCodec::Mjpeg, 16, 16, 2, 31))
                .unwrap();
        let buf = yuvj_buffer(16, 16, 90);
        let frame = FrameView {
            format: PixelFormat::Yuvj420p,
            width: 16,
            height: 16,
            planes: split_planes(&buf, PixelFormat::Yuvj420p, 16, 16).unwrap(),
            pts: 1,
            quality: 236,
        };

        let mut out = vec![0u8; 32];
        assert!(matches!(
            encoder.encode_packet(&frame, &mut out),
            Err(EncodeError::EncodeFailed(_))
        ));
    }

    #[test]
    fn test_frame_mismatch_rejected() {
        let encoder =
            EncoderContext::open(EncoderParams::thumbnail(ThumbnailCodec::Png, 4, 4, 2, 31))
                .unwrap();
        let buf = rgba_frame_buffer(4, 2, [0; 4]);
        let frame = FrameView {
            format: PixelFormat::Rgba,
            width: 4,
            height: 2,
            planes: split_planes(&buf, PixelFormat::Rgba, 4, 2).unwrap(),
            pts: 1,
            quality: 236,
        };
        let mut out = vec![0u8; 1024];
        assert!(matches!(
            encoder.encode_packet(&frame, &mut out),
            Err(EncodeError::EncodeFailed(_))
        ));
    }
}
