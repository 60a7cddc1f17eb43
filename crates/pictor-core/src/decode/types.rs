//! Core types for image decoding.

use thiserror::Error;

use crate::pixel::{ColorRange, PixelFormat};
use crate::scale::PlaneRef;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Neither the magic bytes nor the MIME type name a usable format.
    #[error("Could not find suitable input format: {0}")]
    UnsupportedFormat(String),

    /// The container could not be opened as the sniffed format.
    #[error("Could not open decoder: {0}")]
    DecoderOpenFailed(String),

    /// The stream was opened but no frame came out of it.
    #[error("Could not decode a frame: {0}")]
    NoFrameDecoded(String),

    /// The image exceeds the configured decode limits.
    #[error("Image exceeds decode limits: {0}")]
    AllocationFailed(String),
}

/// EXIF orientation values (0-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Orientation {
    /// No orientation recorded.
    #[default]
    Unknown = 0,
    /// Normal (no transformation needed).
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl Orientation {
    /// Parse a raw tag value; anything outside 0..=8 is rejected.
    pub fn from_raw(value: u32) -> Option<Self> {
        Some(match value {
            0 => Orientation::Unknown,
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => return None,
        })
    }

    /// The raw tag value.
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// One plane of an owned frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    pub data: Vec<u8>,
    pub stride: usize,
}

/// A decoded picture that owns its pixel planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub format: PixelFormat,
    pub color_range: ColorRange,
    pub width: u32,
    pub height: u32,
    pub planes: Vec<Plane>,
}

impl Frame {
    /// Build a frame from a tightly packed picture buffer.
    ///
    /// Returns `None` when `buffer` is shorter than the format requires.
    pub fn from_packed(
        format: PixelFormat,
        color_range: ColorRange,
        width: u32,
        height: u32,
        buffer: &[u8],
    ) -> Option<Self> {
        let mut offset = 0;
        let mut planes = Vec::new();
        for layout in format.plane_layout(width, height) {
            let end = offset + layout.len();
            planes.push(Plane {
                data: buffer.get(offset..end)?.to_vec(),
                stride: layout.stride,
            });
            offset = end;
        }
        Some(Self {
            format,
            color_range,
            width,
            height,
            planes,
        })
    }

    /// Borrow the planes for a scale call.
    pub fn plane_refs(&self) -> Vec<PlaneRef<'_>> {
        self.planes
            .iter()
            .map(|plane| PlaneRef {
                data: &plane.data,
                stride: plane.stride,
            })
            .collect()
    }

    /// The frame has geometry and pixel data in its first plane.
    pub fn is_populated(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.planes.first().is_some_and(|plane| !plane.data.is_empty())
    }
}

/// The result of one decode: a frame plus the metadata captured with it.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// The decoded frame at its original geometry.
    pub frame: Frame,
    /// Width of the most recent render (the decoded width until then).
    pub width: u32,
    /// Height of the most recent render (the decoded height until then).
    pub height: u32,
    /// Decoded width; never changes.
    pub original_width: u32,
    /// Decoded height; never changes.
    pub original_height: u32,
    /// The source format declares an alpha channel or is palette indexed.
    pub has_alpha: bool,
    /// EXIF orientation, `Unknown` when absent or out of range.
    pub orientation: Orientation,
}

impl DecodedImage {
    /// Wrap a frame, deriving geometry and the alpha flag from it.
    pub fn new(frame: Frame, orientation: Orientation) -> Self {
        let has_alpha = frame.format.has_alpha() || frame.format.is_palette();
        Self {
            width: frame.width,
            height: frame.height,
            original_width: frame.width,
            original_height: frame.height,
            has_alpha,
            orientation,
            frame,
        }
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || !self.frame.is_populated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba_frame(width: u32, height: u32) -> Frame {
        let buf = vec![7u8; (width * height * 4) as usize];
        Frame::from_packed(PixelFormat::Rgba, ColorRange::Unspecified, width, height, &buf).unwrap()
    }

    #[test]
    fn test_orientation_from_raw() {
        assert_eq!(Orientation::from_raw(0), Some(Orientation::Unknown));
        assert_eq!(Orientation::from_raw(1), Some(Orientation::Normal));
        assert_eq!(Orientation::from_raw(6), Some(Orientation::Rotate90CW));
        assert_eq!(Orientation::from_raw(8), Some(Orientation::Rotate270CW));
        assert_eq!(Orientation::from_raw(9), None);
        assert_eq!(Orientation::from_raw(99), None);
        assert_eq!(Orientation::Rotate180.value(), 3);
        assert_eq!(Orientation::default().value(), 0);
    }

    #[test]
    fn test_frame_from_packed_yuv() {
        let buf = vec![0u8; PixelFormat::Yuv420p.picture_size(4, 2).unwrap()];
        let frame =
            Frame::from_packed(PixelFormat::Yuvj420p, ColorRange::Full, 4, 2, &buf).unwrap();
        assert_eq!(frame.planes.len(), 3);
        assert_eq!(frame.planes[0].data.len(), 8);
        assert_eq!(frame.planes[1].data.len(), 2);
        assert!(frame.is_populated());
    }

    #[test]
    fn test_frame_from_packed_short_buffer() {
        assert!(Frame::from_packed(PixelFormat::Rgba, ColorRange::Unspecified, 4, 4, &[0; 8]).is_none());
    }

    #[test]
    fn test_decoded_image_creation() {
        let img = DecodedImage::new(rgba_frame(100, 50), Orientation::Normal);

        assert_eq!(img.width, 100);
        assert_eq!(img.height, 50);
        assert_eq!(img.original_width, 100);
        assert_eq!(img.original_height, 50);
        assert!(img.has_alpha);
        assert!(!img.is_empty());
    }

    #[test]
    fn test_alpha_from_palette() {
        let buf = vec![0u8; PixelFormat::Pal8.picture_size(2, 2).unwrap()];
        let frame = Frame::from_packed(PixelFormat::Pal8, ColorRange::Unspecified, 2, 2, &buf).unwrap();
        assert!(DecodedImage::new(frame, Orientation::Unknown).has_alpha);

        let buf = vec![0u8; 12];
        let frame = Frame::from_packed(PixelFormat::Rgb24, ColorRange::Unspecified, 2, 2, &buf).unwrap();
        assert!(!DecodedImage::new(frame, Orientation::Unknown).has_alpha);
    }

    #[test]
    fn test_decoded_image_empty() {
        let frame = Frame {
            format: PixelFormat::Rgba,
            color_range: ColorRange::Unspecified,
            width: 0,
            height: 0,
            planes: Vec::new(),
        };
        assert!(DecodedImage::new(frame, Orientation::Unknown).is_empty());
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::UnsupportedFormat("application/octet-stream".to_string());
        assert_eq!(
            err.to_string(),
            "Could not find suitable input format: application/octet-stream"
        );

        let err = DecodeError::NoFrameDecoded("truncated".to_string());
        assert_eq!(err.to_string(), "Could not decode a frame: truncated");
    }
}
