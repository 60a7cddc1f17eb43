//! Format detection from magic bytes and an advisory MIME type.
//!
//! Some clients store PNGs with a `.jpg` name or send everything as
//! `application/octet-stream`, so the leading bytes win over the label.

use image::ImageFormat;

/// Container formats the decoder can be asked to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    Tiff,
    Jp2,
    Webp,
    Unknown,
}

impl SourceFormat {
    /// Resolve a MIME type on its own, without looking at any bytes.
    pub fn from_mime(mime_type: &str) -> SourceFormat {
        match mime_type {
            "image/jpeg" | "image/jpg" => SourceFormat::Jpeg,
            "image/png" => SourceFormat::Png,
            "image/tiff" => SourceFormat::Tiff,
            "image/jp2" => SourceFormat::Jp2,
            "image/webp" => SourceFormat::Webp,
            _ => SourceFormat::Unknown,
        }
    }

    /// The decoder backing this format, if one is compiled in.
    pub fn image_format(self) -> Option<ImageFormat> {
        match self {
            SourceFormat::Jpeg => Some(ImageFormat::Jpeg),
            SourceFormat::Png => Some(ImageFormat::Png),
            SourceFormat::Tiff => Some(ImageFormat::Tiff),
            SourceFormat::Webp => Some(ImageFormat::WebP),
            SourceFormat::Jp2 | SourceFormat::Unknown => None,
        }
    }
}

/// Number of leading bytes [`sniff`] looks at.
pub const SNIFF_LEN: usize = 4;

/// Pick a source format for `prefix` (the first bytes of the payload).
pub fn sniff(prefix: &[u8], mime_type: &str) -> SourceFormat {
    let is_jpeg = prefix.len() > 2 && prefix[..3] == [0xFF, 0xD8, 0xFF];
    let is_png = prefix.len() > 3 && &prefix[1..4] == b"PNG";
    let is_tiff = prefix.len() > 2 && &prefix[..3] == b"II*";

    if is_jpeg {
        SourceFormat::Jpeg
    } else if is_png {
        SourceFormat::Png
    } else if is_tiff {
        SourceFormat::Tiff
    } else {
        SourceFormat::from_mime(mime_type)
    }
}
