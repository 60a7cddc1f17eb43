//! Pixel format conversion and rescaling.
//!
//! A [`ScaleContext`] is set up once for a source format/geometry and a
//! destination format/geometry, optionally has its colorspace details
//! adjusted, and then converts picture planes in one call:
//!
//! 1. unpack the source planes to 8-bit RGBA, honoring the source range
//! 2. resample with the `image` crate when the geometry changes
//! 3. pack into the destination planes, honoring the destination range
//!
//! Range flags only affect YUV planes. RGB, gray and palette data are always
//! read and written as full range.

mod convert;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pixel::{PixelFormat, PlaneLayout};

/// Errors raised while setting up or running a conversion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScaleError {
    /// The format cannot be used on this side of the conversion.
    #[error("Pixel format {0:?} is not supported here")]
    UnsupportedFormat(PixelFormat),

    /// A width or height is zero.
    #[error("Invalid geometry {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    /// A plane is missing or shorter than its stride and row count require.
    #[error("Plane {plane} is missing or too small")]
    PlaneTooSmall { plane: usize },

    /// The YUV converter rejected the planes.
    #[error("Color conversion failed: {0}")]
    ConversionFailed(String),
}

/// Filter type for resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    #[default]
    Bilinear,
    /// Bicubic (Catmull-Rom) interpolation, the usual choice for downscaling photos.
    Bicubic,
    /// Lanczos3 interpolation (slower, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Bicubic => image::imageops::FilterType::CatmullRom,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Range settings of a [`ScaleContext`]. YUV always uses the BT.601 matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorspaceDetails {
    /// Source YUV samples span 0..=255.
    pub src_full_range: bool,
    /// Destination YUV samples span 0..=255.
    pub dst_full_range: bool,
}

/// Read-only view of one picture plane.
#[derive(Debug, Clone, Copy)]
pub struct PlaneRef<'a> {
    pub data: &'a [u8],
    pub stride: usize,
}

/// Writable view of one picture plane.
#[derive(Debug)]
pub struct PlaneMut<'a> {
    pub data: &'a mut [u8],
    pub stride: usize,
}

/// A configured conversion between two formats and geometries.
#[derive(Debug, Clone)]
pub struct ScaleContext {
    src_format: PixelFormat,
    src_width: u32,
    src_height: u32,
    dst_format: PixelFormat,
    dst_width: u32,
    dst_height: u32,
    filter: FilterType,
    details: ColorspaceDetails,
}

impl ScaleContext {
    /// Set up a conversion.
    ///
    /// Full-range-tagged YUV formats are replaced by their canonical format and
    /// the corresponding range flag is switched on.
    pub fn new(
        src_format: PixelFormat,
        src_width: u32,
        src_height: u32,
        dst_format: PixelFormat,
        dst_width: u32,
        dst_height: u32,
        filter: FilterType,
    ) -> Result<Self, ScaleError> {
        for (width, height) in [(src_width, src_height), (dst_width, dst_height)] {
            if width == 0 || height == 0 {
                return Err(ScaleError::InvalidGeometry { width, height });
            }
        }
        if dst_format.is_palette() {
            return Err(ScaleError::UnsupportedFormat(dst_format));
        }

        Ok(Self {
            src_format: src_format.canonical(),
            src_width,
            src_height,
            dst_format: dst_format.canonical(),
            dst_width,
            dst_height,
            filter,
            details: ColorspaceDetails {
                src_full_range: src_format.is_full_range_tagged(),
                dst_full_range: dst_format.is_full_range_tagged(),
            },
        })
    }

    pub fn colorspace_details(&self) -> ColorspaceDetails {
        self.details
    }

    pub fn set_colorspace_details(&mut self, details: ColorspaceDetails) {
        self.details = details;
    }

    pub fn src_format(&self) -> PixelFormat {
        self.src_format
    }

    pub fn dst_format(&self) -> PixelFormat {
        self.dst_format
    }

    /// Convert `src` planes into `dst` planes.
    pub fn scale(&self, src: &[PlaneRef<'_>], dst: &mut [PlaneMut<'_>]) -> Result<(), ScaleError> {
        let src_layout = self.src_format.plane_layout(self.src_width, self.src_height);
        check_planes(&src_layout, src.iter().map(|p| (p.data.len(), p.stride)))?;

        let dst_layout = self.dst_format.plane_layout(self.dst_width, self.dst_height);
        check_planes(&dst_layout, dst.iter().map(|p| (p.data.len(), p.stride)))?;

        let rgba = convert::unpack(
            self.src_format,
            self.src_width,
            self.src_height,
            src,
            self.details.src_full_range,
        )?;

        let rgba = if (self.src_width, self.src_height) == (self.dst_width, self.dst_height) {
            rgba
        } else {
            image::imageops::resize(
                &rgba,
                self.dst_width,
                self.dst_height,
                self.filter.to_image_filter(),
            )
        };

        convert::pack(
            &rgba,
            self.dst_format,
            dst,
            self.details.dst_full_range,
        )
    }
}

/// Bytes a plane must hold for `rows` rows at `stride`, the last row tight.
fn required_len(layout: &PlaneLayout, stride: usize) -> usize {
    match layout.rows {
        0 => 0,
        rows => stride * (rows - 1) + layout.stride,
    }
}

fn check_planes(
    layout: &[PlaneLayout],
    planes: impl ExactSizeIterator<Item = (usize, usize)>,
) -> Result<(), ScaleError> {
    if planes.len() < layout.len() {
        return Err(ScaleError::PlaneTooSmall { plane: planes.len() });
    }
    for (index, (expected, (len, stride))) in layout.iter().zip(planes).enumerate() {
        if stride < expected.stride || len < required_len(expected, stride) {
            return Err(ScaleError::PlaneTooSmall { plane: index });
        }
    }
    Ok(())
}

/// Carve a packed picture buffer into plane views.
pub fn split_planes(
    buffer: &[u8],
    format: PixelFormat,
    width: u32,
    height: u32,
) -> Result<Vec<PlaneRef<'_>>, ScaleError> {
    let mut rest = buffer;
    let mut planes = Vec::new();
    for (index, layout) in format.plane_layout(width, height).into_iter().enumerate() {
        if rest.len() < layout.len() {
            return Err(ScaleError::PlaneTooSmall { plane: index });
        }
        let (plane, tail) = rest.split_at(layout.len());
        planes.push(PlaneRef {
            data: plane,
            stride: layout.stride,
        });
        rest = tail;
    }
    Ok(planes)
}

/// Mutable counterpart of [`split_planes`].
pub fn split_planes_mut(
    buffer: &mut [u8],
    format: PixelFormat,
    width: u32,
    height: u32,
) -> Result<Vec<PlaneMut<'_>>, ScaleError> {
    let mut rest = buffer;
    let mut planes = Vec::new();
    for (index, layout) in format.plane_layout(width, height).into_iter().enumerate() {
        if rest.len() < layout.len() {
            return Err(ScaleError::PlaneTooSmall { plane: index });
        }
        let (plane, tail) = rest.split_at_mut(layout.len());
        planes.push(PlaneMut {
            data: plane,
            stride: layout.stride,
        });
        rest = tail;
    }
    Ok(planes)
}
