//! Pixel formats, color ranges and caller-facing surface layouts.
//!
//! `PixelFormat` is a closed set: every format the decoder can produce or the
//! encoder can consume appears here.

/// Planar and packed pixel formats understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, limited range by default.
    Yuv420p,
    /// Planar YUV 4:2:2.
    Yuv422p,
    /// Planar YUV 4:4:4.
    Yuv444p,
    /// Planar YUV 4:4:0 (vertical chroma subsampling only).
    Yuv440p,
    /// Planar YUV 4:2:0 tagged as full range (JPEG flavour).
    Yuvj420p,
    /// Planar YUV 4:2:2 tagged as full range.
    Yuvj422p,
    /// Planar YUV 4:4:4 tagged as full range.
    Yuvj444p,
    /// Planar YUV 4:4:0 tagged as full range.
    Yuvj440p,
    /// 8-bit luma.
    Gray8,
    /// 8-bit luma followed by 8-bit alpha.
    GrayA8,
    /// Packed R, G, B.
    Rgb24,
    /// Packed R, G, B, A.
    Rgba,
    /// Packed B, G, R, A: a native-endian 32-bit ARGB word on little-endian hosts.
    Bgra,
    /// 8-bit palette indices; plane 1 holds 256 BGRA entries.
    Pal8,
}

/// Size in bytes of the palette plane of [`PixelFormat::Pal8`].
pub const PALETTE_SIZE: usize = 256 * 4;

impl PixelFormat {
    /// Map full-range-tagged YUV variants onto their canonical counterparts.
    ///
    /// The range itself is carried separately (see [`ColorRange`]); the scaler
    /// is never expected to infer it from the format.
    pub fn canonical(self) -> PixelFormat {
        match self {
            PixelFormat::Yuvj420p => PixelFormat::Yuv420p,
            PixelFormat::Yuvj422p => PixelFormat::Yuv422p,
            PixelFormat::Yuvj444p => PixelFormat::Yuv444p,
            PixelFormat::Yuvj440p => PixelFormat::Yuv440p,
            PixelFormat::Yuv420p
            | PixelFormat::Yuv422p
            | PixelFormat::Yuv444p
            | PixelFormat::Yuv440p
            | PixelFormat::Gray8
            | PixelFormat::GrayA8
            | PixelFormat::Rgb24
            | PixelFormat::Rgba
            | PixelFormat::Bgra
            | PixelFormat::Pal8 => self,
        }
    }

    /// True for the `Yuvj*` variants.
    pub fn is_full_range_tagged(self) -> bool {
        self.canonical() != self
    }

    /// True for planar YUV formats, tagged or not.
    pub fn is_yuv(self) -> bool {
        matches!(
            self.canonical(),
            PixelFormat::Yuv420p
                | PixelFormat::Yuv422p
                | PixelFormat::Yuv444p
                | PixelFormat::Yuv440p
        )
    }

    /// The format carries an alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            PixelFormat::GrayA8 | PixelFormat::Rgba | PixelFormat::Bgra
        )
    }

    /// The format is palette indexed.
    pub fn is_palette(self) -> bool {
        self == PixelFormat::Pal8
    }

    /// Horizontal and vertical chroma shift (log2 of the subsampling factor).
    pub fn chroma_shift(self) -> (u32, u32) {
        match self.canonical() {
            PixelFormat::Yuv420p => (1, 1),
            PixelFormat::Yuv422p => (1, 0),
            PixelFormat::Yuv440p => (0, 1),
            _ => (0, 0),
        }
    }

    /// Bytes per pixel of the first plane.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::GrayA8 => 2,
            PixelFormat::Rgb24 => 3,
            PixelFormat::Rgba | PixelFormat::Bgra => 4,
            _ => 1,
        }
    }

    /// Stride and row count of every plane for a tightly packed picture.
    ///
    /// Strides are not padded; chroma dimensions round up.
    pub fn plane_layout(self, width: u32, height: u32) -> Vec<PlaneLayout> {
        let (w, h) = (width as usize, height as usize);
        if self.is_yuv() {
            let (sx, sy) = self.chroma_shift();
            let cw = chroma_extent(width, sx);
            let ch = chroma_extent(height, sy);
            vec![
                PlaneLayout { stride: w, rows: h },
                PlaneLayout { stride: cw, rows: ch },
                PlaneLayout { stride: cw, rows: ch },
            ]
        } else if self.is_palette() {
            vec![
                PlaneLayout { stride: w, rows: h },
                PlaneLayout {
                    stride: PALETTE_SIZE,
                    rows: 1,
                },
            ]
        } else {
            vec![PlaneLayout {
                stride: w * self.bytes_per_pixel(),
                rows: h,
            }]
        }
    }

    /// Total bytes of a tightly packed picture, `None` on overflow.
    pub fn picture_size(self, width: u32, height: u32) -> Option<usize> {
        self.plane_layout(width, height)
            .iter()
            .try_fold(0usize, |acc, plane| {
                plane
                    .stride
                    .checked_mul(plane.rows)
                    .and_then(|bytes| acc.checked_add(bytes))
            })
    }
}

/// Chroma plane extent for a luma extent and a log2 subsampling shift.
pub(crate) fn chroma_extent(extent: u32, shift: u32) -> usize {
    let extent = extent as usize;
    (extent + (1 << shift) - 1) >> shift
}

/// Allocate a zeroed picture buffer, `None` if the allocator refuses.
pub(crate) fn alloc_picture(len: usize) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).ok()?;
    buf.resize(len, 0);
    Some(buf)
}

/// Geometry of one plane inside a packed picture buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    pub stride: usize,
    pub rows: usize,
}

impl PlaneLayout {
    pub fn len(&self) -> usize {
        self.stride * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sample range signalled alongside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorRange {
    #[default]
    Unspecified,
    /// Studio range: luma 16..=235, chroma 16..=240.
    Limited,
    /// Full 0..=255 range (JPEG).
    Full,
}

/// Pixel layouts a caller can hand to the render and thumbnail operations.
///
/// Only [`SurfaceFormat::Argb32`] is accepted; the others exist so callers can
/// describe what they have and get a clean rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceFormat {
    /// 32-bit native-endian ARGB words (B, G, R, A in memory on little-endian).
    Argb32,
    /// Packed 24-bit RGB.
    Rgb24,
    /// Single alpha byte per pixel.
    Alpha8,
}

impl SurfaceFormat {
    /// The frame format this surface layout corresponds to in memory.
    pub fn pixel_format(self) -> Option<PixelFormat> {
        match self {
            SurfaceFormat::Argb32 => Some(PixelFormat::Bgra),
            SurfaceFormat::Rgb24 => Some(PixelFormat::Rgb24),
            SurfaceFormat::Alpha8 => None,
        }
    }
}
