//! Per-pixel unpack/pack between plane data and 8-bit RGBA.
//!
//! Planar YUV goes through `yuvutils-rs` with the BT.601 matrix. 4:4:0 has no
//! entry point there, so its chroma rows are doubled into 4:4:4 on unpack and
//! averaged in pairs on pack.

use image::{DynamicImage, RgbaImage};
use yuvutils_rs::{
    BufferStoreMut, YuvConversionMode, YuvPlanarImage, YuvPlanarImageMut, YuvRange,
    YuvStandardMatrix,
};

use super::{PlaneMut, PlaneRef, ScaleError};
use crate::pixel::{chroma_extent, PixelFormat};

const MATRIX: YuvStandardMatrix = YuvStandardMatrix::Bt601;

fn yuv_range(full_range: bool) -> YuvRange {
    if full_range {
        YuvRange::Full
    } else {
        YuvRange::Limited
    }
}

fn conversion_failed(err: yuvutils_rs::YuvError) -> ScaleError {
    ScaleError::ConversionFailed(format!("{:?}", err))
}

/// Unpack source planes into an RGBA image. Planes are assumed validated.
pub(super) fn unpack(
    format: PixelFormat,
    width: u32,
    height: u32,
    planes: &[PlaneRef<'_>],
    full_range: bool,
) -> Result<RgbaImage, ScaleError> {
    if format.is_yuv() {
        return unpack_yuv(format, width, height, planes, full_range);
    }

    let image = match format {
        PixelFormat::Pal8 => {
            let (indices, palette) = (planes[0], planes[1]);
            RgbaImage::from_fn(width, height, |x, y| {
                let index = indices.data[y as usize * indices.stride + x as usize] as usize;
                let entry = &palette.data[index * 4..index * 4 + 4];
                image::Rgba([entry[2], entry[1], entry[0], entry[3]])
            })
        }
        _ => {
            let plane = planes[0];
            let bpp = format.bytes_per_pixel();
            RgbaImage::from_fn(width, height, |x, y| {
                let offset = y as usize * plane.stride + x as usize * bpp;
                let px = &plane.data[offset..offset + bpp];
                image::Rgba(match format {
                    PixelFormat::Gray8 => [px[0], px[0], px[0], 255],
                    PixelFormat::GrayA8 => [px[0], px[0], px[0], px[1]],
                    PixelFormat::Rgb24 => [px[0], px[1], px[2], 255],
                    PixelFormat::Rgba => [px[0], px[1], px[2], px[3]],
                    _ => [px[2], px[1], px[0], px[3]],
                })
            })
        }
    };
    Ok(image)
}

fn unpack_yuv(
    format: PixelFormat,
    width: u32,
    height: u32,
    planes: &[PlaneRef<'_>],
    full_range: bool,
) -> Result<RgbaImage, ScaleError> {
    let (luma, cb, cr) = (planes[0], planes[1], planes[2]);
    let mut rgba = RgbaImage::new(width, height);
    let rgba_stride = width * 4;
    let range = yuv_range(full_range);

    let result = match format.chroma_shift() {
        (0, 1) => {
            let u = double_rows(cb, width, height);
            let v = double_rows(cr, width, height);
            let image = YuvPlanarImage {
                y_plane: luma.data,
                y_stride: luma.stride as u32,
                u_plane: &u,
                u_stride: width,
                v_plane: &v,
                v_stride: width,
                width,
                height,
            };
            yuvutils_rs::yuv444_to_rgba(&image, &mut rgba, rgba_stride, range, MATRIX)
        }
        shift => {
            let image = YuvPlanarImage {
                y_plane: luma.data,
                y_stride: luma.stride as u32,
                u_plane: cb.data,
                u_stride: cb.stride as u32,
                v_plane: cr.data,
                v_stride: cr.stride as u32,
                width,
                height,
            };
            let to_rgba = match shift {
                (1, 1) => yuvutils_rs::yuv420_to_rgba,
                (1, 0) => yuvutils_rs::yuv422_to_rgba,
                _ => yuvutils_rs::yuv444_to_rgba,
            };
            to_rgba(&image, &mut rgba, rgba_stride, range, MATRIX)
        }
    };
    result.map_err(conversion_failed)?;
    Ok(rgba)
}

/// Expand a vertically subsampled chroma plane to one row per luma row.
fn double_rows(plane: PlaneRef<'_>, width: u32, height: u32) -> Vec<u8> {
    let width = width as usize;
    let mut out = Vec::with_capacity(width * height as usize);
    for y in 0..height as usize {
        let start = (y >> 1) * plane.stride;
        out.extend_from_slice(&plane.data[start..start + width]);
    }
    out
}

/// Average pairs of full-height chroma rows into a 4:4:0 plane.
fn halve_rows(full: &[u8], width: u32, height: u32, plane: &mut PlaneMut<'_>) {
    let (width, height) = (width as usize, height as usize);
    for cy in 0..chroma_extent(height as u32, 1) {
        let top = &full[2 * cy * width..][..width];
        let bottom = if 2 * cy + 1 < height {
            &full[(2 * cy + 1) * width..][..width]
        } else {
            top
        };
        let row = &mut plane.data[cy * plane.stride..][..width];
        for ((out, &a), &b) in row.iter_mut().zip(top).zip(bottom) {
            *out = ((a as u16 + b as u16 + 1) / 2) as u8;
        }
    }
}

/// Pack an RGBA image into destination planes. Planes are assumed validated.
pub(super) fn pack(
    rgba: &RgbaImage,
    format: PixelFormat,
    planes: &mut [PlaneMut<'_>],
    full_range: bool,
) -> Result<(), ScaleError> {
    let (width, height) = rgba.dimensions();
    match format {
        _ if format.is_yuv() => pack_yuv(rgba, format, planes, full_range)?,
        PixelFormat::Pal8 => return Err(ScaleError::UnsupportedFormat(format)),
        PixelFormat::Gray8 | PixelFormat::GrayA8 => {
            let gray = DynamicImage::ImageRgba8(rgba.clone()).into_luma_alpha8();
            let bpp = format.bytes_per_pixel();
            let plane = &mut planes[0];
            for (x, y, pixel) in gray.enumerate_pixels() {
                let offset = y as usize * plane.stride + x as usize * bpp;
                plane.data[offset..offset + bpp].copy_from_slice(&pixel.0[..bpp]);
            }
        }
        _ => {
            let bpp = format.bytes_per_pixel();
            let plane = &mut planes[0];
            for (x, y, pixel) in rgba.enumerate_pixels() {
                let [r, g, b, a] = pixel.0;
                let offset = y as usize * plane.stride + x as usize * bpp;
                let out = &mut plane.data[offset..offset + bpp];
                match format {
                    PixelFormat::Rgb24 => out.copy_from_slice(&[r, g, b]),
                    PixelFormat::Rgba => out.copy_from_slice(&[r, g, b, a]),
                    _ => out.copy_from_slice(&[b, g, r, a]),
                }
            }
        }
    }
    log::trace!("packed {}x{} into {:?}", width, height, format);
    Ok(())
}

fn pack_yuv(
    rgba: &RgbaImage,
    format: PixelFormat,
    planes: &mut [PlaneMut<'_>],
    full_range: bool,
) -> Result<(), ScaleError> {
    let (width, height) = rgba.dimensions();
    let count = planes.len();
    let [luma, cb, cr, ..] = planes else {
        return Err(ScaleError::PlaneTooSmall { plane: count });
    };
    let rgba_stride = width * 4;
    let range = yuv_range(full_range);
    let mode = YuvConversionMode::Balanced;

    if format.chroma_shift() == (0, 1) {
        let plane_len = width as usize * height as usize;
        let (mut u, mut v) = (vec![0u8; plane_len], vec![0u8; plane_len]);
        {
            let mut image = YuvPlanarImageMut {
                y_plane: BufferStoreMut::Borrowed(&mut *luma.data),
                y_stride: luma.stride as u32,
                u_plane: BufferStoreMut::Borrowed(&mut u[..]),
                u_stride: width,
                v_plane: BufferStoreMut::Borrowed(&mut v[..]),
                v_stride: width,
                width,
                height,
            };
            yuvutils_rs::rgba_to_yuv444(&mut image, rgba.as_raw(), rgba_stride, range, MATRIX, mode)
                .map_err(conversion_failed)?;
        }
        halve_rows(&u, width, height, cb);
        halve_rows(&v, width, height, cr);
        return Ok(());
    }

    let mut image = YuvPlanarImageMut {
        y_plane: BufferStoreMut::Borrowed(&mut *luma.data),
        y_stride: luma.stride as u32,
        u_plane: BufferStoreMut::Borrowed(&mut *cb.data),
        u_stride: cb.stride as u32,
        v_plane: BufferStoreMut::Borrowed(&mut *cr.data),
        v_stride: cr.stride as u32,
        width,
        height,
    };
    let to_yuv = match format.chroma_shift() {
        (1, 1) => yuvutils_rs::rgba_to_yuv420,
        (1, 0) => yuvutils_rs::rgba_to_yuv422,
        _ => yuvutils_rs::rgba_to_yuv444,
    };
    to_yuv(&mut image, rgba.as_raw(), rgba_stride, range, MATRIX, mode).map_err(conversion_failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight(format: PixelFormat, width: u32, height: u32) -> Vec<u8> {
        vec![0u8; format.picture_size(width, height).unwrap()]
    }

    fn roundtrip(source: &RgbaImage, format: PixelFormat, full_range: bool) -> RgbaImage {
        let (width, height) = source.dimensions();
        let mut buf = tight(format, width, height);
        let mut planes = super::super::split_planes_mut(&mut buf, format, width, height).unwrap();
        pack(source, format, &mut planes, full_range).unwrap();
        drop(planes);

        let planes = super::super::split_planes(&buf, format, width, height).unwrap();
        unpack(format, width, height, &planes, full_range).unwrap()
    }

    fn flat(width: u32, height: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, image::Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    #[test]
    fn test_primaries_roundtrip_every_subsampling() {
        for format in [
            PixelFormat::Yuv420p,
            PixelFormat::Yuv422p,
            PixelFormat::Yuv444p,
            PixelFormat::Yuv440p,
        ] {
            for full_range in [true, false] {
                for rgb in [[255u8, 0, 0], [0, 255, 0], [0, 0, 255], [128, 128, 128]] {
                    let back = roundtrip(&flat(6, 4, rgb), format, full_range);
                    let px = back.get_pixel(3, 2).0;
                    for c in 0..3 {
                        assert!(
                            px[c].abs_diff(rgb[c]) <= 4,
                            "{:?} full={} {:?} -> {:?}",
                            format,
                            full_range,
                            rgb,
                            px
                        );
                    }
                    assert_eq!(px[3], 255);
                }
            }
        }
    }

    #[test]
    fn test_limited_range_luma_bounds() {
        let mut buf = tight(PixelFormat::Yuv444p, 2, 2);
        let mut planes = super::super::split_planes_mut(&mut buf, PixelFormat::Yuv444p, 2, 2).unwrap();
        pack(&flat(2, 2, [255, 255, 255]), PixelFormat::Yuv444p, &mut planes, false).unwrap();
        assert!(planes[0].data[0].abs_diff(235) <= 1);
        pack(&flat(2, 2, [0, 0, 0]), PixelFormat::Yuv444p, &mut planes, false).unwrap();
        assert!(planes[0].data[0].abs_diff(16) <= 1);
        pack(&flat(2, 2, [255, 255, 255]), PixelFormat::Yuv444p, &mut planes, true).unwrap();
        assert!(planes[0].data[0] >= 254);
    }

    #[test]
    fn test_yuv440_chroma_rows_are_shared() {
        // top half red, bottom half blue; each chroma row averages one pair
        let source = RgbaImage::from_fn(4, 4, |_, y| {
            if y < 2 {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([0, 0, 255, 255])
            }
        });
        let back = roundtrip(&source, PixelFormat::Yuv440p, true);
        assert!(back.get_pixel(1, 0).0[0] > 200);
        assert!(back.get_pixel(1, 3).0[2] > 200);
    }

    #[test]
    fn test_gray_pack_keeps_alpha() {
        let source = RgbaImage::from_pixel(2, 1, image::Rgba([90, 90, 90, 77]));
        let mut buf = vec![0u8; 4];
        let mut planes = vec![PlaneMut { data: &mut buf, stride: 4 }];
        pack(&source, PixelFormat::GrayA8, &mut planes, true).unwrap();
        drop(planes);
        assert_eq!(buf, vec![90, 77, 90, 77]);
    }

    #[test]
    fn test_palette_destination_rejected() {
        let source = flat(1, 1, [0, 0, 0]);
        let mut buf = vec![0u8; 4];
        let mut planes = vec![PlaneMut { data: &mut buf, stride: 1 }];
        assert_eq!(
            pack(&source, PixelFormat::Pal8, &mut planes, true),
            Err(ScaleError::UnsupportedFormat(PixelFormat::Pal8))
        );
    }
}
