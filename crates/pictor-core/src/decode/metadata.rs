//! EXIF metadata lookup on the source container.

use std::io::{BufRead, Seek};

use exif::{In, Reader, Tag};

use super::Orientation;

/// Read the `Orientation` tag from a JPEG, TIFF, PNG or WebP container.
///
/// Returns `Orientation::Unknown` if no EXIF data is found, the tag is absent,
/// or its value is outside 0..=8.
pub fn read_orientation<R: BufRead + Seek>(reader: &mut R) -> Orientation {
    let exif = match Reader::new().read_from_container(reader) {
        Ok(exif) => exif,
        Err(e) => {
            log::trace!("no EXIF metadata: {}", e);
            return Orientation::Unknown;
        }
    };

    let Some(value) = exif
        .get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
    else {
        return Orientation::Unknown;
    };

    Orientation::from_raw(value).unwrap_or_else(|| {
        log::debug!("ignoring out-of-range orientation {}", value);
        Orientation::Unknown
    })
}

/// Build an APP1 EXIF segment carrying only an orientation tag.
#[cfg(test)]
pub(crate) fn exif_app1_segment(orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\0*");
    tiff.extend_from_slice(&8u32.to_be_bytes());
    tiff.extend_from_slice(&1u16.to_be_bytes());
    // tag 0x0112, type SHORT, count 1, value left-justified
    tiff.extend_from_slice(&0x0112u16.to_be_bytes());
    tiff.extend_from_slice(&3u16.to_be_bytes());
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_be_bytes());

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(&payload);
    segment
}

/// Insert an EXIF segment right after the SOI marker of a JPEG.
#[cfg(test)]
pub(crate) fn with_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&exif_app1_segment(orientation));
    out.extend_from_slice(&jpeg[2..]);
    out
}
