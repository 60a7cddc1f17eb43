//! Image decoding pipeline.
//!
//! This module provides functionality for:
//! - Opening an in-memory buffer as a sniffed container format
//! - Decoding exactly one frame into owned storage
//! - Capturing geometry, alpha and EXIF orientation alongside the frame
//!
//! # Architecture
//!
//! All operations are synchronous and single-threaded. The decode session
//! (memory stream, buffered reader, format decoder) lives only for the
//! duration of [`decode_image`]; the returned [`DecodedImage`] owns its pixels.
//!
//! # Examples
//!
//! ```ignore
//! use pictor_core::decode::decode_image;
//! use pictor_core::PipelineConfig;
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let image = decode_image(&bytes, "image/jpeg", &PipelineConfig::default()).unwrap();
//! println!("Decoded {}x{} image", image.original_width, image.original_height);
//! ```

mod decoder;
mod metadata;
mod types;

pub use decoder::decode_image;
pub use metadata::read_orientation;
pub use types::{DecodeError, DecodedImage, Frame, Orientation, Plane};

#[cfg(test)]
pub(crate) use metadata::with_orientation;
