//! Thumbnail encoding pipeline.
//!
//! This module provides functionality for:
//! - Converting a raw 32-bit ARGB surface into the codec's input layout
//! - Encoding it as a single JPEG or PNG frame
//! - Holding the encoded bytes in an [`OutputBuffer`] until released
//!
//! # Architecture
//!
//! Encoding needs no prior decode. The encoder context, intermediate picture
//! and frame view live only for the duration of [`encode_thumbnail`]; the
//! returned [`OutputBuffer`] is the single owner of the packet bytes.
//!
//! # Examples
//!
//! ```ignore
//! use pictor_core::encode::{encode_thumbnail, ThumbnailRequest};
//! use pictor_core::pixel::SurfaceFormat;
//! use pictor_core::PipelineConfig;
//!
//! let pixels = vec![200u8; 128 * 128 * 4];
//! let request = ThumbnailRequest {
//!     pixels: &pixels,
//!     width: 128,
//!     height: 128,
//!     pitch: 512,
//!     format: SurfaceFormat::Argb32,
//!     mime_type: "image/png",
//!     dest_file: "thumb.png",
//! };
//! let mut thumb = encode_thumbnail(&request, &PipelineConfig::default()).unwrap();
//! println!("Encoded {} bytes", thumb.len());
//! thumb.release();
//! ```

mod buffer;
mod codec;
mod thumbnail;

pub use buffer::OutputBuffer;
pub use codec::{EncodeError, EncoderContext, EncoderParams, FrameView, ThumbnailCodec, QP2LAMBDA};
pub use thumbnail::{encode_thumbnail, ThumbnailRequest};
