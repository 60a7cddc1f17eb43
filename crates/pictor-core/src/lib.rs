//! Pictor Core - in-memory image pipeline
//!
//! This crate decodes a compressed still image held in memory, renders it
//! into a caller-supplied 32-bit ARGB surface at a bounded size, and encodes
//! raw ARGB surfaces into JPEG or PNG thumbnails.
//!
//! Most callers only need [`ImageSession`]; the stage modules are public for
//! callers that want the typed errors.

pub mod config;
pub mod decode;
pub mod encode;
pub mod pixel;
pub mod render;
pub mod scale;
pub mod session;
pub mod sniff;
pub mod stream;

pub use config::{ConfigError, PipelineConfig};
pub use decode::{decode_image, DecodeError, DecodedImage, Orientation};
pub use encode::{encode_thumbnail, EncodeError, OutputBuffer, ThumbnailRequest};
pub use pixel::{ColorRange, PixelFormat, SurfaceFormat};
pub use render::{fit_geometry, render_into, render_to_surface, RenderError, RenderRequest};
pub use scale::FilterType;
pub use session::ImageSession;
pub use sniff::{sniff, SourceFormat};
pub use stream::BoundedMemoryStream;
