//! Pictor WASM - WebAssembly bindings for Pictor
//!
//! This crate provides WASM bindings to expose the pictor-core image session
//! to JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `session` - Decode, render and thumbnail bindings (`JsImageSession`)
//! - `types` - WASM-compatible wrapper types for rendered surfaces
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsImageSession } from '@pictor/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const session = new JsImageSession();
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! if (session.loadFromMemory(bytes, file.type, 0, 0)) {
//!   console.log(`Decoded ${session.originalWidth}x${session.originalHeight}`);
//! }
//! ```

use wasm_bindgen::prelude::*;

mod session;
mod types;

pub use session::JsImageSession;
pub use types::JsSurface;

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
