//! Folio WASM - WebAssembly bindings for Folio
//!
//! This crate exposes folio-core to the browser page. It holds no business
//! logic of its own: the page creates one [`Workspace`], feeds it files and
//! input events, and asks it for the finished PDF.
//!
//! # Module Structure
//!
//! - `workspace` - the stateful `Workspace` object (images, editor, gestures, PDF)
//! - `types` - JS-facing wrappers for previews and composed documents
//! - `preferences` - the persisted document language
//! - `logging` - forwards core diagnostics to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { Workspace, load_locale } from '@folio/wasm';
//!
//! await init();
//! const workspace = new Workspace();
//! workspace.stage_upload(file.name, file.type, new Uint8Array(await file.arrayBuffer()));
//! workspace.ingest_staged();
//! const pdf = workspace.compose({ locale: load_locale() }, () => {});
//! ```

use wasm_bindgen::prelude::*;

mod logging;
mod preferences;
mod types;
mod workspace;

pub use preferences::{load_locale, save_locale};
pub use types::{JsComposedPdf, JsPreview};
pub use workspace::{IngestOutcome, Workspace, WorkspaceError};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logging::init(tracing::Level::INFO);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
