//! Image decoding pipeline for Folio.
//!
//! This module provides functionality for:
//! - Decoding uploaded PNG, JPEG, GIF (first frame) and WebP images
//! - Honoring JPEG EXIF orientation so images appear as the browser shows them
//! - Flattening transparency onto white before the JPEG re-encode
//! - Image resizing for ingestion downscale and editor previews
//!
//! # Architecture
//!
//! The decoding pipeline runs inside the WASM module on the page's only
//! thread. Every call runs to completion before its result touches the
//! record store, so the store is never observed mid-decode.

mod raster;
mod resize;
mod types;

pub use raster::decode_image;
pub use resize::{resize, resize_to_bounds, resize_to_fit};
pub use types::{DecodeError, DecodedImage, FilterType, Orientation};
