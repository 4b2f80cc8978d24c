//! JPEG re-encoding for stored images.
//!
//! Every raster that enters the record store, whether freshly ingested or
//! produced by committing an edit, is re-encoded here so the PDF compositor
//! can embed the bytes directly as a DCT stream.

mod jpeg;

pub use jpeg::{encode_image, encode_jpeg, EncodeError, DEFAULT_JPEG_QUALITY};
