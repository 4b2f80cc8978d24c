//! Folio Core - image ordering, editing and PDF composition
//!
//! This crate holds everything Folio does with images, independent of the
//! browser: validating and decoding uploads, keeping the ordered record
//! store, rotate/crop editing, drag and touch reordering, and laying the
//! images out into a paginated PDF.

pub mod compose;
pub mod decode;
pub mod edit;
pub mod encode;
pub mod geometry;
pub mod ingest;
pub mod locale;
pub mod reorder;
pub mod store;
pub mod transform;

pub use compose::{
    CompositionError, ComposedPdf, Compositor, ImagesPerPage, PageSettings, PdfConfig, Progress,
};
pub use decode::{decode_image, DecodeError, DecodedImage};
pub use edit::{EditError, EditSession, EditSummary, Editor};
pub use encode::{encode_image, EncodeError, DEFAULT_JPEG_QUALITY};
pub use geometry::{Point, Rect, Size};
pub use ingest::{ingest, IngestError, IngestReport, Upload};
pub use locale::Locale;
pub use reorder::{MoveCommand, MoveRequest, PointerDrag, TouchDrag};
pub use store::{ImageId, ImageRecord, ImageStore, ImageSummary, MoveOutcome, StoreError};
pub use transform::QuarterTurn;
