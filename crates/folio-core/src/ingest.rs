//! Upload validation and batch ingestion.
//!
//! Each upload is validated on its declared MIME type and byte length before
//! any decoding happens. Uploads that fail validation are rejected one by one
//! and reported; the rest of the batch continues. Decoding is all-or-nothing:
//! if any accepted upload fails to decode, the whole batch fails and nothing
//! is produced for the store.

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::decode::{decode_image, resize_to_fit, DecodeError, FilterType};
use crate::encode::{encode_image, EncodeError, DEFAULT_JPEG_QUALITY};
use crate::store::ImageRecord;

/// Largest accepted upload: 50 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Ingested rasters are downscaled so neither side exceeds this.
pub const INGEST_MAX_DIMENSION: u32 = 2000;

/// Declared MIME types accepted at the upload boundary.
pub const ALLOWED_MIME_TYPES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/gif",
    "image/webp",
];

const UNNAMED_IMAGE: &str = "Imagem sem nome";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("File type not allowed: {mime} ({name}). Use PNG, JPEG, GIF or WebP.")]
    UnsupportedType { name: String, mime: String },

    #[error("File too large: {name} is {}. Maximum allowed: 50 MB.", format_byte_size(*.size))]
    TooLarge { name: String, size: u64 },

    #[error("Could not load image {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: DecodeError,
    },

    #[error("Could not re-encode image {name}: {source}")]
    Encode {
        name: String,
        #[source]
        source: EncodeError,
    },
}

impl IngestError {
    /// True for per-file validation failures (the rest of the batch goes on).
    pub fn is_validation(&self) -> bool {
        matches!(self, IngestError::UnsupportedType { .. } | IngestError::TooLarge { .. })
    }
}

/// One raw file from the page: its name, declared MIME type and contents.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Outcome of a batch: records ready to append plus per-file rejections.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub records: Vec<ImageRecord>,
    pub rejected: Vec<IngestError>,
}

/// Check the declared type and size of an upload without touching its bytes.
pub fn validate_upload(name: &str, mime: &str, size: u64) -> Result<(), IngestError> {
    if !ALLOWED_MIME_TYPES.contains(&mime) {
        return Err(IngestError::UnsupportedType {
            name: name.to_string(),
            mime: mime.to_string(),
        });
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(IngestError::TooLarge {
            name: name.to_string(),
            size,
        });
    }
    Ok(())
}

/// Validate, decode, downscale and re-encode a batch of uploads.
///
/// # Errors
///
/// Returns the first decode or encode failure; in that case no record from
/// the batch is returned.
pub fn ingest(uploads: Vec<Upload>) -> Result<IngestReport, IngestError> {
    let mut report = IngestReport::default();
    let mut accepted = Vec::with_capacity(uploads.len());

    for upload in uploads {
        match validate_upload(&upload.name, &upload.mime, upload.size()) {
            Ok(()) => accepted.push(upload),
            Err(err) => {
                warn!("{err}");
                report.rejected.push(err);
            }
        }
    }

    for upload in accepted {
        report.records.push(ingest_one(upload)?);
    }

    debug!(
        accepted = report.records.len(),
        rejected = report.rejected.len(),
        "ingested batch"
    );
    Ok(report)
}

fn ingest_one(upload: Upload) -> Result<ImageRecord, IngestError> {
    let name = if upload.name.trim().is_empty() {
        UNNAMED_IMAGE.to_string()
    } else {
        upload.name
    };

    let decoded = decode_image(&upload.bytes)
        .and_then(|img| resize_to_fit(&img, INGEST_MAX_DIMENSION, FilterType::Lanczos3))
        .map_err(|source| {
            error!(%name, "decode failed: {source}");
            IngestError::Decode {
                name: name.clone(),
                source,
            }
        })?;

    let encoded = encode_image(&decoded, DEFAULT_JPEG_QUALITY).map_err(|source| {
        error!(%name, "encode failed: {source}");
        IngestError::Encode {
            name: name.clone(),
            source,
        }
    })?;

    debug!(%name, width = decoded.width, height = decoded.height, "ingested image");
    Ok(ImageRecord::new(
        name,
        upload.bytes.len() as u64,
        upload.mime,
        encoded,
        decoded,
    ))
}

/// Human-readable byte count in 1024 steps: `0 Bytes`, `1.5 KB`, `60 MB`.
pub fn format_byte_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", (value * 100.0).round() / 100.0);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    use super::Upload;

    pub fn png_upload(name: &str, width: u32, height: u32) -> Upload {
        let img = RgbImage::from_pixel(width, height, Rgb([30, 60, 90]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        Upload::new(name, "image/png", buffer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::png_upload;
    use super::*;
    use crate::geometry::Size;

    #[test]
    fn test_validate_accepts_allowed_types() {
        for mime in ALLOWED_MIME_TYPES {
            assert!(validate_upload("a", mime, 10).is_ok());
        }
    }

    #[test]
    fn test_validate_rejects_type() {
        let err = validate_upload("doc.pdf", "application/pdf", 10).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedType { .. }));
        assert!(err.is_validation());
    }

    #[test]
    fn test_validate_size_boundary() {
        assert!(validate_upload("a.png", "image/png", MAX_UPLOAD_BYTES).is_ok());
        let err = validate_upload("a.png", "image/png", MAX_UPLOAD_BYTES + 1).unwrap_err();
        assert!(matches!(err, IngestError::TooLarge { size, .. } if size == MAX_UPLOAD_BYTES + 1));
    }

    #[test]
    fn test_too_large_message_uses_readable_size() {
        let err = validate_upload("big.png", "image/png", 60 * 1024 * 1024).unwrap_err();
        assert_eq!(
            err.to_string(),
            "File too large: big.png is 60 MB. Maximum allowed: 50 MB."
        );
    }

    #[test]
    fn test_ingest_downscales_large_images() {
        let report = ingest(vec![png_upload("wide.png", 2400, 600)]).unwrap();
        let record = &report.records[0];

        assert_eq!(record.size(), Size::new(2000, 500));
        assert_eq!(record.mime(), "image/png");
        assert_eq!(&record.encoded()[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_ingest_keeps_small_images() {
        let report = ingest(vec![png_upload("small.png", 40, 30)]).unwrap();
        assert_eq!(report.records[0].size(), Size::new(40, 30));
        assert!(report.records[0].raster().is_some());
    }

    #[test]
    fn test_ingest_reports_rejections_and_continues() {
        let report = ingest(vec![
            png_upload("ok.png", 4, 4),
            Upload::new("notes.txt", "text/plain", b"hello".to_vec()),
        ])
        .unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert!(matches!(report.rejected[0], IngestError::UnsupportedType { .. }));
    }

    #[test]
    fn test_ingest_decode_failure_fails_batch() {
        let result = ingest(vec![
            png_upload("ok.png", 4, 4),
            Upload::new("broken.png", "image/png", vec![0x89, b'P', b'N', b'G', 0, 0]),
        ]);
        assert!(matches!(result, Err(IngestError::Decode { ref name, .. }) if name == "broken.png"));
    }

    #[test]
    fn test_ingest_unnamed_upload() {
        let mut upload = png_upload("", 2, 2);
        upload.name = "  ".to_string();
        let report = ingest(vec![upload]).unwrap();
        assert_eq!(report.records[0].name(), UNNAMED_IMAGE);
    }

    #[test]
    fn test_format_byte_size() {
        assert_eq!(format_byte_size(0), "0 Bytes");
        assert_eq!(format_byte_size(512), "512 Bytes");
        assert_eq!(format_byte_size(1536), "1.5 KB");
        assert_eq!(format_byte_size(60 * 1024 * 1024), "60 MB");
        assert_eq!(format_byte_size(1_288_490_189), "1.2 GB");
    }
}
