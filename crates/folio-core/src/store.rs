//! Ordered image record store.
//!
//! The store owns every loaded [`ImageRecord`] in display order plus the
//! original order snapshot used by "restore original order". Callers only get
//! shared references or owned summaries; all mutation goes through the
//! methods below so the two sequences stay consistent.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::decode::DecodedImage;
use crate::geometry::Size;

static NEXT_IMAGE_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique identifier of an image record.
///
/// Stable across reorders and edits; never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(u32);

impl ImageId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        ImageId(NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Rebuild an id received from the page. Does not allocate.
    pub const fn from_raw(raw: u32) -> Self {
        ImageId(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "img-{}", self.0)
    }
}

/// Errors raised by store operations that reference a record or position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Image {0} not found")]
    RecordNotFound(ImageId),

    #[error("Position {index} is out of bounds for {len} images")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// One loaded image: metadata plus the current encoded raster.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub(crate) id: ImageId,
    pub(crate) name: String,
    pub(crate) size_bytes: u64,
    pub(crate) mime: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) encoded: Vec<u8>,
    pub(crate) raster: Option<DecodedImage>,
}

impl ImageRecord {
    /// Build a record around an encoded JPEG and the raster it was encoded from.
    ///
    /// `size_bytes` and `mime` describe the original upload and are kept for
    /// display only.
    pub fn new(
        name: impl Into<String>,
        size_bytes: u64,
        mime: impl Into<String>,
        encoded: Vec<u8>,
        raster: DecodedImage,
    ) -> Self {
        Self {
            id: ImageId::next(),
            name: name.into(),
            size_bytes,
            mime: mime.into(),
            width: raster.width,
            height: raster.height,
            encoded,
            raster: Some(raster),
        }
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Current JPEG bytes.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// Retained raster for re-editing, if any.
    pub fn raster(&self) -> Option<&DecodedImage> {
        self.raster.as_ref()
    }

    /// A record is usable only with non-zero dimensions and encoded data.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && !self.encoded.is_empty()
    }

    /// `data:` URL of the current encoded raster, for `<img src>` previews.
    pub fn data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(&self.encoded))
    }

    pub fn summary(&self) -> ImageSummary {
        ImageSummary {
            id: self.id,
            name: self.name.clone(),
            size_bytes: self.size_bytes,
            mime: self.mime.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

/// Serializable view of a record, without pixel data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub id: ImageId,
    pub name: String,
    pub size_bytes: u64,
    pub mime: String,
    pub width: u32,
    pub height: u32,
}

/// Result of a successful [`ImageStore::move_image`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { from: usize, to: usize },
    AlreadyAtPosition,
}

/// The ordered collection plus its original order snapshot.
#[derive(Debug, Default)]
pub struct ImageStore {
    records: Vec<ImageRecord>,
    original_order: Vec<ImageId>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in display order.
    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.records.iter()
    }

    pub fn get(&self, id: ImageId) -> Option<&ImageRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Current index of `id` in display order.
    pub fn position(&self, id: ImageId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// Ids in display order.
    pub fn order(&self) -> Vec<ImageId> {
        self.records.iter().map(|r| r.id).collect()
    }

    /// Ids in original (load) order.
    pub fn original_order(&self) -> &[ImageId] {
        &self.original_order
    }

    /// Owned summaries in display order.
    pub fn snapshot(&self) -> Vec<ImageSummary> {
        self.records.iter().map(ImageRecord::summary).collect()
    }

    /// Append a batch at the end. The snapshot is extended, never reset.
    ///
    /// Records failing [`ImageRecord::is_valid`] are dropped with a warning.
    /// Returns how many were actually added.
    pub fn append(&mut self, batch: Vec<ImageRecord>) -> usize {
        let before = self.records.len();
        for record in batch {
            if !record.is_valid() {
                warn!(
                    id = %record.id,
                    name = %record.name,
                    width = record.width,
                    height = record.height,
                    "dropping invalid image record"
                );
                continue;
            }
            self.original_order.push(record.id);
            self.records.push(record);
        }
        let added = self.records.len() - before;
        debug!(added, total = self.records.len(), "appended images");
        added
    }

    /// Remove a record from both the live order and the snapshot.
    pub fn remove(&mut self, id: ImageId) -> Result<ImageRecord, StoreError> {
        let index = self.require_position(id)?;
        self.original_order.retain(|&other| other != id);
        let record = self.records.remove(index);
        debug!(%id, index, "removed image");
        Ok(record)
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.original_order.clear();
        debug!("cleared all images");
    }

    /// Move `id` to `target_index`, shifting the records in between.
    ///
    /// # Errors
    ///
    /// `RecordNotFound` for an unknown id, `IndexOutOfBounds` for a target
    /// past the end. Neither mutates the store.
    pub fn move_image(&mut self, id: ImageId, target_index: usize) -> Result<MoveOutcome, StoreError> {
        let from = self.require_position(id)?;
        if target_index >= self.records.len() {
            let err = StoreError::IndexOutOfBounds {
                index: target_index,
                len: self.records.len(),
            };
            warn!(%id, "{err}");
            return Err(err);
        }
        if from == target_index {
            debug!(%id, index = from, "image already at position");
            return Ok(MoveOutcome::AlreadyAtPosition);
        }

        let record = self.records.remove(from);
        self.records.insert(target_index, record);
        debug!(%id, from, to = target_index, "moved image");
        Ok(MoveOutcome::Moved {
            from,
            to: target_index,
        })
    }

    /// Restore the original load order. Edited rasters are kept.
    pub fn reset_order(&mut self) {
        let mut remaining = std::mem::take(&mut self.records);
        let mut restored = Vec::with_capacity(remaining.len());
        for id in &self.original_order {
            if let Some(pos) = remaining.iter().position(|r| r.id == *id) {
                restored.push(remaining.swap_remove(pos));
            }
        }
        // Anything the snapshot does not know about keeps its relative order.
        restored.extend(remaining);
        self.records = restored;
        debug!(total = self.records.len(), "restored original order");
    }

    /// True iff the live order differs from the snapshot.
    pub fn order_changed(&self) -> bool {
        self.records.len() != self.original_order.len()
            || self
                .records
                .iter()
                .zip(&self.original_order)
                .any(|(record, id)| record.id != *id)
    }

    /// Swap in a new encoded raster after an edit. The id, name, upload size
    /// and MIME type are preserved.
    pub fn replace_raster(
        &mut self,
        id: ImageId,
        encoded: Vec<u8>,
        raster: DecodedImage,
    ) -> Result<(), StoreError> {
        let index = self.require_position(id)?;
        let record = &mut self.records[index];
        record.width = raster.width;
        record.height = raster.height;
        record.encoded = encoded;
        record.raster = Some(raster);
        debug!(%id, width = record.width, height = record.height, "replaced raster");
        Ok(())
    }

    /// Drop records that fail [`ImageRecord::is_valid`]. Returns how many.
    pub fn purge_invalid(&mut self) -> usize {
        let before = self.records.len();
        let mut purged = Vec::new();
        self.records.retain(|r| {
            let keep = r.is_valid();
            if !keep {
                purged.push(r.id);
            }
            keep
        });
        if !purged.is_empty() {
            self.original_order.retain(|id| !purged.contains(id));
            warn!(count = purged.len(), "purged invalid image records");
        }
        before - self.records.len()
    }

    fn require_position(&self, id: ImageId) -> Result<usize, StoreError> {
        self.position(id).ok_or_else(|| {
            let err = StoreError::RecordNotFound(id);
            warn!("{err}");
            err
        })
    }
}



// ============================================================================
// Property-Based Tests
// ============================================================================
