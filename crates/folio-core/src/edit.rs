//! Rotate/crop edit session for a single image.
//!
//! An [`EditSession`] is opened against one record in the store and holds
//! all working state: the pre-edit raster, the accumulated quarter-turn
//! rotation, the editor canvas size and an optional crop selection drawn in
//! canvas coordinates. Nothing touches the store until [`EditSession::commit`].
//!
//! [`Editor`] owns the "is a session open" question so callers never keep
//! ambient editing state of their own.

use thiserror::Error;
use tracing::{debug, warn};

use crate::decode::{decode_image, resize_to_bounds, DecodeError, DecodedImage, FilterType};
use crate::encode::{encode_image, EncodeError, DEFAULT_JPEG_QUALITY};
use crate::geometry::{
    map_crop_rect_to_source, rotated_canvas_size, scale_to_bounds, Point, Rect, Size,
};
use crate::store::{ImageId, ImageStore};
use crate::transform::{apply_crop, apply_rotation, QuarterTurn};

/// Largest canvas the editor draws on.
pub const EDITOR_CANVAS_BOUNDS: Size = Size::new(500, 400);

/// Fraction of the canvas covered by a freshly seeded crop (10% margins).
pub const DEFAULT_CROP_FRACTION: f64 = 0.8;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("Image {0} not found")]
    RecordNotFound(ImageId),

    #[error("No image is open for editing")]
    NotOpen,

    #[error("Rotation must be a multiple of 90 degrees, got {0}")]
    UnsupportedAngle(i32),

    #[error("Could not save edit: image {0} no longer exists")]
    CommitFailed(ImageId),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Crop rectangle plus the anchor of an in-progress pointer drag.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CropSelection {
    rect: Rect,
    drag_origin: Option<Point>,
}

/// What a successful commit wrote back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct EditSummary {
    pub id: ImageId,
    pub rotation_degrees: i32,
    pub cropped: bool,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    id: ImageId,
    name: String,
    source: DecodedImage,
    rotation: QuarterTurn,
    canvas: Size,
    crop: Option<CropSelection>,
}

impl EditSession {
    /// Open a session on `id`.
    ///
    /// Uses the record's retained raster, decoding the stored JPEG when none
    /// was kept.
    pub fn open(store: &ImageStore, id: ImageId) -> Result<Self, EditError> {
        let record = store.get(id).ok_or_else(|| {
            warn!(%id, "cannot open editor: record not found");
            EditError::RecordNotFound(id)
        })?;

        let source = match record.raster() {
            Some(raster) => raster.clone(),
            None => decode_image(record.encoded())?,
        };

        let canvas = scale_to_bounds(source.size(), EDITOR_CANVAS_BOUNDS);
        debug!(%id, ?canvas, "opened edit session");

        Ok(Self {
            id,
            name: record.name().to_string(),
            source,
            rotation: QuarterTurn::None,
            canvas,
            crop: None,
        })
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rotation(&self) -> QuarterTurn {
        self.rotation
    }

    /// Current editor canvas size; crop coordinates are relative to it.
    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    pub fn is_cropping(&self) -> bool {
        self.crop.is_some()
    }

    pub fn crop_rect(&self) -> Option<Rect> {
        self.crop.map(|c| c.rect)
    }

    /// Add `delta_degrees` (a multiple of 90) to the accumulated rotation.
    ///
    /// The canvas is resized for the new orientation. An active crop loses
    /// any in-progress drag and is re-seeded on the new canvas.
    pub fn rotate(&mut self, delta_degrees: i32) -> Result<(), EditError> {
        let target = self.rotation.degrees() + delta_degrees.rem_euclid(360);
        let rotation =
            QuarterTurn::from_degrees(target).ok_or(EditError::UnsupportedAngle(delta_degrees))?;

        self.rotation = rotation;
        self.canvas = scale_to_bounds(
            rotated_canvas_size(self.source.size(), rotation.degrees()),
            EDITOR_CANVAS_BOUNDS,
        );
        if self.crop.is_some() {
            self.crop = Some(self.seeded_crop());
        }
        debug!(id = %self.id, degrees = rotation.degrees(), canvas = ?self.canvas, "rotated");
        Ok(())
    }

    /// Enter or leave crop mode; returns whether crop mode is now active.
    pub fn toggle_crop(&mut self) -> bool {
        self.crop = match self.crop {
            Some(_) => None,
            None => Some(self.seeded_crop()),
        };
        self.crop.is_some()
    }

    /// Replace the crop with the bounding box of two canvas points.
    ///
    /// Ignored outside crop mode.
    pub fn update_crop_rect(&mut self, start: Point, current: Point) -> Option<Rect> {
        let crop = self.crop.as_mut()?;
        crop.rect = Rect::from_corners(start, current);
        Some(crop.rect)
    }

    pub fn begin_crop_drag(&mut self, at: Point) {
        if let Some(crop) = self.crop.as_mut() {
            crop.drag_origin = Some(at);
            crop.rect = Rect::from_corners(at, at);
        }
    }

    pub fn drag_crop_to(&mut self, at: Point) -> Option<Rect> {
        let origin = self.crop.as_ref()?.drag_origin?;
        self.update_crop_rect(origin, at)
    }

    pub fn end_crop_drag(&mut self) {
        if let Some(crop) = self.crop.as_mut() {
            crop.drag_origin = None;
        }
    }

    pub fn is_dragging_crop(&self) -> bool {
        self.crop.is_some_and(|c| c.drag_origin.is_some())
    }

    /// The source rotated and scaled to the canvas, for redrawing the editor.
    pub fn preview(&self) -> Result<DecodedImage, EditError> {
        let rotated = apply_rotation(&self.source, self.rotation);
        Ok(resize_to_bounds(&rotated, EDITOR_CANVAS_BOUNDS, FilterType::Bilinear)?)
    }

    /// Render the edit at source resolution and write it back to the store.
    ///
    /// The crop is mapped from canvas coordinates onto the rotated source;
    /// an empty mapped rectangle means no crop.
    ///
    /// # Errors
    ///
    /// `CommitFailed` if the record vanished from the store since the session
    /// was opened. The store is untouched in that case.
    pub fn commit(&self, store: &mut ImageStore) -> Result<EditSummary, EditError> {
        if store.get(self.id).is_none() {
            warn!(id = %self.id, "commit target disappeared");
            return Err(EditError::CommitFailed(self.id));
        }

        let rotated = apply_rotation(&self.source, self.rotation);
        let region = self
            .crop
            .map(|c| map_crop_rect_to_source(c.rect, self.canvas, rotated.size()))
            .filter(|r| !r.is_empty());

        let output = match region {
            Some(rect) => apply_crop(&rotated, rect),
            None => rotated,
        };
        let encoded = encode_image(&output, DEFAULT_JPEG_QUALITY)?;

        let summary = EditSummary {
            id: self.id,
            rotation_degrees: self.rotation.degrees(),
            cropped: region.is_some(),
            width: output.width,
            height: output.height,
        };
        store
            .replace_raster(self.id, encoded, output)
            .map_err(|_| EditError::CommitFailed(self.id))?;

        debug!(?summary, "committed edit");
        Ok(summary)
    }

    fn seeded_crop(&self) -> CropSelection {
        CropSelection {
            rect: Rect::centered_fraction(self.canvas, DEFAULT_CROP_FRACTION),
            drag_origin: None,
        }
    }
}

/// Holder for the at-most-one open edit session.
#[derive(Debug, Default)]
pub struct Editor {
    session: Option<EditSession>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Open a session on `id`, replacing any open one.
    ///
    /// On failure the editor is left closed.
    pub fn open(&mut self, store: &ImageStore, id: ImageId) -> Result<&mut EditSession, EditError> {
        self.session = None;
        Ok(self.session.insert(EditSession::open(store, id)?))
    }

    pub fn session(&self) -> Result<&EditSession, EditError> {
        self.session.as_ref().ok_or(EditError::NotOpen)
    }

    pub fn session_mut(&mut self) -> Result<&mut EditSession, EditError> {
        self.session.as_mut().ok_or(EditError::NotOpen)
    }

    /// Commit and close. The session is discarded whether or not the
    /// commit succeeds.
    pub fn save(&mut self, store: &mut ImageStore) -> Result<EditSummary, EditError> {
        let session = self.session.take().ok_or(EditError::NotOpen)?;
        session.commit(store)
    }

    /// Close without touching the store. Returns whether a session was open.
    pub fn cancel(&mut self) -> bool {
        self.session.take().is_some()
    }
}
