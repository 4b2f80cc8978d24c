//! The stateful object the page drives.
//!
//! A `Workspace` owns the record store and the gesture and editor state. JS
//! event handlers call into it; every exported method forwards to an inner
//! method returning [`WorkspaceError`], so the logic stays testable off the
//! browser.
//!
//! State lives in `RefCell`s. A borrow conflict can only happen when a JS
//! callback (the progress callback of `compose`) re-enters the workspace, and
//! it is reported as [`WorkspaceError::Busy`] instead of panicking.

use std::cell::{Ref, RefCell, RefMut};

use chrono::NaiveDate;
use folio_core::compose::CompositionError;
use folio_core::edit::EditError;
use folio_core::ingest::IngestError;
use folio_core::{
    ingest, ComposedPdf, Compositor, Editor, EditSummary, ImageId, ImageStore, ImageSummary,
    MoveCommand, MoveOutcome, PdfConfig, Point, PointerDrag, Progress, StoreError, TouchDrag,
    Upload,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use wasm_bindgen::prelude::*;

use crate::types::{JsComposedPdf, JsPreview};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Workspace is busy")]
    Busy,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Compose(#[from] CompositionError),

    #[error("Invalid PDF settings: {0}")]
    Config(String),
}

fn to_js(err: WorkspaceError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn rect_to_vec(rect: folio_core::Rect) -> Vec<f64> {
    vec![rect.x, rect.y, rect.width, rect.height]
}

/// Result of a batch upload as seen by the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    pub added: usize,
    /// One user-facing message per rejected file.
    pub rejected: Vec<String>,
}

#[wasm_bindgen]
#[derive(Default)]
pub struct Workspace {
    store: RefCell<ImageStore>,
    staged: RefCell<Vec<Upload>>,
    editor: RefCell<Editor>,
    pointer: RefCell<PointerDrag>,
    touch: RefCell<TouchDrag>,
    compositor: Compositor,
}

fn borrow<T>(cell: &RefCell<T>) -> Result<Ref<'_, T>, WorkspaceError> {
    cell.try_borrow().map_err(|_| WorkspaceError::Busy)
}

fn borrow_mut<T>(cell: &RefCell<T>) -> Result<RefMut<'_, T>, WorkspaceError> {
    cell.try_borrow_mut().map_err(|_| WorkspaceError::Busy)
}

// Rust-side operations.
impl Workspace {
    pub(crate) fn stage(&self, upload: Upload) -> Result<usize, WorkspaceError> {
        let mut staged = borrow_mut(&self.staged)?;
        staged.push(upload);
        Ok(staged.len())
    }

    /// Ingest every staged upload as one batch. The staging area is emptied
    /// whether or not the batch succeeds.
    pub(crate) fn ingest_staged_inner(&self) -> Result<IngestOutcome, WorkspaceError> {
        let uploads = std::mem::take(&mut *borrow_mut(&self.staged)?);
        let mut store = borrow_mut(&self.store)?;
        let report = ingest(uploads)?;

        let rejected = report.rejected.iter().map(ToString::to_string).collect();
        let added = store.append(report.records);
        info!(added, total = store.len(), "images loaded");
        Ok(IngestOutcome { added, rejected })
    }

    /// Invalid records are purged before anything is listed.
    pub(crate) fn snapshot(&self) -> Result<Vec<ImageSummary>, WorkspaceError> {
        let mut store = borrow_mut(&self.store)?;
        store.purge_invalid();
        Ok(store.snapshot())
    }

    pub(crate) fn remove_inner(&self, id: ImageId) -> Result<(), WorkspaceError> {
        borrow_mut(&self.store)?.remove(id)?;
        Ok(())
    }

    pub(crate) fn move_inner(&self, id: ImageId, command: MoveCommand) -> Result<bool, WorkspaceError> {
        let outcome = command.execute(&mut *borrow_mut(&self.store)?, id)?;
        Ok(matches!(outcome, MoveOutcome::Moved { .. }))
    }

    pub(crate) fn drop_inner(&self, target_index: usize) -> Result<bool, WorkspaceError> {
        let request = borrow_mut(&self.pointer)?.drop_on(target_index);
        self.apply(request)
    }

    pub(crate) fn touch_end_inner(&self, target_index: Option<usize>) -> Result<bool, WorkspaceError> {
        let request = borrow_mut(&self.touch)?.touch_end(target_index);
        self.apply(request)
    }

    fn apply(&self, request: Option<folio_core::MoveRequest>) -> Result<bool, WorkspaceError> {
        match request {
            Some(request) => {
                let outcome = request.apply(&mut *borrow_mut(&self.store)?)?;
                Ok(matches!(outcome, MoveOutcome::Moved { .. }))
            }
            None => Ok(false),
        }
    }

    pub(crate) fn edit_open_inner(&self, id: ImageId) -> Result<folio_core::DecodedImage, WorkspaceError> {
        let store = borrow(&self.store)?;
        let mut editor = borrow_mut(&self.editor)?;
        Ok(editor.open(&store, id)?.preview()?)
    }

    pub(crate) fn edit_rotate_inner(&self, delta: i32) -> Result<folio_core::DecodedImage, WorkspaceError> {
        let mut editor = borrow_mut(&self.editor)?;
        let session = editor.session_mut()?;
        session.rotate(delta)?;
        Ok(session.preview()?)
    }

    pub(crate) fn edit_save_inner(&self) -> Result<EditSummary, WorkspaceError> {
        let mut store = borrow_mut(&self.store)?;
        let summary = borrow_mut(&self.editor)?.save(&mut store)?;
        Ok(summary)
    }

    pub(crate) fn compose_inner(
        &self,
        config: &PdfConfig,
        today: NaiveDate,
        progress: impl FnMut(Progress),
    ) -> Result<ComposedPdf, WorkspaceError> {
        let mut store = borrow_mut(&self.store)?;
        store.purge_invalid();
        let pdf = self.compositor.compose(store.records(), config, today, progress)?;
        info!(pages = pdf.page_count, filename = %pdf.filename, "pdf ready");
        Ok(pdf)
    }
}

#[wasm_bindgen]
impl Workspace {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Workspace {
        Workspace::default()
    }

    /// Number of loaded images.
    #[wasm_bindgen(getter)]
    pub fn len(&self) -> usize {
        self.store.try_borrow().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ---------------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------------

    /// Queue one file for the next `ingest_staged` call.
    ///
    /// ```typescript
    /// for (const file of input.files) {
    ///   workspace.stage_upload(file.name, file.type, new Uint8Array(await file.arrayBuffer()));
    /// }
    /// const { added, rejected } = workspace.ingest_staged();
    /// ```
    pub fn stage_upload(&self, name: String, mime: String, bytes: Vec<u8>) -> Result<usize, JsValue> {
        self.stage(Upload::new(name, mime, bytes)).map_err(to_js)
    }

    /// Decode and append all staged files. Fails as a whole if any file
    /// cannot be decoded; files with a bad type or size are only listed in
    /// `rejected`.
    pub fn ingest_staged(&self) -> Result<JsValue, JsValue> {
        let outcome = self.ingest_staged_inner().map_err(to_js)?;
        serde_wasm_bindgen::to_value(&outcome).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Ordered summaries of the loaded images.
    pub fn images(&self) -> Result<JsValue, JsValue> {
        let snapshot = self.snapshot().map_err(to_js)?;
        serde_wasm_bindgen::to_value(&snapshot).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// `data:` URL of an image's current pixels, for thumbnails.
    pub fn data_url(&self, id: u32) -> Result<String, JsValue> {
        let id = ImageId::from_raw(id);
        let store = borrow(&self.store).map_err(to_js)?;
        store
            .get(id)
            .map(|record| record.data_url())
            .ok_or_else(|| to_js(StoreError::RecordNotFound(id).into()))
    }

    pub fn remove(&self, id: u32) -> Result<(), JsValue> {
        self.remove_inner(ImageId::from_raw(id)).map_err(to_js)
    }

    pub fn clear(&self) -> Result<(), JsValue> {
        borrow_mut(&self.store).map_err(to_js)?.clear();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Ordering
    // ---------------------------------------------------------------------

    /// Move an image to `target_index`. Returns whether anything moved.
    pub fn move_image(&self, id: u32, target_index: usize) -> Result<bool, JsValue> {
        self.move_inner(ImageId::from_raw(id), MoveCommand::ToIndex(target_index))
            .map_err(to_js)
    }

    pub fn move_up(&self, id: u32) -> Result<bool, JsValue> {
        self.move_inner(ImageId::from_raw(id), MoveCommand::Up).map_err(to_js)
    }

    pub fn move_down(&self, id: u32) -> Result<bool, JsValue> {
        self.move_inner(ImageId::from_raw(id), MoveCommand::Down).map_err(to_js)
    }

    pub fn reset_order(&self) -> Result<(), JsValue> {
        borrow_mut(&self.store).map_err(to_js)?.reset_order();
        Ok(())
    }

    pub fn order_changed(&self) -> bool {
        self.store.try_borrow().map(|s| s.order_changed()).unwrap_or(false)
    }

    /// `dragstart` on a thumbnail.
    pub fn drag_start(&self, id: u32) -> Result<(), JsValue> {
        borrow_mut(&self.pointer).map_err(to_js)?.start(ImageId::from_raw(id));
        Ok(())
    }

    /// `drop` on the thumbnail at `target_index`.
    pub fn drag_drop(&self, target_index: usize) -> Result<bool, JsValue> {
        self.drop_inner(target_index).map_err(to_js)
    }

    pub fn drag_cancel(&self) -> Result<(), JsValue> {
        borrow_mut(&self.pointer).map_err(to_js)?.cancel();
        Ok(())
    }

    /// `touchstart`; `now_ms` is `event.timeStamp`.
    pub fn touch_start(&self, id: u32, x: f64, y: f64, now_ms: f64) -> Result<(), JsValue> {
        borrow_mut(&self.touch)
            .map_err(to_js)?
            .touch_start(ImageId::from_raw(id), Point::new(x, y), now_ms);
        Ok(())
    }

    /// Long-press timer tick. Returns true once the drag has begun.
    pub fn touch_hold(&self, now_ms: f64) -> Result<bool, JsValue> {
        Ok(borrow_mut(&self.touch).map_err(to_js)?.hold_elapsed(now_ms))
    }

    /// `touchmove`. Returns the `[dx, dy]` translation of the dragged
    /// thumbnail, or `undefined` when no drag is active.
    pub fn touch_move(&self, x: f64, y: f64, now_ms: f64) -> Result<Option<Vec<f64>>, JsValue> {
        let offset = borrow_mut(&self.touch)
            .map_err(to_js)?
            .touch_move(Point::new(x, y), now_ms);
        Ok(offset.map(|p| vec![p.x, p.y]))
    }

    /// `touchend`, with the index of the thumbnail under the finger if any.
    pub fn touch_end(&self, target_index: Option<usize>) -> Result<bool, JsValue> {
        self.touch_end_inner(target_index).map_err(to_js)
    }

    pub fn touch_cancel(&self) -> Result<(), JsValue> {
        borrow_mut(&self.touch).map_err(to_js)?.cancel();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Editing
    // ---------------------------------------------------------------------

    /// Open the editor on an image and return the first canvas.
    pub fn edit_open(&self, id: u32) -> Result<JsPreview, JsValue> {
        self.edit_open_inner(ImageId::from_raw(id))
            .map(JsPreview::from)
            .map_err(to_js)
    }

    /// Rotate by a multiple of 90 degrees and return the redrawn canvas.
    pub fn edit_rotate(&self, delta_degrees: i32) -> Result<JsPreview, JsValue> {
        self.edit_rotate_inner(delta_degrees)
            .map(JsPreview::from)
            .map_err(to_js)
    }

    /// Toggle crop mode. Returns whether crop mode is now on.
    pub fn edit_toggle_crop(&self) -> Result<bool, JsValue> {
        let mut editor = borrow_mut(&self.editor).map_err(to_js)?;
        let session = editor.session_mut().map_err(|e| to_js(e.into()))?;
        Ok(session.toggle_crop())
    }

    pub fn edit_crop_start(&self, x: f64, y: f64) -> Result<(), JsValue> {
        let mut editor = borrow_mut(&self.editor).map_err(to_js)?;
        let session = editor.session_mut().map_err(|e| to_js(e.into()))?;
        session.begin_crop_drag(Point::new(x, y));
        Ok(())
    }

    /// Returns the selection as `[x, y, width, height]` in canvas pixels.
    pub fn edit_crop_move(&self, x: f64, y: f64) -> Result<Option<Vec<f64>>, JsValue> {
        let mut editor = borrow_mut(&self.editor).map_err(to_js)?;
        let session = editor.session_mut().map_err(|e| to_js(e.into()))?;
        Ok(session.drag_crop_to(Point::new(x, y)).map(rect_to_vec))
    }

    pub fn edit_crop_end(&self) -> Result<(), JsValue> {
        let mut editor = borrow_mut(&self.editor).map_err(to_js)?;
        let session = editor.session_mut().map_err(|e| to_js(e.into()))?;
        session.end_crop_drag();
        Ok(())
    }

    pub fn edit_crop_rect(&self) -> Result<Option<Vec<f64>>, JsValue> {
        let editor = borrow(&self.editor).map_err(to_js)?;
        let session = editor.session().map_err(|e| to_js(e.into()))?;
        Ok(session.crop_rect().map(rect_to_vec))
    }

    /// Commit the edit and close the editor.
    pub fn edit_save(&self) -> Result<JsValue, JsValue> {
        let summary = self.edit_save_inner().map_err(to_js)?;
        serde_wasm_bindgen::to_value(&summary).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Close the editor without saving.
    pub fn edit_cancel(&self) -> Result<bool, JsValue> {
        Ok(borrow_mut(&self.editor).map_err(to_js)?.cancel())
    }

    // ---------------------------------------------------------------------
    // PDF
    // ---------------------------------------------------------------------

    /// Compose the PDF. `config` may be `undefined` for the defaults;
    /// `progress` is called as `progress(fraction, message)`.
    ///
    /// ```typescript
    /// const pdf = workspace.compose({ title, author, images_per_page: 2 },
    ///   (fraction, message) => updateBar(fraction * 100, message));
    /// download(new Blob([pdf.bytes()], { type: 'application/pdf' }), pdf.filename);
    /// ```
    pub fn compose(&self, config: JsValue, progress: &js_sys::Function) -> Result<JsComposedPdf, JsValue> {
        let config: PdfConfig = if config.is_undefined() || config.is_null() {
            PdfConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| to_js(WorkspaceError::Config(e.to_string())))?
        };

        let now = js_sys::Date::new_0();
        let today = NaiveDate::from_ymd_opt(now.get_full_year() as i32, now.get_month() + 1, now.get_date())
            .ok_or_else(|| JsValue::from_str("Invalid system date"))?;

        let report = |p: Progress| {
            let fraction = JsValue::from_f64(p.fraction);
            let message = JsValue::from_str(&p.message);
            if let Err(err) = progress.call2(&JsValue::NULL, &fraction, &message) {
                warn!(?err, "progress callback failed");
            }
        };

        self.compose_inner(&config, today, report)
            .map(JsComposedPdf::from)
            .map_err(to_js)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::compose::ImagesPerPage;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 120, 200]));
        let mut buffer = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    fn loaded(sizes: &[(u32, u32)]) -> (Workspace, Vec<ImageId>) {
        let ws = Workspace::new();
        for (i, &(w, h)) in sizes.iter().enumerate() {
            ws.stage(Upload::new(format!("{i}.png"), "image/png", png(w, h)))
                .unwrap();
        }
        let outcome = ws.ingest_staged_inner().unwrap();
        assert_eq!(outcome.added, sizes.len());
        let ids = ws.snapshot().unwrap().iter().map(|s| s.id).collect();
        (ws, ids)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
    }

    #[test]
    fn test_ingest_reports_rejections() {
        let ws = Workspace::new();
        ws.stage(Upload::new("a.png", "image/png", png(10, 10))).unwrap();
        ws.stage(Upload::new("doc.pdf", "application/pdf", vec![1, 2, 3]))
            .unwrap();

        let outcome = ws.ingest_staged_inner().unwrap();
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert!(outcome.rejected[0].contains("doc.pdf"));
        assert!(ws.staged.borrow().is_empty());
    }

    #[test]
    fn test_corrupt_file_fails_whole_batch() {
        let ws = Workspace::new();
        ws.stage(Upload::new("a.png", "image/png", png(10, 10))).unwrap();
        ws.stage(Upload::new("b.png", "image/png", vec![0x89, b'P', b'N', b'G']))
            .unwrap();

        assert!(matches!(
            ws.ingest_staged_inner(),
            Err(WorkspaceError::Ingest(_))
        ));
        assert!(ws.is_empty());
        assert!(ws.staged.borrow().is_empty());
    }

    #[test]
    fn test_move_commands_and_reset() {
        let (ws, ids) = loaded(&[(20, 20), (10, 40), (40, 10)]);

        assert!(ws.move_inner(ids[2], MoveCommand::ToIndex(0)).unwrap());
        assert!(ws.order_changed());
        assert!(!ws.move_inner(ids[2], MoveCommand::Up).unwrap());
        assert!(ws.move_inner(ids[0], MoveCommand::Down).unwrap());

        ws.store.borrow_mut().reset_order();
        assert!(!ws.order_changed());
        let order: Vec<_> = ws.snapshot().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn test_unknown_id_reports_not_found() {
        let (ws, _) = loaded(&[(8, 8)]);
        let missing = ImageId::from_raw(u32::MAX);

        assert!(matches!(
            ws.remove_inner(missing),
            Err(WorkspaceError::Store(StoreError::RecordNotFound(_)))
        ));
        assert!(ws.move_inner(missing, MoveCommand::Down).is_err());
        assert_eq!(ws.len(), 1);
    }

    #[test]
    fn test_pointer_and_touch_gestures_move() {
        let (ws, ids) = loaded(&[(8, 8), (8, 8), (8, 8)]);

        ws.pointer.borrow_mut().start(ids[0]);
        assert!(ws.drop_inner(2).unwrap());
        assert_eq!(ws.store.borrow().position(ids[0]), Some(2));

        {
            let mut touch = ws.touch.borrow_mut();
            touch.touch_start(ids[0], Point::new(0.0, 0.0), 0.0);
            assert!(touch.hold_elapsed(250.0));
        }
        assert!(ws.touch_end_inner(Some(0)).unwrap());
        assert_eq!(ws.store.borrow().position(ids[0]), Some(0));

        assert!(!ws.touch_end_inner(Some(1)).unwrap());
    }

    #[test]
    fn test_edit_rotate_and_save() {
        let (ws, ids) = loaded(&[(40, 20)]);

        let preview = ws.edit_open_inner(ids[0]).unwrap();
        assert_eq!((preview.width, preview.height), (40, 20));

        let rotated = ws.edit_rotate_inner(90).unwrap();
        assert_eq!((rotated.width, rotated.height), (20, 40));

        let summary = ws.edit_save_inner().unwrap();
        assert_eq!((summary.width, summary.height), (20, 40));
        assert!(matches!(
            ws.edit_rotate_inner(90),
            Err(WorkspaceError::Edit(EditError::NotOpen))
        ));
    }

    #[test]
    fn test_compose_two_per_page() {
        let (ws, _) = loaded(&[(50, 50), (20, 80), (80, 20)]);
        let config = PdfConfig {
            images_per_page: ImagesPerPage::Two,
            ..PdfConfig::default()
        };
        let mut updates = 0;

        let pdf = ws.compose_inner(&config, today(), |_| updates += 1).unwrap();

        assert_eq!(pdf.page_count, 2);
        assert_eq!(pdf.filename, "documento_2025-03-09.pdf");
        assert_eq!(updates, 4);
    }

    #[test]
    fn test_reentrant_mutation_during_compose_is_busy() {
        let (ws, ids) = loaded(&[(8, 8), (8, 8)]);
        let mut attempts = Vec::new();

        ws.compose_inner(&PdfConfig::default(), today(), |_| {
            attempts.push(ws.remove_inner(ids[0]));
        })
        .unwrap();

        assert!(attempts
            .iter()
            .all(|r| matches!(r, Err(WorkspaceError::Busy))));
        assert_eq!(ws.len(), 2);
    }

    #[test]
    fn test_invalid_record_never_listed_or_composed() {
        let ws = Workspace::new();
        let blank = folio_core::ImageRecord::new(
            "blank.png",
            0,
            "image/png",
            Vec::new(),
            folio_core::DecodedImage::new(0, 0, Vec::new()),
        );

        assert_eq!(ws.store.borrow_mut().append(vec![blank]), 0);
        assert!(ws.snapshot().unwrap().is_empty());
        assert!(matches!(
            ws.compose_inner(&PdfConfig::default(), today(), |_| {}),
            Err(WorkspaceError::Compose(CompositionError::NoImages))
        ));
    }

    #[test]
    fn test_compose_empty_workspace() {
        let ws = Workspace::new();
        assert!(matches!(
            ws.compose_inner(&PdfConfig::default(), today(), |_| {}),
            Err(WorkspaceError::Compose(CompositionError::NoImages))
        ));
    }
}
