//! Reordering gestures and commands.
//!
//! Every input surface (pointer drag-and-drop, touch long-press drag, and
//! the explicit up/down/jump commands) resolves to a [`MoveRequest`], and
//! every request is applied through [`ImageStore::move_image`]. The
//! recognizers below only interpret raw input; they never touch the store.
//!
//! Gestures remember the dragged image by id rather than by index, so a
//! stale index from the page cannot move the wrong record.

use tracing::{debug, warn};

use crate::geometry::Point;
use crate::store::{ImageId, ImageStore, MoveOutcome, StoreError};

/// How long a touch must be held before it becomes a drag.
pub const LONG_PRESS_MS: f64 = 200.0;

/// Movement (per axis, in CSS pixels) that turns a pending touch into a scroll.
pub const MOVE_THRESHOLD_PX: f64 = 10.0;

/// A resolved request to move one image to an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub id: ImageId,
    pub target_index: usize,
}

impl MoveRequest {
    pub fn new(id: ImageId, target_index: usize) -> Self {
        Self { id, target_index }
    }

    pub fn apply(self, store: &mut ImageStore) -> Result<MoveOutcome, StoreError> {
        store.move_image(self.id, self.target_index)
    }
}

/// Direct move commands from buttons and the position picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveCommand {
    Up,
    Down,
    ToIndex(usize),
}

impl MoveCommand {
    /// Resolve against the current order.
    ///
    /// `Up` on the first image and `Down` on the last resolve to `None`.
    pub fn resolve(self, store: &ImageStore, id: ImageId) -> Result<Option<MoveRequest>, StoreError> {
        let index = store.position(id).ok_or_else(|| {
            warn!(%id, "move command for unknown image");
            StoreError::RecordNotFound(id)
        })?;

        let target = match self {
            MoveCommand::Up => index.checked_sub(1),
            MoveCommand::Down => Some(index + 1).filter(|&t| t < store.len()),
            MoveCommand::ToIndex(t) => Some(t),
        };
        Ok(target.map(|t| MoveRequest::new(id, t)))
    }

    /// Resolve and apply in one step. Edge no-ops report `AlreadyAtPosition`.
    pub fn execute(self, store: &mut ImageStore, id: ImageId) -> Result<MoveOutcome, StoreError> {
        match self.resolve(store, id)? {
            Some(request) => request.apply(store),
            None => Ok(MoveOutcome::AlreadyAtPosition),
        }
    }
}

/// HTML5 drag-and-drop recognizer.
#[derive(Debug, Default)]
pub struct PointerDrag {
    dragging: Option<ImageId>,
}

impl PointerDrag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, id: ImageId) {
        debug!(%id, "pointer drag started");
        self.dragging = Some(id);
    }

    pub fn dragging(&self) -> Option<ImageId> {
        self.dragging
    }

    /// Finish the drag over the item at `target_index`.
    pub fn drop_on(&mut self, target_index: usize) -> Option<MoveRequest> {
        self.dragging
            .take()
            .map(|id| MoveRequest::new(id, target_index))
    }

    /// Drag ended outside any item.
    pub fn cancel(&mut self) {
        self.dragging = None;
    }
}

/// State of a touch gesture on a preview item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchPhase {
    Idle,
    /// Finger down, waiting for the long-press to elapse.
    Pending { id: ImageId, origin: Point, started_at: f64 },
    /// Moved too far before the long-press; treated as a scroll.
    Cancelled,
    Dragging { id: ImageId, origin: Point },
}

/// Long-press touch drag recognizer.
///
/// Timestamps are milliseconds from any monotonic clock (the page passes
/// `event.timeStamp`). The page should call [`TouchDrag::hold_elapsed`]
/// from a timer so a finger that never moves still starts a drag.
#[derive(Debug, Clone, Copy)]
pub struct TouchDrag {
    phase: TouchPhase,
}

impl Default for TouchDrag {
    fn default() -> Self {
        Self {
            phase: TouchPhase::Idle,
        }
    }
}

impl TouchDrag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TouchPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, TouchPhase::Dragging { .. })
    }

    pub fn touch_start(&mut self, id: ImageId, at: Point, now_ms: f64) {
        self.phase = TouchPhase::Pending {
            id,
            origin: at,
            started_at: now_ms,
        };
    }

    /// Timer tick. Promotes a pending touch to a drag once held long enough.
    pub fn hold_elapsed(&mut self, now_ms: f64) -> bool {
        if let TouchPhase::Pending {
            id,
            origin,
            started_at,
        } = self.phase
        {
            if now_ms - started_at >= LONG_PRESS_MS {
                debug!(%id, "touch drag started");
                self.phase = TouchPhase::Dragging { id, origin };
            }
        }
        self.is_dragging()
    }

    /// Finger moved. Returns the drag offset from the origin while dragging.
    pub fn touch_move(&mut self, at: Point, now_ms: f64) -> Option<Point> {
        // A timer that should already have fired wins over the movement.
        self.hold_elapsed(now_ms);

        match self.phase {
            TouchPhase::Pending { origin, .. } => {
                let dx = (at.x - origin.x).abs();
                let dy = (at.y - origin.y).abs();
                if dx > MOVE_THRESHOLD_PX || dy > MOVE_THRESHOLD_PX {
                    self.phase = TouchPhase::Cancelled;
                }
                None
            }
            TouchPhase::Dragging { origin, .. } => {
                Some(Point::new(at.x - origin.x, at.y - origin.y))
            }
            TouchPhase::Idle | TouchPhase::Cancelled => None,
        }
    }

    /// Finger lifted over the item at `target_index`, if any.
    ///
    /// Only a touch that became a drag produces a request; taps and scrolls
    /// return `None`. The recognizer always goes back to idle.
    pub fn touch_end(&mut self, target_index: Option<usize>) -> Option<MoveRequest> {
        let phase = std::mem::replace(&mut self.phase, TouchPhase::Idle);
        match (phase, target_index) {
            (TouchPhase::Dragging { id, .. }, Some(index)) => Some(MoveRequest::new(id, index)),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.phase = TouchPhase::Idle;
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
