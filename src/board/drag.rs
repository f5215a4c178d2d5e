// Drag-and-drop controller for the kanban boards
//
// The controller only holds transient gesture state. A drop becomes at most
// one Intent; applying it is up to whoever owns the records.

use crate::board::menu::CardMenu;

/// Where an item was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// A board column (stage id or deal status)
    Bucket(String),
    /// The "convert to deal" zone
    Convert,
    /// The "remove from pipeline" zone
    Delete,
}

impl DropTarget {
    pub fn bucket(key: &str) -> Self {
        DropTarget::Bucket(key.to_string())
    }
}

/// A mutation requested from the record owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Move { id: String, key: String },
    Convert { id: String },
    Delete { id: String },
    Select { id: String },
}

impl Intent {
    /// Forward this intent to the matching callback
    pub fn dispatch<S: IntentSink + ?Sized>(self, sink: &mut S) {
        match self {
            Intent::Move { id, key } => sink.move_item(&id, &key),
            Intent::Convert { id } => sink.convert_item(&id),
            Intent::Delete { id } => sink.delete_item(&id),
            Intent::Select { id } => sink.select_item(&id),
        }
    }
}

/// Callbacks supplied by the record owner. Fire-and-forget.
pub trait IntentSink {
    fn move_item(&mut self, id: &str, key: &str);
    fn convert_item(&mut self, id: &str);
    fn delete_item(&mut self, id: &str);
    fn select_item(&mut self, id: &str);
}

/// Per-board drag state, including the board's card menu
#[derive(Debug, Default)]
pub struct DragController {
    dragged: Option<String>,
    hovered: Option<DropTarget>,
    allow_convert: bool,
    allow_delete: bool,
    menu: CardMenu,
}

impl DragController {
    /// Controller with column targets only
    pub fn new() -> Self {
        Self::default()
    }

    /// Prospect boards: columns plus convert and delete zones
    pub fn with_pseudo_targets(allow_convert: bool, allow_delete: bool) -> Self {
        Self {
            allow_convert,
            allow_delete,
            ..Self::default()
        }
    }

    pub fn dragged(&self) -> Option<&str> {
        self.dragged.as_deref()
    }

    pub fn hovered(&self) -> Option<&DropTarget> {
        self.hovered.as_ref()
    }

    pub fn offers(&self, target: &DropTarget) -> bool {
        match target {
            DropTarget::Bucket(_) => true,
            DropTarget::Convert => self.allow_convert,
            DropTarget::Delete => self.allow_delete,
        }
    }

    pub fn menu(&self) -> &CardMenu {
        &self.menu
    }

    pub fn menu_mut(&mut self) -> &mut CardMenu {
        &mut self.menu
    }

    /// Begin dragging `id`; any open card menu closes
    pub fn start_drag(&mut self, id: &str) {
        self.menu.drag_started();
        self.dragged = Some(id.to_string());
        self.hovered = None;
    }

    /// Pointer entered a target; ignored when no drag is in progress
    pub fn drag_over(&mut self, target: DropTarget) {
        if self.dragged.is_some() && self.offers(&target) {
            self.hovered = Some(target);
        }
    }

    pub fn drag_leave(&mut self) {
        self.hovered = None;
    }

    /// Gesture ended without a drop
    pub fn end_drag(&mut self) {
        self.dragged = None;
        self.hovered = None;
    }

    /// Finish the gesture on `target`.
    ///
    /// `current_key_of` resolves the dragged item's current column. The
    /// target decides the intent: a column yields Move (unless the item is
    /// already there), the pseudo-targets yield Convert or Delete. State is
    /// reset whatever the outcome.
    pub fn drop<F>(&mut self, target: DropTarget, current_key_of: F) -> Option<Intent>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let dragged = self.dragged.take();
        self.hovered = None;

        let id = dragged?;
        if !self.offers(&target) {
            log::debug!("drop of {} on unavailable target {:?} ignored", id, target);
            return None;
        }

        match target {
            DropTarget::Bucket(key) => {
                if current_key_of(&id).as_deref() == Some(key.as_str()) {
                    None
                } else {
                    Some(Intent::Move { id, key })
                }
            }
            DropTarget::Convert => Some(Intent::Convert { id }),
            DropTarget::Delete => Some(Intent::Delete { id }),
        }
    }
}
