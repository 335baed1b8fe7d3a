use crate::content::RichText;

pub const DEFAULT_TRIGGER: char = '/';
pub const DEFAULT_MIN_TOP_MARGIN: i32 = 10;

/// Cursor bounds as reported by the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorBounds {
    pub left: i32,
    pub top: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Below,
    Above,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteAnchor {
    pub left: i32,
    pub top: i32,
    pub placement: Placement,
}

/// What the detector hands to the palette when the trigger is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerHit {
    pub editor: usize,
    /// Offset of the trigger char itself, the unit replaced on commit.
    pub trigger_offset: usize,
    pub anchor: PaletteAnchor,
}

/// Geometry of the viewport and the editor the cursor lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditorFrame {
    /// Editor origin in the document's coordinate space.
    pub origin_left: i32,
    pub origin_top: i32,
    pub viewport_height: i32,
}

/// Watches content changes in the focused step editor for the trigger char.
#[derive(Debug, Clone)]
pub struct TriggerDetector {
    trigger: char,
    palette_height: i32,
    min_top_margin: i32,
    attached: Option<usize>,
}

impl TriggerDetector {
    pub fn new(trigger: char, palette_height: i32, min_top_margin: i32) -> Self {
        Self {
            trigger,
            palette_height,
            min_top_margin,
            attached: None,
        }
    }

    pub fn trigger(&self) -> char {
        self.trigger
    }

    pub fn palette_height(&self) -> i32 {
        self.palette_height
    }

    pub fn attach(&mut self, editor: usize) {
        self.attached = Some(editor);
    }

    pub fn detach(&mut self) {
        self.attached = None;
    }

    pub fn attached(&self) -> Option<usize> {
        self.attached
    }

    /// Called after every content change. Only the attached editor is
    /// observed.
    pub fn on_change(
        &self,
        editor: usize,
        document: &RichText,
        cursor: usize,
        bounds: CursorBounds,
        frame: EditorFrame,
    ) -> Option<TriggerHit> {
        if self.attached != Some(editor) {
            return None;
        }
        if document.char_before(cursor) != Some(self.trigger) {
            return None;
        }
        Some(TriggerHit {
            editor,
            trigger_offset: cursor - 1,
            anchor: self.anchor_for(bounds, frame),
        })
    }

    pub fn anchor_for(&self, bounds: CursorBounds, frame: EditorFrame) -> PaletteAnchor {
        let left = frame.origin_left + bounds.left;
        let top = frame.origin_top + bounds.top;
        if top + self.palette_height > frame.viewport_height {
            PaletteAnchor {
                left,
                top: (top - self.palette_height).max(self.min_top_margin),
                placement: Placement::Above,
            }
        } else {
            PaletteAnchor {
                left,
                top: top + bounds.height,
                placement: Placement::Below,
            }
        }
    }
}
