pub mod codec;
pub mod index;
pub mod palette;
pub mod token;
pub mod trigger;

pub use codec::{DecodeError, Fragment, TokenCodec};
pub use index::{locate, locate_token, LocateError};
pub use palette::{
    apply_commit, CommandPalette, DocumentEdit, PaletteCommit, PaletteEvent, PaletteInput,
    PaletteOrigin, PalettePageKind, PaletteRow,
};
pub use token::{DecisionKind, DecisionToken, DecisionTokenError, ALL_DECISION_KINDS};
pub use trigger::{CursorBounds, EditorFrame, PaletteAnchor, Placement, TriggerDetector, TriggerHit};
