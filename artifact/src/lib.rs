//! Versioned slide-deck artifact state machine.
//!
//! The library is the pure core behind the deck-editing endpoints: it
//! repairs raw slide data into a canonical shape, wraps decks in a
//! versioned envelope with bounded undo/redo history, and migrates legacy
//! raw-array documents on read. All functions are synchronous
//! transformations of explicit arguments; persistence belongs to the
//! gateway (`slides-store`).

pub mod envelope;
pub mod error;
pub mod history;
pub mod ids;
pub mod normalize;
pub mod ops;
pub mod types;

pub use envelope::{
    build_envelope, extract_state, is_artifact_envelope, Envelope, EnvelopeArgs, ExtractedState,
    DEFAULT_THEME,
};
pub use error::{DeckError, Result};
pub use history::{push_snapshot, redo_state, undo_state, SNAPSHOT_CAPACITY};
pub use ids::{IdSource, SequentialIds, UuidIds};
pub use normalize::{normalize_meta, normalize_slides, trim_meta, NormalizedSlides, UNTITLED};
pub use ops::{
    apply_edit, apply_redo, apply_regenerate, apply_undo, migrate, touch_export, EditRequest,
    SlidePatch,
};
pub use types::{
    Artifact, ArtifactKind, ArtifactMeta, ArtifactStatus, Deck, DeckMeta, DocumentRecord,
    ExportFormat, LastAction, Slide, SlideLayout, SlideStyle, SlidesState,
};
