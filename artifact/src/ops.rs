//! The mutation shapes every caller performs, expressed as pure state
//! transitions over a loaded [`DocumentRecord`]. Each returns the next
//! [`Artifact`] to hand to the persistence gateway; nothing here performs
//! I/O.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::envelope::{build_envelope, extract_state, EnvelopeArgs, ExtractedState};
use crate::error::{DeckError, Result};
use crate::history::{push_snapshot, redo_state, undo_state};
use crate::ids::IdSource;
use crate::normalize::{normalize_meta, normalize_slides};
use crate::types::{Artifact, Deck, DocumentRecord, ExportFormat, LastAction, SlidesState};

/// A full-deck edit: replacement slides plus optional title/theme/meta.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_name: Option<String>,
    #[serde(default)]
    pub slides: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Field replacements for a single regenerated slide.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlidePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Apply a full-deck edit: snapshot the prior deck, replace it with the
/// normalized incoming data, and build a bumped `update` envelope.
pub fn apply_edit(doc: &DocumentRecord, req: &EditRequest, ids: &mut dyn IdSource) -> Artifact {
    let ExtractedState { state, artifact, .. } = extract_state(doc, ids);
    let prior = state.deck.clone();

    let norm = normalize_slides(&req.slides, ids);
    let title = pick(req.title.as_deref(), &prior.title);
    let theme = pick(req.theme_name.as_deref(), &prior.theme_name);
    let meta = req
        .meta
        .as_ref()
        .and_then(normalize_meta)
        .or_else(|| prior.meta.clone());

    let next = SlidesState {
        deck: Deck {
            id: doc.id.clone(),
            title: title.clone(),
            theme_name: theme.clone(),
            slides: norm.slides,
            meta,
        },
        ..state
    };
    let next = push_snapshot(next, prior);

    build_envelope(EnvelopeArgs {
        doc_id: &doc.id,
        title: &title,
        theme_name: &theme,
        state: next,
        prev: artifact.as_ref(),
        bump_version: true,
        action: LastAction::Update,
    })
}

/// Replace one slide's fields (the regenerate flow). The slide keeps its
/// id; only supplied fields change. Blank bullets in the patch are
/// dropped.
pub fn apply_regenerate(
    doc: &DocumentRecord,
    slide_id: &str,
    patch: &SlidePatch,
    ids: &mut dyn IdSource,
) -> Result<Artifact> {
    let ExtractedState { mut state, artifact, .. } = extract_state(doc, ids);
    let prior = state.deck.clone();

    let Some(slide) = state.deck.slides.iter_mut().find(|s| s.id == slide_id) else {
        return Err(DeckError::SlideNotFound {
            id: slide_id.to_string(),
        });
    };
    if let Some(title) = &patch.title {
        slide.title = title.clone();
    }
    if let Some(bullets) = &patch.bullets {
        slide.bullets = bullets
            .iter()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();
    }
    if let Some(prompt) = &patch.image_prompt {
        slide.image_prompt = prompt.clone();
    }
    if let Some(url) = &patch.image_url {
        slide.image_url = Some(url.clone());
    }
    if let Some(notes) = &patch.notes {
        slide.notes = Some(notes.clone());
    }

    let title = state.deck.title.clone();
    let theme = state.deck.theme_name.clone();
    let next = push_snapshot(state, prior);

    Ok(build_envelope(EnvelopeArgs {
        doc_id: &doc.id,
        title: &title,
        theme_name: &theme,
        state: next,
        prev: artifact.as_ref(),
        bump_version: true,
        action: LastAction::Regenerate,
    }))
}

/// Restore the previous deck. Rejected with [`DeckError::NothingToUndo`]
/// when the undo stack is empty.
pub fn apply_undo(doc: &DocumentRecord, ids: &mut dyn IdSource) -> Result<Artifact> {
    transition(doc, ids, LastAction::Undo)
}

/// Re-apply the most recently undone deck. Rejected with
/// [`DeckError::NothingToRedo`] when the redo stack is empty.
pub fn apply_redo(doc: &DocumentRecord, ids: &mut dyn IdSource) -> Result<Artifact> {
    transition(doc, ids, LastAction::Redo)
}

fn transition(doc: &DocumentRecord, ids: &mut dyn IdSource, action: LastAction) -> Result<Artifact> {
    let ExtractedState { state, artifact, .. } = extract_state(doc, ids);
    let mut state = match action {
        LastAction::Redo => redo_state(state)?,
        _ => undo_state(state)?,
    };

    // restored snapshots can predate the id-uniqueness repair
    let raw = serde_json::to_value(&state.deck.slides).unwrap_or(Value::Null);
    state.deck.slides = normalize_slides(&raw, ids).slides;

    let title = state.deck.title.clone();
    let theme = state.deck.theme_name.clone();

    Ok(build_envelope(EnvelopeArgs {
        doc_id: &doc.id,
        title: &title,
        theme_name: &theme,
        state,
        prev: artifact.as_ref(),
        bump_version: true,
        action,
    }))
}

/// Record an export on the artifact's metadata: `lastAction = export`
/// plus the target format. No snapshot, no version bump, state untouched.
/// Returns `None` for a document that has not been migrated yet.
pub fn touch_export(
    doc: &DocumentRecord,
    format: ExportFormat,
    ids: &mut dyn IdSource,
) -> Option<Artifact> {
    let ExtractedState { state, artifact, .. } = extract_state(doc, ids);
    let mut artifact = artifact?;
    artifact.meta.last_action = Some(LastAction::Export);
    artifact.meta.last_export = Some(format);
    artifact.state = state;
    Some(artifact)
}

/// One-time repair write for a loaded document, or `None` when nothing is
/// owed.
///
/// Legacy raw-array content yields a fresh `create` envelope without a
/// version bump. Envelope content whose slides needed repair yields a
/// `manual-edit` envelope, also unbumped. An already-migrated, clean
/// document returns `None`, which makes the migration idempotent.
pub fn migrate(doc: &DocumentRecord, ids: &mut dyn IdSource) -> Option<Artifact> {
    let ExtractedState {
        state,
        artifact,
        normalization_changed,
    } = extract_state(doc, ids);

    if artifact.is_none() {
        debug!(doc = %doc.id, "migrating legacy slide array into artifact envelope");
        let title = state.deck.title.clone();
        let theme = state.deck.theme_name.clone();
        return Some(build_envelope(EnvelopeArgs {
            doc_id: &doc.id,
            title: &title,
            theme_name: &theme,
            state,
            prev: None,
            bump_version: false,
            action: LastAction::Create,
        }));
    }

    if normalization_changed {
        debug!(doc = %doc.id, "persisting repaired slides");
        let title = state.deck.title.clone();
        let theme = state.deck.theme_name.clone();
        return Some(build_envelope(EnvelopeArgs {
            doc_id: &doc.id,
            title: &title,
            theme_name: &theme,
            state,
            prev: artifact.as_ref(),
            bump_version: false,
            action: LastAction::ManualEdit,
        }));
    }

    None
}

fn pick(incoming: Option<&str>, fallback: &str) -> String {
    match incoming {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}
