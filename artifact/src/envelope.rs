//! Codec for the versioned storage wrapper.
//!
//! Document content comes in two shapes: the current `{ "artifact": ... }`
//! envelope and the legacy raw slide array. Shape sniffing happens once
//! here; callers only ever see a normalized [`SlidesState`]. Extraction
//! never fails on malformed content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::ids::IdSource;
use crate::normalize::{normalize_meta, normalize_slides, trim_meta};
use crate::types::{
    Artifact, ArtifactKind, ArtifactMeta, ArtifactStatus, Deck, DocumentRecord, LastAction,
    SlidesState,
};

/// Theme applied when neither the deck nor the document row names one.
pub const DEFAULT_THEME: &str = "Default";

/// True when `content` is an artifact envelope rather than a legacy slide
/// array.
pub fn is_artifact_envelope(content: &Value) -> bool {
    content.get("artifact").is_some_and(Value::is_object)
}

/// The wire wrapper written back to `DocumentRecord.content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub artifact: Artifact,
}

impl From<Artifact> for Envelope {
    fn from(artifact: Artifact) -> Self {
        Self { artifact }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedState {
    pub state: SlidesState,
    /// The stored artifact, for version/meta chaining. `None` signals a
    /// legacy document that still owes a migration write.
    pub artifact: Option<Artifact>,
    /// True when normalization had to repair the current deck's slides.
    pub normalization_changed: bool,
}

/// Read a document's content into a usable, normalized state.
///
/// Envelope content yields the stored deck (slides repaired), the undo and
/// redo stacks (a legacy singular `history` array is read as `past`), and
/// the artifact for chaining. Anything else is treated as a legacy slide
/// array and yields `artifact: None`.
pub fn extract_state(doc: &DocumentRecord, ids: &mut dyn IdSource) -> ExtractedState {
    if let Some(raw) = doc.content.get("artifact").filter(|v| v.is_object()) {
        let state_raw = raw.get("state");
        let deck_raw = state_raw.and_then(|s| s.get("deck"));

        let norm = normalize_slides(
            deck_raw.and_then(|d| d.get("slides")).unwrap_or(&Value::Null),
            ids,
        );

        let past_raw = state_raw
            .and_then(|s| s.get("past"))
            .filter(|v| v.is_array())
            .or_else(|| {
                // older writers stored a singular undo stack
                state_raw.and_then(|s| s.get("history")).filter(|v| v.is_array())
            });
        let past = snapshots(past_raw, ids);
        let future = snapshots(
            state_raw.and_then(|s| s.get("future")).filter(|v| v.is_array()),
            ids,
        );

        let deck = Deck {
            id: doc.id.clone(),
            title: deck_raw
                .and_then(|d| d.get("title"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| doc.title.clone()),
            theme_name: deck_raw
                .and_then(|d| d.get("themeName"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| doc.theme_name.clone())
                .unwrap_or_else(|| DEFAULT_THEME.to_string()),
            slides: norm.slides,
            meta: deck_raw.and_then(|d| d.get("meta")).and_then(normalize_meta),
        };

        let state = SlidesState { deck, past, future };
        let artifact = stored_artifact(raw, doc, &state);

        ExtractedState {
            state,
            artifact: Some(artifact),
            normalization_changed: norm.changed,
        }
    } else {
        let norm = normalize_slides(&doc.content, ids);
        let deck = Deck {
            id: doc.id.clone(),
            title: doc.title.clone(),
            theme_name: doc
                .theme_name
                .clone()
                .unwrap_or_else(|| DEFAULT_THEME.to_string()),
            slides: norm.slides,
            meta: None,
        };
        ExtractedState {
            state: SlidesState {
                deck,
                past: Vec::new(),
                future: Vec::new(),
            },
            artifact: None,
            normalization_changed: norm.changed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvelopeArgs<'a> {
    pub doc_id: &'a str,
    pub title: &'a str,
    pub theme_name: &'a str,
    pub state: SlidesState,
    pub prev: Option<&'a Artifact>,
    pub bump_version: bool,
    pub action: LastAction,
}

/// Build the next artifact envelope.
///
/// Version is the previous artifact's (1 when there is none) plus one if a
/// bump was requested. The deck is restamped with the caller-supplied
/// id/title/theme: the caller, not the stale snapshot, is the source of
/// truth for those fields.
pub fn build_envelope(args: EnvelopeArgs<'_>) -> Artifact {
    let now = Utc::now();
    let prev_version = args.prev.map(|a| a.version).unwrap_or(1);
    let version = if args.bump_version {
        prev_version + 1
    } else {
        prev_version
    };

    let mut state = args.state;
    state.deck.id = args.doc_id.to_string();
    state.deck.title = args.title.to_string();
    state.deck.theme_name = args.theme_name.to_string();
    state.deck.meta = trim_meta(state.deck.meta.take());

    Artifact {
        id: args
            .prev
            .map(|a| a.id.clone())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| args.doc_id.to_string()),
        kind: ArtifactKind::Slides,
        title: args.title.to_string(),
        version,
        meta: ArtifactMeta {
            status: ArtifactStatus::Ready,
            last_action: Some(args.action),
            last_export: None,
            error: None,
        },
        state,
        created_at: args.prev.and_then(|a| a.created_at).or(Some(now)),
        updated_at: Some(now),
    }
}

/// Read the past/future stacks. Snapshots that no longer parse as a deck
/// are rebuilt leniently rather than lost.
fn snapshots(raw: Option<&Value>, ids: &mut dyn IdSource) -> Vec<Deck> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };
    items.iter().filter_map(|v| deck_snapshot(v, ids)).collect()
}

fn deck_snapshot(raw: &Value, ids: &mut dyn IdSource) -> Option<Deck> {
    if !raw.is_object() {
        return None;
    }
    if let Ok(deck) = serde_json::from_value::<Deck>(raw.clone()) {
        return Some(deck);
    }
    warn!("rebuilding unreadable deck snapshot");
    let norm = normalize_slides(raw.get("slides").unwrap_or(&Value::Null), ids);
    Some(Deck {
        id: read_str(raw, "id").unwrap_or_default(),
        title: read_str(raw, "title").unwrap_or_default(),
        theme_name: read_str(raw, "themeName").unwrap_or_else(|| DEFAULT_THEME.to_string()),
        slides: norm.slides,
        meta: raw.get("meta").and_then(normalize_meta),
    })
}

/// Rebuild the stored artifact for chaining. Scalar fields are read
/// leniently so a half-corrupt envelope still yields a usable previous
/// version instead of resetting the counter.
fn stored_artifact(raw: &Value, doc: &DocumentRecord, state: &SlidesState) -> Artifact {
    Artifact {
        id: read_str(raw, "id").unwrap_or_else(|| doc.id.clone()),
        kind: ArtifactKind::Slides,
        title: read_str(raw, "title").unwrap_or_else(|| doc.title.clone()),
        version: raw.get("version").and_then(Value::as_u64).unwrap_or(1),
        meta: raw
            .get("meta")
            .and_then(|m| serde_json::from_value::<ArtifactMeta>(m.clone()).ok())
            .unwrap_or_default(),
        state: state.clone(),
        created_at: raw.get("createdAt").and_then(read_timestamp),
        updated_at: raw.get("updatedAt").and_then(read_timestamp),
    }
}

fn read_str(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

fn read_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    raw.as_str().and_then(|s| s.parse::<DateTime<Utc>>().ok())
}
