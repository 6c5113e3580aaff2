use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One presentation page.
///
/// Field names mirror the stored JSON (`imagePrompt`, `imageUrl`, `_order`),
/// so decks round-trip byte-compatibly with documents written by earlier
/// versions of the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub bullets: Vec<String>,
    #[serde(default)]
    pub image_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<SlideLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<SlideStyle>,
    /// Positional index recorded by the normalizer.
    #[serde(rename = "_order", default, skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlideLayout {
    TextLeft,
    ImageLeft,
    FullImage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
}

/// Free-form generation context attached to a deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DeckMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

impl DeckMeta {
    pub fn is_empty(&self) -> bool {
        self.topic.is_none() && self.audience.is_none() && self.tone.is_none()
    }
}

/// A presentation: title, theme and ordered slides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub theme_name: String,
    #[serde(default)]
    pub slides: Vec<Slide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<DeckMeta>,
}

/// The mutable unit the core manages: the current deck plus bounded
/// undo (`past`) and redo (`future`) snapshot stacks, most-recent-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SlidesState {
    #[serde(default)]
    pub deck: Deck,
    #[serde(default)]
    pub past: Vec<Deck>,
    #[serde(default)]
    pub future: Vec<Deck>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ArtifactKind {
    #[default]
    #[serde(rename = "slides")]
    Slides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    #[default]
    Ready,
    Loading,
    Error,
}

/// The action that produced the current artifact revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LastAction {
    Create,
    Update,
    Regenerate,
    ManualEdit,
    Export,
    Undo,
    Redo,
}

/// Target format of the most recent export touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Pptx,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMeta {
    #[serde(default)]
    pub status: ArtifactStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_action: Option<LastAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_export: Option<ExportFormat>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The versioned, persisted envelope wrapping a deck plus its undo/redo
/// history. `version` is a monotonically increasing counter starting at 1;
/// the persistence gateway treats it as an optimistic-concurrency token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: ArtifactKind,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_version")]
    pub version: u64,
    #[serde(default)]
    pub meta: ArtifactMeta,
    #[serde(default)]
    pub state: SlidesState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

pub(crate) fn default_version() -> u64 {
    1
}

/// A document row as the persistence gateway hands it to the codec.
/// `content` is opaque JSON: either a legacy raw slide array or an
/// artifact envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_name: Option<String>,
    pub content: Value,
    #[serde(default = "default_version")]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slide_wire_field_names() {
        let slide = Slide {
            id: "s-1".to_string(),
            title: "Intro".to_string(),
            bullets: vec!["one".to_string()],
            image_prompt: "a city skyline".to_string(),
            image_url: None,
            layout: Some(SlideLayout::ImageLeft),
            notes: None,
            style: None,
            order: Some(0),
        };
        let v = serde_json::to_value(&slide).unwrap();
        assert_eq!(v["imagePrompt"], "a city skyline");
        assert_eq!(v["layout"], "image-left");
        assert_eq!(v["_order"], 0);
        assert!(v.get("imageUrl").is_none());
        assert!(v.get("notes").is_none());
    }

    #[test]
    fn test_last_action_wire_values() {
        assert_eq!(
            serde_json::to_value(LastAction::ManualEdit).unwrap(),
            json!("manual-edit")
        );
        assert_eq!(serde_json::to_value(LastAction::Undo).unwrap(), json!("undo"));
    }

    #[test]
    fn test_artifact_meta_serializes_null_error() {
        let meta = ArtifactMeta {
            status: ArtifactStatus::Ready,
            last_action: Some(LastAction::Create),
            last_export: None,
            error: None,
        };
        let v = serde_json::to_value(&meta).unwrap();
        assert_eq!(v["status"], "ready");
        assert_eq!(v["error"], Value::Null);
    }

    #[test]
    fn test_artifact_deserializes_with_missing_fields() {
        let a: Artifact = serde_json::from_value(json!({ "id": "doc-1" })).unwrap();
        assert_eq!(a.version, 1);
        assert_eq!(a.kind, ArtifactKind::Slides);
        assert!(a.state.past.is_empty());
    }
}
