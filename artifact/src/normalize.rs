//! Repairs raw slide records into the canonical [`Slide`] shape.
//!
//! Stored documents have gone through several generations of client code,
//! so anything can show up here: numeric ids, duplicate ids, missing
//! titles, bullets that are not arrays. Nothing is ever rejected; every
//! record is coerced into a well-formed slide and a `changed` flag tells
//! the caller whether a repaired copy should be written back.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::ids::IdSource;
use crate::types::{DeckMeta, Slide, SlideLayout, SlideStyle};

/// Placeholder for slides with a missing or blank title.
pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSlides {
    pub slides: Vec<Slide>,
    /// True when any coercion altered data from its input form.
    pub changed: bool,
}

/// Repair an arbitrary JSON value into a canonical slide list.
///
/// Non-array input yields an empty list. Ids are coerced to strings and
/// made pairwise distinct (earlier records win their id; later duplicates
/// get a fresh token from `ids`). Running this on its own output reports
/// `changed == false`.
pub fn normalize_slides(raw: &Value, ids: &mut dyn IdSource) -> NormalizedSlides {
    let Some(arr) = raw.as_array() else {
        return NormalizedSlides {
            slides: Vec::new(),
            changed: false,
        };
    };

    let mut used: HashSet<String> = HashSet::new();
    let mut changed = false;
    let mut slides = Vec::with_capacity(arr.len());

    for (idx, record) in arr.iter().enumerate() {
        if !record.is_object() {
            changed = true;
        }

        let mut id = match record.get("id") {
            Some(Value::String(v)) if !v.trim().is_empty() => v.clone(),
            Some(Value::Number(n)) => {
                changed = true;
                n.to_string()
            }
            _ => {
                changed = true;
                fresh_unused(ids, &used)
            }
        };
        if used.contains(&id) {
            // a duplicate id would make the later slide unaddressable
            changed = true;
            id = fresh_unused(ids, &used);
        }
        used.insert(id.clone());

        let title = match record.get("title") {
            Some(Value::String(v)) if !v.trim().is_empty() => v.clone(),
            Some(Value::Number(n)) => {
                changed = true;
                n.to_string()
            }
            Some(Value::Bool(b)) => {
                changed = true;
                b.to_string()
            }
            _ => {
                changed = true;
                UNTITLED.to_string()
            }
        };

        let bullets = match record.get("bullets") {
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    let text = match item {
                        Value::String(v) => v.clone(),
                        Value::Number(n) => {
                            changed = true;
                            n.to_string()
                        }
                        Value::Bool(b) => {
                            changed = true;
                            b.to_string()
                        }
                        _ => {
                            changed = true;
                            String::new()
                        }
                    };
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        changed = true;
                        continue;
                    }
                    if trimmed != text {
                        changed = true;
                    }
                    out.push(trimmed.to_string());
                }
                out
            }
            _ => {
                changed = true;
                Vec::new()
            }
        };

        let image_prompt = match record.get("imagePrompt") {
            Some(Value::String(v)) => v.clone(),
            Some(Value::Number(n)) => {
                changed = true;
                n.to_string()
            }
            Some(Value::Bool(b)) => {
                changed = true;
                b.to_string()
            }
            _ => {
                changed = true;
                String::new()
            }
        };

        let image_url = match record.get("imageUrl") {
            Some(Value::String(v)) => Some(v.clone()),
            Some(Value::Null) | None => None,
            Some(_) => {
                changed = true;
                None
            }
        };

        let layout = match record.get("layout") {
            Some(Value::String(v)) => match v.as_str() {
                "text-left" => Some(SlideLayout::TextLeft),
                "image-left" => Some(SlideLayout::ImageLeft),
                "full-image" => Some(SlideLayout::FullImage),
                _ => {
                    changed = true;
                    None
                }
            },
            Some(Value::Null) | None => None,
            Some(_) => {
                changed = true;
                None
            }
        };

        let notes = match record.get("notes") {
            Some(Value::String(v)) => Some(v.clone()),
            Some(Value::Null) | None => None,
            Some(_) => {
                changed = true;
                None
            }
        };

        let style = match record.get("style") {
            Some(v @ Value::Object(map)) => {
                if map.keys().any(|k| k != "background" && k != "accent") {
                    changed = true;
                }
                match serde_json::from_value::<SlideStyle>(v.clone()) {
                    Ok(style) => Some(style),
                    Err(_) => {
                        changed = true;
                        None
                    }
                }
            }
            Some(Value::Null) | None => None,
            Some(_) => {
                changed = true;
                None
            }
        };

        match record.get("_order").and_then(Value::as_u64) {
            Some(n) if n as usize == idx => {}
            _ => changed = true,
        }

        slides.push(Slide {
            id,
            title,
            bullets,
            image_prompt,
            image_url,
            layout,
            notes,
            style,
            order: Some(idx),
        });
    }

    if changed {
        debug!(count = slides.len(), "repaired slide records during normalization");
    }

    NormalizedSlides { slides, changed }
}

/// Repair a raw deck meta value: keep only well-typed, non-blank fields,
/// and collapse an all-blank meta to absent.
pub fn normalize_meta(raw: &Value) -> Option<DeckMeta> {
    let obj = raw.as_object()?;
    let field = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let meta = DeckMeta {
        topic: field("topic"),
        audience: field("audience"),
        tone: field("tone"),
    };
    if meta.is_empty() {
        None
    } else {
        Some(meta)
    }
}

/// Re-trim an already typed deck meta; blank metas collapse to `None`.
pub fn trim_meta(meta: Option<DeckMeta>) -> Option<DeckMeta> {
    let meta = meta?;
    let clean = |v: Option<String>| {
        v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    };
    let meta = DeckMeta {
        topic: clean(meta.topic),
        audience: clean(meta.audience),
        tone: clean(meta.tone),
    };
    if meta.is_empty() {
        None
    } else {
        Some(meta)
    }
}

fn fresh_unused(ids: &mut dyn IdSource, used: &HashSet<String>) -> String {
    loop {
        let id = ids.next_id();
        if !used.contains(&id) {
            return id;
        }
    }
}
