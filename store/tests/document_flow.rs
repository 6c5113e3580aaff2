//! Full read-modify-write cycles against the in-memory store: migration
//! on first read, edits with snapshots, undo/redo, and the optimistic
//! version check.

use serde_json::json;
use slides_artifact::{
    apply_edit, apply_redo, apply_undo, extract_state, migrate, Artifact, EditRequest, Envelope,
    IdSource, SequentialIds,
};
use slides_store::{DocumentStore, DocumentUpdate, MemoryStore, StoreError};

const OWNER: &str = "alice";
const DOC: &str = "doc-1";

/// Write an artifact back the way the HTTP handlers do: envelope into
/// `content`, document title/theme kept in sync with the deck, row
/// version bumped for mutations and left alone for migration writes.
fn save_artifact(
    store: &MemoryStore,
    prev_version: u64,
    artifact: Artifact,
    bump_row_version: bool,
) -> Result<u64, StoreError> {
    let update = DocumentUpdate {
        title: Some(artifact.state.deck.title.clone()),
        theme_name: Some(artifact.state.deck.theme_name.clone()),
        content: serde_json::to_value(Envelope::from(artifact)).unwrap(),
        version: bump_row_version.then_some(prev_version + 1),
        expected_version: Some(prev_version),
    };
    store.save_document(DOC, OWNER, update)
}

fn setup_legacy(store: &MemoryStore) {
    store.create_document(
        OWNER,
        DOC,
        "Launch Plan",
        Some("Ocean"),
        json!([
            { "id": 1, "title": "Intro", "bullets": ["welcome", ""] },
            { "id": 1, "title": "Agenda" }
        ]),
    );
}

#[test]
fn migration_on_first_read_is_idempotent() {
    let store = MemoryStore::new();
    let mut ids = SequentialIds::new("gen");
    setup_legacy(&store);

    let doc = store.load_document(DOC, OWNER).unwrap();
    let migrated = migrate(&doc, &mut ids).unwrap();
    assert_eq!(migrated.version, 1);
    save_artifact(&store, doc.version, migrated, false).unwrap();

    let doc = store.load_document(DOC, OWNER).unwrap();
    assert_eq!(doc.version, 1);

    // second read owes nothing: same version, same state
    assert!(migrate(&doc, &mut ids).is_none());
    let extracted = extract_state(&doc, &mut ids);
    assert!(!extracted.normalization_changed);
    let slides = &extracted.state.deck.slides;
    assert_eq!(slides.len(), 2);
    assert_eq!(slides[0].id, "1");
    assert_ne!(slides[1].id, slides[0].id);
    assert_eq!(slides[0].bullets, vec!["welcome"]);
}

#[test]
fn edit_undo_redo_cycle() {
    let store = MemoryStore::new();
    let mut ids = SequentialIds::new("gen");
    setup_legacy(&store);

    let doc = store.load_document(DOC, OWNER).unwrap();
    let migrated = migrate(&doc, &mut ids).unwrap();
    save_artifact(&store, doc.version, migrated, false).unwrap();

    // edit: replace the deck, bump both counters
    let doc = store.load_document(DOC, OWNER).unwrap();
    let edited = apply_edit(
        &doc,
        &EditRequest {
            title: Some("Launch Plan v2".to_string()),
            slides: json!([{ "id": "1", "title": "Only Slide" }]),
            ..Default::default()
        },
        &mut ids,
    );
    assert_eq!(edited.version, 2);
    save_artifact(&store, doc.version, edited, true).unwrap();

    let doc = store.load_document(DOC, OWNER).unwrap();
    assert_eq!(doc.version, 2);
    assert_eq!(doc.title, "Launch Plan v2");

    // undo restores the migrated deck
    let undone = apply_undo(&doc, &mut ids).unwrap();
    assert_eq!(undone.version, 3);
    assert_eq!(undone.state.deck.slides.len(), 2);
    assert_eq!(undone.state.future.len(), 1);
    save_artifact(&store, doc.version, undone, true).unwrap();

    // redo brings the edit back
    let doc = store.load_document(DOC, OWNER).unwrap();
    let redone = apply_redo(&doc, &mut ids).unwrap();
    assert_eq!(redone.state.deck.slides.len(), 1);
    assert_eq!(redone.state.deck.slides[0].title, "Only Slide");
    assert!(redone.state.future.is_empty());
    save_artifact(&store, doc.version, redone, true).unwrap();

    let doc = store.load_document(DOC, OWNER).unwrap();
    assert_eq!(doc.version, 4);
}

#[test]
fn stale_writer_gets_conflict() {
    let store = MemoryStore::new();
    let mut ids = SequentialIds::new("gen");
    setup_legacy(&store);

    let doc = store.load_document(DOC, OWNER).unwrap();
    let migrated = migrate(&doc, &mut ids).unwrap();
    save_artifact(&store, doc.version, migrated, false).unwrap();

    // two handlers read the same revision
    let first_read = store.load_document(DOC, OWNER).unwrap();
    let second_read = first_read.clone();

    let a = apply_edit(
        &first_read,
        &EditRequest {
            slides: json!([{ "id": "1", "title": "From A" }]),
            ..Default::default()
        },
        &mut ids,
    );
    save_artifact(&store, first_read.version, a, true).unwrap();

    let b = apply_edit(
        &second_read,
        &EditRequest {
            slides: json!([{ "id": "1", "title": "From B" }]),
            ..Default::default()
        },
        &mut ids,
    );
    let err = save_artifact(&store, second_read.version, b, true).unwrap_err();
    assert_eq!(
        err,
        StoreError::Conflict {
            expected: 1,
            found: 2
        }
    );

    // the losing writer retries from the fresh revision
    let doc = store.load_document(DOC, OWNER).unwrap();
    let b = apply_edit(
        &doc,
        &EditRequest {
            slides: json!([{ "id": "1", "title": "From B" }]),
            ..Default::default()
        },
        &mut ids,
    );
    save_artifact(&store, doc.version, b, true).unwrap();
    let doc = store.load_document(DOC, OWNER).unwrap();
    assert_eq!(doc.version, 3);

    let extracted = extract_state(&doc, &mut ids);
    assert_eq!(extracted.state.deck.slides[0].title, "From B");
}

#[test]
fn undo_rejection_leaves_store_untouched() {
    let store = MemoryStore::new();
    let mut ids = SequentialIds::new("gen");
    setup_legacy(&store);

    let doc = store.load_document(DOC, OWNER).unwrap();
    let migrated = migrate(&doc, &mut ids).unwrap();
    save_artifact(&store, doc.version, migrated, false).unwrap();

    let doc = store.load_document(DOC, OWNER).unwrap();
    assert!(apply_undo(&doc, &mut ids).is_err());

    // nothing was written
    let after = store.load_document(DOC, OWNER).unwrap();
    assert_eq!(after.version, doc.version);
    assert_eq!(after.content, doc.content);
}

#[test]
fn bounded_history_across_many_edits() {
    let store = MemoryStore::new();
    let mut ids = SequentialIds::new("gen");
    setup_legacy(&store);

    let doc = store.load_document(DOC, OWNER).unwrap();
    let migrated = migrate(&doc, &mut ids).unwrap();
    save_artifact(&store, doc.version, migrated, false).unwrap();

    for i in 0..25 {
        let doc = store.load_document(DOC, OWNER).unwrap();
        let edited = apply_edit(
            &doc,
            &EditRequest {
                slides: json!([{ "id": "1", "title": format!("Rev {i}") }]),
                ..Default::default()
            },
            &mut ids,
        );
        save_artifact(&store, doc.version, edited, true).unwrap();
    }

    let doc = store.load_document(DOC, OWNER).unwrap();
    let extracted = extract_state(&doc, &mut ids);
    assert_eq!(extracted.state.past.len(), slides_artifact::SNAPSHOT_CAPACITY);
    assert_eq!(extracted.artifact.unwrap().version, 26);
}

// compile-time check that a boxed store still satisfies the trait object
// surface handlers program against
#[allow(dead_code)]
fn assert_object_safe(store: &dyn DocumentStore, ids: &mut dyn IdSource) {
    if let Ok(doc) = store.load_document(DOC, OWNER) {
        let _ = extract_state(&doc, ids);
    }
}
