//! End-to-end field scenarios: seeding, locale switches, upload insertion,
//! settlement, and read-only behavior.

use std::cell::RefCell;
use std::rc::Rc;

use inkfield_editor_core::{EditSurface, Position, TextRange};
use inkfield_markdown::{
    FieldConfig, FieldError, FileRef, InsertMode, MarkdownField, MarkerState, SettleOutcome,
    StructuredValue, UploadOutcome, UploadedFile,
};

fn range(l0: usize, c0: usize, l1: usize, c1: usize) -> TextRange {
    TextRange::new(Position::new(l0, c0), Position::new(l1, c1))
}

fn whole_buffer(field: &MarkdownField) -> TextRange {
    TextRange::new(
        Position::origin(),
        field.surface().position_at(field.surface().len_chars()),
    )
}

fn field_with_text(text: &str) -> MarkdownField {
    MarkdownField::new(StructuredValue::from_text(text), FieldConfig::default())
}

#[test]
fn seed_round_trips_text() {
    let field = field_with_text("# Title\n\nSome *markdown* text.\n");
    assert_eq!(field.text(), "# Title\n\nSome *markdown* text.\n");
    assert_eq!(field.value().text, "# Title\n\nSome *markdown* text.\n");
}

#[test]
fn locale_change_reseeds_with_current_value() {
    let mut field = MarkdownField::new(
        StructuredValue::from_text("Valeur 1"),
        FieldConfig {
            locale: "fr".into(),
            ..FieldConfig::default()
        },
    );

    field.set_value(StructuredValue::from_text("Valeur 2"));
    field.set_locale("en");
    assert_eq!(field.text(), "Valeur 2");
    assert_eq!(field.locale(), "en");

    // same locale is a no-op
    field.set_locale("en");
    assert_eq!(field.text(), "Valeur 2");
}

#[test]
fn parser_seeds_markers_for_known_files() {
    let field = MarkdownField::new(
        StructuredValue {
            text: "aaa\n![Cat](cat.jpg)\nbbb".into(),
            files: vec![FileRef {
                name: "cat.jpg".into(),
                size: Some(123),
                ..FileRef::default()
            }],
        },
        FieldConfig::default(),
    );

    // the text itself is untouched
    assert_eq!(field.text(), "aaa\n![Cat](cat.jpg)\nbbb");

    assert_eq!(field.markers().len(), 1);
    let marker = field.markers().iter().next().unwrap();
    assert_eq!(marker.state(), MarkerState::Success);
    assert_eq!(marker.title(), "Cat");
    let file = marker.file().unwrap();
    assert_eq!(file.name, "cat.jpg");
    assert_eq!(file.size, Some(123));

    // the marker tracks exactly the matched span, and the selection was
    // placed over it
    assert_eq!(
        field.surface().find_mark(marker.handle()),
        Some(range(1, 0, 1, 15))
    );
    assert_eq!(field.selection(), range(1, 0, 1, 15));
}

#[test]
fn parser_leaves_unknown_references_inert() {
    let field = MarkdownField::new(
        StructuredValue {
            text: "![a](known.png) ![b](unknown.png)".into(),
            files: vec![FileRef::named("known.png")],
        },
        FieldConfig::default(),
    );

    assert_eq!(field.text(), "![a](known.png) ![b](unknown.png)");
    assert_eq!(field.markers().len(), 1);
    let marker = field.markers().iter().next().unwrap();
    assert_eq!(marker.file().unwrap().name, "known.png");
}

#[test]
fn insertion_on_empty_buffer() {
    let mut field = field_with_text("");
    let id = field.insert_upload(InsertMode::Insertion).unwrap();

    assert_eq!(field.text(), "\n![]()\n\n");
    let marker = field.markers().resolve(id).unwrap();
    assert_eq!(marker.state(), MarkerState::Pending);
    assert_eq!(
        field.surface().find_mark(marker.handle()),
        Some(range(1, 0, 1, 5))
    );
    // caret sits in the empty title span
    assert_eq!(field.selection(), range(1, 2, 1, 2));
}

#[test]
fn insertion_replaces_selection_with_block() {
    let mut field = field_with_text("Lorem Elsass ipsum");
    field.set_selection(range(0, 5, 0, 13));
    field.insert_upload(InsertMode::Insertion).unwrap();

    assert_eq!(field.text(), "Lorem\n\n![]()\n\nipsum");
}

#[test]
fn replace_by_selection_reuses_title() {
    let mut field = field_with_text("Lorem Elsass ipsum");
    field.set_selection(range(0, 6, 0, 12));
    let id = field.insert_upload(InsertMode::ReplaceBySelection).unwrap();

    assert_eq!(field.text(), "Lorem ![Elsass]() ipsum");
    assert_eq!(field.markers().resolve(id).unwrap().title(), "Elsass");

    field
        .resolve_upload(id, UploadOutcome::Success(UploadedFile::named("cat.jpg")))
        .unwrap();
    assert_eq!(field.text(), "Lorem ![Elsass](cat.jpg) ipsum");
}

#[test]
fn success_settlement_rewrites_placeholder_and_records_file() {
    let mut field = field_with_text("");
    let id = field.insert_upload(InsertMode::Insertion).unwrap();

    let outcome = field
        .resolve_upload(id, UploadOutcome::Success(UploadedFile::named("cat.jpg")))
        .unwrap();
    assert_eq!(outcome, SettleOutcome::Rewritten);
    assert_eq!(field.text(), "\n![](cat.jpg)\n\n");

    let files = field.value().files;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "cat.jpg");

    let marker = field.markers().resolve(id).unwrap();
    assert_eq!(marker.state(), MarkerState::Success);
    // the marker keeps tracking the rewritten markdown
    assert_eq!(
        field.surface().find_mark(marker.handle()),
        Some(range(1, 0, 1, 12))
    );
}

#[test]
fn settlement_tracks_span_across_intervening_edits() {
    let mut field = field_with_text("");
    let id = field.insert_upload(InsertMode::Insertion).unwrap();
    assert_eq!(field.text(), "\n![]()\n\n");

    // the user keeps typing while the upload is in flight
    field
        .edit(TextRange::collapsed(Position::origin()), "intro")
        .unwrap();
    field.edit(range(2, 0, 2, 0), "outro").unwrap();
    assert_eq!(field.text(), "intro\n![]()\noutro\n");

    field
        .resolve_upload(id, UploadOutcome::Success(UploadedFile::named("cat.jpg")))
        .unwrap();
    assert_eq!(field.text(), "intro\n![](cat.jpg)\noutro\n");
}

#[test]
fn orphaned_success_records_file_without_rewrite() {
    let mut field = field_with_text("");
    let id = field.insert_upload(InsertMode::Insertion).unwrap();

    let emitted = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&emitted);
    field.subscribe(move |v| sink.borrow_mut().push(v.clone()));

    // everything, placeholder included, gets deleted mid-flight
    let full = whole_buffer(&field);
    field.edit(full, "").unwrap();
    assert_eq!(field.text(), "");

    let outcome = field
        .resolve_upload(id, UploadOutcome::Success(UploadedFile::named("cat.jpg")))
        .unwrap();
    assert_eq!(outcome, SettleOutcome::Orphaned);
    // no rewrite, but the upload result is still recorded and emitted
    assert_eq!(field.text(), "");
    assert_eq!(field.value().files.len(), 1);
    let last = emitted.borrow().last().cloned().unwrap();
    assert_eq!(last.files.len(), 1);
    assert_eq!(last.files[0].name, "cat.jpg");
}

#[test]
fn failed_upload_becomes_inline_error_indicator() {
    let mut field = field_with_text("");
    let id = field.insert_upload(InsertMode::Insertion).unwrap();

    let outcome = field
        .resolve_upload(id, UploadOutcome::Failure("too large".into()))
        .unwrap();
    assert_eq!(outcome, SettleOutcome::Rewritten);
    assert_eq!(field.text(), "\n![upload failed]()\n\n");
    // error settlements never touch the files list
    assert!(field.value().files.is_empty());
    assert_eq!(
        field.markers().resolve(id).unwrap().state(),
        MarkerState::Error
    );
}

#[test]
fn settlement_is_one_shot() {
    let mut field = field_with_text("");
    let id = field.insert_upload(InsertMode::Insertion).unwrap();

    field
        .resolve_upload(id, UploadOutcome::Success(UploadedFile::named("cat.jpg")))
        .unwrap();
    assert_eq!(
        field.resolve_upload(id, UploadOutcome::Failure("late".into())),
        Err(FieldError::AlreadySettled(id))
    );
    assert_eq!(field.text(), "\n![](cat.jpg)\n\n");
}

#[test]
fn unknown_marker_is_an_error() {
    let mut field = field_with_text("");
    field.insert_upload(InsertMode::Insertion).unwrap();

    // mint an id this field's registry never issued
    let mut other = field_with_text("");
    other.insert_upload(InsertMode::Insertion).unwrap();
    let end = TextRange::collapsed(other.surface().position_at(other.surface().len_chars()));
    other.set_selection(end);
    let stray = other.insert_upload(InsertMode::Insertion).unwrap();

    assert_eq!(
        field.resolve_upload(stray, UploadOutcome::Failure("??".into())),
        Err(FieldError::UnknownMarker(stray))
    );
}

#[test]
fn input_emitted_on_text_change() {
    let mut field = MarkdownField::new(
        StructuredValue {
            text: String::new(),
            files: vec![FileRef::named("kept.png")],
        },
        FieldConfig::default(),
    );

    let emitted = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&emitted);
    field.subscribe(move |v| sink.borrow_mut().push(v.clone()));

    let full = whole_buffer(&field);
    field.edit(full, "AAA").unwrap();

    let last = emitted.borrow().last().cloned().unwrap();
    assert_eq!(last.text, "AAA");
    // the files list rides along unchanged
    assert_eq!(last.files.len(), 1);
    assert_eq!(last.files[0].name, "kept.png");
}

#[test]
fn read_only_rejects_user_edits_but_not_settlement() {
    let mut field = field_with_text("");
    let id = field.insert_upload(InsertMode::Insertion).unwrap();

    field.set_read_only(true);
    assert!(field.is_read_only());
    assert_eq!(
        field.edit(TextRange::collapsed(Position::origin()), "x"),
        Err(FieldError::ReadOnly)
    );
    assert_eq!(
        field.insert_upload(InsertMode::Insertion),
        Err(FieldError::ReadOnly)
    );

    // settlement reflects an already-committed outcome and still rewrites
    let outcome = field
        .resolve_upload(id, UploadOutcome::Success(UploadedFile::named("cat.jpg")))
        .unwrap();
    assert_eq!(outcome, SettleOutcome::Rewritten);
    assert_eq!(field.text(), "\n![](cat.jpg)\n\n");
}

#[test]
fn reseeding_rebuilds_markers() {
    let mut field = MarkdownField::new(
        StructuredValue {
            text: "![a](one.png)".into(),
            files: vec![FileRef::named("one.png")],
        },
        FieldConfig::default(),
    );
    assert_eq!(field.markers().len(), 1);

    field.set_value(StructuredValue {
        text: "![b](two.png)".into(),
        files: vec![FileRef::named("two.png")],
    });
    assert_eq!(field.text(), "![b](two.png)");
    assert_eq!(field.markers().len(), 1);
    let marker = field.markers().iter().next().unwrap();
    assert_eq!(marker.file().unwrap().name, "two.png");
}
