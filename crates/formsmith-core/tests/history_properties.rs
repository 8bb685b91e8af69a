//! Undo/redo properties over random edit sequences.

use formsmith_core::{FieldType, Form, FormEditor, Outcome, Template, MAX_HISTORY};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Edit {
    Add(usize),
    Insert(usize, isize),
    Duplicate(usize),
    Delete(usize),
    Move(usize, isize),
    AddPage,
    Title(u8),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0..FieldType::ALL.len()).prop_map(Edit::Add),
        (0..FieldType::ALL.len(), -3isize..10).prop_map(|(t, i)| Edit::Insert(t, i)),
        (0usize..8).prop_map(Edit::Duplicate),
        (0usize..8).prop_map(Edit::Delete),
        (0usize..8, -2isize..10).prop_map(|(f, i)| Edit::Move(f, i)),
        Just(Edit::AddPage),
        any::<u8>().prop_map(Edit::Title),
    ]
}

fn nth_field(editor: &FormEditor, n: usize) -> Option<String> {
    let fields = &editor.active_page().fields;
    (!fields.is_empty()).then(|| fields[n % fields.len()].id.clone())
}

/// Apply `edit`, returning whether the form changed.
fn apply(editor: &mut FormEditor, edit: &Edit) -> bool {
    let outcome = match edit {
        Edit::Add(t) => editor.add_field(FieldType::ALL[*t]),
        Edit::Insert(t, i) => {
            let page = editor.active_page_index();
            editor.insert_field_at(FieldType::ALL[*t], *i, page)
        }
        Edit::Duplicate(n) => match nth_field(editor, *n) {
            Some(id) => editor.duplicate_field(&id),
            None => return false,
        },
        Edit::Delete(n) => match nth_field(editor, *n) {
            Some(id) => editor.delete_field(&id),
            None => return false,
        },
        Edit::Move(n, to) => match nth_field(editor, *n) {
            Some(id) => editor.move_field(&id, *to),
            None => return false,
        },
        Edit::AddPage => editor.add_page(),
        Edit::Title(n) => editor.set_title(format!("Title {}", n)),
    };
    outcome == Outcome::Applied
}

proptest! {
    #[test]
    fn undo_returns_to_start_and_redo_replays(edits in prop::collection::vec(edit(), 1..=MAX_HISTORY)) {
        let mut editor = FormEditor::new(Template::Quiz.instantiate("g"));
        let start: Form = editor.form().clone();

        let applied = edits.iter().filter(|e| apply(&mut editor, e)).count();
        let end: Form = editor.form().clone();
        prop_assert_eq!(editor.history().undo_len(), applied);

        for _ in 0..applied {
            prop_assert!(editor.undo().is_applied());
        }
        prop_assert_eq!(editor.form(), &start);
        prop_assert!(!editor.undo().is_applied());

        for _ in 0..applied {
            prop_assert!(editor.redo().is_applied());
        }
        prop_assert_eq!(editor.form(), &end);
    }

    #[test]
    fn history_never_exceeds_capacity(edits in prop::collection::vec(edit(), 0..120)) {
        let mut editor = FormEditor::new(Form::new("Long session", "g"));
        for e in &edits {
            apply(&mut editor, e);
            prop_assert!(editor.history().undo_len() <= MAX_HISTORY);
        }
    }

    #[test]
    fn field_ids_stay_unique_per_page(edits in prop::collection::vec(edit(), 0..60)) {
        let mut editor = FormEditor::new(Template::Survey.instantiate("g"));
        for e in &edits {
            apply(&mut editor, e);
        }
        for page in &editor.form().pages {
            let mut ids: Vec<_> = page.fields.iter().map(|f| f.id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), page.fields.len());
        }
    }
}
