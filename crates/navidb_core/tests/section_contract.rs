use navidb_core::db::{DbError, DbResult};
use navidb_core::{
    Address, CommentEditor, CommentError, CommentResult, CreateSectionArgs, FailureCause,
    NewSection, Section, SectionPermission, SectionProcedures, SectionRow, SectionStore,
    SectionStoreError,
};
use std::cell::{Cell, RefCell};

/// Backend double that records calls and replays canned results.
#[derive(Default)]
struct RecordingProcedures {
    calls: RefCell<Vec<&'static str>>,
    created_id: Cell<Option<i64>>,
    comment_ack: Cell<Option<i64>>,
    rows: RefCell<Vec<SectionRow>>,
    fail: Cell<bool>,
    last_create: RefCell<Option<(Option<i64>, String, u64)>>,
}

impl RecordingProcedures {
    fn record(&self, name: &'static str) -> DbResult<()> {
        self.calls.borrow_mut().push(name);
        if self.fail.get() {
            return Err(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows));
        }
        Ok(())
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl SectionProcedures for RecordingProcedures {
    fn create_section(&self, args: &CreateSectionArgs<'_>) -> DbResult<Option<i64>> {
        self.record("create_section")?;
        *self.last_create.borrow_mut() = Some((
            args.comment_id,
            args.permission.to_string(),
            args.end_address,
        ));
        Ok(self.created_id.get())
    }

    fn delete_section(&self, _module_id: i64, _section_id: i64) -> DbResult<()> {
        self.record("delete_section")
    }

    fn get_sections(&self, _module_id: i64) -> DbResult<Vec<SectionRow>> {
        self.record("get_sections")?;
        Ok(self.rows.borrow().clone())
    }

    fn set_section_name(&self, _module_id: i64, _section_id: i64, _name: &str) -> DbResult<()> {
        self.record("set_section_name")
    }

    fn append_section_comment(
        &self,
        _module_id: i64,
        _section_id: i64,
        _user_id: i64,
        _comment_text: &str,
    ) -> DbResult<Option<i64>> {
        self.record("append_section_comment")?;
        Ok(self.created_id.get())
    }

    fn delete_section_comment(
        &self,
        _module_id: i64,
        _section_id: i64,
        _comment_id: i64,
        _user_id: i64,
    ) -> DbResult<Option<i64>> {
        self.record("delete_section_comment")?;
        Ok(self.comment_ack.get())
    }
}

#[derive(Default)]
struct RecordingEditor {
    edits: RefCell<Vec<(i64, i64, String)>>,
    reject: Cell<bool>,
}

impl CommentEditor for RecordingEditor {
    fn edit_comment(&self, comment_id: i64, user_id: i64, text: &str) -> CommentResult<()> {
        self.edits
            .borrow_mut()
            .push((comment_id, user_id, text.to_string()));
        if self.reject.get() {
            return Err(CommentError::NotFound {
                comment_id,
                user_id,
            });
        }
        Ok(())
    }
}

fn store() -> SectionStore<RecordingProcedures, RecordingEditor> {
    SectionStore::new(RecordingProcedures::default(), RecordingEditor::default())
}

fn new_section(module_id: i64) -> NewSection<'static> {
    NewSection {
        module_id,
        name: "text",
        comment_id: None,
        start_address: Address::new(0x1000),
        end_address: Address::new(0x2000),
        permission: SectionPermission::ReadExecute,
        data: &[],
    }
}

fn section(module_id: i64, id: i64) -> Section {
    Section {
        id,
        module_id,
        name: "text".to_string(),
        start_address: Address::new(0x1000),
        end_address: Address::new(0x2000),
        permission: SectionPermission::ReadExecute,
        data: Vec::new(),
    }
}

fn assert_invalid(result: Result<impl std::fmt::Debug, SectionStoreError>, argument: &str) {
    match result {
        Err(SectionStoreError::InvalidArgument { argument: got, .. }) => {
            assert_eq!(got, argument)
        }
        other => panic!("expected invalid `{argument}`, got {other:?}"),
    }
}

#[test]
fn non_positive_module_id_never_reaches_backend() {
    let store = store();

    for module_id in [0, -1] {
        assert_invalid(store.create_section(&new_section(module_id)), "module_id");
        assert_invalid(store.delete_section(&section(module_id, 1)), "module_id");
        assert_invalid(store.load_sections(module_id), "module_id");
        assert_invalid(store.set_section_name(module_id, 1, "x"), "module_id");
        assert_invalid(store.append_section_comment(module_id, 1, "x", 1), "module_id");
        assert_invalid(store.delete_section_comment(module_id, 1, 1, 1), "module_id");
        assert_invalid(store.edit_section_comment(module_id, 1, 1, "x"), "module_id");
    }

    assert_eq!(store.procedures().call_count(), 0);
    assert!(store.comments().edits.borrow().is_empty());
}

#[test]
fn negative_section_id_never_reaches_backend() {
    let store = store();

    assert_invalid(store.delete_section(&section(1, -1)), "section_id");
    assert_invalid(store.set_section_name(1, -1, "x"), "section_id");
    assert_invalid(store.append_section_comment(1, -1, "x", 1), "section_id");
    assert_invalid(store.delete_section_comment(1, -1, 1, 1), "section_id");

    assert_eq!(store.procedures().call_count(), 0);
}

#[test]
fn section_id_zero_is_accepted() {
    let store = store();

    store.set_section_name(1, 0, "x").unwrap();
    assert_eq!(*store.procedures().calls.borrow(), vec!["set_section_name"]);
}

#[test]
fn create_sends_absent_comment_and_permission_symbol() {
    let store = store();
    store.procedures().created_id.set(Some(17));

    let section = NewSection {
        end_address: Address::new(u64::MAX),
        ..new_section(7)
    };
    assert_eq!(store.create_section(&section).unwrap(), 17);

    let sent = store.procedures().last_create.borrow().clone().unwrap();
    assert_eq!(sent, (None, "READ_EXECUTE".to_string(), u64::MAX));
}

#[test]
fn null_identities_are_save_errors() {
    let store = store();

    let err = store.create_section(&new_section(7)).unwrap_err();
    assert!(matches!(
        err,
        SectionStoreError::Save(FailureCause::NullIdentity("section id"))
    ));

    let err = store.append_section_comment(7, 1, "x", 1).unwrap_err();
    assert!(matches!(
        err,
        SectionStoreError::Save(FailureCause::NullIdentity("comment id"))
    ));
}

#[test]
fn null_delete_acknowledgement_is_delete_error() {
    let store = store();

    let err = store.delete_section_comment(7, 1, 5, 1).unwrap_err();
    assert!(matches!(
        err,
        SectionStoreError::Delete(FailureCause::NullIdentity(_))
    ));

    store.procedures().comment_ack.set(Some(5));
    store.delete_section_comment(7, 1, 5, 1).unwrap();
}

#[test]
fn backend_failures_map_to_operation_category() {
    let store = store();
    store.procedures().fail.set(true);

    assert!(matches!(
        store.create_section(&new_section(1)),
        Err(SectionStoreError::Save(FailureCause::Backend(_)))
    ));
    assert!(matches!(
        store.set_section_name(1, 1, "x"),
        Err(SectionStoreError::Save(FailureCause::Backend(_)))
    ));
    assert!(matches!(
        store.append_section_comment(1, 1, "x", 1),
        Err(SectionStoreError::Save(FailureCause::Backend(_)))
    ));
    assert!(matches!(
        store.load_sections(1),
        Err(SectionStoreError::Load(FailureCause::Backend(_)))
    ));
    assert!(matches!(
        store.delete_section(&section(1, 1)),
        Err(SectionStoreError::Delete(FailureCause::Backend(_)))
    ));
    assert!(matches!(
        store.delete_section_comment(1, 1, 1, 1),
        Err(SectionStoreError::Delete(FailureCause::Backend(_)))
    ));

    assert_eq!(store.procedures().call_count(), 6);
}

#[test]
fn load_decodes_rows_and_keeps_null_comment_absent() {
    let store = store();
    store.procedures().rows.borrow_mut().extend([
        SectionRow {
            id: 1,
            name: ".text".to_string(),
            comment_id: None,
            start_address: 0x1000,
            end_address: 0x1fff,
            permission: "READ_EXECUTE".to_string(),
            data: vec![0x90],
        },
        SectionRow {
            id: 2,
            name: ".data".to_string(),
            comment_id: Some(0),
            start_address: 0x2000,
            end_address: 0x2fff,
            permission: "READ_WRITE".to_string(),
            data: Vec::new(),
        },
    ]);

    let sections = store.load_sections(3).unwrap();
    assert_eq!(sections.len(), 2);
    for (section, comment_id) in &sections {
        assert_eq!(section.module_id, 3);
        match section.id {
            1 => assert_eq!(*comment_id, None),
            2 => assert_eq!(*comment_id, Some(0)),
            other => panic!("unexpected section {other}"),
        }
    }
}

#[test]
fn edit_delegates_and_wraps_collaborator_errors() {
    let store = store();

    store.edit_section_comment(2, 11, 4, "new text").unwrap();
    store.comments().reject.set(true);
    let err = store.edit_section_comment(2, 11, 5, "again").unwrap_err();

    assert!(matches!(
        err,
        SectionStoreError::Save(FailureCause::Comment(CommentError::NotFound {
            comment_id: 11,
            user_id: 5
        }))
    ));
    assert_eq!(
        *store.comments().edits.borrow(),
        vec![(11, 4, "new text".to_string()), (11, 5, "again".to_string())]
    );
    assert_eq!(store.procedures().call_count(), 0);
}
