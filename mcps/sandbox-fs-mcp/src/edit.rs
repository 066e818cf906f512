//! Sequential multi-edit engine
//!
//! Edits are applied in order to an in-memory copy of the file. Each edit
//! replaces every non-overlapping occurrence of its search text in the
//! current content and gets one of three outcomes:
//!
//! - `Applied`: the search text was present in the current content
//! - `SupersededByPriorEdit`: present in the original, but an earlier edit in
//!   the same batch already removed it
//! - `NotFound`: never present, or empty search text
//!
//! Nothing is written until every edit has been evaluated, and nothing at all
//! on a dry run or when the content ends up unchanged.

use std::fmt;

use crate::sandbox::ResolvedPath;
use crate::storage::ContentStore;
use crate::types::FsResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOperation {
    pub search: String,
    pub replace: String,
}

impl EditOperation {
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    NotFound,
    SupersededByPriorEdit,
}

impl fmt::Display for EditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditOutcome::Applied => write!(f, "applied"),
            EditOutcome::NotFound => write!(f, "not found"),
            EditOutcome::SupersededByPriorEdit => write!(f, "superseded by prior edit"),
        }
    }
}

/// One processed edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRecord {
    pub operation: EditOperation,
    pub outcome: EditOutcome,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct EditSessionResult {
    pub original: String,
    /// Final content; on a dry run, the content that would have been written
    pub content: String,
    pub edits: Vec<EditRecord>,
    pub changed: bool,
    pub dry_run: bool,
}

impl EditSessionResult {
    /// Whether this session persisted its content.
    pub fn written(&self) -> bool {
        self.changed && !self.dry_run
    }
}

/// Apply `edits` in order to `original`. Pure; performs no I/O.
pub fn apply_edits(original: &str, edits: Vec<EditOperation>, dry_run: bool) -> EditSessionResult {
    let mut current = original.to_string();
    let mut records = Vec::with_capacity(edits.len());

    for operation in edits {
        let search = operation.search.as_str();

        let (outcome, description) = if search.is_empty() {
            (EditOutcome::NotFound, "empty search text".to_string())
        } else if current.contains(search) {
            let count = current.matches(search).count();
            current = current.replace(search, &operation.replace);
            let noun = if count == 1 { "occurrence" } else { "occurrences" };
            (EditOutcome::Applied, format!("replaced {} {}", count, noun))
        } else if original.contains(search) {
            (
                EditOutcome::SupersededByPriorEdit,
                "text was present but already changed by an earlier edit".to_string(),
            )
        } else {
            (EditOutcome::NotFound, "text not found in file".to_string())
        };

        records.push(EditRecord {
            operation,
            outcome,
            description,
        });
    }

    EditSessionResult {
        changed: current != original,
        original: original.to_string(),
        content: current,
        edits: records,
        dry_run,
    }
}

/// Read `path`, apply `edits`, and write the result back when it changed and
/// this is not a dry run.
///
/// The read-modify-write is not serialized against other callers: two
/// concurrent edits of the same file race and the last write wins.
pub async fn edit_content<S>(
    store: &S,
    path: &ResolvedPath,
    edits: Vec<EditOperation>,
    dry_run: bool,
) -> FsResult<EditSessionResult>
where
    S: ContentStore + ?Sized,
{
    let original = store.read(path).await?;
    let session = apply_edits(&original, edits, dry_run);

    if session.written() {
        store.write(path, &session.content).await?;
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{AllowedRoots, Sandbox};
    use crate::types::FsError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// In-memory store counting writes.
    #[derive(Default)]
    struct MemoryStore {
        files: Mutex<HashMap<PathBuf, String>>,
        writes: Mutex<usize>,
    }

    impl MemoryStore {
        fn with(path: &ResolvedPath, content: &str) -> Self {
            let store = Self::default();
            store
                .files
                .lock()
                .unwrap()
                .insert(path.as_path().to_path_buf(), content.to_string());
            store
        }

        fn get(&self, path: &ResolvedPath) -> Option<String> {
            self.files.lock().unwrap().get(path.as_path()).cloned()
        }

        fn write_count(&self) -> usize {
            *self.writes.lock().unwrap()
        }
    }

    #[async_trait]
    impl ContentStore for MemoryStore {
        async fn read(&self, path: &ResolvedPath) -> FsResult<String> {
            self.get(path)
                .ok_or_else(|| FsError::NotFound(path.requested().to_string()))
        }

        async fn write(&self, path: &ResolvedPath, content: &str) -> FsResult<()> {
            *self.writes.lock().unwrap() += 1;
            self.files
                .lock()
                .unwrap()
                .insert(path.as_path().to_path_buf(), content.to_string());
            Ok(())
        }
    }

    fn target() -> ResolvedPath {
        Sandbox::new(AllowedRoots::new("/srv/root", ["."]).unwrap())
            .validate("doc.txt")
            .unwrap()
    }

    fn outcomes(session: &EditSessionResult) -> Vec<EditOutcome> {
        session.edits.iter().map(|r| r.outcome).collect()
    }

    #[test]
    fn test_replaces_all_occurrences() {
        let session = apply_edits("foo bar foo", vec![EditOperation::new("foo", "baz")], false);
        assert_eq!(session.content, "baz bar baz");
        assert_eq!(outcomes(&session), vec![EditOutcome::Applied]);
        assert_eq!(session.edits[0].description, "replaced 2 occurrences");
        assert!(session.changed);
    }

    #[test]
    fn test_replacement_is_not_rescanned() {
        let session = apply_edits("aa", vec![EditOperation::new("a", "aa")], false);
        assert_eq!(session.content, "aaaa");

        let session = apply_edits("aaa", vec![EditOperation::new("aa", "b")], false);
        assert_eq!(session.content, "ba");
    }

    #[test]
    fn test_superseded_by_prior_edit() {
        let session = apply_edits(
            "foo",
            vec![EditOperation::new("foo", "qux"), EditOperation::new("foo", "zzz")],
            false,
        );
        assert_eq!(session.content, "qux");
        assert_eq!(
            outcomes(&session),
            vec![EditOutcome::Applied, EditOutcome::SupersededByPriorEdit]
        );
    }

    #[test]
    fn test_not_found_regardless_of_position() {
        let session = apply_edits(
            "alpha beta",
            vec![
                EditOperation::new("gamma", "x"),
                EditOperation::new("alpha", "delta"),
                EditOperation::new("omega", "y"),
            ],
            false,
        );
        assert_eq!(
            outcomes(&session),
            vec![EditOutcome::NotFound, EditOutcome::Applied, EditOutcome::NotFound]
        );
        assert_eq!(session.content, "delta beta");
    }

    #[test]
    fn test_text_introduced_by_earlier_edit_can_be_edited() {
        let session = apply_edits(
            "one",
            vec![EditOperation::new("one", "two"), EditOperation::new("two", "three")],
            false,
        );
        assert_eq!(session.content, "three");
        assert_eq!(outcomes(&session), vec![EditOutcome::Applied, EditOutcome::Applied]);
    }

    #[test]
    fn test_empty_search_is_not_found() {
        let session = apply_edits("abc", vec![EditOperation::new("", "x")], false);
        assert_eq!(outcomes(&session), vec![EditOutcome::NotFound]);
        assert_eq!(session.content, "abc");
        assert!(!session.changed);
    }

    #[test]
    fn test_identity_edit_does_not_change() {
        let session = apply_edits("same same", vec![EditOperation::new("same", "same")], false);
        assert_eq!(outcomes(&session), vec![EditOutcome::Applied]);
        assert!(!session.changed);
        assert!(!session.written());
    }

    #[test]
    fn test_edits_cancelling_out_are_unchanged() {
        let session = apply_edits(
            "x",
            vec![EditOperation::new("x", "y"), EditOperation::new("y", "x")],
            false,
        );
        assert!(!session.changed);
        assert_eq!(session.original, session.content);
    }

    #[tokio::test]
    async fn test_edit_content_writes_when_changed() {
        let path = target();
        let store = MemoryStore::with(&path, "hello world");

        let session = edit_content(&store, &path, vec![EditOperation::new("world", "there")], false)
            .await
            .unwrap();

        assert!(session.written());
        assert_eq!(store.get(&path).unwrap(), "hello there");
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_never_writes() {
        let path = target();
        let store = MemoryStore::with(&path, "hello world");

        let session = edit_content(&store, &path, vec![EditOperation::new("world", "there")], true)
            .await
            .unwrap();

        assert!(session.changed);
        assert!(session.dry_run);
        assert_eq!(session.content, "hello there");
        assert_eq!(store.get(&path).unwrap(), "hello world");
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_unchanged_session_skips_write() {
        let path = target();
        let store = MemoryStore::with(&path, "hello");

        let session = edit_content(&store, &path, vec![EditOperation::new("absent", "x")], false)
            .await
            .unwrap();

        assert!(!session.changed);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_propagates() {
        let path = target();
        let store = MemoryStore::default();

        let result = edit_content(&store, &path, vec![EditOperation::new("a", "b")], false).await;
        assert!(matches!(result, Err(FsError::NotFound(p)) if p == "doc.txt"));
    }
}
