//! Assigning filesystem entries to mapping keys.

use std::collections::{HashMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

use crate::batch_rename::RenameError;
use crate::batch_rename::sanitize::split_extension;

/// How a key is compared against an entry name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Key is a case-insensitive substring of the full name
    #[default]
    Contains,
    /// Key equals the name without extension, ignoring case
    Exact,
}

/// Kind of filesystem entry to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Snapshot of one directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemEntry {
    /// Name exactly as stored on disk, used to build paths.
    pub file_name: OsString,
    /// Display name with invalid Unicode removed.
    pub name: String,
    pub kind: EntryKind,
}

/// Entries matched to one key, in listing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchGroup {
    pub key: String,
    pub entries: Vec<FilesystemEntry>,
}

/// Result of matching a directory listing against the mapping keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// Groups in the order their key first matched an entry.
    pub groups: Vec<MatchGroup>,
    /// Entries that matched no key, in listing order.
    pub unmatched: Vec<FilesystemEntry>,
}

impl FilesystemEntry {
    #[must_use]
    pub fn new(file_name: impl Into<OsString>, kind: EntryKind) -> Self {
        let file_name = file_name.into();
        Self {
            name: crate::os_str_to_string(&file_name),
            file_name,
            kind,
        }
    }

    /// Name used for comparing against keys: NFC and lowercase.
    fn match_name(&self) -> String {
        normalize(&self.name)
    }
}

impl MatchType {
    /// Check if the key matches the entry name.
    /// Both arguments must already be lowercase.
    fn is_match(self, key: &str, name: &str) -> bool {
        match self {
            Self::Contains => name.contains(key),
            Self::Exact => split_extension(name).0 == key,
        }
    }
}

impl MatchResult {
    /// Total number of matched entries over all groups.
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.groups.iter().map(|group| group.entries.len()).sum()
    }

    #[must_use]
    pub fn group(&self, key: &str) -> Option<&MatchGroup> {
        self.groups.iter().find(|group| group.key == key)
    }
}

/// List the immediate children of `dir` that are of the given kind.
///
/// Entries keep their on-disk names and are sorted by them,
/// so the order does not depend on the platform.
///
/// # Errors
/// Returns an error if the directory cannot be read.
pub fn list_entries(dir: &Path, kind: EntryKind) -> Result<Vec<FilesystemEntry>, RenameError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| RenameError::io(dir, e))? {
        let entry = entry.map_err(|e| RenameError::io(dir, e))?;
        let path = entry.path();
        let is_kind = match kind {
            EntryKind::File => path.is_file(),
            EntryKind::Directory => path.is_dir(),
        };
        if is_kind {
            entries.push(FilesystemEntry::new(entry.file_name(), kind));
        }
    }
    entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(entries)
}

/// Match entries against keys.
///
/// Keys are tried longest first so a short key cannot take an entry that a more
/// specific key also matches. Keys of equal length keep their given order.
/// Each entry goes to the first matching key, or to `unmatched`.
/// Keys and names are compared in NFC so composed and decomposed forms match.
pub fn match_entries<'a, I>(keys: I, entries: &[FilesystemEntry], match_type: MatchType) -> MatchResult
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sorted_keys: Vec<(&str, String)> = keys.into_iter().map(|key| (key, normalize(key))).collect();
    sorted_keys.sort_by_key(|(key, _)| std::cmp::Reverse(key.chars().count()));

    let mut result = MatchResult::default();
    let mut group_index: HashMap<&str, usize> = HashMap::new();
    let mut processed: HashSet<&OsStr> = HashSet::new();

    for entry in entries {
        if !processed.insert(entry.file_name.as_os_str()) {
            continue;
        }
        let name = entry.match_name();
        let matched_key = sorted_keys
            .iter()
            .find(|(_, key)| match_type.is_match(key, &name))
            .map(|(key, _)| *key);

        match matched_key {
            Some(key) => {
                let index = *group_index.entry(key).or_insert_with(|| {
                    result.groups.push(MatchGroup {
                        key: key.to_string(),
                        entries: Vec::new(),
                    });
                    result.groups.len() - 1
                });
                result.groups[index].entries.push(entry.clone());
            }
            None => result.unmatched.push(entry.clone()),
        }
    }

    result
}

fn normalize(text: &str) -> String {
    text.nfc().collect::<String>().to_lowercase()
}

#[cfg(test)]
mod matcher_tests {
    use super::*;

    use std::fs::File;

    use tempfile::tempdir;

    fn files(names: &[&str]) -> Vec<FilesystemEntry> {
        names.iter().map(|name| FilesystemEntry::new(*name, EntryKind::File)).collect()
    }

    fn names(entries: &[FilesystemEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn longer_key_wins_over_shorter() {
        let result = match_entries(
            ["An", "Anna"],
            &files(&["Anna_report.pdf", "Andy.txt", "Bob.txt"]),
            MatchType::Contains,
        );
        assert_eq!(names(&result.group("Anna").unwrap().entries), vec!["Anna_report.pdf"]);
        assert_eq!(names(&result.group("An").unwrap().entries), vec!["Andy.txt"]);
        assert_eq!(names(&result.unmatched), vec!["Bob.txt"]);
    }

    #[test]
    fn contains_is_case_insensitive() {
        let result = match_entries(["BOB"], &files(&["resume_bob.PDF"]), MatchType::Contains);
        assert_eq!(names(&result.group("BOB").unwrap().entries), vec!["resume_bob.PDF"]);
    }

    #[test]
    fn exact_compares_stem_only() {
        let result = match_entries(
            ["bob", "anna"],
            &files(&["Bob.pdf", "bob2.pdf", "Anna", "anna.tar.gz"]),
            MatchType::Exact,
        );
        assert_eq!(names(&result.group("bob").unwrap().entries), vec!["Bob.pdf"]);
        assert_eq!(names(&result.group("anna").unwrap().entries), vec!["Anna"]);
        assert_eq!(names(&result.unmatched), vec!["bob2.pdf", "anna.tar.gz"]);
    }

    #[test]
    fn groups_follow_discovery_order() {
        let result = match_entries(["Zed", "Amy"], &files(&["amy1", "zed1", "amy2"]), MatchType::Contains);
        let keys: Vec<&str> = result.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Amy", "Zed"]);
        assert_eq!(names(&result.group("Amy").unwrap().entries), vec!["amy1", "amy2"]);
    }

    #[test]
    fn equal_length_keys_keep_given_order() {
        let result = match_entries(["ab", "bc"], &files(&["abc.txt"]), MatchType::Contains);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].key, "ab");
    }

    #[test]
    fn duplicate_names_are_matched_once() {
        let result = match_entries(["a"], &files(&["a.txt", "a.txt", "x"]), MatchType::Contains);
        assert_eq!(names(&result.group("a").unwrap().entries), vec!["a.txt"]);
        assert_eq!(names(&result.unmatched), vec!["x"]);
        assert_eq!(result.matched_count(), 1);
    }

    #[test]
    fn no_keys_leaves_everything_unmatched() {
        let result = match_entries(std::iter::empty(), &files(&["a", "b"]), MatchType::Contains);
        assert!(result.groups.is_empty());
        assert_eq!(names(&result.unmatched), vec!["a", "b"]);
    }

    #[test]
    fn list_entries_filters_by_kind() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("b.txt")).unwrap();
        File::create(dir.path().join("a.txt")).unwrap();
        fs::create_dir(dir.path().join("folder")).unwrap();

        let files = list_entries(dir.path(), EntryKind::File).unwrap();
        let names: Vec<&str> = files.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert!(files.iter().all(|e| e.kind == EntryKind::File));

        let dirs = list_entries(dir.path(), EntryKind::Directory).unwrap();
        assert_eq!(dirs, vec![FilesystemEntry::new("folder", EntryKind::Directory)]);
    }

    #[test]
    fn decomposed_name_matches_composed_key() {
        let decomposed = "A\u{30a}sa_cv.pdf";
        let result = match_entries(["\u{c5}sa"], &files(&[decomposed]), MatchType::Contains);
        let entries = &result.group("\u{c5}sa").unwrap().entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, OsString::from(decomposed));
        assert_eq!(entries[0].name, decomposed);
    }

    #[test]
    fn list_entries_keeps_names_as_stored() {
        let dir = tempdir().unwrap();
        let decomposed = "A\u{30a}sa_cv.pdf";
        File::create(dir.path().join(decomposed)).unwrap();

        let files = list_entries(dir.path(), EntryKind::File).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, OsString::from(decomposed));
        assert!(dir.path().join(&files[0].file_name).is_file());
    }

    #[cfg(unix)]
    #[test]
    fn list_entries_keeps_non_unicode_names() {
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let raw = OsStr::from_bytes(b"anna_\xff.pdf");
        File::create(dir.path().join(raw)).unwrap();

        let files = list_entries(dir.path(), EntryKind::File).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name.as_os_str(), raw);
        assert_eq!(files[0].name, "anna_.pdf");

        let result = match_entries(["anna"], &files, MatchType::Contains);
        assert_eq!(result.matched_count(), 1);
    }

    #[test]
    fn list_entries_missing_directory() {
        let dir = tempdir().unwrap();
        assert!(list_entries(&dir.path().join("missing"), EntryKind::File).is_err());
    }
}
