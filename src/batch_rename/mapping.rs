//! Validated key → target name mapping.

use std::collections::HashMap;

use itertools::Itertools;

use crate::batch_rename::RenameError;
use crate::batch_rename::table::Table;

/// One validated mapping row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub key: String,
    pub target_name: String,
}

/// Key → target name table with case-insensitively unique keys and unique target names.
/// Entries keep the order of the source rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: Vec<MappingEntry>,
}

impl MappingEntry {
    #[must_use]
    pub fn new(key: impl Into<String>, target_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            target_name: target_name.into(),
        }
    }
}

impl Mapping {
    /// Build a mapping from the two named columns of a table.
    ///
    /// # Errors
    /// Returns an error if a column does not exist or the rows contain duplicates.
    pub fn from_table(table: &Table, key_column: &str, target_column: &str) -> Result<Self, RenameError> {
        let key_index = table.column_index(key_column)?;
        let target_index = table.column_index(target_column)?;
        Self::from_rows(table.pairs(key_index, target_index), key_column, target_column)
    }

    /// Validate raw `(key, target name)` rows.
    ///
    /// Both fields are trimmed and rows with an empty field are dropped.
    /// Keys must be unique ignoring case and target names must be unique exactly.
    /// The column names are only used for error messages.
    ///
    /// # Errors
    /// Returns `DuplicateKeys` or `DuplicateTargets` listing every offending value.
    pub fn from_rows<K, T>(
        rows: impl IntoIterator<Item = (K, T)>,
        key_column: &str,
        target_column: &str,
    ) -> Result<Self, RenameError>
    where
        K: AsRef<str>,
        T: AsRef<str>,
    {
        let entries: Vec<MappingEntry> = rows
            .into_iter()
            .map(|(key, target)| (key.as_ref().trim().to_string(), target.as_ref().trim().to_string()))
            .filter(|(key, target)| !key.is_empty() && !target.is_empty())
            .map(|(key, target_name)| MappingEntry { key, target_name })
            .collect();

        let mut key_counts: HashMap<String, usize> = HashMap::new();
        for entry in &entries {
            *key_counts.entry(entry.key.to_lowercase()).or_default() += 1;
        }
        let duplicate_keys: Vec<String> = entries
            .iter()
            .filter(|entry| key_counts[&entry.key.to_lowercase()] > 1)
            .map(|entry| entry.key.clone())
            .unique()
            .sorted()
            .collect();
        if !duplicate_keys.is_empty() {
            return Err(RenameError::DuplicateKeys {
                column: key_column.to_string(),
                keys: duplicate_keys,
            });
        }

        let target_counts = entries.iter().counts_by(|entry| entry.target_name.as_str());
        let duplicate_targets: Vec<(String, String)> = entries
            .iter()
            .filter(|entry| target_counts[entry.target_name.as_str()] > 1)
            .map(|entry| (entry.target_name.clone(), entry.key.clone()))
            .sorted()
            .collect();
        if !duplicate_targets.is_empty() {
            return Err(RenameError::DuplicateTargets {
                column: target_column.to_string(),
                conflicts: duplicate_targets,
            });
        }

        Ok(Self { entries })
    }

    /// Get the target name for a key.
    #[must_use]
    pub fn target_name(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.target_name.as_str())
    }

    /// Keys in source row order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    #[must_use]
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod mapping_tests {
    use super::*;

    fn rows(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, t)| ((*k).to_string(), (*t).to_string())).collect()
    }

    #[test]
    fn unique_rows_succeed_with_same_size() {
        let input = rows(&[("Anna", "Anna.pdf"), ("Bob", "Bob.pdf"), ("Cecilia", "C.pdf")]);
        let mapping = Mapping::from_rows(input, "Name", "File").unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.target_name("Bob"), Some("Bob.pdf"));
        assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["Anna", "Bob", "Cecilia"]);
    }

    #[test]
    fn trims_and_drops_empty_rows() {
        let input = rows(&[("  Anna ", " Anna.pdf  "), ("", "orphan.pdf"), ("Bob", "   "), ("  ", "")]);
        let mapping = Mapping::from_rows(input, "Name", "File").unwrap();
        assert_eq!(mapping.entries(), &[MappingEntry::new("Anna", "Anna.pdf")]);
    }

    #[test]
    fn duplicate_keys_ignore_case() {
        let input = rows(&[("anna", "1.pdf"), ("Bob", "2.pdf"), ("ANNA", "3.pdf"), ("bob", "4.pdf")]);
        match Mapping::from_rows(input, "Name", "File") {
            Err(RenameError::DuplicateKeys { column, keys }) => {
                assert_eq!(column, "Name");
                assert_eq!(keys, vec!["ANNA", "Bob", "anna", "bob"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn duplicate_keys_after_trimming() {
        let input = rows(&[("Anna ", "1.pdf"), (" Anna", "2.pdf")]);
        match Mapping::from_rows(input, "Name", "File") {
            Err(RenameError::DuplicateKeys { keys, .. }) => assert_eq!(keys, vec!["Anna"]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn duplicate_targets_are_exact() {
        let input = rows(&[("Anna", "Report.pdf"), ("Bob", "report.pdf"), ("Cecilia", "Report.pdf")]);
        match Mapping::from_rows(input, "Name", "File") {
            Err(RenameError::DuplicateTargets { column, conflicts }) => {
                assert_eq!(column, "File");
                assert_eq!(
                    conflicts,
                    vec![
                        ("Report.pdf".to_string(), "Anna".to_string()),
                        ("Report.pdf".to_string(), "Cecilia".to_string()),
                    ]
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn duplicate_keys_reported_before_targets() {
        let input = rows(&[("Anna", "x.pdf"), ("anna", "x.pdf")]);
        assert!(matches!(
            Mapping::from_rows(input, "Name", "File"),
            Err(RenameError::DuplicateKeys { .. })
        ));
    }

    #[test]
    fn from_table_resolves_columns() {
        let table = Table {
            headers: vec!["Notes".to_string(), "File".to_string(), "Name".to_string()],
            rows: vec![vec!["x".to_string(), "Anna.pdf".to_string(), "Anna".to_string()]],
        };
        let mapping = Mapping::from_table(&table, "Name", "File").unwrap();
        assert_eq!(mapping.target_name("Anna"), Some("Anna.pdf"));
    }

    #[test]
    fn from_table_missing_column() {
        let table = Table {
            headers: vec!["Name".to_string()],
            rows: Vec::new(),
        };
        assert!(matches!(
            Mapping::from_table(&table, "Name", "File"),
            Err(RenameError::MissingColumn { .. })
        ));
    }
}
