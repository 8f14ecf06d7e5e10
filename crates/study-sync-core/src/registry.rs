//! In-memory study registry, one record per StudyInstanceUID.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::Path;

use crate::config::Config;
use crate::discovery::walk_files;
use crate::error::{Error, Result};
use crate::extract::extract;
use crate::types::{FileAttributes, StudyField, StudyRecord};

/// Deduplicated set of studies, kept in encounter order
#[derive(Debug, Clone, Default)]
pub struct Registry {
    records: Vec<StudyRecord>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `record` unless its study is already known. Returns true if added.
    pub fn insert(&mut self, record: StudyRecord) -> bool {
        if record.study_instance_uid.is_empty()
            || self.index.contains_key(&record.study_instance_uid)
        {
            return false;
        }
        self.index
            .insert(record.study_instance_uid.clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn get(&self, study_uid: &str) -> Option<&StudyRecord> {
        self.index.get(study_uid).map(|&i| &self.records[i])
    }

    pub fn contains(&self, study_uid: &str) -> bool {
        self.index.contains_key(study_uid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records sorted by PatientName; ties keep encounter order
    pub fn sorted_by_patient_name(&self) -> Vec<&StudyRecord> {
        let mut sorted: Vec<&StudyRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| a.patient_name.cmp(&b.patient_name));
        sorted
    }
}

impl FromIterator<StudyRecord> for Registry {
    fn from_iter<T: IntoIterator<Item = StudyRecord>>(iter: T) -> Self {
        let mut registry = Registry::new();
        for record in iter {
            registry.insert(record);
        }
        registry
    }
}

/// Scan every file under `root` and build the registry.
///
/// The first file seen for a study provides its record; later files for the
/// same study are ignored.
pub fn scan(root: &Path, config: &Config) -> Result<Registry> {
    let files = walk_files(root)?;
    let mut registry = Registry::new();
    let mut non_dicom = 0usize;

    for path in &files {
        let attributes = match extract(path) {
            Ok(attributes) => attributes,
            Err(failure) => {
                debug!("Skipping file: {}", Error::from(failure));
                non_dicom += 1;
                continue;
            }
        };

        let Some(study_uid) = attributes.study_uid() else {
            debug!("Skipping file: {}", Error::MissingStudyIdentifier(path.clone()));
            continue;
        };

        if let Some(existing) = registry.get(study_uid) {
            if config.report_duplicate_conflicts {
                report_conflicts(path, existing, &attributes);
            }
            continue;
        }

        registry.insert(StudyRecord::from_attributes(&attributes));
    }

    info!(
        "Scanned {} files under {}: {} unique studies, {} non-DICOM files",
        files.len(),
        root.display(),
        registry.len(),
        non_dicom
    );

    Ok(registry)
}

/// Warn about study fields where a later file disagrees with the kept record
fn report_conflicts(path: &Path, existing: &StudyRecord, attributes: &FileAttributes) {
    let fields = StudyField::UPDATABLE
        .iter()
        .chain(std::iter::once(&StudyField::ReportTemplateName));

    for &field in fields {
        let kept = existing.get(field);
        let seen = attributes.get(field);
        if kept != seen {
            warn!(
                "Study {} conflict in {}: keeping '{}', ignoring '{}' from {}",
                existing.study_instance_uid,
                field,
                kept,
                seen,
                path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(uid: &str, name: &str) -> StudyRecord {
        StudyRecord {
            study_instance_uid: uid.to_string(),
            patient_name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_seen_wins() {
        let mut registry = Registry::new();
        assert!(registry.insert(record("S1", "Doe^Jane")));
        assert!(!registry.insert(record("S1", "Doe^Jane^Later")));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("S1").unwrap().patient_name, "Doe^Jane");
    }

    #[test]
    fn test_empty_uid_rejected() {
        let mut registry = Registry::new();
        assert!(!registry.insert(record("", "Nobody")));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sorted_by_patient_name_is_stable() {
        let registry: Registry = vec![
            record("S1", "Zed"),
            record("S2", "Adams"),
            record("S3", "Moe"),
            record("S4", "Adams"),
        ]
        .into_iter()
        .collect();

        let uids: Vec<&str> = registry
            .sorted_by_patient_name()
            .iter()
            .map(|r| r.study_instance_uid.as_str())
            .collect();
        assert_eq!(uids, vec!["S2", "S4", "S3", "S1"]);
    }
}
