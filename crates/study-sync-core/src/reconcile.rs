//! Propagating registry edits back into the DICOM files.

use dicom::core::header::Header;
use dicom::core::value::PrimitiveValue;
use dicom::core::{DataElement, VR};
use dicom::object::DefaultDicomObject;
use log::{debug, info};
use std::fs;
use std::path::Path;
use tempfile::Builder;

use crate::config::Config;
use crate::discovery::discover_containers;
use crate::error::{Error, Result};
use crate::extract::{element_text, open_container};
use crate::logging::{log_file_error, log_fs_modification};
use crate::persistence::RegistryRows;
use crate::progress::ProgressTracker;
use crate::types::{RunSummary, StudyField, StudyRecord};

/// What happened to a single file during reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// File rewritten; lists the fields that changed
    Updated(Vec<StudyField>),
    /// Study found and every field already matched
    Unchanged,
    /// Not readable as DICOM
    NotDicom,
    /// No registry row for the file's StudyInstanceUID
    UnknownStudy,
}

/// Rewrite every file under `root` whose study fields differ from `rows`.
///
/// Returns the run summary; `updated` is the number of files rewritten.
pub fn reconcile(root: &Path, rows: &RegistryRows, config: &Config) -> Result<RunSummary> {
    let files = discover_containers(root, config)?;
    let mut progress =
        ProgressTracker::new("Updating DICOM files", files.len(), config.show_progress);

    for path in &files {
        match reconcile_file(path, rows) {
            Ok(FileOutcome::Updated(_)) => progress.updated(),
            Ok(_) => progress.skipped(),
            Err(e) => {
                log_file_error(path, "save", &e);
                progress.failed();
            }
        }
    }

    Ok(progress.finish())
}

/// Bring one file in line with its registry row
pub fn reconcile_file(path: &Path, rows: &RegistryRows) -> Result<FileOutcome> {
    let mut object = match open_container(path) {
        Ok(object) => object,
        Err(failure) => {
            debug!("Skipping non-DICOM file {}", failure);
            return Ok(FileOutcome::NotDicom);
        }
    };

    let Some(row) = element_text(&object, StudyField::StudyInstanceUid)
        .and_then(|uid| rows.get(&uid))
    else {
        return Ok(FileOutcome::UnknownStudy);
    };

    let changed = apply_row(&mut object, row);
    if changed.is_empty() {
        return Ok(FileOutcome::Unchanged);
    }

    save_atomically(&object, path)?;

    let names: Vec<&str> = changed.iter().map(|field| field.keyword()).collect();
    log_fs_modification("update", path, Some(&names.join(", ")));
    info!("Updated {}: {}", path.display(), names.join(", "));

    Ok(FileOutcome::Updated(changed))
}

/// Write `object` to a temporary sibling of `path`, then rename it over `path`.
/// On failure the original file is left as it was and the temporary is removed.
fn save_atomically(object: &DefaultDicomObject, path: &Path) -> Result<()> {
    let save_error = |reason: String| Error::Save {
        path: path.to_path_buf(),
        reason,
    };

    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = Builder::new()
        .prefix(".study-sync-")
        .tempfile_in(dir)
        .map_err(|e| save_error(e.to_string()))?;

    // Temporary files are created private; keep the original's mode
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())
            .map_err(|e| save_error(e.to_string()))?;
    }

    object
        .write_to_file(temp.path())
        .map_err(|e| save_error(e.to_string()))?;
    temp.persist(path).map_err(|e| save_error(e.error.to_string()))?;
    Ok(())
}

/// Overwrite the fields of `object` that differ from `row`, in memory only.
/// Returns the fields that were changed.
pub fn apply_row(object: &mut DefaultDicomObject, row: &StudyRecord) -> Vec<StudyField> {
    let mut changed = Vec::new();

    for field in StudyField::UPDATABLE {
        let wanted = row.get(field);
        let current = element_text(object, field).unwrap_or_default();
        if current == wanted {
            continue;
        }

        // Keep the VR the file already uses for this element
        let vr = object
            .element(field.tag())
            .ok()
            .map(|element| element.vr())
            .filter(|vr| *vr != VR::UN)
            .unwrap_or_else(|| field.vr());

        let value = if wanted.is_empty() {
            PrimitiveValue::Empty
        } else {
            PrimitiveValue::from(wanted.to_string())
        };

        object.put(DataElement::new(field.tag(), vr, value));
        changed.push(field);
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom::dictionary_std::{tags, uids};
    use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
    use tempfile::tempdir;

    fn small_object(patient: &str) -> DefaultDicomObject {
        let mut object = InMemDicomObject::new_empty();
        object.put(DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from(uids::SECONDARY_CAPTURE_IMAGE_STORAGE),
        ));
        object.put(DataElement::new(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from("2.25.1"),
        ));
        object.put(DataElement::new(
            StudyField::PatientName.tag(),
            VR::PN,
            PrimitiveValue::from(patient),
        ));
        object
            .with_meta(FileMetaTableBuilder::new().transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN))
            .unwrap()
    }

    #[test]
    fn test_non_dicom_file_is_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("IM0001");
        fs::write(&path, b"not a dicom file").unwrap();

        let outcome = reconcile_file(&path, &RegistryRows::new()).unwrap();
        assert_eq!(outcome, FileOutcome::NotDicom);
        assert_eq!(fs::read(&path).unwrap(), b"not a dicom file");
    }

    #[test]
    fn test_save_replaces_file_without_leftovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("IM0001");
        fs::write(&path, b"old").unwrap();

        let object = small_object("Doe^Jane");
        save_atomically(&object, &path).unwrap();

        let saved = open_container(&path).unwrap();
        assert_eq!(
            element_text(&saved, StudyField::PatientName).as_deref(),
            Some("Doe^Jane")
        );
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("IM0001")]);
    }

    #[test]
    fn test_save_failure_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone/IM0001");

        let object = small_object("Doe^Jane");
        let result = save_atomically(&object, &missing);

        assert!(matches!(result, Err(Error::Save { .. })));
        assert!(!missing.exists());
    }

    #[test]
    fn test_missing_root() {
        let result = reconcile(
            Path::new("/path/that/does/not/exist"),
            &RegistryRows::new(),
            &Config::default(),
        );
        assert!(matches!(result, Err(Error::NotADirectory(_))));
    }
}
