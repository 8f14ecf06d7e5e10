use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::Path;

use super::error::{PersistenceError, PersistenceResult};
use crate::registry::Registry;
use crate::types::StudyRecord;

/// Column order of the registry file
pub const REGISTRY_COLUMNS: [&str; 10] = [
    "PatientName",
    "PatientID",
    "PatientBirthDate",
    "PatientAge",
    "PatientSex",
    "AccessionNumber",
    "StudyDate",
    "StudyDescription",
    "StudyInstanceUID",
    "ReportTemplateName",
];

/// Registry rows as loaded from disk, keyed by StudyInstanceUID
pub type RegistryRows = HashMap<String, StudyRecord>;

/// Write `registry` to `path`, one row per study sorted by PatientName.
/// An existing file is overwritten.
pub fn write_registry(registry: &Registry, path: &Path) -> PersistenceResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    // Serialising the records writes the header, except when there are none
    if registry.is_empty() {
        writer.write_record(REGISTRY_COLUMNS)?;
    }

    for record in registry.sorted_by_patient_name() {
        writer.serialize(record)?;
    }

    writer
        .flush()
        .map_err(|e| PersistenceError::Io(path.to_path_buf(), e))?;

    info!(
        "Registry with {} studies written to {}",
        registry.len(),
        path.display()
    );
    Ok(())
}

/// Load the registry file at `path`.
///
/// Header names and values are trimmed. Rows without a StudyInstanceUID are
/// dropped; when a study appears twice the last row wins.
pub fn read_registry(path: &Path) -> PersistenceResult<RegistryRows> {
    if !path.is_file() {
        return Err(PersistenceError::NotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    let mut rows = RegistryRows::new();
    for (line, result) in reader.deserialize::<StudyRecord>().enumerate() {
        let record = match result {
            Ok(record) => record.trimmed(),
            Err(e) => {
                warn!("Skipping unreadable row {} in {}: {}", line + 2, path.display(), e);
                continue;
            }
        };

        if record.study_instance_uid.is_empty() {
            debug!("Skipping row {} without StudyInstanceUID", line + 2);
            continue;
        }

        if let Some(previous) = rows.insert(record.study_instance_uid.clone(), record) {
            debug!(
                "Study {} listed more than once; using the later row",
                previous.study_instance_uid
            );
        }
    }

    if rows.is_empty() {
        return Err(PersistenceError::Empty(path.to_path_buf()));
    }

    info!("Registry loaded for {} studies from {}", rows.len(), path.display());
    Ok(rows)
}
