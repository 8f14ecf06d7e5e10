use std::path::{Path, PathBuf};

use crate::extract::{extract, ParseFailure};
use crate::types::{FileAttributes, StudyField};

/// Placeholder for missing names and descriptions
pub const UNKNOWN: &str = "Unknown";

/// Characters that are replaced by `_` in folder names
pub const INVALID_CHARS: [char; 10] = [' ', '\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Trim `text` and keep at most `max_len` characters; empty becomes "Unknown"
pub fn truncate(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.is_empty() {
        return UNKNOWN.to_string();
    }
    text.chars().take(max_len).collect()
}

/// Replace characters that are unsafe in folder names with underscores
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Folder a file with `attributes` belongs in:
/// `root/Patient-<name>/Study-<description>/Series-<description>`
pub fn derive_path(attributes: &FileAttributes, root: &Path, max_len: usize) -> PathBuf {
    let patient = match attributes.get(StudyField::PatientName).trim() {
        "" => UNKNOWN,
        name => name,
    };
    let study = truncate(attributes.get(StudyField::StudyDescription), max_len);
    let series = truncate(attributes.get(StudyField::SeriesDescription), max_len);

    root.join(format!("Patient-{}", sanitize(patient)))
        .join(format!("Study-{}", sanitize(&study)))
        .join(format!("Series-{}", sanitize(&series)))
}

/// Read `file` and derive its destination folder under `root`
pub fn derive_destination(file: &Path, root: &Path, max_len: usize) -> Result<PathBuf, ParseFailure> {
    let attributes = extract(file)?;
    Ok(derive_path(&attributes, root, max_len))
}
