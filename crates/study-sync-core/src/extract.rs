//! Reading study attributes out of DICOM files.
//!
//! Any file may be handed to [`extract`]; files that are not DICOM Part-10
//! containers come back as a [`ParseFailure`] and callers skip them.

use dicom::core::header::Header;
use dicom::core::VR;
use dicom::dictionary_std::tags;
use dicom::object::{open_file, DefaultDicomObject, OpenFileOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::Error;
use crate::types::{FileAttributes, StudyField};

/// A file that could not be read as a DICOM container
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {reason}")]
pub struct ParseFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl From<ParseFailure> for Error {
    fn from(failure: ParseFailure) -> Self {
        Error::ContainerParse {
            path: failure.path,
            reason: failure.reason,
        }
    }
}

/// Read the study attributes of `path`, stopping before the pixel data
pub fn extract(path: &Path) -> Result<FileAttributes, ParseFailure> {
    let object = OpenFileOptions::new()
        .read_until(tags::PIXEL_DATA)
        .open_file(path)
        .map_err(|err| ParseFailure {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

    Ok(attributes_of(&object))
}

/// Read the whole file, pixel data included, so it can be written back
pub fn open_container(path: &Path) -> Result<DefaultDicomObject, ParseFailure> {
    open_file(path).map_err(|err| ParseFailure {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Collect every [`StudyField`] present in `object`
pub fn attributes_of(object: &DefaultDicomObject) -> FileAttributes {
    let mut attributes = FileAttributes::new();
    for field in StudyField::ALL {
        if let Some(value) = element_text(object, field) {
            attributes.set(field, value);
        }
    }
    attributes
}

/// Text value of `field`, or None if the element is absent or not textual
pub fn element_text(object: &DefaultDicomObject, field: StudyField) -> Option<String> {
    let element = object.element(field.tag()).ok()?;

    let text = match element.vr() {
        // Private elements without a dictionary entry come back as raw bytes
        VR::UN | VR::OB => element
            .to_bytes()
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())?,
        _ => element.to_str().ok()?.into_owned(),
    };

    Some(clean_value(&text))
}

/// Strip DICOM padding (spaces and NULs) from both ends
pub fn clean_value(value: &str) -> String {
    value
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}
