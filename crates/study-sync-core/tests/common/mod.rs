#![allow(dead_code)]

use dicom::core::value::PrimitiveValue;
use dicom::core::{DataElement, Tag, VR};
use dicom::dictionary_std::{tags, uids};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use std::fs;
use std::path::{Path, PathBuf};

use study_sync_core::extract::extract;
use study_sync_core::{FileAttributes, StudyField};

/// Private creator reserving the (1351,10xx) block
const PRIVATE_CREATOR_TAG: Tag = Tag(0x1351, 0x0010);

/// Pixel payload written into every test file
pub const PIXEL_BYTES: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

/// Write a small DICOM Part-10 file at `path` carrying `fields`
pub fn write_dicom(path: &Path, fields: &[(StudyField, &str)]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }

    let sop_instance_uid = format!(
        "2.25.{}",
        path.to_string_lossy()
            .bytes()
            .fold(7u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
    );

    let mut object = InMemDicomObject::new_empty();
    object.put(DataElement::new(
        tags::SOP_CLASS_UID,
        VR::UI,
        PrimitiveValue::from(uids::SECONDARY_CAPTURE_IMAGE_STORAGE),
    ));
    object.put(DataElement::new(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from(sop_instance_uid),
    ));

    for (field, value) in fields {
        if *field == StudyField::ReportTemplateName {
            object.put(DataElement::new(
                PRIVATE_CREATOR_TAG,
                VR::LO,
                PrimitiveValue::from("REPORTING"),
            ));
        }
        object.put(DataElement::new(
            field.tag(),
            field.vr(),
            PrimitiveValue::from(*value),
        ));
    }

    object.put(DataElement::new(
        tags::PIXEL_DATA,
        VR::OB,
        PrimitiveValue::from(PIXEL_BYTES.to_vec()),
    ));

    let file = object
        .with_meta(FileMetaTableBuilder::new().transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN))
        .unwrap();
    file.write_to_file(path).unwrap();
    path.to_path_buf()
}

/// Write a typical CT file for study `uid`
pub fn write_study_file(path: &Path, uid: &str, patient: &str, study: &str, series: &str) -> PathBuf {
    write_dicom(
        path,
        &[
            (StudyField::StudyInstanceUid, uid),
            (StudyField::PatientName, patient),
            (StudyField::PatientId, "PID-001"),
            (StudyField::PatientBirthDate, "19800101"),
            (StudyField::PatientAge, "044Y"),
            (StudyField::PatientSex, "F"),
            (StudyField::AccessionNumber, "ACC42"),
            (StudyField::StudyDate, "20240101"),
            (StudyField::StudyDescription, study),
            (StudyField::SeriesDescription, series),
        ],
    )
}

/// Write a file that is clearly not DICOM
pub fn write_text(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
    path.to_path_buf()
}

/// Read the study attributes back from a test file
pub fn read_attributes(path: &Path) -> FileAttributes {
    extract(path).unwrap()
}

/// All regular files below `root`, relative to it, sorted
pub fn relative_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

/// All directories below `root` (root excluded)
pub fn subdirectories(root: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect()
}

/// Make `dir` read-only. Returns false when the current user can still
/// create entries in it (e.g. root), in which case the directory is restored.
#[cfg(unix)]
pub fn lock_dir(dir: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(dir, fs::Permissions::from_mode(0o555)).unwrap();
    let check = dir.join(".write-check");
    if fs::write(&check, b"").is_ok() {
        fs::remove_file(&check).unwrap();
        unlock_dir(dir);
        return false;
    }
    true
}

#[cfg(unix)]
pub fn unlock_dir(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).unwrap();
}
