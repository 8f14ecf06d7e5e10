use dicom::core::{Tag, VR};
use dicom::dictionary_std::tags;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Private tag (1351,1001) holding the report template name
pub const REPORT_TEMPLATE_TAG: Tag = Tag(0x1351, 0x1001);

/// DICOM attributes read or written by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudyField {
    StudyInstanceUid,
    PatientName,
    PatientId,
    PatientBirthDate,
    PatientAge,
    PatientSex,
    AccessionNumber,
    StudyDate,
    StudyDescription,
    SeriesDescription,
    ReportTemplateName,
}

impl StudyField {
    /// Every field extracted from a file
    pub const ALL: [StudyField; 11] = [
        Self::StudyInstanceUid,
        Self::PatientName,
        Self::PatientId,
        Self::PatientBirthDate,
        Self::PatientAge,
        Self::PatientSex,
        Self::AccessionNumber,
        Self::StudyDate,
        Self::StudyDescription,
        Self::SeriesDescription,
        Self::ReportTemplateName,
    ];

    /// Fields written back to files when the registry is edited.
    /// ReportTemplateName lives only in the registry.
    pub const UPDATABLE: [StudyField; 8] = [
        Self::PatientName,
        Self::PatientId,
        Self::PatientBirthDate,
        Self::PatientAge,
        Self::PatientSex,
        Self::AccessionNumber,
        Self::StudyDate,
        Self::StudyDescription,
    ];

    /// DICOM keyword, also used as the registry column name
    pub fn keyword(self) -> &'static str {
        match self {
            Self::StudyInstanceUid => "StudyInstanceUID",
            Self::PatientName => "PatientName",
            Self::PatientId => "PatientID",
            Self::PatientBirthDate => "PatientBirthDate",
            Self::PatientAge => "PatientAge",
            Self::PatientSex => "PatientSex",
            Self::AccessionNumber => "AccessionNumber",
            Self::StudyDate => "StudyDate",
            Self::StudyDescription => "StudyDescription",
            Self::SeriesDescription => "SeriesDescription",
            Self::ReportTemplateName => "ReportTemplateName",
        }
    }

    pub fn tag(self) -> Tag {
        match self {
            Self::StudyInstanceUid => tags::STUDY_INSTANCE_UID,
            Self::PatientName => tags::PATIENT_NAME,
            Self::PatientId => tags::PATIENT_ID,
            Self::PatientBirthDate => tags::PATIENT_BIRTH_DATE,
            Self::PatientAge => tags::PATIENT_AGE,
            Self::PatientSex => tags::PATIENT_SEX,
            Self::AccessionNumber => tags::ACCESSION_NUMBER,
            Self::StudyDate => tags::STUDY_DATE,
            Self::StudyDescription => tags::STUDY_DESCRIPTION,
            Self::SeriesDescription => tags::SERIES_DESCRIPTION,
            Self::ReportTemplateName => REPORT_TEMPLATE_TAG,
        }
    }

    /// Value representation used when writing the attribute
    pub fn vr(self) -> VR {
        match self {
            Self::StudyInstanceUid => VR::UI,
            Self::PatientName => VR::PN,
            Self::PatientId => VR::LO,
            Self::PatientBirthDate | Self::StudyDate => VR::DA,
            Self::PatientAge => VR::AS,
            Self::PatientSex => VR::CS,
            Self::AccessionNumber => VR::SH,
            Self::StudyDescription | Self::SeriesDescription => VR::LO,
            Self::ReportTemplateName => VR::LO,
        }
    }
}

impl fmt::Display for StudyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Attributes read from a single DICOM file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAttributes {
    values: HashMap<StudyField, String>,
}

impl FileAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `field`, or an empty string when the file lacks it
    pub fn get(&self, field: StudyField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: StudyField, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn with(mut self, field: StudyField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// StudyInstanceUID, if present and non-empty
    pub fn study_uid(&self) -> Option<&str> {
        Some(self.get(StudyField::StudyInstanceUid)).filter(|uid| !uid.is_empty())
    }
}

/// One row of the study registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyRecord {
    #[serde(rename = "PatientName")]
    pub patient_name: String,
    #[serde(rename = "PatientID")]
    pub patient_id: String,
    #[serde(rename = "PatientBirthDate")]
    pub patient_birth_date: String,
    #[serde(rename = "PatientAge")]
    pub patient_age: String,
    #[serde(rename = "PatientSex")]
    pub patient_sex: String,
    #[serde(rename = "AccessionNumber")]
    pub accession_number: String,
    #[serde(rename = "StudyDate")]
    pub study_date: String,
    #[serde(rename = "StudyDescription")]
    pub study_description: String,
    #[serde(rename = "StudyInstanceUID")]
    pub study_instance_uid: String,
    #[serde(rename = "ReportTemplateName")]
    pub report_template_name: String,
}

impl StudyRecord {
    /// Build a record from the attributes of the first file seen for a study
    pub fn from_attributes(attributes: &FileAttributes) -> Self {
        Self {
            patient_name: attributes.get(StudyField::PatientName).to_string(),
            patient_id: attributes.get(StudyField::PatientId).to_string(),
            patient_birth_date: attributes.get(StudyField::PatientBirthDate).to_string(),
            patient_age: attributes.get(StudyField::PatientAge).to_string(),
            patient_sex: attributes.get(StudyField::PatientSex).to_string(),
            accession_number: attributes.get(StudyField::AccessionNumber).to_string(),
            study_date: attributes.get(StudyField::StudyDate).to_string(),
            study_description: attributes.get(StudyField::StudyDescription).to_string(),
            study_instance_uid: attributes.get(StudyField::StudyInstanceUid).to_string(),
            report_template_name: attributes.get(StudyField::ReportTemplateName).to_string(),
        }
    }

    /// Registry value for a study-level field; series fields have none
    pub fn get(&self, field: StudyField) -> &str {
        match field {
            StudyField::StudyInstanceUid => &self.study_instance_uid,
            StudyField::PatientName => &self.patient_name,
            StudyField::PatientId => &self.patient_id,
            StudyField::PatientBirthDate => &self.patient_birth_date,
            StudyField::PatientAge => &self.patient_age,
            StudyField::PatientSex => &self.patient_sex,
            StudyField::AccessionNumber => &self.accession_number,
            StudyField::StudyDate => &self.study_date,
            StudyField::StudyDescription => &self.study_description,
            StudyField::ReportTemplateName => &self.report_template_name,
            StudyField::SeriesDescription => "",
        }
    }

    /// Trim surrounding whitespace from every value
    pub fn trimmed(self) -> Self {
        fn t(value: String) -> String {
            value.trim().to_string()
        }
        Self {
            patient_name: t(self.patient_name),
            patient_id: t(self.patient_id),
            patient_birth_date: t(self.patient_birth_date),
            patient_age: t(self.patient_age),
            patient_sex: t(self.patient_sex),
            accession_number: t(self.accession_number),
            study_date: t(self.study_date),
            study_description: t(self.study_description),
            study_instance_uid: t(self.study_instance_uid),
            report_template_name: t(self.report_template_name),
        }
    }
}

/// Counters reported at the end of a batch operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files or directories examined
    pub processed: usize,

    /// Items changed (files rewritten, files moved or directories removed)
    pub updated: usize,

    /// Items left alone (not DICOM, no matching study, already in place)
    pub skipped: usize,

    /// Items whose change was attempted but failed
    pub failed: usize,
}

impl RunSummary {
    pub fn merge(&mut self, other: RunSummary) {
        self.processed += other.processed;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} updated, {} skipped, {} failed",
            self.processed, self.updated, self.skipped, self.failed
        )
    }
}

/// Result of a reorganisation: file moves, then the empty-directory sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReorganizeSummary {
    pub files: RunSummary,

    /// `None` when emptied directories were kept
    pub directories: Option<RunSummary>,
}

impl fmt::Display for ReorganizeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "files: {}", self.files)?;
        match &self.directories {
            Some(dirs) => write!(f, "; {} empty directories removed", dirs.updated)?,
            None => write!(f, "; empty directories kept")?,
        }
        if let Some(dirs) = self.directories.filter(|dirs| dirs.failed > 0) {
            write!(f, " ({} could not be removed)", dirs.failed)?;
        }
        Ok(())
    }
}
