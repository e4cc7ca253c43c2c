use std::path::Path;

use log::{info, warn};
use matrw::{MatFile, MatVariable};

use crate::export::matfile;

pub const RECORD_NAME: &str = "data";
pub const REQUIRED_FIELDS: [&str; 4] = ["conductance", "time", "timeoff", "samplingrate"];

/// Presence of one required field in the written record.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldCheck {
    pub name: &'static str,
    /// Shape for vectors, value for scalars; `None` when the field is missing.
    pub detail: Option<String>,
}

impl FieldCheck {
    pub fn is_present(&self) -> bool {
        self.detail.is_some()
    }
}

/// Outcome of reading the MAT file back. Purely diagnostic: the file is on
/// disk whatever this says.
#[derive(Clone, Debug, PartialEq)]
pub enum VerificationReport {
    Checked { fields: Vec<FieldCheck> },
    MissingRecord { available: Vec<String> },
    Unreadable(String),
}

impl VerificationReport {
    pub fn is_complete(&self) -> bool {
        match self {
            VerificationReport::Checked { fields } => fields.iter().all(FieldCheck::is_present),
            _ => false,
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        match self {
            VerificationReport::Checked { fields } => fields
                .iter()
                .filter(|f| !f.is_present())
                .map(|f| f.name)
                .collect(),
            _ => REQUIRED_FIELDS.to_vec(),
        }
    }

    pub fn log(&self) {
        match self {
            VerificationReport::Checked { fields } => {
                info!("  '{RECORD_NAME}' struct present");
                for field in fields {
                    match &field.detail {
                        Some(detail) => info!("  '{}': {detail}", field.name),
                        None => warn!("  missing field '{}'", field.name),
                    }
                }
            }
            VerificationReport::MissingRecord { available } => {
                warn!("  '{RECORD_NAME}' variable not found; file holds {available:?}");
            }
            VerificationReport::Unreadable(reason) => warn!("  could not verify file: {reason}"),
        }
    }
}

pub fn verify_structured(path: &Path) -> VerificationReport {
    match matfile::load(path) {
        Ok(file) => check_variables(&file),
        Err(e) => VerificationReport::Unreadable(e.to_string()),
    }
}

pub fn check_variables(file: &MatFile) -> VerificationReport {
    let Some(record) = matfile::variable(file, RECORD_NAME).filter(|v| matfile::is_record(v)) else {
        return VerificationReport::MissingRecord {
            available: matfile::variable_names(file),
        };
    };
    let fields = REQUIRED_FIELDS
        .iter()
        .map(|&name| FieldCheck {
            name,
            detail: matfile::field(record, name).map(describe),
        })
        .collect();
    VerificationReport::Checked { fields }
}

fn describe(value: &MatVariable) -> String {
    if let Some(scalar) = matfile::as_scalar(value) {
        return format!("{scalar}");
    }
    let dims: Vec<String> = matfile::dims(value).iter().map(|d| d.to_string()).collect();
    format!("shape=({}), dtype=float64", dims.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::matfile::{column, scalar};
    use matrw::matvar;

    fn file_with(name: &str, value: MatVariable) -> MatFile {
        let mut file = MatFile::new();
        file.insert(name, value);
        file
    }

    #[test]
    fn reports_shapes_and_scalars() {
        let series = column(&[0.0; 4]);
        let stamps = column(&[0.0; 4]);
        let offset = scalar(0.0);
        let rate = scalar(12.5);
        let record = matvar!({
            conductance: series,
            time: stamps,
            timeoff: offset,
            samplingrate: rate,
        });
        let report = check_variables(&file_with("data", record));
        assert!(report.is_complete());
        let VerificationReport::Checked { fields } = &report else {
            panic!("expected checked report");
        };
        assert_eq!(fields[0].detail.as_deref(), Some("shape=(4, 1), dtype=float64"));
        assert_eq!(fields[3].detail.as_deref(), Some("12.5"));
    }

    #[test]
    fn flags_missing_fields_and_records() {
        let stamps = scalar(0.0);
        let record = matvar!({ time: stamps });
        let report = check_variables(&file_with("data", record));
        assert!(!report.is_complete());
        assert_eq!(report.missing_fields(), vec!["conductance", "timeoff", "samplingrate"]);

        let report = check_variables(&file_with("gsr", scalar(1.0)));
        assert_eq!(
            report,
            VerificationReport::MissingRecord {
                available: vec!["gsr".into()]
            }
        );
    }

    #[test]
    fn unreadable_file_is_a_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mat");
        std::fs::write(&path, b"not a mat file").unwrap();
        assert!(matches!(
            verify_structured(&path),
            VerificationReport::Unreadable(_)
        ));
    }
}
