//! MAT-file persistence through `matrw`.
//!
//! Everything that touches the `matrw` types lives here; the rest of the
//! export code asks for variables, fields, dims and scalars by name.
use std::path::Path;

use matrw::{load_matfile, matvar, save_matfile_v7, MatFile, MatVariable, MatlabType, NumericArray};

use crate::drivers::MatError;

/// Writes `value` as the only variable `name`, uncompressed so Ledalab's
/// loader and older MATLAB releases read it without zlib.
pub fn save(path: &Path, name: &str, value: MatVariable) -> Result<(), MatError> {
    let mut file = MatFile::new();
    file.insert(name, value);
    let path = path
        .to_str()
        .ok_or_else(|| MatError::Write(format!("{} is not valid UTF-8", path.display())))?;
    save_matfile_v7(path, file, false).map_err(|e| MatError::Write(e.to_string()))
}

pub fn load(path: &Path) -> Result<MatFile, MatError> {
    if !path.is_file() {
        return Err(MatError::Read(format!("{} is not a file", path.display())));
    }
    let path = path
        .to_str()
        .ok_or_else(|| MatError::Read(format!("{} is not valid UTF-8", path.display())))?;
    load_matfile(path).map_err(|e| MatError::Read(e.to_string()))
}

/// n×1 double column vector.
pub fn column(values: &[f64]) -> MatVariable {
    MatVariable::NumericArray(
        NumericArray::new(vec![values.len(), 1], MatlabType::from(values.to_vec()), None)
            .expect("dims match value count"),
    )
}

pub fn scalar(value: f64) -> MatVariable {
    matvar!(value)
}

pub fn variable<'a>(file: &'a MatFile, name: &str) -> Option<&'a MatVariable> {
    file.contains(name).then(|| &file[name])
}

pub fn variable_names(file: &MatFile) -> Vec<String> {
    file.iter().map(|(name, _)| name.clone()).collect()
}

pub fn field<'a>(record: &'a MatVariable, name: &str) -> Option<&'a MatVariable> {
    match record {
        MatVariable::Structure(fields) => fields.get(name),
        _ => None,
    }
}

pub fn is_record(value: &MatVariable) -> bool {
    matches!(value, MatVariable::Structure(_))
}

pub fn dims(value: &MatVariable) -> Vec<usize> {
    value.dim()
}

/// The value of a 1×1 numeric variable.
pub fn as_scalar(value: &MatVariable) -> Option<f64> {
    if dims(value).iter().product::<usize>() != 1 {
        return None;
    }
    value.to_f64()
}
