//! Carton list and inventory report files.

use std::path::Path;

pub mod error;
pub mod list;
pub mod report;

pub use error::IoError;
pub use list::{read_carton_list, write_carton_list};
pub use report::{write_alternatives, ReportWriter};

/// Refuse to replace an existing file unless `overwrite` is set.
pub fn check_overwrite(path: &Path, overwrite: bool) -> Result<(), IoError> {
    if !overwrite && path.exists() {
        return Err(IoError::Exists(path.to_path_buf()));
    }
    Ok(())
}

pub(crate) fn delimiter_byte(delimiter: char) -> Result<u8, IoError> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(IoError::Delimiter(delimiter))
    }
}
