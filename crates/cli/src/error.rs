use cartons_io::IoError;
use cartons_recon::ReconError;
use cartons_store::StoreError;

use crate::exit_codes::{io_exit_code, recon_exit_code, EXIT_ERROR, EXIT_IO, EXIT_STORE, EXIT_USAGE};

/// Error carried up to `main`: exit code, message and an optional hint line.
#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        Self::new(recon_exit_code(&err), err.to_string())
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        let hint = matches!(err, IoError::Exists(_)).then(|| "pass --overwrite to replace it".to_string());
        Self { code: io_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        let hint = matches!(err, StoreError::Missing(_)).then(|| "set --db or CARTONS_DB".to_string());
        Self { code: EXIT_STORE, message: err.to_string(), hint }
    }
}
