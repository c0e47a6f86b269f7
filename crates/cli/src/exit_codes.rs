//! CLI Exit Code Registry
//!
//! Single source of truth for the exit codes of `cartons-inventory`. Batch
//! scripts branch on them, so existing values must not change.
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success                                               |
//! | 1    | General error (unspecified)                           |
//! | 2    | Usage / input validation (bad args, missing list, existing output) |
//! | 3    | Catalog store failure (missing database, query error) |
//! | 4    | File IO failure (log, list or report files)           |
//! | 5    | Precondition violation (operation on unresolved carton) |
//! | 6    | `check`: at least one carton is missing from the catalog |

use cartons_io::IoError;
use cartons_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, invalid parameter combination, unreadable
/// configuration, refusing to overwrite.
pub const EXIT_USAGE: u8 = 2;

/// The catalog database could not be opened or queried.
pub const EXIT_STORE: u8 = 3;

/// Reading or writing a list, report or log file failed.
pub const EXIT_IO: u8 = 4;

/// An operation was attempted on a record that does not allow it.
pub const EXIT_PRECONDITION: u8 = 5;

/// `check` found cartons absent from the catalog. Like `diff(1)`, the
/// command itself succeeded.
pub const EXIT_CARTONS_MISSING: u8 = 6;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    if err.is_input_error() {
        return EXIT_USAGE;
    }
    match err {
        ReconError::Store(_) => EXIT_STORE,
        _ => EXIT_PRECONDITION,
    }
}

/// Map a file error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Exists(_) | IoError::ShortRow { .. } | IoError::Delimiter(_) => EXIT_USAGE,
        IoError::Open { .. } | IoError::Csv(_) | IoError::Io(_) => EXIT_IO,
    }
}
