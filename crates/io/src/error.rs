use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("{} already exists and overwrite is off", .0.display())]
    Exists(PathBuf),

    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: line {line} has {fields} fields, expected at least {expected}", .path.display())]
    ShortRow {
        path: PathBuf,
        line: u64,
        fields: usize,
        expected: usize,
    },

    #[error("invalid delimiter '{0}': must be a single ASCII character")]
    Delimiter(char),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
