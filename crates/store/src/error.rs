use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog database not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("cannot open catalog database {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("catalog query failed: {0}")]
    Query(#[from] rusqlite::Error),
}
