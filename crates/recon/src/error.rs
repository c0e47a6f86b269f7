use thiserror::Error;

/// Boxed error from a [`crate::source::DataSource`] implementation.
pub type StoreFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ReconError {
    /// Target fetch or aggregation attempted on a carton that was not found.
    #[error("carton '{carton}' (plan '{plan}', category '{category}') is not resolvable: {reason}")]
    NotResolvable {
        carton: String,
        plan: String,
        category: String,
        reason: &'static str,
    },
    /// A report row was requested before the matching computation ran.
    #[error("carton '{carton}' (plan '{plan}', category '{category}'): {what} not computed")]
    NotComputed {
        carton: String,
        plan: String,
        category: String,
        what: &'static str,
    },
    /// Invalid combination of selection / orchestration parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (unknown range attribute, duplicated band, ...).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Band and system label lists passed to the outlier classifier differ in length.
    #[error("{bands} band(s) but {systems} photometric system label(s)")]
    BandSystemMismatch { bands: usize, systems: usize },
    /// The data source failed; the original error is kept as the source.
    #[error("store query failed: {0}")]
    Store(#[source] StoreFailure),
}

impl ReconError {
    pub(crate) fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(err))
    }

    /// True for the errors that come from the caller's parameters rather than
    /// from the catalog or a programming mistake.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::ConfigParse(_) | Self::ConfigValidation(_)
        )
    }
}
