use std::collections::BTreeMap;

use tracing::info;

use crate::error::ReconError;
use crate::model::{CartonRequest, CartonRow, NamePattern};
use crate::source::DataSource;

/// How many versions of each carton name to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionMode {
    /// Only the highest version id per name.
    Latest,
    /// Every version.
    All,
    /// Only the given version id, for every name.
    Single(i64),
}

impl VersionMode {
    /// Parse a mode name, pairing `single` with its version id.
    pub fn parse(mode: &str, unique_version: Option<i64>) -> Result<Self, ReconError> {
        match (mode, unique_version) {
            ("latest", _) => Ok(Self::Latest),
            ("all", _) => Ok(Self::All),
            ("single", Some(id)) => Ok(Self::Single(id)),
            ("single", None) => Err(ReconError::InvalidInput(
                "versions='single' requires a unique version id".into(),
            )),
            (other, _) => Err(ReconError::InvalidInput(format!(
                "'{other}' is not a valid versions option (expected latest, all or single)"
            ))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::All => "all",
            Self::Single(_) => "single",
        }
    }
}

/// Version mode plus per-carton overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub mode: VersionMode,
    /// Carton name → version id. Takes precedence over `mode`.
    pub forced_versions: BTreeMap<String, i64>,
}

impl SelectionPolicy {
    pub fn new(mode: VersionMode) -> Self {
        Self {
            mode,
            forced_versions: BTreeMap::new(),
        }
    }

    pub fn with_forced(mut self, forced_versions: BTreeMap<String, i64>) -> Self {
        self.forced_versions = forced_versions;
        self
    }
}

/// Keep, per carton name, the rows chosen by `policy`.
///
/// Names come out sorted; rows of one name keep their source order. Rows that
/// share a (name, version) pair are all kept. An empty selection is an error.
pub fn select_versions(rows: Vec<CartonRow>, policy: &SelectionPolicy) -> Result<Vec<CartonRow>, ReconError> {
    let mut by_name: BTreeMap<String, Vec<CartonRow>> = BTreeMap::new();
    for row in rows {
        by_name.entry(row.name.clone()).or_default().push(row);
    }

    let mut selected = Vec::new();
    for (name, rows) in by_name {
        let keep_version = if let Some(forced) = policy.forced_versions.get(&name) {
            Some(*forced)
        } else {
            match policy.mode {
                VersionMode::Single(id) => Some(id),
                VersionMode::All => None,
                VersionMode::Latest => rows.iter().map(|r| r.version_id).max(),
            }
        };

        match keep_version {
            Some(version) => selected.extend(rows.into_iter().filter(|r| r.version_id == version)),
            None => selected.extend(rows),
        }
    }

    if selected.is_empty() {
        return Err(ReconError::InvalidInput(
            "there are no carton/version pairs matching the selection criteria used".into(),
        ));
    }
    Ok(selected)
}

/// Select cartons straight from the catalog by name pattern and version policy.
pub fn select_cartons<S>(
    source: &S,
    pattern: &NamePattern,
    policy: &SelectionPolicy,
) -> Result<Vec<CartonRequest>, ReconError>
where
    S: DataSource + ?Sized,
{
    let rows = source.cartons_matching(pattern).map_err(ReconError::store)?;
    let candidates = rows.len();
    let selected = select_versions(rows, policy)?;

    info!(
        pattern = pattern.as_str(),
        versions = policy.mode.label(),
        forced = policy.forced_versions.len(),
        candidates,
        selected = selected.len(),
        "selected cartons from catalog"
    );

    Ok(selected
        .into_iter()
        .map(CartonRequest::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, version_id: i64) -> CartonRow {
        CartonRow {
            name: name.into(),
            plan: format!("plan{version_id}"),
            category: Some("science".into()),
            version_id,
            tag: format!("tag{version_id}"),
            program: None,
        }
    }

    fn sample() -> Vec<CartonRow> {
        vec![row("A", 1), row("A", 2), row("A", 3), row("B", 5)]
    }

    fn pairs(rows: &[CartonRow]) -> Vec<(&str, i64)> {
        rows.iter().map(|r| (r.name.as_str(), r.version_id)).collect()
    }

    #[test]
    fn latest_keeps_max_version() {
        let out = select_versions(sample(), &SelectionPolicy::new(VersionMode::Latest)).unwrap();
        assert_eq!(pairs(&out), vec![("A", 3), ("B", 5)]);
    }

    #[test]
    fn all_keeps_every_row() {
        let out = select_versions(sample(), &SelectionPolicy::new(VersionMode::All)).unwrap();
        assert_eq!(pairs(&out), vec![("A", 1), ("A", 2), ("A", 3), ("B", 5)]);
    }

    #[test]
    fn forced_overrides_mode() {
        let policy = SelectionPolicy::new(VersionMode::Latest)
            .with_forced(BTreeMap::from([("A".to_string(), 1)]));
        let out = select_versions(sample(), &policy).unwrap();
        assert_eq!(pairs(&out), vec![("A", 1), ("B", 5)]);
    }

    #[test]
    fn single_drops_names_without_that_version() {
        let out = select_versions(sample(), &SelectionPolicy::new(VersionMode::Single(5))).unwrap();
        assert_eq!(pairs(&out), vec![("B", 5)]);
    }

    #[test]
    fn ties_on_version_keep_every_category() {
        let mut rows = sample();
        let mut dup = row("B", 5);
        dup.category = Some("standard".into());
        rows.push(dup);
        let out = select_versions(rows, &SelectionPolicy::new(VersionMode::Latest)).unwrap();
        assert_eq!(pairs(&out), vec![("A", 3), ("B", 5), ("B", 5)]);
    }

    #[test]
    fn empty_selection_fails() {
        let err = select_versions(sample(), &SelectionPolicy::new(VersionMode::Single(42))).unwrap_err();
        assert!(err.is_input_error());
        let err = select_versions(Vec::new(), &SelectionPolicy::new(VersionMode::All)).unwrap_err();
        assert!(matches!(err, ReconError::InvalidInput(_)));
    }

    #[test]
    fn parse_modes() {
        assert_eq!(VersionMode::parse("latest", None).unwrap(), VersionMode::Latest);
        assert_eq!(VersionMode::parse("all", Some(3)).unwrap(), VersionMode::All);
        assert_eq!(VersionMode::parse("single", Some(3)).unwrap(), VersionMode::Single(3));
        assert!(VersionMode::parse("single", None).is_err());
        assert!(VersionMode::parse("unique", Some(3)).is_err());
    }
}
