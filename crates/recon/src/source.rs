//! Read-only catalog access used by the engine.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::{CartonIdentity, CartonRow, NamePattern, TargetRow, VersionRef};

/// The five read-only queries the engine issues against a catalog store.
///
/// Implementations must return rows in a stable order (e.g. by primary key):
/// the engine takes the first identity row as the resolved one.
pub trait DataSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Carton identities whose name, plan and category label all match. A
    /// `None` category matches cartons without one.
    fn carton_identities(
        &self,
        carton: &str,
        plan: &str,
        category: Option<&str>,
    ) -> Result<Vec<CartonIdentity>, Self::Error>;

    /// Versions registered under `plan`.
    fn versions_for_plan(&self, plan: &str) -> Result<Vec<VersionRef>, Self::Error>;

    /// Targets of the carton version `(carton, plan, tag)`, left-joined to
    /// cadence, instrument and magnitude data.
    fn target_rows(&self, carton: &str, plan: &str, tag: &str) -> Result<Vec<TargetRow>, Self::Error>;

    /// Every version/category of cartons named exactly `carton`.
    fn cartons_named(&self, carton: &str) -> Result<Vec<CartonRow>, Self::Error>;

    /// Every version/category of cartons whose name matches `pattern`.
    fn cartons_matching(&self, pattern: &NamePattern) -> Result<Vec<CartonRow>, Self::Error>;
}

impl<S: DataSource + ?Sized> DataSource for &S {
    type Error = S::Error;

    fn carton_identities(
        &self,
        carton: &str,
        plan: &str,
        category: Option<&str>,
    ) -> Result<Vec<CartonIdentity>, Self::Error> {
        (**self).carton_identities(carton, plan, category)
    }

    fn versions_for_plan(&self, plan: &str) -> Result<Vec<VersionRef>, Self::Error> {
        (**self).versions_for_plan(plan)
    }

    fn target_rows(&self, carton: &str, plan: &str, tag: &str) -> Result<Vec<TargetRow>, Self::Error> {
        (**self).target_rows(carton, plan, tag)
    }

    fn cartons_named(&self, carton: &str) -> Result<Vec<CartonRow>, Self::Error> {
        (**self).cartons_named(carton)
    }

    fn cartons_matching(&self, pattern: &NamePattern) -> Result<Vec<CartonRow>, Self::Error> {
        (**self).cartons_matching(pattern)
    }
}

// ---------------------------------------------------------------------------
// In-memory catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
#[error("in-memory catalog unavailable: {0}")]
pub struct MemoryError(pub String);

#[derive(Debug, Clone)]
struct VersionEntry {
    pk: i64,
    plan: String,
    tag: String,
}

/// Carton definition for [`MemorySource::add_carton`].
#[derive(Debug, Clone, Default)]
pub struct CartonEntry {
    pub name: String,
    pub version_id: i64,
    pub category: Option<String>,
    pub category_id: Option<i64>,
    pub mapper_label: Option<String>,
    pub mapper_id: Option<i64>,
    pub program: Option<String>,
}

/// Catalog snapshot held in memory, keyed the same way as the relational store.
#[derive(Debug, Default)]
pub struct MemorySource {
    versions: Vec<VersionEntry>,
    cartons: BTreeMap<i64, CartonEntry>,
    targets: Vec<(i64, TargetRow)>,
    failure: Option<String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a version and return its primary key.
    pub fn add_version(&mut self, plan: impl Into<String>, tag: impl Into<String>) -> i64 {
        let pk = self.versions.iter().map(|v| v.pk).max().unwrap_or(0) + 1;
        self.add_version_with_id(pk, plan, tag)
    }

    pub fn add_version_with_id(&mut self, pk: i64, plan: impl Into<String>, tag: impl Into<String>) -> i64 {
        self.versions.push(VersionEntry {
            pk,
            plan: plan.into(),
            tag: tag.into(),
        });
        pk
    }

    /// Register a carton and return its primary key.
    pub fn add_carton(&mut self, entry: CartonEntry) -> i64 {
        let pk = self.cartons.keys().next_back().copied().unwrap_or(0) + 1;
        self.cartons.insert(pk, entry);
        pk
    }

    pub fn add_target(&mut self, carton_pk: i64, row: TargetRow) {
        self.targets.push((carton_pk, row));
    }

    /// Make every subsequent query fail with `message`.
    pub fn fail_queries(&mut self, message: impl Into<String>) {
        self.failure = Some(message.into());
    }

    fn check(&self) -> Result<(), MemoryError> {
        match &self.failure {
            Some(msg) => Err(MemoryError(msg.clone())),
            None => Ok(()),
        }
    }

    fn version(&self, pk: i64) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.pk == pk)
    }

    fn carton_rows<'a>(&'a self, keep: impl Fn(&CartonEntry) -> bool + 'a) -> Vec<CartonRow> {
        self.cartons
            .values()
            .filter(|c| keep(c))
            .filter_map(|c| {
                let version = self.version(c.version_id)?;
                Some(CartonRow {
                    name: c.name.clone(),
                    plan: version.plan.clone(),
                    category: c.category.clone(),
                    version_id: version.pk,
                    tag: version.tag.clone(),
                    program: c.program.clone(),
                })
            })
            .collect()
    }
}

impl DataSource for MemorySource {
    type Error = MemoryError;

    fn carton_identities(
        &self,
        carton: &str,
        plan: &str,
        category: Option<&str>,
    ) -> Result<Vec<CartonIdentity>, Self::Error> {
        self.check()?;
        Ok(self
            .cartons
            .values()
            .filter(|c| c.name == carton && c.category.as_deref() == category)
            .filter_map(|c| {
                let version = self.version(c.version_id).filter(|v| v.plan == plan)?;
                Some(CartonIdentity {
                    mapper_label: c.mapper_label.clone(),
                    program: c.program.clone(),
                    version_id: version.pk,
                    tag: version.tag.clone(),
                    mapper_id: c.mapper_id,
                    category_id: c.category_id,
                })
            })
            .collect())
    }

    fn versions_for_plan(&self, plan: &str) -> Result<Vec<VersionRef>, Self::Error> {
        self.check()?;
        Ok(self
            .versions
            .iter()
            .filter(|v| v.plan == plan)
            .map(|v| VersionRef {
                version_id: v.pk,
                tag: v.tag.clone(),
            })
            .collect())
    }

    fn target_rows(&self, carton: &str, plan: &str, tag: &str) -> Result<Vec<TargetRow>, Self::Error> {
        self.check()?;
        let carton_pks: Vec<i64> = self
            .cartons
            .iter()
            .filter(|(_, c)| c.name == carton)
            .filter(|(_, c)| {
                self.version(c.version_id)
                    .is_some_and(|v| v.plan == plan && v.tag == tag)
            })
            .map(|(pk, _)| *pk)
            .collect();

        Ok(self
            .targets
            .iter()
            .filter(|(pk, _)| carton_pks.contains(pk))
            .map(|(_, row)| row.clone())
            .collect())
    }

    fn cartons_named(&self, carton: &str) -> Result<Vec<CartonRow>, Self::Error> {
        self.check()?;
        Ok(self.carton_rows(|c| c.name == carton))
    }

    fn cartons_matching(&self, pattern: &NamePattern) -> Result<Vec<CartonRow>, Self::Error> {
        self.check()?;
        Ok(self.carton_rows(|c| pattern.matches(&c.name)))
    }
}
