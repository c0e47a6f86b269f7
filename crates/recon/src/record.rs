use tracing::{debug, warn};

use crate::config::InventoryConfig;
use crate::error::ReconError;
use crate::model::{
    Band, CartonIdentity, CartonRequest, Computation, OutlierSet, Summaries, TargetRow, VersionRef,
};
use crate::outliers::check_mag_outliers;
use crate::source::DataSource;

/// Which target-dependent computations [`CartonRecord::assign_target_info`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetInfo {
    pub sets: bool,
    pub outliers: bool,
}

impl Default for TargetInfo {
    fn default() -> Self {
        Self {
            sets: true,
            outliers: false,
        }
    }
}

/// Per-step outcome of [`CartonRecord::assign_target_info`]; `None` = not requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignReport {
    pub sets: Option<Computation>,
    pub outliers: Option<Computation>,
    /// Number of target rows fetched, if a fetch was needed.
    pub targets: Option<usize>,
}

/// A requested carton together with what the catalog knows about it.
#[derive(Debug, Clone)]
pub struct CartonRecord {
    request: CartonRequest,
    identity: Option<CartonIdentity>,
    /// Version looked up by plan alone when the carton itself was not found.
    fallback_version: Option<VersionRef>,
    summaries: Option<Summaries>,
    outliers: Option<Option<OutlierSet>>,
}

impl CartonRecord {
    /// Resolve `request` against the catalog.
    ///
    /// The first identity row wins. When nothing matches, the plan's version is
    /// looked up to keep a best-effort tag / version id for reporting.
    pub fn resolve<S>(source: &S, request: CartonRequest) -> Result<Self, ReconError>
    where
        S: DataSource + ?Sized,
    {
        let identity = source
            .carton_identities(&request.name, &request.plan, request.category.as_deref())
            .map_err(ReconError::store)?
            .into_iter()
            .next();

        let fallback_version = if identity.is_none() {
            let version = source
                .versions_for_plan(&request.plan)
                .map_err(ReconError::store)?
                .into_iter()
                .next();
            debug!(
                carton = %request.name,
                plan = %request.plan,
                category = %request.category_label(),
                version_id = ?version.as_ref().map(|v| v.version_id),
                "carton not found in catalog"
            );
            version
        } else {
            None
        };

        Ok(Self {
            request,
            identity,
            fallback_version,
            summaries: None,
            outliers: None,
        })
    }

    pub fn request(&self) -> &CartonRequest {
        &self.request
    }

    /// True when the exact (name, plan, category) triple exists in the catalog.
    pub fn found(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&CartonIdentity> {
        self.identity.as_ref()
    }

    /// Resolved tag, or the plan's tag when the carton was not found.
    pub fn tag(&self) -> Option<&str> {
        match (&self.identity, &self.fallback_version) {
            (Some(identity), _) => Some(identity.tag.as_str()),
            (None, Some(version)) => Some(version.tag.as_str()),
            (None, None) => None,
        }
    }

    /// Resolved version id, or the plan's version id when the carton was not found.
    pub fn version_id(&self) -> Option<i64> {
        self.identity
            .as_ref()
            .map(|i| i.version_id)
            .or_else(|| self.fallback_version.as_ref().map(|v| v.version_id))
    }

    pub fn summaries(&self) -> Option<&Summaries> {
        self.summaries.as_ref()
    }

    pub fn sets_computed(&self) -> bool {
        self.summaries.is_some()
    }

    /// Outlier tags, `None` when not computed or when nothing was flagged.
    pub fn outliers(&self) -> Option<&OutlierSet> {
        self.outliers.as_ref().and_then(Option::as_ref)
    }

    pub fn outliers_computed(&self) -> bool {
        self.outliers.is_some()
    }

    fn not_resolvable(&self, reason: &'static str) -> ReconError {
        ReconError::NotResolvable {
            carton: self.request.name.clone(),
            plan: self.request.plan.clone(),
            category: self.request.category_label().to_string(),
            reason,
        }
    }

    /// Fetch this carton version's targets by `(name, plan, tag)`.
    pub fn fetch_targets<S>(&self, source: &S) -> Result<Vec<TargetRow>, ReconError>
    where
        S: DataSource + ?Sized,
    {
        let identity = self
            .identity
            .as_ref()
            .ok_or_else(|| self.not_resolvable("cannot fetch targets of a carton missing from the catalog"))?;

        source
            .target_rows(&self.request.name, &self.request.plan, &identity.tag)
            .map_err(ReconError::store)
    }

    /// Summarize `rows` into unique-value sets. Runs at most once per record.
    pub fn compute_summaries(&mut self, rows: &[TargetRow]) -> Result<Computation, ReconError> {
        if !self.found() {
            return Err(self.not_resolvable("cannot summarize a carton missing from the catalog"));
        }
        if self.summaries.is_some() {
            warn!(carton = %self.request.name, "sets already calculated for this carton");
            return Ok(Computation::AlreadyComputed);
        }
        self.summaries = Some(Summaries::from_rows(rows));
        Ok(Computation::Computed)
    }

    /// Classify magnitude outliers in `rows`. Runs at most once per record.
    pub fn compute_outliers(
        &mut self,
        rows: &[TargetRow],
        bands: &[Band],
        systems: &[String],
    ) -> Result<Computation, ReconError> {
        if !self.found() {
            return Err(self.not_resolvable("cannot classify magnitudes of a carton missing from the catalog"));
        }
        if self.outliers.is_some() {
            warn!(carton = %self.request.name, "magnitude outliers already calculated for this carton");
            return Ok(Computation::AlreadyComputed);
        }
        self.outliers = Some(check_mag_outliers(rows, bands, systems)?);
        Ok(Computation::Computed)
    }

    /// Fetch targets once and run the requested computations on them.
    pub fn assign_target_info<S>(
        &mut self,
        source: &S,
        config: &InventoryConfig,
        info: TargetInfo,
    ) -> Result<AssignReport, ReconError>
    where
        S: DataSource + ?Sized,
    {
        if !self.found() {
            return Err(self.not_resolvable("cannot assign target info to a carton missing from the catalog"));
        }

        let need_sets = info.sets && !self.sets_computed();
        let need_outliers = info.outliers && !self.outliers_computed();

        let mut report = AssignReport::default();
        let rows = if need_sets || need_outliers {
            let rows = self.fetch_targets(source)?;
            report.targets = Some(rows.len());
            rows
        } else {
            Vec::new()
        };

        if info.sets {
            report.sets = Some(self.compute_summaries(&rows)?);
        }
        if info.outliers {
            let (bands, systems) = config.band_systems();
            report.outliers = Some(self.compute_outliers(&rows, &bands, &systems)?);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CartonEntry, MemorySource};

    fn catalog() -> MemorySource {
        let mut source = MemorySource::new();
        let v = source.add_version_with_id(83, "0.5.0", "0.5.2");
        source.add_version_with_id(90, "1.0.0", "1.0.1");
        let pk = source.add_carton(CartonEntry {
            name: "bhm_rm_core".into(),
            version_id: v,
            category: Some("science".into()),
            category_id: Some(0),
            mapper_label: Some("BHM".into()),
            mapper_id: Some(1),
            program: Some("bhm_rm".into()),
        });
        let mut row = TargetRow {
            cadence_label: Some("dark_174x8".into()),
            priority: Some(1000),
            value: Some(1.0),
            ..TargetRow::default()
        };
        row.magnitudes.g = Some(-9999.0);
        source.add_target(pk, row.clone());
        row.priority = Some(1010);
        source.add_target(pk, row);
        source
    }

    #[test]
    fn resolve_copies_identity() {
        let source = catalog();
        let record =
            CartonRecord::resolve(&source, CartonRequest::new("bhm_rm_core", "0.5.0", "science")).unwrap();
        assert!(record.found());
        let identity = record.identity().unwrap();
        assert_eq!(identity.mapper_label.as_deref(), Some("BHM"));
        assert_eq!(identity.program.as_deref(), Some("bhm_rm"));
        assert_eq!(identity.version_id, 83);
        assert_eq!(identity.tag, "0.5.2");
        assert_eq!(identity.mapper_id, Some(1));
        assert_eq!(identity.category_id, Some(0));
    }

    #[test]
    fn first_matching_row_wins() {
        let mut source = catalog();
        source.add_carton(CartonEntry {
            name: "bhm_rm_core".into(),
            version_id: 83,
            category: Some("science".into()),
            category_id: Some(7),
            mapper_label: Some("MWM".into()),
            mapper_id: Some(0),
            program: Some("bhm_rm_dup".into()),
        });
        assert_eq!(
            source.carton_identities("bhm_rm_core", "0.5.0", Some("science")).unwrap().len(),
            2
        );

        let record =
            CartonRecord::resolve(&source, CartonRequest::new("bhm_rm_core", "0.5.0", "science")).unwrap();
        let identity = record.identity().unwrap();
        assert_eq!(identity.mapper_label.as_deref(), Some("BHM"));
        assert_eq!(identity.program.as_deref(), Some("bhm_rm"));
        assert_eq!(identity.mapper_id, Some(1));
        assert_eq!(identity.category_id, Some(0));
    }

    #[test]
    fn uncategorized_carton_resolves_from_selection() {
        let mut source = catalog();
        source.add_carton(CartonEntry {
            name: "ops_sky_boss".into(),
            version_id: 90,
            ..CartonEntry::default()
        });

        let rows = source.cartons_named("ops_sky_boss").unwrap();
        let request = CartonRequest::from(rows[0].clone());
        assert_eq!(request.category, None);
        assert_eq!(request.category_label(), "None");

        let record = CartonRecord::resolve(&source, request).unwrap();
        assert!(record.found());
        assert_eq!(record.version_id(), Some(90));

        let labelled =
            CartonRecord::resolve(&source, CartonRequest::new("ops_sky_boss", "1.0.0", "None")).unwrap();
        assert!(!labelled.found());
    }

    #[test]
    fn missing_carton_keeps_plan_version() {
        let source = catalog();
        let record =
            CartonRecord::resolve(&source, CartonRequest::new("bhm_rm_core", "1.0.0", "science")).unwrap();
        assert!(!record.found());
        assert!(record.identity().is_none());
        assert_eq!(record.tag(), Some("1.0.1"));
        assert_eq!(record.version_id(), Some(90));
    }

    #[test]
    fn missing_plan_leaves_version_absent() {
        let source = catalog();
        let record =
            CartonRecord::resolve(&source, CartonRequest::new("bhm_rm_core", "9.9.9", "science")).unwrap();
        assert!(!record.found());
        assert_eq!(record.tag(), None);
        assert_eq!(record.version_id(), None);
    }

    #[test]
    fn fetch_targets_declines_missing_carton() {
        let source = catalog();
        let record =
            CartonRecord::resolve(&source, CartonRequest::new("bhm_rm_core", "1.0.0", "science")).unwrap();
        let err = record.fetch_targets(&source).unwrap_err();
        assert!(matches!(err, ReconError::NotResolvable { .. }));
    }

    #[test]
    fn assign_target_info_is_idempotent() {
        let source = catalog();
        let mut record =
            CartonRecord::resolve(&source, CartonRequest::new("bhm_rm_core", "0.5.0", "science")).unwrap();
        let info = TargetInfo { sets: true, outliers: true };
        let config = InventoryConfig::default();

        let first = record.assign_target_info(&source, &config, info).unwrap();
        assert_eq!(first.sets, Some(Computation::Computed));
        assert_eq!(first.outliers, Some(Computation::Computed));
        assert_eq!(first.targets, Some(2));
        let summaries = record.summaries().cloned().unwrap();
        let outliers = record.outliers().cloned().unwrap();
        assert!(outliers.contains("SDSS_-9999.0"));

        let second = record.assign_target_info(&source, &config, info).unwrap();
        assert_eq!(second.sets, Some(Computation::AlreadyComputed));
        assert_eq!(second.outliers, Some(Computation::AlreadyComputed));
        assert_eq!(second.targets, None);
        assert_eq!(record.summaries(), Some(&summaries));
        assert_eq!(record.outliers(), Some(&outliers));
    }

    #[test]
    fn compute_on_missing_carton_fails() {
        let source = catalog();
        let mut record =
            CartonRecord::resolve(&source, CartonRequest::new("nope", "0.5.0", "science")).unwrap();
        assert!(record.compute_summaries(&[]).is_err());
        assert!(record.compute_outliers(&[], &[], &[]).is_err());
        assert!(!record.sets_computed());
        assert!(!record.outliers_computed());
    }

    #[test]
    fn store_failure_propagates() {
        let mut source = catalog();
        source.fail_queries("connection reset");
        let err = CartonRecord::resolve(&source, CartonRequest::new("bhm_rm_core", "0.5.0", "science"))
            .unwrap_err();
        assert!(matches!(err, ReconError::Store(_)));
        assert!(err.to_string().contains("connection reset"));
    }
}
