//! Alternatives for cartons missing from the catalog.
//!
//! The diff message logged here is parsed by tooling that rewrites carton
//! input lists, so its column layout must not change.

use serde::Serialize;
use tracing::debug;

use crate::error::ReconError;
use crate::model::{CartonRow, NOT_AVAILABLE, NO_CATEGORY};
use crate::record::CartonRecord;
use crate::source::DataSource;

/// One row of an alternatives table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlternativeRow {
    pub name: String,
    pub plan: String,
    pub category: Option<String>,
    pub stage: String,
    pub active: String,
    pub tag: Option<String>,
    pub version_id: Option<i64>,
    pub found: bool,
}

impl AlternativeRow {
    fn requested(record: &CartonRecord) -> Self {
        let req = record.request();
        Self {
            name: req.name.clone(),
            plan: req.plan.clone(),
            category: req.category.clone(),
            stage: req.stage.clone(),
            active: req.active.clone(),
            tag: record.tag().map(str::to_string),
            version_id: record.version_id(),
            found: false,
        }
    }

    fn suggested(row: CartonRow) -> Self {
        Self {
            name: row.name,
            plan: row.plan,
            category: row.category,
            stage: NOT_AVAILABLE.into(),
            active: NOT_AVAILABLE.into(),
            tag: Some(row.tag),
            version_id: Some(row.version_id),
            found: true,
        }
    }
}

/// Requested (not found) rows and the catalog alternatives proposed for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlternativesTable {
    pub rows: Vec<AlternativeRow>,
    /// Human-readable diff or warning, when one was produced.
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

impl AlternativesTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of requested cartons that were not found.
    pub fn missing(&self) -> usize {
        self.rows.iter().filter(|r| !r.found).count()
    }

    /// Append another table's rows, keeping both diagnostics.
    pub fn extend(&mut self, other: AlternativesTable) {
        self.rows.extend(other.rows);
        self.diagnostic = match (self.diagnostic.take(), other.diagnostic) {
            (Some(a), Some(b)) => Some(format!("{a}\n{b}")),
            (a, b) => a.or(b),
        };
    }
}

/// Line for the requested carton in the diff message.
pub fn requested_line(name: &str, plan: &str, category: &str, stage: &str, active: &str) -> String {
    format!("|{name:>41} | {plan:>6} | {category:>20} |{stage:>6} | {active:>6} | --> Replace this line")
}

/// Line for a suggested alternative in the diff message.
pub fn suggested_line(name: &str, plan: &str, category: &str) -> String {
    format!("|{name:>41} | {plan:>6} | {category:>20} |   N/A |    N/A |")
}

/// Propose catalog alternatives for a carton whose (name, plan, category) was
/// not found: every other plan/category under which the same name exists.
///
/// Found records yield an empty table. With `verbose`, the diff message is
/// logged at debug level.
pub fn check_existence<S>(
    record: &CartonRecord,
    source: &S,
    verbose: bool,
) -> Result<AlternativesTable, ReconError>
where
    S: DataSource + ?Sized,
{
    if record.found() {
        return Ok(AlternativesTable::default());
    }

    let req = record.request();
    let alternatives = source.cartons_named(&req.name).map_err(ReconError::store)?;

    let mut table = AlternativesTable {
        rows: vec![AlternativeRow::requested(record)],
        diagnostic: None,
    };

    let msg = if alternatives.is_empty() {
        format!(
            "Warning: carton {} not in targetdb and there is no carton with that name",
            req.name
        )
    } else {
        let mut msg = format!(
            "Carton {} not in targetdb, to avoid this you can replace the next\n\
             line with the information that follows replacing (stage) and (active) if it corresponds\n",
            req.name
        );
        msg.push_str(&requested_line(&req.name, &req.plan, req.category_label(), &req.stage, &req.active));
        msg.push('\n');
        for alt in alternatives {
            let category = alt.category.as_deref().unwrap_or(NO_CATEGORY);
            msg.push_str(&suggested_line(&alt.name, &alt.plan, category));
            msg.push('\n');
            table.rows.push(AlternativeRow::suggested(alt));
        }
        msg
    };

    if verbose {
        debug!("{msg}");
    }
    table.diagnostic = Some(msg);

    Ok(table)
}
