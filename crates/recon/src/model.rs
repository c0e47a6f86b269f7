use std::collections::BTreeSet;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Placeholder for request-local bookkeeping fields that were not supplied.
pub const NOT_AVAILABLE: &str = "N/A";

/// Text of a missing category in lists, reports and messages.
pub const NO_CATEGORY: &str = "None";

// ---------------------------------------------------------------------------
// Requests + identities
// ---------------------------------------------------------------------------

/// A carton as requested by the caller (input list row or selection result).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartonRequest {
    pub name: String,
    pub plan: String,
    /// Category label; `None` for cartons the catalog holds without a category.
    pub category: Option<String>,
    /// Robostrategy stage. Carried through, never interpreted.
    pub stage: String,
    /// Robostrategy active flag. Carried through, never interpreted.
    pub active: String,
}

impl CartonRequest {
    pub fn new(name: impl Into<String>, plan: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plan: plan.into(),
            category: Some(category.into()),
            stage: NOT_AVAILABLE.into(),
            active: NOT_AVAILABLE.into(),
        }
    }

    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(NO_CATEGORY)
    }

    pub fn with_bookkeeping(mut self, stage: impl Into<String>, active: impl Into<String>) -> Self {
        self.stage = stage.into();
        self.active = active.into();
        self
    }
}

/// Carton-dependent fields copied from the catalog row that matched a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartonIdentity {
    pub mapper_label: Option<String>,
    pub program: Option<String>,
    pub version_id: i64,
    pub tag: String,
    pub mapper_id: Option<i64>,
    pub category_id: Option<i64>,
}

/// A row of the version table, used as best-effort identity for missing cartons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRef {
    pub version_id: i64,
    pub tag: String,
}

/// A carton row joined to its version and category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartonRow {
    pub name: String,
    pub plan: String,
    pub category: Option<String>,
    pub version_id: i64,
    pub tag: String,
    pub program: Option<String>,
}

impl From<CartonRow> for CartonRequest {
    fn from(row: CartonRow) -> Self {
        Self {
            name: row.name,
            plan: row.plan,
            category: row.category,
            stage: NOT_AVAILABLE.into(),
            active: NOT_AVAILABLE.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Name patterns
// ---------------------------------------------------------------------------

/// Carton name pattern where `*` matches any run of characters.
///
/// Matching is ASCII case-insensitive, like the catalog's `ILIKE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern(String);

impl NamePattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// Pattern matching every carton.
    pub fn all() -> Self {
        Self("*".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_all(&self) -> bool {
        !self.0.is_empty() && self.0.chars().all(|c| c == '*')
    }

    /// SQL `LIKE` form using `\` as the escape character.
    pub fn to_sql_like(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 4);
        for c in self.0.chars() {
            match c {
                '*' => out.push('%'),
                '%' | '_' | '\\' => {
                    out.push('\\');
                    out.push(c);
                }
                _ => out.push(c),
            }
        }
        out
    }

    pub fn matches(&self, name: &str) -> bool {
        let pattern: Vec<char> = self.0.to_ascii_lowercase().chars().collect();
        let name: Vec<char> = name.to_ascii_lowercase().chars().collect();
        glob_match(&pattern, &name)
    }
}

/// Iterative `*`-only glob with single-star backtracking.
fn glob_match(pattern: &[char], name: &[char]) -> bool {
    let (mut p, mut n) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, n));
            p += 1;
        } else if p < pattern.len() && pattern[p] == name[n] {
            p += 1;
            n += 1;
        } else if let Some((sp, sn)) = star {
            p = sp + 1;
            n = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

// ---------------------------------------------------------------------------
// Target rows
// ---------------------------------------------------------------------------

/// Magnitude bands available in the catalog's magnitude table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    G,
    R,
    I,
    Z,
    H,
    J,
    K,
    Bp,
    Rp,
    GaiaG,
}

impl Band {
    pub const ALL: [Band; 10] = [
        Band::G,
        Band::R,
        Band::I,
        Band::Z,
        Band::H,
        Band::J,
        Band::K,
        Band::Bp,
        Band::Rp,
        Band::GaiaG,
    ];

    /// Column name in the magnitude table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::G => "g",
            Self::R => "r",
            Self::I => "i",
            Self::Z => "z",
            Self::H => "h",
            Self::J => "j",
            Self::K => "k",
            Self::Bp => "bp",
            Self::Rp => "rp",
            Self::GaiaG => "gaia_g",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// One nullable magnitude per band. A missing magnitude row leaves every band `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Magnitudes {
    pub g: Option<f64>,
    pub r: Option<f64>,
    pub i: Option<f64>,
    pub z: Option<f64>,
    pub h: Option<f64>,
    pub j: Option<f64>,
    pub k: Option<f64>,
    pub bp: Option<f64>,
    pub rp: Option<f64>,
    pub gaia_g: Option<f64>,
}

impl Magnitudes {
    pub fn get(&self, band: Band) -> Option<f64> {
        match band {
            Band::G => self.g,
            Band::R => self.r,
            Band::I => self.i,
            Band::Z => self.z,
            Band::H => self.h,
            Band::J => self.j,
            Band::K => self.k,
            Band::Bp => self.bp,
            Band::Rp => self.rp,
            Band::GaiaG => self.gaia_g,
        }
    }

    pub fn set(&mut self, band: Band, value: Option<f64>) {
        let slot = match band {
            Band::G => &mut self.g,
            Band::R => &mut self.r,
            Band::I => &mut self.i,
            Band::Z => &mut self.z,
            Band::H => &mut self.h,
            Band::J => &mut self.j,
            Band::K => &mut self.k,
            Band::Bp => &mut self.bp,
            Band::Rp => &mut self.rp,
            Band::GaiaG => &mut self.gaia_g,
        };
        *slot = value;
    }
}

/// One target assigned to a carton version, with its left-joined reference data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetRow {
    pub cadence_id: Option<i64>,
    pub cadence_label: Option<String>,
    pub lambda_eff: Option<f64>,
    pub instrument_id: Option<i64>,
    pub instrument_label: Option<String>,
    pub priority: Option<i64>,
    pub value: Option<f64>,
    pub magnitudes: Magnitudes,
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Target-dependent attributes that can be summarized into a unique-value set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetAttribute {
    CadenceId,
    CadenceLabel,
    LambdaEff,
    InstrumentId,
    InstrumentLabel,
    Priority,
    Value,
}

impl SetAttribute {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CadenceId => "cadence_id",
            Self::CadenceLabel => "cadence_label",
            Self::LambdaEff => "lambda_eff",
            Self::InstrumentId => "instrument_id",
            Self::InstrumentLabel => "instrument_label",
            Self::Priority => "priority",
            Self::Value => "value",
        }
    }

    /// Numeric attributes have a meaningful (min, max) range.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::CadenceLabel | Self::InstrumentLabel)
    }
}

impl std::fmt::Display for SetAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Distinct non-null values per target attribute. `None` means the carton's
/// targets carry no value at all for that attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summaries {
    pub cadence_id: Option<BTreeSet<i64>>,
    pub cadence_label: Option<BTreeSet<String>>,
    pub lambda_eff: Option<BTreeSet<OrderedFloat<f64>>>,
    pub instrument_id: Option<BTreeSet<i64>>,
    pub instrument_label: Option<BTreeSet<String>>,
    pub priority: Option<BTreeSet<i64>>,
    pub value: Option<BTreeSet<OrderedFloat<f64>>>,
}

/// Distinct `<system>_<tag>` magnitude anomaly tags.
pub type OutlierSet = BTreeSet<String>;

/// Outcome of an idempotent computation step on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Computation {
    Computed,
    /// The step had already run; nothing was recomputed.
    AlreadyComputed,
}
