use std::collections::BTreeSet;

use ordered_float::OrderedFloat;

use crate::model::{SetAttribute, Summaries, TargetRow};

/// Distinct non-null values, or `None` when nothing but nulls was seen.
pub fn unique_values<T, I>(values: I) -> Option<BTreeSet<T>>
where
    T: Ord,
    I: IntoIterator<Item = Option<T>>,
{
    let set: BTreeSet<T> = values.into_iter().flatten().collect();
    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}

/// Same as [`unique_values`] for float columns. NaN is the catalog's missing-value
/// marker for floats and is dropped like a null.
pub fn unique_floats<I>(values: I) -> Option<BTreeSet<OrderedFloat<f64>>>
where
    I: IntoIterator<Item = Option<f64>>,
{
    unique_values(
        values
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()).map(OrderedFloat)),
    )
}

/// `(min, max)` of a summarized set; both `None` when the set is absent.
pub fn value_range<T: Ord + Clone>(set: Option<&BTreeSet<T>>) -> (Option<T>, Option<T>) {
    match set {
        Some(set) => (set.first().cloned(), set.last().cloned()),
        None => (None, None),
    }
}

impl Summaries {
    /// Collapse a carton's target rows into one unique-value set per attribute.
    pub fn from_rows(rows: &[TargetRow]) -> Self {
        Self {
            cadence_id: unique_values(rows.iter().map(|r| r.cadence_id)),
            cadence_label: unique_values(rows.iter().map(|r| r.cadence_label.clone())),
            lambda_eff: unique_floats(rows.iter().map(|r| r.lambda_eff)),
            instrument_id: unique_values(rows.iter().map(|r| r.instrument_id)),
            instrument_label: unique_values(rows.iter().map(|r| r.instrument_label.clone())),
            priority: unique_values(rows.iter().map(|r| r.priority)),
            value: unique_floats(rows.iter().map(|r| r.value)),
        }
    }

    /// Whether the attribute has at least one non-null value.
    pub fn is_present(&self, attr: SetAttribute) -> bool {
        match attr {
            SetAttribute::CadenceId => self.cadence_id.is_some(),
            SetAttribute::CadenceLabel => self.cadence_label.is_some(),
            SetAttribute::LambdaEff => self.lambda_eff.is_some(),
            SetAttribute::InstrumentId => self.instrument_id.is_some(),
            SetAttribute::InstrumentLabel => self.instrument_label.is_some(),
            SetAttribute::Priority => self.priority.is_some(),
            SetAttribute::Value => self.value.is_some(),
        }
    }
}
