//! Magnitude outlier classification.
//!
//! Each photometric system gets one tag per kind of anomaly seen in any of its
//! bands: `None` for missing magnitudes, `Invalid` for NaN/infinite values, and
//! the literal value for every distinct out-of-range magnitude. Keeping the
//! literal value shows which placeholder convention (`-9999.0`, `999.0`,
//! `99.9`, `0.0`, ...) a system used in a carton.

use std::collections::BTreeSet;

use crate::error::ReconError;
use crate::model::{Band, OutlierSet, TargetRow};
use crate::render::format_float;

/// Magnitudes brighter than this are flagged.
pub const MAG_BRIGHT_LIMIT: f64 = -9.0;
/// Magnitudes dimmer than this are flagged.
pub const MAG_FAINT_LIMIT: f64 = 50.0;

pub const TAG_MISSING: &str = "None";
pub const TAG_INVALID: &str = "Invalid";

/// True for finite magnitudes outside the physical range or exactly zero.
pub fn is_out_of_range(mag: f64) -> bool {
    mag < MAG_BRIGHT_LIMIT || mag > MAG_FAINT_LIMIT || mag == 0.0
}

/// Anomaly tags (without system prefix) for a single band.
pub fn band_tags(rows: &[TargetRow], band: Band) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    let mut missing = false;
    let mut invalid = false;

    for row in rows {
        match row.magnitudes.get(band) {
            None => missing = true,
            Some(mag) if !mag.is_finite() => invalid = true,
            Some(mag) if is_out_of_range(mag) => {
                tags.insert(format_float(mag));
            }
            Some(_) => {}
        }
    }

    if missing {
        tags.insert(TAG_MISSING.to_string());
    }
    if invalid {
        tags.insert(TAG_INVALID.to_string());
    }
    tags
}

/// Classify magnitude anomalies across `bands`, where `bands[i]` belongs to the
/// photometric system `systems[i]`. Returns `None` when nothing was flagged.
pub fn check_mag_outliers(
    rows: &[TargetRow],
    bands: &[Band],
    systems: &[String],
) -> Result<Option<OutlierSet>, ReconError> {
    if bands.len() != systems.len() {
        return Err(ReconError::BandSystemMismatch {
            bands: bands.len(),
            systems: systems.len(),
        });
    }

    let mut out = OutlierSet::new();
    for (band, system) in bands.iter().zip(systems) {
        for tag in band_tags(rows, *band) {
            out.insert(format!("{system}_{tag}"));
        }
    }

    Ok(if out.is_empty() { None } else { Some(out) })
}
