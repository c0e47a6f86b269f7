//! Text rendering of record values: report rows and the framed carton view.
//!
//! Cells follow the formatting of the inventory reports already in circulation:
//! absent values print as `None`, sets as `{a, b}` with quoted strings, and
//! integral floats keep a trailing `.0`.

use std::collections::BTreeSet;

use ordered_float::OrderedFloat;

use crate::aggregate::value_range;
use crate::config::InventoryConfig;
use crate::error::ReconError;
use crate::model::{SetAttribute, Summaries};
use crate::record::{CartonRecord, TargetInfo};

pub const ABSENT: &str = "None";

/// Shortest round-trip float text with a `.0` on integral values and
/// `e+NN`/`e-NN` exponents outside `[1e-4, 1e16)`.
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".into();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf".into() } else { "-inf".into() };
    }

    let abs = v.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let sci = format!("{v:e}");
        return match sci.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(d) => ('-', d),
                    None => ('+', exp),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => sci,
        };
    }

    if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

fn render_optional<T>(value: Option<T>, fmt: impl Fn(T) -> String) -> String {
    value.map(fmt).unwrap_or_else(|| ABSENT.to_string())
}

fn render_set<T>(set: Option<&BTreeSet<T>>, fmt: impl Fn(&T) -> String) -> String {
    match set {
        Some(set) => {
            let items: Vec<String> = set.iter().map(fmt).collect();
            format!("{{{}}}", items.join(", "))
        }
        None => ABSENT.to_string(),
    }
}

fn quoted(s: &String) -> String {
    format!("'{s}'")
}

fn float_cell(v: &OrderedFloat<f64>) -> String {
    format_float(v.0)
}

fn int_cell(v: &i64) -> String {
    v.to_string()
}

/// Render an outlier set, `None` when absent.
pub fn render_outliers(outliers: Option<&BTreeSet<String>>) -> String {
    render_set(outliers, quoted)
}

impl Summaries {
    /// The attribute's unique-value set as a single cell.
    pub fn set_cell(&self, attr: SetAttribute) -> String {
        match attr {
            SetAttribute::CadenceId => render_set(self.cadence_id.as_ref(), int_cell),
            SetAttribute::CadenceLabel => render_set(self.cadence_label.as_ref(), quoted),
            SetAttribute::LambdaEff => render_set(self.lambda_eff.as_ref(), float_cell),
            SetAttribute::InstrumentId => render_set(self.instrument_id.as_ref(), int_cell),
            SetAttribute::InstrumentLabel => render_set(self.instrument_label.as_ref(), quoted),
            SetAttribute::Priority => render_set(self.priority.as_ref(), int_cell),
            SetAttribute::Value => render_set(self.value.as_ref(), float_cell),
        }
    }

    /// The attribute's `(min, max)` cells.
    pub fn range_cells(&self, attr: SetAttribute) -> (String, String) {
        fn cells<T: Ord + Clone>(set: Option<&BTreeSet<T>>, fmt: impl Fn(&T) -> String) -> (String, String) {
            let (lo, hi) = value_range(set);
            (
                render_optional(lo.as_ref(), &fmt),
                render_optional(hi.as_ref(), &fmt),
            )
        }
        match attr {
            SetAttribute::CadenceId => cells(self.cadence_id.as_ref(), int_cell),
            SetAttribute::CadenceLabel => cells(self.cadence_label.as_ref(), quoted),
            SetAttribute::LambdaEff => cells(self.lambda_eff.as_ref(), float_cell),
            SetAttribute::InstrumentId => cells(self.instrument_id.as_ref(), int_cell),
            SetAttribute::InstrumentLabel => cells(self.instrument_label.as_ref(), quoted),
            SetAttribute::Priority => cells(self.priority.as_ref(), int_cell),
            SetAttribute::Value => cells(self.value.as_ref(), float_cell),
        }
    }
}

// ---------------------------------------------------------------------------
// Report rows
// ---------------------------------------------------------------------------

/// Fields supplied by the carton request, in report order (after the name).
pub const INPUT_FIELDS: [&str; 4] = ["plan", "category", "stage", "active"];

/// Fields copied from the catalog identity, in report order.
pub const CARTON_FIELDS: [&str; 6] = ["mapper_label", "program", "version_id", "tag", "mapper_id", "category_id"];

pub const OUTLIERS_COLUMN: &str = "magnitude_outliers";

/// Report header for the given configuration and computations.
pub fn report_header(config: &InventoryConfig, info: TargetInfo) -> Vec<String> {
    let mut columns = vec!["carton".to_string()];
    columns.extend(INPUT_FIELDS.iter().map(|s| s.to_string()));
    columns.extend(CARTON_FIELDS.iter().map(|s| s.to_string()));
    if info.sets {
        columns.extend(config.plain_sets().map(|a| a.name().to_string()));
        for attr in &config.fields.ranges {
            columns.push(format!("{attr}_min"));
            columns.push(format!("{attr}_max"));
        }
    }
    if info.outliers {
        columns.push(OUTLIERS_COLUMN.to_string());
    }
    columns
}

/// One line of the output report, fields in contract order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub carton: String,
    pub plan: String,
    pub category: String,
    pub stage: String,
    pub active: String,
    pub mapper_label: String,
    pub program: String,
    pub version_id: String,
    pub tag: String,
    pub mapper_id: String,
    pub category_id: String,
    pub sets: Vec<String>,
    pub ranges: Vec<(String, String)>,
    pub outliers: Option<String>,
}

impl ReportRow {
    /// Build the report row of a resolved record. The requested computations
    /// must already have run.
    pub fn from_record(record: &CartonRecord, config: &InventoryConfig, info: TargetInfo) -> Result<Self, ReconError> {
        let req = record.request();
        let identity = record.identity().ok_or_else(|| ReconError::NotResolvable {
            carton: req.name.clone(),
            plan: req.plan.clone(),
            category: req.category_label().to_string(),
            reason: "only cartons found in the catalog are reported",
        })?;
        let not_computed = |what| ReconError::NotComputed {
            carton: req.name.clone(),
            plan: req.plan.clone(),
            category: req.category_label().to_string(),
            what,
        };

        let (sets, ranges) = if info.sets {
            let summaries = record.summaries().ok_or_else(|| not_computed("target sets"))?;
            (
                config.plain_sets().map(|a| summaries.set_cell(a)).collect(),
                config.fields.ranges.iter().map(|a| summaries.range_cells(*a)).collect(),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        let outliers = if info.outliers {
            if !record.outliers_computed() {
                return Err(not_computed("magnitude outliers"));
            }
            Some(render_outliers(record.outliers()))
        } else {
            None
        };

        Ok(Self {
            carton: req.name.clone(),
            plan: req.plan.clone(),
            category: req.category_label().to_string(),
            stage: req.stage.clone(),
            active: req.active.clone(),
            mapper_label: render_optional(identity.mapper_label.as_ref(), String::clone),
            program: render_optional(identity.program.as_ref(), String::clone),
            version_id: identity.version_id.to_string(),
            tag: identity.tag.clone(),
            mapper_id: render_optional(identity.mapper_id, |v| v.to_string()),
            category_id: render_optional(identity.category_id, |v| v.to_string()),
            sets,
            ranges,
            outliers,
        })
    }

    /// Cells in header order.
    pub fn to_record(&self) -> Vec<String> {
        let mut out = vec![
            self.carton.clone(),
            self.plan.clone(),
            self.category.clone(),
            self.stage.clone(),
            self.active.clone(),
            self.mapper_label.clone(),
            self.program.clone(),
            self.version_id.clone(),
            self.tag.clone(),
            self.mapper_id.clone(),
            self.category_id.clone(),
        ];
        out.extend(self.sets.iter().cloned());
        for (lo, hi) in &self.ranges {
            out.push(lo.clone());
            out.push(hi.clone());
        }
        if let Some(outliers) = &self.outliers {
            out.push(outliers.clone());
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Framed view
// ---------------------------------------------------------------------------

pub const VIEW_WIDTH: usize = 140;

/// `###   msg   ###` centered in `width` columns. A half-column split
/// rounds the left padding to even.
pub fn centered_line(msg: &str, width: usize) -> String {
    let space = width.saturating_sub(msg.len() + 7);
    let half = space / 2;
    let left = if space % 2 == 1 && half % 2 == 1 { half + 1 } else { half };
    let right = space - left;
    format!("###{}{}{} ###", " ".repeat(left), msg, " ".repeat(right))
}

fn param_line(name: &str, value: &str, width: usize) -> String {
    let pad = width.saturating_sub(name.len() + 10);
    format!("### {name}: {value:<pad$} ###")
}

fn range_line(name: &str, lo: &str, hi: &str, width: usize) -> String {
    let pad = width.saturating_sub(lo.len() + hi.len() + name.len() + 20);
    format!("### {name} range: {lo} to {hi}{} ###", " ".repeat(pad))
}

/// Human-readable, framed description of a record.
pub fn describe(record: &CartonRecord, config: &InventoryConfig, width: usize) -> Vec<String> {
    let rule = "#".repeat(width);
    let req = record.request();
    let mut lines = vec![String::new(), rule.clone()];
    lines.push(centered_line("CARTON DEPENDENT INFORMATION", width));
    lines.push(centered_line(" ", width));

    for (name, value) in [
        ("carton", req.name.clone()),
        ("plan", req.plan.clone()),
        ("category", req.category_label().to_string()),
        ("stage", req.stage.clone()),
        ("active", req.active.clone()),
        ("found", if record.found() { "True".into() } else { "False".into() }),
    ] {
        lines.push(param_line(name, &value, width));
    }

    let identity = record.identity();
    let carton_values = [
        identity.and_then(|i| i.mapper_label.clone()),
        identity.and_then(|i| i.program.clone()),
        record.version_id().map(|v| v.to_string()),
        record.tag().map(str::to_string),
        identity.and_then(|i| i.mapper_id).map(|v| v.to_string()),
        identity.and_then(|i| i.category_id).map(|v| v.to_string()),
    ];
    for (name, value) in CARTON_FIELDS.iter().zip(carton_values) {
        lines.push(param_line(name, value.as_deref().unwrap_or(ABSENT), width));
    }
    lines.push(rule.clone());

    if !record.found() {
        lines.push(centered_line("Since the carton is not in targetdb", width));
        lines.push(centered_line("this is all the information we can get", width));
        lines.push(rule);
        return lines;
    }

    match record.summaries() {
        None => {
            lines.push(centered_line("The list of values per target parameter has", width));
            lines.push(centered_line("not been calculated for this carton, to do so", width));
            lines.push(centered_line("first assign target info on this carton", width));
            lines.push(centered_line("with sets enabled (default)", width));
        }
        Some(summaries) => {
            lines.push(centered_line("VALUES PER TARGET DEPENDENT PARAMETER", width));
            lines.push(centered_line(" ", width));
            for attr in config.plain_sets() {
                lines.push(param_line(attr.name(), &summaries.set_cell(attr), width));
            }
            for attr in &config.fields.ranges {
                let (lo, hi) = summaries.range_cells(*attr);
                lines.push(range_line(attr.name(), &lo, &hi, width));
            }
        }
    }
    lines.push(rule.clone());

    if record.outliers_computed() {
        lines.push(centered_line("MAGNITUDE OUTLIERS PER PHOTOMETRIC SYSTEM", width));
        lines.push(centered_line(" ", width));
        lines.push(param_line(OUTLIERS_COLUMN, &render_outliers(record.outliers()), width));
    } else {
        lines.push(centered_line("The list of magnitude outliers for each photometric", width));
        lines.push(centered_line("system has not been calculated for this carton yet,", width));
        lines.push(centered_line("to do so first assign target info on this carton", width));
        lines.push(centered_line("with magnitude outliers enabled (not default)", width));
    }
    lines.push(rule);

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CartonRequest, TargetRow};
    use crate::source::{CartonEntry, MemorySource};

    #[test]
    fn floats_keep_trailing_zero() {
        assert_eq!(format_float(-9999.0), "-9999.0");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(-0.0), "-0.0");
        assert_eq!(format_float(999.0), "999.0");
        assert_eq!(format_float(99.9), "99.9");
        assert_eq!(format_float(-99.9), "-99.9");
        assert_eq!(format_float(5400.5), "5400.5");
    }

    #[test]
    fn floats_use_exponent_outside_plain_range() {
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.5e-5), "1.5e-05");
        assert_eq!(format_float(f64::INFINITY), "inf");
        assert_eq!(format_float(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn sets_render_sorted_and_quoted() {
        let summaries = Summaries::from_rows(&[
            TargetRow {
                cadence_label: Some("dark_2x1".into()),
                priority: Some(5),
                lambda_eff: Some(5400.0),
                ..TargetRow::default()
            },
            TargetRow {
                cadence_label: Some("bright_1x1".into()),
                priority: Some(1),
                lambda_eff: Some(16000.0),
                ..TargetRow::default()
            },
        ]);
        assert_eq!(summaries.set_cell(SetAttribute::CadenceLabel), "{'bright_1x1', 'dark_2x1'}");
        assert_eq!(summaries.set_cell(SetAttribute::Priority), "{1, 5}");
        assert_eq!(summaries.set_cell(SetAttribute::LambdaEff), "{5400.0, 16000.0}");
        assert_eq!(summaries.set_cell(SetAttribute::Value), "None");
        assert_eq!(
            summaries.range_cells(SetAttribute::Priority),
            ("1".to_string(), "5".to_string())
        );
        assert_eq!(
            summaries.range_cells(SetAttribute::Value),
            ("None".to_string(), "None".to_string())
        );
    }

    #[test]
    fn header_follows_config_order() {
        let config = InventoryConfig::default();
        let header = report_header(&config, TargetInfo { sets: true, outliers: true });
        assert_eq!(header[0], "carton");
        assert_eq!(&header[1..5], &["plan", "category", "stage", "active"]);
        assert_eq!(header[5], "mapper_label");
        assert_eq!(header[10], "category_id");
        assert_eq!(
            &header[11..15],
            &["cadence_label", "instrument_label", "cadence_id", "instrument_id"]
        );
        assert_eq!(
            &header[15..21],
            &["priority_min", "priority_max", "value_min", "value_max", "lambda_eff_min", "lambda_eff_max"]
        );
        assert_eq!(header[21], "magnitude_outliers");
        assert_eq!(header.len(), 22);

        let bare = report_header(&config, TargetInfo { sets: false, outliers: false });
        assert_eq!(bare.len(), 11);
    }

    fn resolved() -> (MemorySource, CartonRecord) {
        let mut source = MemorySource::new();
        let v = source.add_version_with_id(83, "0.5.0", "0.5.2");
        let pk = source.add_carton(CartonEntry {
            name: "mwm_cb_uvex1".into(),
            version_id: v,
            category: Some("science".into()),
            category_id: Some(0),
            mapper_label: Some("MWM".into()),
            mapper_id: Some(0),
            program: None,
        });
        source.add_target(
            pk,
            TargetRow {
                priority: Some(1400),
                value: Some(1.0),
                ..TargetRow::default()
            },
        );
        let record = CartonRecord::resolve(&source, CartonRequest::new("mwm_cb_uvex1", "0.5.0", "science")).unwrap();
        (source, record)
    }

    #[test]
    fn report_row_matches_header_width() {
        let (source, mut record) = resolved();
        let config = InventoryConfig::default();
        let info = TargetInfo { sets: true, outliers: true };
        record.assign_target_info(&source, &config, info).unwrap();

        let row = ReportRow::from_record(&record, &config, info).unwrap();
        let cells = row.to_record();
        assert_eq!(cells.len(), report_header(&config, info).len());
        assert_eq!(cells[0], "mwm_cb_uvex1");
        assert_eq!(cells[6], "None");
        assert_eq!(cells[7], "83");
        assert_eq!(cells[8], "0.5.2");
        assert_eq!(cells[15], "1400");
        assert_eq!(cells[16], "1400");
        assert!(cells[21].contains("'SDSS_None'"));
    }

    #[test]
    fn report_row_requires_computed_sets() {
        let (_, record) = resolved();
        let config = InventoryConfig::default();
        let err = ReportRow::from_record(&record, &config, TargetInfo::default()).unwrap_err();
        assert!(matches!(err, ReconError::NotComputed { .. }));
    }

    #[test]
    fn describe_missing_carton() {
        let (source, _) = resolved();
        let record = CartonRecord::resolve(&source, CartonRequest::new("nope", "0.5.0", "science")).unwrap();
        let lines = describe(&record, &InventoryConfig::default(), VIEW_WIDTH);
        assert!(lines.iter().any(|l| l.contains("Since the carton is not in targetdb")));
        assert!(lines.iter().any(|l| l.starts_with("### found: False")));
        assert!(lines.iter().any(|l| l.starts_with("### tag: 0.5.2")));
    }

    #[test]
    fn describe_lines_have_fixed_width() {
        let (source, mut record) = resolved();
        let config = InventoryConfig::default();
        record.assign_target_info(&source, &config, TargetInfo::default()).unwrap();
        let lines = describe(&record, &config, VIEW_WIDTH);
        for line in lines.iter().filter(|l| l.starts_with("###")) {
            assert_eq!(line.len(), VIEW_WIDTH, "line: {line}");
        }
        assert!(lines.iter().any(|l| l.contains("priority range: 1400 to 1400")));
    }

    #[test]
    fn centered_line_width() {
        assert_eq!(centered_line("X", 20).len(), 20);
        // odd padding: the left side rounds to even
        assert_eq!(centered_line("ABCDEF", 20), "###    ABCDEF    ###");
        assert_eq!(centered_line("ABCDEFGH", 20), "###  ABCDEFGH    ###");
        assert_eq!(centered_line("ABCDEFGHIJ", 20), "###  ABCDEFGHIJ  ###");
    }
}
