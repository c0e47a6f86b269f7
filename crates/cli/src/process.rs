//! `process`, `check` and `show`: batch orchestration over the catalog.

use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use cartons_io::{read_carton_list, write_alternatives, write_carton_list, ReportWriter};
use cartons_recon::render::{describe, VIEW_WIDTH};
use cartons_recon::{
    check_existence, report_header, select_cartons, AlternativesTable, CartonRecord, CartonRequest,
    InventoryConfig, ReportRow, TargetInfo,
};
use cartons_store::SqliteSource;

use crate::error::CliError;
use crate::exit_codes::EXIT_CARTONS_MISSING;
use crate::plan::{CartonSource, ProcessPlan};

/// Counters of a finished `process` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub requested: usize,
    pub processed: usize,
    pub skipped: usize,
    pub written: usize,
}

/// Open the catalog named by `--db` / `CARTONS_DB`.
pub fn open_catalog(db: Option<&Path>) -> Result<SqliteSource, CliError> {
    let db = db.ok_or_else(|| CliError::usage("no catalog database given").with_hint("set --db or CARTONS_DB"))?;
    Ok(SqliteSource::open(db)?)
}

/// Log the framed view of a record at INFO, one line per entry.
pub fn visualize(record: &CartonRecord, config: &InventoryConfig) {
    for line in describe(record, config, VIEW_WIDTH) {
        info!("{line}");
    }
}

fn load_requests(
    plan: &ProcessPlan,
    source: &SqliteSource,
    config: &InventoryConfig,
) -> Result<Vec<CartonRequest>, CliError> {
    match &plan.source {
        CartonSource::List(path) => Ok(read_carton_list(path, config.input.delimiter, config.input.header_rows)?),
        CartonSource::Catalog { pattern, policy } => Ok(select_cartons(source, pattern, policy)?),
    }
}

/// Run a validated `process` plan.
pub fn run_process(plan: &ProcessPlan, source: &SqliteSource, config: &InventoryConfig) -> Result<ProcessSummary, CliError> {
    let requests = load_requests(plan, source, config)?;
    let mut summary = ProcessSummary {
        requested: requests.len(),
        ..ProcessSummary::default()
    };

    for path in plan.input_write.iter().chain(plan.output.iter()) {
        ensure_parent(path)?;
    }

    if let Some(path) = &plan.input_write {
        write_carton_list(path, &requests, config.input.delimiter, plan.overwrite)?;
        info!("Wrote file {}", path.display());
    }

    let mut writer = match &plan.output {
        Some(path) => Some(ReportWriter::create(
            path,
            config.output.delimiter,
            &report_header(config, plan.info),
            plan.overwrite,
        )?),
        None => None,
    };

    let total = requests.len();
    for (index, request) in requests.into_iter().enumerate() {
        let mut record = CartonRecord::resolve(source, request)?;

        if !record.found() {
            let req = record.request();
            debug!(
                "carton={} plan={} version_pk={} category={} not found in targetdb",
                req.name,
                req.plan,
                record.version_id().map_or_else(|| "None".to_string(), |v| v.to_string()),
                req.category_label()
            );
            summary.skipped += 1;
            continue;
        }

        if plan.info.sets || plan.info.outliers {
            record.assign_target_info(source, config, plan.info)?;
            info!("Ran assign_target_info on carton {}", record.request().name);
        }
        summary.processed += 1;

        if plan.visualize {
            visualize(&record, config);
        }

        if let Some(writer) = writer.as_mut() {
            writer.write_row(&ReportRow::from_record(&record, config, plan.info)?)?;
            summary.written += 1;
            info!(
                "wrote row to output csv for carton={} ({}/{})",
                record.request().name,
                index + 1,
                total
            );
        }
    }

    if let Some(writer) = writer {
        let path = writer.path().to_path_buf();
        writer.finish()?;
        info!("Saved output file={}", path.display());
    }

    info!(
        requested = summary.requested,
        processed = summary.processed,
        skipped = summary.skipped,
        "finished processing cartons"
    );
    Ok(summary)
}

fn ensure_parent(path: &Path) -> Result<(), CliError> {
    match path.parent().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => std::fs::create_dir_all(dir)
            .map_err(|e| CliError::io(format!("cannot create {}: {e}", dir.display()))),
        None => Ok(()),
    }
}

/// Existence check of every carton in a list; returns the concatenated
/// alternatives of the missing ones. The diff of each missing carton is
/// logged at DEBUG, so it always reaches the run log file.
pub fn run_check(list: &Path, source: &SqliteSource, config: &InventoryConfig) -> Result<AlternativesTable, CliError> {
    let requests = read_carton_list(list, config.input.delimiter, config.input.header_rows)?;
    let mut table = AlternativesTable::default();
    for request in requests {
        let record = CartonRecord::resolve(source, request)?;
        table.extend(check_existence(&record, source, true)?);
    }
    info!(
        "Ran check_existence to compare input file {} with targetdb content",
        list.display()
    );
    Ok(table)
}

/// Print a check result to `out` and turn missing cartons into exit code 6.
pub fn report_check(
    table: &AlternativesTable,
    out: impl Write,
    delimiter: char,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    if !quiet && !table.is_empty() {
        if json {
            let mut out = out;
            serde_json::to_writer_pretty(&mut out, &table.rows)
                .map_err(|e| CliError::io(format!("cannot write JSON: {e}")))?;
            writeln!(out).map_err(|e| CliError::io(e.to_string()))?;
        } else {
            write_alternatives(out, table, delimiter)?;
        }
    }

    match table.missing() {
        0 => Ok(()),
        n => Err(CliError::new(
            EXIT_CARTONS_MISSING,
            format!("{n} carton(s) not found in the catalog"),
        )),
    }
}

/// Resolve one carton, run the requested computations and log its view.
pub fn run_show(
    request: CartonRequest,
    info: TargetInfo,
    source: &SqliteSource,
    config: &InventoryConfig,
) -> Result<CartonRecord, CliError> {
    let mut record = CartonRecord::resolve(source, request)?;
    if record.found() {
        if info.sets || info.outliers {
            record.assign_target_info(source, config, info)?;
        }
    } else {
        let table = check_existence(&record, source, false)?;
        if let Some(msg) = &table.diagnostic {
            warn!("{msg}");
        }
    }
    visualize(&record, config);
    Ok(record)
}
