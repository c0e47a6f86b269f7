// cartons-inventory - carton inventory batch runner

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use cartons_cli::exit_codes::EXIT_SUCCESS;
use cartons_cli::plan::{input_list_path, parse_forced, plan_process, ListOrigin, Origin, ProcessArgs};
use cartons_cli::process::{open_catalog, report_check, run_check, run_process, run_show};
use cartons_cli::{logging, settings, CliError};
use cartons_recon::{CartonRequest, TargetInfo};

#[derive(Parser)]
#[command(name = "cartons-inventory")]
#[command(about = "Inventory of cartons, their targets and magnitude outliers")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Catalog database (SQLite)
    #[arg(long, env = "CARTONS_DB", global = true)]
    db: Option<PathBuf>,

    /// Inventory configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Folder holding one sub-folder per origin with lists and reports
    #[arg(long, default_value = "./files/", global = true)]
    files_folder: PathBuf,

    /// Folder for run log files
    #[arg(long, default_value = "./logs", global = true)]
    log_dir: PathBuf,

    /// Debug output on stderr (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that every carton of a list exists in the catalog
    #[command(after_help = "\
Examples:
  cartons-inventory check --origin rsconfig --input rsconfig_cartons_1.0.0.txt
  cartons-inventory check --origin custom --input my_cartons.txt --json")]
    Check {
        #[arg(long, value_enum)]
        origin: ListOrigin,

        /// List file name inside <files-folder>/<origin>/
        #[arg(long)]
        input: String,

        /// Do not print the alternatives table
        #[arg(long)]
        quiet: bool,

        /// Print the alternatives table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize targets and magnitude outliers of many cartons
    #[command(after_help = "\
Examples:
  cartons-inventory process --origin rsconfig --input rsconfig_cartons_1.0.0.txt
  cartons-inventory process --origin targetdb --write-input --placeholders
  cartons-inventory process --origin targetdb --pattern 'bhm_rm_*' --versions all --write-input
  cartons-inventory process --origin targetdb --versions single --unique-version 83 --no-output
  cartons-inventory process --origin targetdb --force mwm_cb_uvex1=83 --write-input")]
    Process {
        #[arg(long, value_enum)]
        origin: Origin,

        /// List file name inside <files-folder>/<origin>/ (rsconfig, custom)
        #[arg(long)]
        input: Option<String>,

        /// Carton name pattern, `*` as wildcard (targetdb; all cartons when omitted)
        #[arg(long)]
        pattern: Option<String>,

        /// Versions per carton name: latest, all or single (targetdb)
        #[arg(long, default_value = "latest")]
        versions: String,

        /// Version id used with --versions single
        #[arg(long)]
        unique_version: Option<i64>,

        /// Force a version for one carton name. Repeatable.
        #[arg(long = "force", value_name = "NAME=VERSION", value_parser = parse_forced)]
        forced: Vec<(String, i64)>,

        /// Write the selected cartons as a list file (targetdb)
        #[arg(long)]
        write_input: bool,

        /// Compute value sets per target attribute (default)
        #[arg(long, overrides_with = "no_sets")]
        sets: bool,

        /// Skip value sets
        #[arg(long)]
        no_sets: bool,

        /// Compute magnitude outliers per photometric system
        #[arg(long)]
        placeholders: bool,

        /// Do not write the output report
        #[arg(long)]
        no_output: bool,

        /// Log the framed view of every processed carton
        #[arg(long)]
        visualize: bool,

        /// Replace existing list and report files
        #[arg(long)]
        overwrite: bool,
    },

    /// Resolve a single carton and log its framed view
    #[command(after_help = "\
Examples:
  cartons-inventory show --carton mwm_cb_uvex1 --plan 0.5.0 --category science --placeholders")]
    Show {
        #[arg(long)]
        carton: String,

        #[arg(long)]
        plan: String,

        #[arg(long)]
        category: String,

        #[arg(long, default_value = "N/A")]
        stage: String,

        #[arg(long, default_value = "N/A")]
        active: String,

        /// Skip value sets
        #[arg(long)]
        no_sets: bool,

        /// Compute magnitude outliers per photometric system
        #[arg(long)]
        placeholders: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  cartons-recon ", env!("CARGO_PKG_VERSION"),
        "\nbuild:   ", env!("BUILD_PROFILE"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { origin, input, quiet, json } => cmd_check(&cli.global, origin.into(), input, quiet, json),
        Commands::Process {
            origin,
            input,
            pattern,
            versions,
            unique_version,
            forced,
            write_input,
            sets: _,
            no_sets,
            placeholders,
            no_output,
            visualize,
            overwrite,
        } => cmd_process(
            &cli.global,
            ProcessArgs {
                origin,
                input,
                pattern,
                versions,
                unique_version,
                forced,
                write_input,
                sets: !no_sets,
                placeholders,
                write_output: !no_output,
                visualize,
                overwrite,
            },
        ),
        Commands::Show { carton, plan, category, stage, active, no_sets, placeholders } => cmd_show(
            &cli.global,
            CartonRequest::new(carton, plan, category).with_bookkeeping(stage, active),
            TargetInfo { sets: !no_sets, outliers: placeholders },
        ),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn log_path(global: &GlobalArgs, origin: Origin, sets: bool, mags: bool) -> PathBuf {
    global.log_dir.join(logging::log_file_name(origin.as_str(), sets, mags))
}

fn cmd_process(global: &GlobalArgs, args: ProcessArgs) -> Result<(), CliError> {
    let config = settings::load_config(global.config.as_deref())?;
    let plan = plan_process(&args, &global.files_folder)?;
    if global.db.is_none() {
        return Err(CliError::usage("no catalog database given").with_hint("set --db or CARTONS_DB"));
    }

    let log_file = log_path(global, args.origin, args.sets, args.placeholders);
    logging::init(Some(&log_file), global.verbose)?;
    let mut params = args.parameters();
    params.push(("files_folder", global.files_folder.display().to_string()));
    params.push(("db", display_opt(global.db.as_deref())));
    logging::banner("process", &params);

    let source = open_catalog(global.db.as_deref())?;
    let summary = run_process(&plan, &source, &config)?;

    if let Some(path) = &plan.output {
        println!("{}", path.display());
    }
    info!(
        "processed {} of {} cartons ({} not in catalog), log at {}",
        summary.processed,
        summary.requested,
        summary.skipped,
        log_file.display()
    );
    Ok(())
}

fn cmd_check(global: &GlobalArgs, origin: Origin, input: String, quiet: bool, json: bool) -> Result<(), CliError> {
    let config = settings::load_config(global.config.as_deref())?;
    let list = input_list_path(&global.files_folder, origin, Some(&input))?;
    if global.db.is_none() {
        return Err(CliError::usage("no catalog database given").with_hint("set --db or CARTONS_DB"));
    }

    logging::init(Some(&log_path(global, origin, false, false)), global.verbose)?;
    logging::banner(
        "check",
        &[
            ("origin", origin.as_str().to_string()),
            ("inputname", input.clone()),
            ("check_exists", "true".to_string()),
            ("files_folder", global.files_folder.display().to_string()),
            ("db", display_opt(global.db.as_deref())),
        ],
    );

    let source = open_catalog(global.db.as_deref())?;
    let table = run_check(&list, &source, &config)?;
    report_check(&table, std::io::stdout().lock(), config.output.delimiter, json, quiet)
}

fn cmd_show(global: &GlobalArgs, request: CartonRequest, info: TargetInfo) -> Result<(), CliError> {
    let config = settings::load_config(global.config.as_deref())?;
    logging::init(None, global.verbose)?;
    let source = open_catalog(global.db.as_deref())?;
    let record = run_show(request, info, &source, &config)?;
    if record.found() {
        Ok(())
    } else {
        Err(CliError::new(
            cartons_cli::exit_codes::EXIT_CARTONS_MISSING,
            format!("carton {} not found in the catalog", record.request().name),
        ))
    }
}

fn display_opt(path: Option<&Path>) -> String {
    path.map_or_else(|| "None".to_string(), |p| p.display().to_string())
}
