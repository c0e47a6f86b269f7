//! Parameter validation and file naming for `process` and `check`.
//!
//! Everything here runs before the catalog is opened: a bad combination of
//! flags must fail without touching the store or creating any file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use cartons_io::check_overwrite;
use cartons_recon::{NamePattern, SelectionPolicy, TargetInfo, VersionMode};

use crate::error::CliError;

/// Where the cartons to process come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Origin {
    /// Carton list exported from a robostrategy configuration.
    Rsconfig,
    /// Hand-written carton list.
    Custom,
    /// Selection straight from the catalog by name pattern and version.
    Targetdb,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rsconfig => "rsconfig",
            Self::Custom => "custom",
            Self::Targetdb => "targetdb",
        }
    }

    pub fn is_list(&self) -> bool {
        !matches!(self, Self::Targetdb)
    }
}

/// Origins backed by a carton list file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListOrigin {
    Rsconfig,
    Custom,
}

impl From<ListOrigin> for Origin {
    fn from(origin: ListOrigin) -> Self {
        match origin {
            ListOrigin::Rsconfig => Origin::Rsconfig,
            ListOrigin::Custom => Origin::Custom,
        }
    }
}

/// Parse `NAME=VERSION` for `--force`.
pub fn parse_forced(s: &str) -> Result<(String, i64), String> {
    let (name, version) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VERSION, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing carton name in '{s}'"));
    }
    let version = version
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("version in '{s}' is not an integer"))?;
    Ok((name.to_string(), version))
}

/// Raw `process` parameters as given on the command line.
#[derive(Debug, Clone)]
pub struct ProcessArgs {
    pub origin: Origin,
    pub input: Option<String>,
    pub pattern: Option<String>,
    pub versions: String,
    pub unique_version: Option<i64>,
    pub forced: Vec<(String, i64)>,
    pub write_input: bool,
    pub sets: bool,
    pub placeholders: bool,
    pub write_output: bool,
    pub visualize: bool,
    pub overwrite: bool,
}

impl ProcessArgs {
    /// Every parameter as `(name, value)` for the run banner.
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        let forced = if self.forced.is_empty() {
            "None".to_string()
        } else {
            self.forced
                .iter()
                .map(|(name, v)| format!("{name}={v}"))
                .collect::<Vec<_>>()
                .join(",")
        };
        vec![
            ("origin", self.origin.as_str().to_string()),
            ("inputname", self.input.clone().unwrap_or_else(|| "None".into())),
            ("all_cartons", self.pattern.is_none().to_string()),
            ("cartons_name_pattern", self.pattern.clone().unwrap_or_else(|| "None".into())),
            ("versions", self.versions.clone()),
            ("unique_version", self.unique_version.map_or_else(|| "None".into(), |v| v.to_string())),
            ("forced_versions", forced),
            ("write_input", self.write_input.to_string()),
            ("write_output", self.write_output.to_string()),
            ("assign_sets", self.sets.to_string()),
            ("assign_placeholders", self.placeholders.to_string()),
            ("visualize", self.visualize.to_string()),
            ("overwrite", self.overwrite.to_string()),
        ]
    }
}

/// How the run obtains its carton requests.
#[derive(Debug, Clone, PartialEq)]
pub enum CartonSource {
    List(PathBuf),
    Catalog {
        pattern: NamePattern,
        policy: SelectionPolicy,
    },
}

/// A validated `process` run.
#[derive(Debug, Clone)]
pub struct ProcessPlan {
    pub origin: Origin,
    pub source: CartonSource,
    /// Fixed-width list of the selected cartons (targetdb only).
    pub input_write: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub info: TargetInfo,
    pub visualize: bool,
    pub overwrite: bool,
}

/// Input list name without its `.txt` extension.
pub fn list_stem(input: &str) -> &str {
    input.strip_suffix(".txt").unwrap_or(input)
}

/// `Cartons_{all|sample}_Versions_<mode>`, or `_Version_<id>` for a single
/// version, plus `_and_forced` when versions were forced.
pub fn targetdb_basename(all_cartons: bool, mode: VersionMode, forced: bool) -> String {
    let mut name = if all_cartons { "Cartons_all" } else { "Cartons_sample" }.to_string();
    match mode {
        VersionMode::Single(id) => name.push_str(&format!("_Version_{id}")),
        other => name.push_str(&format!("_Versions_{}", other.label())),
    }
    if forced {
        name.push_str("_and_forced");
    }
    name
}

/// Output file suffix for the requested computations.
pub fn output_suffix(info: TargetInfo) -> Option<&'static str> {
    match (info.sets, info.outliers) {
        (true, false) => Some("_sets.csv"),
        (false, true) => Some("_magplaceholders.csv"),
        (true, true) => Some("_all.csv"),
        (false, false) => None,
    }
}

/// `<files_folder>/<origin>/<input>`, which must exist.
pub fn input_list_path(files_folder: &Path, origin: Origin, input: Option<&str>) -> Result<PathBuf, CliError> {
    let input = input.ok_or_else(|| {
        CliError::usage(format!("--input is required for --origin {}", origin.as_str()))
    })?;
    let path = files_folder.join(origin.as_str()).join(input);
    if !path.is_file() {
        return Err(CliError::usage(format!(
            "carton list {} required for --origin {} does not exist",
            path.display(),
            origin.as_str()
        ))
        .with_hint(format!("place the list under {}", files_folder.join(origin.as_str()).display())));
    }
    Ok(path)
}

/// Validate `args` and derive every path the run will read or write.
pub fn plan_process(args: &ProcessArgs, files_folder: &Path) -> Result<ProcessPlan, CliError> {
    let folder = files_folder.join(args.origin.as_str());
    let info = TargetInfo {
        sets: args.sets,
        outliers: args.placeholders,
    };

    let (source, input_write, output_base) = if args.origin.is_list() {
        if args.write_input {
            return Err(CliError::usage("--write-input is only available for --origin targetdb"));
        }
        let path = input_list_path(files_folder, args.origin, args.input.as_deref())?;
        let stem = list_stem(args.input.as_deref().unwrap_or_default());
        let base = folder.join(format!("Info_{stem}"));
        (CartonSource::List(path), None, base)
    } else {
        let mode = VersionMode::parse(&args.versions, args.unique_version)?;
        if args.write_output && !args.write_input {
            return Err(CliError::usage(
                "to create an output file for --origin targetdb the input list has to be written as well",
            )
            .with_hint("add --write-input or --no-output"));
        }

        let forced: BTreeMap<String, i64> = args.forced.iter().cloned().collect();
        let basename = targetdb_basename(args.pattern.is_none(), mode, !forced.is_empty());
        let input_path = folder.join(format!("{basename}.txt"));
        if args.write_input {
            check_overwrite(&input_path, args.overwrite)?;
        }

        let pattern = args.pattern.as_deref().map_or_else(NamePattern::all, NamePattern::new);
        let policy = SelectionPolicy::new(mode).with_forced(forced);
        let input_write = args.write_input.then_some(input_path);
        (
            CartonSource::Catalog { pattern, policy },
            input_write,
            folder.join(format!("Info_{basename}")),
        )
    };

    let output = if args.write_output {
        let suffix = output_suffix(info).ok_or_else(|| {
            CliError::usage("an output file needs at least one of sets or placeholders")
                .with_hint("drop --no-sets, add --placeholders, or pass --no-output")
        })?;
        let mut name = output_base.into_os_string();
        name.push(suffix);
        let path = PathBuf::from(name);
        check_overwrite(&path, args.overwrite)?;
        Some(path)
    } else {
        None
    };

    Ok(ProcessPlan {
        origin: args.origin,
        source,
        input_write,
        output,
        info,
        visualize: args.visualize,
        overwrite: args.overwrite,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::EXIT_USAGE;

    fn targetdb() -> ProcessArgs {
        ProcessArgs {
            origin: Origin::Targetdb,
            input: None,
            pattern: None,
            versions: "latest".into(),
            unique_version: None,
            forced: Vec::new(),
            write_input: true,
            sets: true,
            placeholders: false,
            write_output: true,
            visualize: false,
            overwrite: false,
        }
    }

    fn rsconfig(input: &str) -> ProcessArgs {
        ProcessArgs {
            origin: Origin::Rsconfig,
            input: Some(input.into()),
            write_input: false,
            ..targetdb()
        }
    }

    #[test]
    fn targetdb_names() {
        assert_eq!(targetdb_basename(true, VersionMode::Latest, false), "Cartons_all_Versions_latest");
        assert_eq!(targetdb_basename(false, VersionMode::All, true), "Cartons_sample_Versions_all_and_forced");
        assert_eq!(targetdb_basename(true, VersionMode::Single(83), false), "Cartons_all_Version_83");
    }

    #[test]
    fn targetdb_plan_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = targetdb();
        args.placeholders = true;
        args.pattern = Some("bhm_rm_*".into());
        args.forced = vec![("bhm_rm_core".into(), 5)];
        let plan = plan_process(&args, dir.path()).unwrap();

        let folder = dir.path().join("targetdb");
        assert_eq!(
            plan.input_write.as_deref(),
            Some(folder.join("Cartons_sample_Versions_latest_and_forced.txt").as_path())
        );
        assert_eq!(
            plan.output.as_deref(),
            Some(folder.join("Info_Cartons_sample_Versions_latest_and_forced_all.csv").as_path())
        );
        match plan.source {
            CartonSource::Catalog { pattern, policy } => {
                assert_eq!(pattern.as_str(), "bhm_rm_*");
                assert_eq!(policy.forced_versions.get("bhm_rm_core"), Some(&5));
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn list_plan_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("rsconfig")).unwrap();
        std::fs::write(dir.path().join("rsconfig/rs_0.5.0.txt"), "").unwrap();

        let mut args = rsconfig("rs_0.5.0.txt");
        args.sets = false;
        args.placeholders = true;
        let plan = plan_process(&args, dir.path()).unwrap();
        assert_eq!(plan.input_write, None);
        assert_eq!(
            plan.output.unwrap(),
            dir.path().join("rsconfig/Info_rs_0.5.0_magplaceholders.csv")
        );
        assert_eq!(plan.source, CartonSource::List(dir.path().join("rsconfig/rs_0.5.0.txt")));
    }

    #[test]
    fn invalid_combinations_fail_with_usage() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("custom")).unwrap();
        std::fs::write(dir.path().join("custom/list.txt"), "").unwrap();

        let mut cases = Vec::new();

        let mut a = rsconfig("list.txt");
        a.origin = Origin::Custom;
        a.write_input = true;
        cases.push(a);

        cases.push(rsconfig("missing.txt"));

        let mut a = rsconfig("list.txt");
        a.origin = Origin::Custom;
        a.input = None;
        cases.push(a);

        let mut a = targetdb();
        a.versions = "single".into();
        cases.push(a);

        let mut a = targetdb();
        a.write_input = false;
        cases.push(a);

        let mut a = targetdb();
        a.sets = false;
        a.placeholders = false;
        cases.push(a);

        let mut a = targetdb();
        a.versions = "newest".into();
        cases.push(a);

        for args in cases {
            let err = plan_process(&args, dir.path()).unwrap_err();
            assert_eq!(err.code, EXIT_USAGE, "{args:?} -> {}", err.message);
        }
    }

    #[test]
    fn no_output_skips_output_checks() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = targetdb();
        args.write_input = false;
        args.write_output = false;
        args.sets = false;
        let plan = plan_process(&args, dir.path()).unwrap();
        assert!(plan.output.is_none());
        assert!(plan.input_write.is_none());
    }

    #[test]
    fn existing_files_need_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("targetdb");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("Cartons_all_Versions_latest.txt"), "").unwrap();

        let err = plan_process(&targetdb(), dir.path()).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(err.hint.is_some());

        let mut args = targetdb();
        args.overwrite = true;
        assert!(plan_process(&args, dir.path()).is_ok());
    }

    #[test]
    fn forced_argument_parsing() {
        assert_eq!(parse_forced("bhm_rm_core=5").unwrap(), ("bhm_rm_core".to_string(), 5));
        assert!(parse_forced("bhm_rm_core").is_err());
        assert!(parse_forced("=5").is_err());
        assert!(parse_forced("x=five").is_err());
    }

    #[test]
    fn parameters_cover_every_flag() {
        let params = targetdb().parameters();
        assert_eq!(params.len(), 13);
        assert!(params.contains(&("all_cartons", "true".to_string())));
        assert!(params.contains(&("forced_versions", "None".to_string())));
    }
}
