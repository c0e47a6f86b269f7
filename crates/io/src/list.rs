// Carton list files: one carton per row, `| carton | plan | category | stage | active |`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use cartons_recon::model::NO_CATEGORY;
use cartons_recon::CartonRequest;

use crate::error::IoError;
use crate::{check_overwrite, delimiter_byte};

/// Leading index column plus the five request fields.
const MIN_FIELDS: usize = 6;

const LIST_COLUMNS: [&str; 5] = ["carton", "plan", "category", "stage", "active"];

/// Read a carton list. Field 0 is an index column and is ignored; fields 1..=5
/// are carton, plan, category, stage and active, trimmed.
pub fn read_carton_list(path: &Path, delimiter: char, header_rows: usize) -> Result<Vec<CartonRequest>, IoError> {
    let file = File::open(path).map_err(|source| IoError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte(delimiter)?)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut requests = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if index < header_rows {
            continue;
        }
        if record.len() < MIN_FIELDS {
            return Err(IoError::ShortRow {
                path: path.to_path_buf(),
                line: record.position().map(|p| p.line()).unwrap_or(index as u64 + 1),
                fields: record.len(),
                expected: MIN_FIELDS,
            });
        }
        let mut request =
            CartonRequest::new(&record[1], &record[2], &record[3]).with_bookkeeping(&record[4], &record[5]);
        if matches!(&record[3], "" | NO_CATEGORY) {
            request.category = None;
        }
        requests.push(request);
    }

    info!(path = %path.display(), cartons = requests.len(), "read carton list");
    Ok(requests)
}

/// Write `requests` as a fixed-width list that [`read_carton_list`] reads back
/// with one header row.
pub fn write_carton_list(
    path: &Path,
    requests: &[CartonRequest],
    delimiter: char,
    overwrite: bool,
) -> Result<(), IoError> {
    check_overwrite(path, overwrite)?;
    delimiter_byte(delimiter)?;

    let rows: Vec<[&str; 5]> = requests
        .iter()
        .map(|r| [r.name.as_str(), r.plan.as_str(), r.category_label(), r.stage.as_str(), r.active.as_str()])
        .collect();

    let mut widths = LIST_COLUMNS.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let file = File::create(path).map_err(|source| IoError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);

    let line = |cells: &[&str; 5]| -> String {
        let mut s = String::new();
        s.push(delimiter);
        for (cell, width) in cells.iter().zip(widths) {
            s.push_str(&format!(" {cell:>width$} "));
            s.push(delimiter);
        }
        s
    };

    writeln!(out, "{}", line(&LIST_COLUMNS))?;
    for row in &rows {
        writeln!(out, "{}", line(row))?;
    }
    out.flush()?;

    info!(path = %path.display(), cartons = rows.len(), "wrote carton list");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fixed_width_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rsconfig.txt");
        std::fs::write(
            &path,
            "|              carton |  plan |   category | stage | active |\n\
             |         bhm_rm_core | 0.5.0 |    science |   srd |      y |\n\
             | ops_std_boss_lowext | 0.5.0 | standard_boss |  none |  n |\n",
        )
        .unwrap();

        let requests = read_carton_list(&path, '|', 1).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].name, "bhm_rm_core");
        assert_eq!(requests[0].plan, "0.5.0");
        assert_eq!(requests[0].category.as_deref(), Some("science"));
        assert_eq!(requests[0].stage, "srd");
        assert_eq!(requests[0].active, "y");
        assert_eq!(requests[1].category.as_deref(), Some("standard_boss"));
    }

    #[test]
    fn short_row_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "| carton | plan | category | stage | active |\n| a | 0.5.0 |\n").unwrap();

        let err = read_carton_list(&path, '|', 1).unwrap_err();
        match err {
            IoError::ShortRow { line, fields, .. } => {
                assert_eq!(line, 2);
                assert_eq!(fields, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn written_list_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cartons_all_Versions_latest.txt");
        let requests = vec![
            CartonRequest::new("mwm_yso_disk_apogee", "1.0.0", "science"),
            CartonRequest {
                category: None,
                ..CartonRequest::new("ops_sky_boss", "1.0.0", "")
            }
            .with_bookkeeping("srd", "y"),
        ];
        write_carton_list(&path, &requests, '|', false).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let first = text.lines().next().unwrap();
        assert!(first.starts_with('|'));
        assert!(first.contains("carton"));
        assert!(first.ends_with('|'));
        assert!(text.lines().nth(2).unwrap().contains(" None |"));

        let back = read_carton_list(&path, '|', 1).unwrap();
        assert_eq!(back, requests);
    }

    #[test]
    fn existing_list_is_not_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        std::fs::write(&path, "keep").unwrap();

        let err = write_carton_list(&path, &[], '|', false).unwrap_err();
        assert!(matches!(err, IoError::Exists(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep");

        write_carton_list(&path, &[], '|', true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("carton"));
    }
}
