//! Persistence of processed tables.
//!
//! Every table in the result store becomes `<name>_processed.csv` (or
//! `.csv.gz`) in the output directory, next to a `run_summary.json` index.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::pipeline::ResultStore;
use crate::relation::Relation;
use crate::source::write_relation;

/// Index document written next to the processed tables.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub gzip: bool,
    pub tables: Vec<TableSummary>,
}

#[derive(Debug, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub file: String,
    pub rows: usize,
    pub columns: usize,
}

/// File name of a processed table.
pub fn processed_file_name(name: &str, gzip: bool) -> String {
    if gzip {
        format!("{name}_processed.csv.gz")
    } else {
        format!("{name}_processed.csv")
    }
}

/// Writes one relation as CSV to `path`, gzip-compressed when asked.
pub fn write_table(relation: &Relation, path: &Path, gzip: bool) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_relation(relation, &mut encoder)?;
        encoder.finish()?.flush()?;
    } else {
        let mut file = file;
        write_relation(relation, &mut file)?;
        file.flush()?;
    }
    Ok(())
}

/// Writes every stored table into `dir`, creating it if absent, and records
/// the run in `run_summary.json`.
#[tracing::instrument(skip_all, fields(dir = %dir.display(), tables = store.len(), gzip = gzip))]
pub fn save_processed_data(store: &ResultStore, dir: &Path, gzip: bool) -> Result<RunSummary> {
    fs::create_dir_all(dir)?;

    let mut tables = Vec::with_capacity(store.len());
    for (name, relation) in store.iter() {
        let file = processed_file_name(name, gzip);
        let path: PathBuf = dir.join(&file);
        write_table(relation, &path, gzip)?;
        info!(table = name, path = %path.display(), rows = relation.len(), "Saved table");
        print_preview(relation);

        tables.push(TableSummary {
            name: name.to_string(),
            file,
            rows: relation.len(),
            columns: relation.width(),
        });
    }

    let summary = RunSummary {
        generated_at: Utc::now(),
        gzip,
        tables,
    };
    let mut index = BufWriter::new(File::create(dir.join("run_summary.json"))?);
    serde_json::to_writer_pretty(&mut index, &summary)?;
    index.flush()?;
    Ok(summary)
}

/// Logs the first rows of a table at debug level.
pub fn print_preview(relation: &Relation) {
    let names = relation.column_names().join(",");
    debug!(table = relation.name(), columns = %names, "Preview");
    for row in relation.rows().take(5) {
        let cells: Vec<String> = relation
            .column_names()
            .iter()
            .map(|c| row.get(c).to_string())
            .collect();
        debug!(table = relation.name(), row = row.index(), "{}", cells.join(","));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::Value;
    use crate::source::read_relation;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn store() -> ResultStore {
        let mut store = ResultStore::new();
        store.insert(
            "households",
            Relation::from_columns(
                "households",
                vec![
                    ("hhid", vec![Value::text("H1"), Value::text("H2")]),
                    ("household_income", vec![Value::Float(84_499.0), Value::Float(267_249.5)]),
                    ("income_bracket", vec![Value::text("Middle (50000 - 100000]"), Value::Null]),
                    ("is_city", vec![Value::Int(1), Value::Int(0)]),
                ],
            )
            .unwrap(),
        );
        store.insert(
            "master",
            Relation::from_columns("master", vec![("persid", vec![Value::text("P1")])]).unwrap(),
        );
        store
    }

    #[test]
    fn test_print_preview_does_not_panic() {
        print_preview(&store().require("households").unwrap());
    }

    #[test]
    fn test_save_creates_directory_and_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("processed");

        let summary = save_processed_data(&store(), &dir, false).unwrap();

        assert!(dir.join("households_processed.csv").exists());
        assert!(dir.join("master_processed.csv").exists());
        assert!(dir.join("run_summary.json").exists());
        assert_eq!(summary.tables.len(), 2);
        assert_eq!(summary.tables[0].name, "households");
        assert_eq!(summary.tables[0].rows, 2);
    }

    #[test]
    fn test_round_trip_keeps_numbers() {
        let tmp = tempfile::tempdir().unwrap();
        save_processed_data(&store(), tmp.path(), false).unwrap();

        let file = File::open(tmp.path().join("households_processed.csv")).unwrap();
        let back = read_relation("households", file, None).unwrap();
        let original = store().require("households").unwrap();

        assert_eq!(back.len(), original.len());
        assert_eq!(
            back.column("household_income").unwrap(),
            original.column("household_income").unwrap()
        );
        assert_eq!(back.column("is_city").unwrap(), original.column("is_city").unwrap());
        assert_eq!(back.row(1).get("income_bracket"), &Value::Null);
    }

    #[test]
    fn test_gzip_output() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = save_processed_data(&store(), tmp.path(), true).unwrap();
        assert_eq!(summary.tables[1].file, "master_processed.csv.gz");

        let mut text = String::new();
        GzDecoder::new(File::open(tmp.path().join("master_processed.csv.gz")).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "persid\nP1\n");
    }

    #[test]
    fn test_rerun_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        save_processed_data(&store(), tmp.path(), false).unwrap();
        save_processed_data(&store(), tmp.path(), false).unwrap();

        let content = fs::read_to_string(tmp.path().join("master_processed.csv")).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
