//! Where raw survey tables come from.
//!
//! [`TableSource`] is the seam between the accessor and storage;
//! [`CsvDirectory`] reads the extracts from a directory of CSV files.

mod csv_dir;

pub use csv_dir::CsvDirectory;

use std::io::{Read, Write};

use crate::catalog::Dataset;
use crate::error::{Result, SurveyError};
use crate::relation::{Relation, Value};

/// Cells read as null, matching the markers survey tooling commonly writes.
const NULL_MARKERS: &[&str] = &[
    "", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A", "<NA>",
];

/// Loads one raw dataset, optionally restricted to `columns`.
pub trait TableSource {
    fn read(&self, dataset: Dataset, columns: Option<&[&str]>) -> Result<Relation>;
}

/// Decodes CSV into a [`Relation`] named `name`.
///
/// When `columns` is given only those columns are kept, in file order; any
/// requested column missing from the header is an error. Each column is typed
/// from its non-null cells: integers, then floats, then `True`/`False`,
/// otherwise text.
pub fn read_relation<R: Read>(name: &str, reader: R, columns: Option<&[&str]>) -> Result<Relation> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let keep: Vec<usize> = match columns {
        None => (0..headers.len()).collect(),
        Some(wanted) => {
            if let Some(missing) = wanted.iter().find(|c| !headers.iter().any(|h| h == **c)) {
                return Err(SurveyError::UnknownColumn {
                    dataset: name.to_string(),
                    column: missing.to_string(),
                });
            }
            headers
                .iter()
                .enumerate()
                .filter(|(_, h)| wanted.contains(h))
                .map(|(i, _)| i)
                .collect()
        }
    };

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); keep.len()];
    for record in rdr.records() {
        let record = record?;
        for (slot, &i) in keep.iter().enumerate() {
            let cell = record.get(i).unwrap_or("");
            cells[slot].push((!NULL_MARKERS.contains(&cell)).then(|| cell.to_string()));
        }
    }

    let mut relation = Relation::empty(name);
    for (slot, &i) in keep.iter().enumerate() {
        relation.set_column(&headers[i], infer_column(std::mem::take(&mut cells[slot])))?;
    }
    Ok(relation)
}

/// Encodes `relation` as CSV with a header row.
pub fn write_relation<W: Write>(relation: &Relation, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(relation.column_names())?;
    for row in relation.rows() {
        wtr.write_record(
            relation
                .column_names()
                .iter()
                .map(|c| row.get(c).to_string()),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

fn infer_column(cells: Vec<Option<String>>) -> Vec<Value> {
    let present = || cells.iter().flatten();

    if present().all(|c| c.parse::<i64>().is_ok()) {
        cells
            .into_iter()
            .map(|c| c.and_then(|c| c.parse().ok()).map_or(Value::Null, Value::Int))
            .collect()
    } else if present().all(|c| c.parse::<f64>().is_ok()) {
        cells
            .into_iter()
            .map(|c| c.and_then(|c| c.parse().ok()).map_or(Value::Null, Value::Float))
            .collect()
    } else if present().all(|c| c == "True" || c == "False") {
        cells
            .into_iter()
            .map(|c| c.map_or(Value::Null, |c| Value::Bool(c == "True")))
            .collect()
    } else {
        cells.into_iter().map(Value::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        "hhid,hhsize,cumdist,owner,flag\nH1,2,1.5,Yes,True\nH2,,Missing,NA,False\n";

    #[test]
    fn test_read_infers_column_types() {
        let rel = read_relation("households", SAMPLE.as_bytes(), None).unwrap();

        assert_eq!(rel.len(), 2);
        assert_eq!(rel.column("hhsize").unwrap(), &[Value::Int(2), Value::Null]);
        // a single non-numeric cell keeps the whole column textual
        assert_eq!(rel.column("cumdist").unwrap()[0], Value::text("1.5"));
        assert_eq!(rel.column("owner").unwrap()[1], Value::Null);
        assert_eq!(rel.column("flag").unwrap()[1], Value::Bool(false));
    }

    #[test]
    fn test_read_selected_columns_in_file_order() {
        let rel = read_relation("households", SAMPLE.as_bytes(), Some(&["owner", "hhid"])).unwrap();
        assert_eq!(rel.column_names(), &["hhid".to_string(), "owner".to_string()]);
    }

    #[test]
    fn test_read_unknown_column_fails() {
        let err = read_relation("households", SAMPLE.as_bytes(), Some(&["nope"])).unwrap_err();
        assert!(matches!(err, SurveyError::UnknownColumn { .. }));
    }

    #[test]
    fn test_write_then_read_back() {
        let rel = read_relation("households", SAMPLE.as_bytes(), None).unwrap();
        let mut buf = Vec::new();
        write_relation(&rel, &mut buf).unwrap();

        let back = read_relation("households", buf.as_slice(), None).unwrap();
        assert_eq!(back, rel);
    }
}
