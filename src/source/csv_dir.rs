use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{TableSource, read_relation};
use crate::catalog::Dataset;
use crate::error::Result;
use crate::relation::Relation;

/// Reads the survey extracts from `<root>/<dataset file>`.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    root: PathBuf,
}

impl CsvDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, dataset: Dataset) -> PathBuf {
        self.root.join(dataset.file_name())
    }
}

impl TableSource for CsvDirectory {
    fn read(&self, dataset: Dataset, columns: Option<&[&str]>) -> Result<Relation> {
        let path = self.path_for(dataset);
        debug!(path = %path.display(), ?columns, "Reading survey extract");
        let file = File::open(&path)?;
        read_relation(dataset.name(), BufReader::new(file), columns)
    }
}
