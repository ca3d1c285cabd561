use std::io::Read;
use std::path::{Path, PathBuf};

use super::{CriteriaError, Grid, GridSource};

/// Reads the criteria grid from a CSV export of the worksheet.
#[derive(Debug, Clone)]
pub struct CsvGridSource {
    path: PathBuf,
}

impl CsvGridSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl GridSource for CsvGridSource {
    fn describe(&self) -> String {
        format!("CSV file {}", self.path.display())
    }

    fn read_grid(&self) -> Result<Grid, CriteriaError> {
        let file = std::fs::File::open(&self.path)?;
        read_csv_grid(file)
    }
}

/// Header handling is left to the grid parser, so every record is returned.
pub fn read_csv_grid<R: Read>(reader: R) -> Result<Grid, CriteriaError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut grid = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        grid.push(record.iter().map(str::to_string).collect());
    }
    Ok(grid)
}
