mod file;
mod parser;
mod sheets;

use std::fmt::Debug;

use tracing::{info, warn};

use crate::workflows::search::SearchCriteria;

pub use file::{read_csv_grid, CsvGridSource};
pub use parser::parse_grid;
pub use sheets::{
    GoogleSheetsClient, HttpsConnector, SheetGateway, SheetGridSource, SheetOperationError,
};

/// Raw worksheet contents, one `Vec` per row, header included.
pub type Grid = Vec<Vec<String>>;

#[derive(Debug, thiserror::Error)]
pub enum CriteriaError {
    #[error(transparent)]
    Sheet(#[from] SheetOperationError),
    #[error("failed to read criteria file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid criteria CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("criteria source unavailable: {0}")]
    Unavailable(String),
    #[error("worksheet is empty")]
    EmptyWorksheet,
    #[error("no valid search rows found in the worksheet")]
    NoValidRows,
}

/// Anything that can hand back the criteria worksheet as a grid.
pub trait GridSource: Debug {
    fn describe(&self) -> String;
    fn read_grid(&self) -> Result<Grid, CriteriaError>;
}

/// Outcome of loading criteria. Callers always get at least one row, but can
/// tell real data from the degraded default.
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaBatch {
    Loaded(Vec<SearchCriteria>),
    Fallback {
        criteria: SearchCriteria,
        reason: String,
    },
}

impl CriteriaBatch {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn rows(&self) -> &[SearchCriteria] {
        match self {
            Self::Loaded(rows) => rows,
            Self::Fallback { criteria, .. } => std::slice::from_ref(criteria),
        }
    }

    pub fn into_rows(self) -> Vec<SearchCriteria> {
        match self {
            Self::Loaded(rows) => rows,
            Self::Fallback { criteria, .. } => vec![criteria],
        }
    }
}

#[derive(Debug)]
pub struct CriteriaLoader {
    source: Box<dyn GridSource>,
}

impl CriteriaLoader {
    pub fn new(source: Box<dyn GridSource>) -> Self {
        Self { source }
    }

    /// Never fails: any read or parse problem yields the fallback criteria.
    pub fn load(&self) -> CriteriaBatch {
        let origin = self.source.describe();
        match self.try_load() {
            Ok(rows) => {
                info!(%origin, rows = rows.len(), "loaded search criteria");
                CriteriaBatch::Loaded(rows)
            }
            Err(err) => {
                warn!(%origin, error = %err, "falling back to default search criteria");
                CriteriaBatch::Fallback {
                    criteria: SearchCriteria::fallback(),
                    reason: err.to_string(),
                }
            }
        }
    }

    fn try_load(&self) -> Result<Vec<SearchCriteria>, CriteriaError> {
        let grid = self.source.read_grid()?;
        parse_grid(&grid)
    }
}

/// Used when the spreadsheet client cannot even be constructed, so the loader
/// still degrades to the fallback criteria.
#[derive(Debug)]
pub struct UnavailableSource {
    description: String,
    error: String,
}

impl UnavailableSource {
    pub fn new(description: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            description: description.into(),
            error: error.to_string(),
        }
    }
}

impl GridSource for UnavailableSource {
    fn describe(&self) -> String {
        self.description.clone()
    }

    fn read_grid(&self) -> Result<Grid, CriteriaError> {
        Err(CriteriaError::Unavailable(self.error.clone()))
    }
}
