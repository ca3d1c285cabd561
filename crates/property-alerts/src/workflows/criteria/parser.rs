use tracing::{debug, warn};

use super::{CriteriaError, Grid};
use crate::workflows::search::{PropertyType, PropertyTypeFilter, SearchCriteria};

const DEFAULT_RADIUS_MILES: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Location,
    MinPrice,
    MaxPrice,
    MinBedrooms,
    MaxBedrooms,
    PropertyType,
    Radius,
}

impl Column {
    const ALL: [Self; 7] = [
        Self::Location,
        Self::MinPrice,
        Self::MaxPrice,
        Self::MinBedrooms,
        Self::MaxBedrooms,
        Self::PropertyType,
        Self::Radius,
    ];

    /// Position in the documented `Location | Min Price | ... | Radius` layout.
    const fn position(self) -> usize {
        self as usize
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Location => "Location",
            Self::MinPrice => "Min Price",
            Self::MaxPrice => "Max Price",
            Self::MinBedrooms => "Min Bedrooms",
            Self::MaxBedrooms => "Max Bedrooms",
            Self::PropertyType => "Property Type",
            Self::Radius => "Radius",
        }
    }

    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Location => &["location", "city", "area"],
            Self::MinPrice => &["min price", "min_price", "minimum price"],
            Self::MaxPrice => &["max price", "max_price", "maximum price"],
            Self::MinBedrooms => &["min bedrooms", "min_bedrooms", "minimum bedrooms"],
            Self::MaxBedrooms => &["max bedrooms", "max_bedrooms", "maximum bedrooms"],
            Self::PropertyType => &["property type", "property_type", "type"],
            Self::Radius => &["radius", "radius_miles", "radius (miles)"],
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
enum RowIssue {
    #[error("no location given")]
    MissingLocation,
    #[error("'{0}' is empty")]
    MissingValue(&'static str),
    #[error("'{column}' value '{value}' is not a whole number in range")]
    NotNumeric { column: &'static str, value: String },
    #[error("{0} minimum exceeds maximum")]
    InvertedBounds(&'static str),
}

/// Maps each column to its index, preferring the header text and falling back
/// to the documented position.
#[derive(Debug)]
struct ColumnMap {
    indices: [usize; 7],
}

impl ColumnMap {
    fn from_header(header: &[String]) -> Self {
        let normalized: Vec<String> = header
            .iter()
            .map(|cell| cell.trim().to_ascii_lowercase())
            .collect();

        let mut indices = [0; 7];
        for column in Column::ALL {
            let found = column
                .aliases()
                .iter()
                .find_map(|alias| normalized.iter().position(|cell| cell == alias));
            indices[column.position()] = match found {
                Some(index) => index,
                None => {
                    debug!(column = column.label(), "header not found, using position");
                    column.position()
                }
            };
        }
        Self { indices }
    }

    fn cell<'a>(&self, row: &'a [String], column: Column) -> &'a str {
        row.get(self.indices[column.position()])
            .map(|cell| cell.trim())
            .unwrap_or("")
    }

    fn required_number<T>(&self, row: &[String], column: Column) -> Result<T, RowIssue>
    where
        T: TryFrom<u64>,
    {
        let raw = self.cell(row, column);
        if raw.is_empty() {
            return Err(RowIssue::MissingValue(column.label()));
        }
        parse_whole_number(raw)
            .and_then(|value| T::try_from(value).ok())
            .ok_or_else(|| RowIssue::NotNumeric {
                column: column.label(),
                value: raw.to_string(),
            })
    }

    fn parse_row(&self, row: &[String], row_number: usize) -> Result<SearchCriteria, RowIssue> {
        let location = self.cell(row, Column::Location);
        if location.is_empty() {
            return Err(RowIssue::MissingLocation);
        }

        let min_price: u32 = self.required_number(row, Column::MinPrice)?;
        let max_price: u32 = self.required_number(row, Column::MaxPrice)?;
        let min_bedrooms: u8 = self.required_number(row, Column::MinBedrooms)?;
        let max_bedrooms: u8 = self.required_number(row, Column::MaxBedrooms)?;

        if min_price > max_price {
            return Err(RowIssue::InvertedBounds("price"));
        }
        if min_bedrooms > max_bedrooms {
            return Err(RowIssue::InvertedBounds("bedroom"));
        }

        let raw_type = self.cell(row, Column::PropertyType);
        let property_type = match raw_type.to_ascii_lowercase().as_str() {
            "" | "any" | "all" => PropertyTypeFilter::Any,
            _ => match PropertyType::parse(raw_type) {
                Some(kind) => PropertyTypeFilter::Only(kind),
                None => {
                    warn!(
                        row = row_number,
                        value = raw_type,
                        "unrecognised property type, searching all types"
                    );
                    PropertyTypeFilter::Any
                }
            },
        };

        let raw_radius = self.cell(row, Column::Radius);
        let radius_miles = if raw_radius.is_empty() {
            DEFAULT_RADIUS_MILES
        } else {
            match parse_miles(raw_radius) {
                Some(radius) => radius,
                None => {
                    warn!(
                        row = row_number,
                        value = raw_radius,
                        "unreadable radius, using default"
                    );
                    DEFAULT_RADIUS_MILES
                }
            }
        };

        Ok(SearchCriteria {
            location: location.to_string(),
            min_price,
            max_price,
            min_bedrooms,
            max_bedrooms,
            property_type,
            radius_miles,
        })
    }
}

/// Turns a worksheet grid into criteria. Row 1 is the header; unusable rows
/// are logged and skipped.
pub fn parse_grid(grid: &Grid) -> Result<Vec<SearchCriteria>, CriteriaError> {
    let Some((header, rows)) = grid.split_first() else {
        return Err(CriteriaError::EmptyWorksheet);
    };

    let columns = ColumnMap::from_header(header);
    let mut criteria = Vec::new();

    for (offset, row) in rows.iter().enumerate() {
        let row_number = offset + 2;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        match columns.parse_row(row, row_number) {
            Ok(parsed) => criteria.push(parsed),
            Err(issue) => warn!(row = row_number, %issue, "skipping criteria row"),
        }
    }

    if criteria.is_empty() {
        return Err(CriteriaError::NoValidRows);
    }
    Ok(criteria)
}

/// Accepts "£250,000", "$1200" and "3.0"; rejects negatives and fractions.
fn parse_whole_number(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '£' | '$' | '€' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(value) = cleaned.parse::<u64>() {
        return Some(value);
    }

    let value = cleaned.parse::<f64>().ok()?;
    let representable = value.is_finite() && value >= 0.0 && value.fract() == 0.0;
    (representable && value <= u64::MAX as f64).then_some(value as u64)
}

/// Accepts "0.5", "2.5 miles" and "10mi"; the radius may be fractional.
fn parse_miles(raw: &str) -> Option<f64> {
    let lowered = raw.trim().to_ascii_lowercase();
    let number = ["miles", "mile", "mi"]
        .iter()
        .find_map(|unit| lowered.strip_suffix(unit))
        .unwrap_or(&lowered)
        .trim();
    let value = number.parse::<f64>().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}
