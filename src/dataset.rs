//! Training set loading.
//!
//! The training set is a headed CSV table with one historical sale per row.
//! Column names are a deployment contract and are matched exactly.

use std::io;
use std::path::PathBuf;

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

pub const SQUARE_FOOTAGE_COLUMN: &str = "Square Footage";
pub const BEDROOMS_COLUMN: &str = "Number of Bedrooms";
pub const PRICE_COLUMN: &str = "Price ($)";

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("failed to read the training set: {0}")]
    Read(#[from] csv::Error),

    #[error("the training set is missing the `{column}` column")]
    MissingColumn { column: &'static str },

    #[error("malformed `{column}` value {value:?} on line {line}")]
    MalformedRow {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("the training set is empty")]
    Empty,
}

/// One historical sale record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingRow {
    pub square_footage: f64,
    pub bedrooms: u32,
    pub price: f64,
}

pub trait TrainingSource: Send + Sync {
    /// Reads the whole training set, failing on the first malformed row.
    fn load(&self) -> Result<Vec<TrainingRow>, DataSourceError>;

    /// Human-readable source name for the logs.
    fn describe(&self) -> String;
}

/// Reads the training set from a CSV file on disk.
pub struct CsvTrainingSource {
    path: PathBuf,
}

impl CsvTrainingSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TrainingSource for CsvTrainingSource {
    fn load(&self) -> Result<Vec<TrainingRow>, DataSourceError> {
        let reader = ReaderBuilder::new().trim(Trim::All).from_path(&self.path)?;
        read_rows(reader)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
pub struct InMemoryTrainingSource {
    rows: Vec<TrainingRow>,
}

#[cfg(test)]
impl InMemoryTrainingSource {
    pub const fn new(rows: Vec<TrainingRow>) -> Self {
        Self { rows }
    }
}

#[cfg(test)]
impl TrainingSource for InMemoryTrainingSource {
    fn load(&self) -> Result<Vec<TrainingRow>, DataSourceError> {
        Ok(self.rows.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory rows", self.rows.len())
    }
}

/// Positions of the required columns within a header.
struct Columns {
    square_footage: usize,
    bedrooms: usize,
    price: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, DataSourceError> {
        let position = |column: &'static str| {
            headers
                .iter()
                .position(|header| header == column)
                .ok_or(DataSourceError::MissingColumn { column })
        };
        Ok(Self {
            square_footage: position(SQUARE_FOOTAGE_COLUMN)?,
            bedrooms: position(BEDROOMS_COLUMN)?,
            price: position(PRICE_COLUMN)?,
        })
    }
}

fn read_rows<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<TrainingRow>, DataSourceError> {
    let columns = Columns::locate(reader.headers()?)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(parse_row(&record?, &columns)?);
    }
    match rows.is_empty() {
        false => Ok(rows),
        true => Err(DataSourceError::Empty),
    }
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Result<TrainingRow, DataSourceError> {
    let line = record.position().map_or(0, |position| position.line());
    let field = |index: usize, column: &'static str| {
        record.get(index).ok_or_else(|| DataSourceError::MalformedRow {
            line,
            column,
            value: String::new(),
        })
    };
    let malformed = |column: &'static str, value: &str| DataSourceError::MalformedRow {
        line,
        column,
        value: value.to_string(),
    };

    let value = field(columns.square_footage, SQUARE_FOOTAGE_COLUMN)?;
    let square_footage = parse_positive(value).ok_or_else(|| malformed(SQUARE_FOOTAGE_COLUMN, value))?;

    let value = field(columns.bedrooms, BEDROOMS_COLUMN)?;
    let bedrooms = value
        .parse::<u32>()
        .map_err(|_| malformed(BEDROOMS_COLUMN, value))?;

    let value = field(columns.price, PRICE_COLUMN)?;
    let price = parse_positive(value).ok_or_else(|| malformed(PRICE_COLUMN, value))?;

    Ok(TrainingRow {
        square_footage,
        bedrooms,
        price,
    })
}

fn parse_positive(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}
