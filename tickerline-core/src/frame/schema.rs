use polars::prelude::*;
use thiserror::Error;

/// Expected columns of a bar frame.
pub struct BarFrameSchema;

/// Expected columns of a split-event frame.
pub struct SplitFrameSchema;

impl BarFrameSchema {
    /// Optional transaction-count column.
    pub const TRANSACTIONS: &'static str = "transactions";

    /// Required bar columns and their types
    pub fn schema() -> Schema {
        Schema::from_iter(vec![
            Field::new("date".into(), DataType::Date),
            Field::new("ticker".into(), DataType::String),
            Field::new("open".into(), DataType::Float64),
            Field::new("high".into(), DataType::Float64),
            Field::new("low".into(), DataType::Float64),
            Field::new("close".into(), DataType::Float64),
            Field::new("volume".into(), DataType::UInt64),
        ])
    }

    pub fn validate(df: &DataFrame) -> Result<(), FrameError> {
        validate_against(df, &Self::schema())
    }
}

impl SplitFrameSchema {
    pub fn schema() -> Schema {
        Schema::from_iter(vec![
            Field::new("ticker".into(), DataType::String),
            Field::new("date".into(), DataType::Date),
            Field::new("split_from".into(), DataType::Float64),
            Field::new("split_to".into(), DataType::Float64),
        ])
    }

    pub fn validate(df: &DataFrame) -> Result<(), FrameError> {
        validate_against(df, &Self::schema())
    }
}

fn validate_against(df: &DataFrame, expected: &Schema) -> Result<(), FrameError> {
    let actual = df.schema();

    for field in expected.iter_fields() {
        let actual_dtype = actual
            .get(field.name())
            .ok_or_else(|| FrameError::MissingColumn(field.name().to_string()))?;
        if actual_dtype != field.dtype() {
            return Err(FrameError::TypeMismatch {
                column: field.name().to_string(),
                expected: field.dtype().clone(),
                actual: actual_dtype.clone(),
            });
        }
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("Null value in column {column} at row {row}")]
    NullValue { column: String, row: usize },

    #[error("Row count mismatch: frame has {frame} rows, records have {records}")]
    LengthMismatch { frame: usize, records: usize },

    #[error("Invalid cumulative factor {value} at row {row} (must be finite and > 0)")]
    InvalidFactor { row: usize, value: f64 },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}
