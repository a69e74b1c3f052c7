//! Cumulative-factor adjustment over a frame with caller-chosen columns.

use polars::prelude::*;

use super::schema::FrameError;

/// Add `adj_<column>` for each listed column using a per-row cumulative factor.
///
/// Division columns (prices) are divided by the factor, product columns
/// (volume, shares outstanding) multiplied by it. Nulls in the factor column
/// become 1.0 before any arithmetic; the filled factor replaces the original
/// column. Present factors that are non-finite or not positive are rejected.
pub fn adjust_frame_with_factor(
    df: &DataFrame,
    factor_column: &str,
    division_columns: &[&str],
    product_columns: &[&str],
) -> Result<DataFrame, FrameError> {
    for name in std::iter::once(&factor_column)
        .chain(division_columns)
        .chain(product_columns)
    {
        if df.column(name).is_err() {
            return Err(FrameError::MissingColumn(name.to_string()));
        }
    }

    let factors = df.column(factor_column)?.cast(&DataType::Float64)?;
    let bad = factors
        .f64()?
        .iter()
        .enumerate()
        .find_map(|(row, v)| v.filter(|f| !(f.is_finite() && *f > 0.0)).map(|f| (row, f)));
    if let Some((row, value)) = bad {
        return Err(FrameError::InvalidFactor { row, value });
    }

    let factor = col(factor_column)
        .cast(DataType::Float64)
        .fill_null(lit(1.0));

    let mut exprs = vec![factor.clone().alias(factor_column)];
    for name in division_columns {
        exprs.push((col(*name).cast(DataType::Float64) / factor.clone()).alias(format!("adj_{name}")));
    }
    for name in product_columns {
        exprs.push((col(*name).cast(DataType::Float64) * factor.clone()).alias(format!("adj_{name}")));
    }

    Ok(df.clone().lazy().with_columns(exprs).collect()?)
}
