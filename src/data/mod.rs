//! `DataFrame` module for named column containers.
//!
//! Holds the cases a cross-validation run partitions. Columns are either
//! numeric or categorical; categorical columns usually carry grouping
//! variables for clustered cross-validation.

use serde::{Deserialize, Serialize};

use crate::error::{CvError, Result};

/// A single named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum Column {
    /// Numeric values.
    Numeric(Vec<f64>),
    /// Categorical labels.
    Categorical(Vec<String>),
}

impl Column {
    /// Number of elements in the column.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Categorical(v) => v.len(),
        }
    }

    /// Returns true if the column has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Label of row `idx`, used to build cluster keys.
    fn label(&self, idx: usize) -> String {
        match self {
            Self::Numeric(v) => format!("{}", v[idx]),
            Self::Categorical(v) => v[idx].clone(),
        }
    }

    fn take(&self, indices: &[usize]) -> Self {
        match self {
            Self::Numeric(v) => Self::Numeric(indices.iter().map(|&i| v[i]).collect()),
            Self::Categorical(v) => {
                Self::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// A minimal `DataFrame` with named columns.
///
/// # Examples
///
/// ```
/// use crossfold::data::{Column, DataFrame};
///
/// let df = DataFrame::new(vec![
///     ("x".to_string(), Column::Numeric(vec![1.0, 2.0, 3.0])),
///     ("g".to_string(), Column::Categorical(vec!["a".into(), "b".into(), "a".into()])),
/// ])
/// .expect("columns have equal length");
/// assert_eq!(df.shape(), (3, 2));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    columns: Vec<(String, Column)>,
    n_rows: usize,
}

impl DataFrame {
    /// Creates a new `DataFrame` from named columns.
    ///
    /// # Errors
    ///
    /// Returns an error if columns have different lengths, names are empty
    /// or duplicated, or no columns are given.
    pub fn new(columns: Vec<(String, Column)>) -> Result<Self> {
        if columns.is_empty() {
            return Err(CvError::InvalidData(
                "DataFrame must have at least one column".into(),
            ));
        }

        let n_rows = columns[0].1.len();

        for (name, col) in &columns {
            if col.len() != n_rows {
                return Err(CvError::DimensionMismatch {
                    expected: format!("{n_rows} rows"),
                    actual: format!("{} rows in column '{name}'", col.len()),
                });
            }
            if name.is_empty() {
                return Err(CvError::InvalidData("Column names cannot be empty".into()));
            }
        }

        let mut names: Vec<&str> = columns.iter().map(|(n, _)| n.as_str()).collect();
        names.sort_unstable();
        if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(CvError::InvalidData(format!(
                "Duplicate column name '{}'",
                dup[0]
            )));
        }

        Ok(Self { columns, n_rows })
    }

    /// Convenience constructor for all-numeric frames.
    ///
    /// # Errors
    ///
    /// Same as [`DataFrame::new`].
    pub fn from_numeric(columns: Vec<(&str, Vec<f64>)>) -> Result<Self> {
        Self::new(
            columns
                .into_iter()
                .map(|(n, v)| (n.to_string(), Column::Numeric(v)))
                .collect(),
        )
    }

    /// Returns the shape as (`n_rows`, `n_cols`).
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.columns.len())
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Returns the column names.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Returns true if a column with this name exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    /// Returns a reference to a column by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column doesn't exist.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| CvError::ColumnNotFound(name.to_string()))
    }

    /// Returns a numeric column as a slice.
    ///
    /// # Errors
    ///
    /// Returns an error if the column doesn't exist or is categorical.
    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        match self.column(name)? {
            Column::Numeric(v) => Ok(v),
            Column::Categorical(_) => Err(CvError::InvalidData(format!(
                "column '{name}' is categorical, expected numeric"
            ))),
        }
    }

    /// Adds a new column to the `DataFrame`.
    ///
    /// # Errors
    ///
    /// Returns an error if column length doesn't match or name already exists.
    pub fn add_column(&mut self, name: String, data: Column) -> Result<()> {
        if data.len() != self.n_rows {
            return Err(CvError::dimension_mismatch(&name, self.n_rows, data.len()));
        }
        if name.is_empty() {
            return Err(CvError::InvalidData("Column name cannot be empty".into()));
        }
        if self.has_column(&name) {
            return Err(CvError::InvalidData(format!(
                "Column '{name}' already exists"
            )));
        }

        self.columns.push((name, data));
        Ok(())
    }

    /// Returns a new frame holding the given rows, in the given order.
    #[must_use]
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.take(indices)))
                .collect(),
            n_rows: indices.len(),
        }
    }

    /// Returns a new frame without the excluded rows, original order kept.
    #[must_use]
    pub fn without_rows(&self, excluded: &[usize]) -> Self {
        let mut keep = vec![true; self.n_rows];
        for &i in excluded {
            if i < self.n_rows {
                keep[i] = false;
            }
        }
        let kept: Vec<usize> = (0..self.n_rows).filter(|&i| keep[i]).collect();
        self.take_rows(&kept)
    }

    /// Builds one key per row from the combined values of `variables`.
    ///
    /// A key holds one value per variable, so rows share a key exactly when
    /// they share every value.
    ///
    /// # Errors
    ///
    /// Returns an error if `variables` is empty or names a missing column.
    pub fn cluster_keys(&self, variables: &[String]) -> Result<Vec<ClusterKey>> {
        if variables.is_empty() {
            return Err(CvError::InvalidRequest(
                "at least one cluster variable is required".into(),
            ));
        }
        let cols = variables
            .iter()
            .map(|v| self.column(v))
            .collect::<Result<Vec<_>>>()?;

        Ok((0..self.n_rows)
            .map(|i| cols.iter().map(|c| c.label(i)).collect())
            .collect())
    }
}

/// Values of the grouping variables for one row, in variable order.
pub type ClusterKey = Vec<String>;

/// Display form of a cluster key, values joined with `.`.
///
/// Not unique across keys; group by the key itself.
#[must_use]
pub fn cluster_label(key: &[String]) -> String {
    key.join(".")
}

#[cfg(test)]
#[path = "data_tests.rs"]
mod tests;
