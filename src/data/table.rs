//! CSV Dataset Loading
//!
//! Reads a headered CSV file into memory and extracts named numeric
//! columns as feature matrices and label vectors.

use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use ndarray::{Array1, Array2};

use crate::error::{PipelineError, Result};

/// An in-memory CSV table: one header row plus data rows.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl Table {
    /// Reads `path` as a headered CSV file.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = csv::Reader::from_reader(file);

        let headers = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?);
        }

        if rows.is_empty() {
            return Err(PipelineError::Schema(format!(
                "{} contains a header but no data rows",
                path.as_ref().display()
            )));
        }

        Ok(Self { headers, rows })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Position of `name` in the header row.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Extracts the named columns as a row-major numeric matrix, keeping
    /// file row order.
    pub fn numeric_columns(&self, columns: &[String]) -> Result<Array2<f64>> {
        let indices = self.resolve_columns(columns)?;

        let mut matrix = Array2::zeros((self.rows.len(), columns.len()));
        for (i, row) in self.rows.iter().enumerate() {
            for (j, &idx) in indices.iter().enumerate() {
                matrix[[i, j]] = self.parse_cell(row, idx, &columns[j], i)?;
            }
        }
        Ok(matrix)
    }

    /// Extracts the feature matrix and the binary label vector in one pass.
    ///
    /// Row order is preserved, so `labels[i]` belongs to `features.row(i)`.
    pub fn select_features(
        &self,
        feature_columns: &[String],
        label_column: &str,
    ) -> Result<(Array2<f64>, Array1<f64>)> {
        let features = self.numeric_columns(feature_columns)?;

        let label_idx = self.column_index(label_column).ok_or_else(|| {
            PipelineError::Schema(format!("column `{}` not found in header", label_column))
        })?;

        let mut labels = Array1::zeros(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            let value = self.parse_cell(row, label_idx, label_column, i)?;
            if value != 0.0 && value != 1.0 {
                return Err(PipelineError::Schema(format!(
                    "column `{}`, row {}: label must be 0 or 1, got {}",
                    label_column,
                    i + 1,
                    value
                )));
            }
            labels[i] = value;
        }

        Ok((features, labels))
    }

    fn resolve_columns(&self, columns: &[String]) -> Result<Vec<usize>> {
        columns
            .iter()
            .map(|name| {
                self.column_index(name).ok_or_else(|| {
                    PipelineError::Schema(format!("column `{}` not found in header", name))
                })
            })
            .collect()
    }

    fn parse_cell(&self, row: &StringRecord, idx: usize, column: &str, row_no: usize) -> Result<f64> {
        let cell = row.get(idx).ok_or_else(|| {
            PipelineError::Schema(format!(
                "column `{}`, row {}: field is missing",
                column,
                row_no + 1
            ))
        })?;

        let value = cell.trim().parse::<f64>().map_err(|_| {
            PipelineError::Schema(format!(
                "column `{}`, row {}: cannot parse `{}` as a number",
                column,
                row_no + 1,
                cell
            ))
        })?;

        // `NaN` and `inf` parse as floats, so finiteness needs its own check.
        if !value.is_finite() {
            return Err(PipelineError::Schema(format!(
                "column `{}`, row {}: `{}` is not a finite number",
                column,
                row_no + 1,
                cell
            )));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn feature_names() -> Vec<String> {
        vec![
            "Age".to_string(),
            "BloodPressure".to_string(),
            "Glucose".to_string(),
        ]
    }

    #[test]
    fn test_load_and_select() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "risk.csv",
            "Age,BloodPressure,Glucose,Risk\n\
             34,120,85,0\n\
             61,145,160,1\n\
             48,130,110,0\n",
        );

        let table = Table::from_csv_path(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.headers().len(), 4);

        let (features, labels) = table.select_features(&feature_names(), "Risk").unwrap();
        assert_eq!(features.dim(), (3, 3));
        assert_eq!(features[[1, 2]], 160.0);
        assert_eq!(labels.to_vec(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_row_order_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "risk.csv",
            "Age,Risk\n10,0\n20,1\n30,1\n40,0\n",
        );

        let table = Table::from_csv_path(&path).unwrap();
        let (features, labels) = table
            .select_features(&["Age".to_string()], "Risk")
            .unwrap();

        assert_eq!(features.column(0).to_vec(), vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(labels.to_vec(), vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Table::from_csv_path("does_not_exist.csv").unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }

    #[test]
    fn test_missing_column_names_the_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "risk.csv", "Age,Risk\n34,0\n");

        let table = Table::from_csv_path(&path).unwrap();
        let err = table.select_features(&feature_names(), "Risk").unwrap_err();

        match err {
            PipelineError::Schema(msg) => assert!(msg.contains("`BloodPressure`")),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_cell_names_column_and_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "risk.csv",
            "Age,BloodPressure,Glucose,Risk\n34,120,85,0\n61,abc,160,1\n",
        );

        let table = Table::from_csv_path(&path).unwrap();
        let err = table.select_features(&feature_names(), "Risk").unwrap_err();

        match err {
            PipelineError::Schema(msg) => {
                assert!(msg.contains("`BloodPressure`"));
                assert!(msg.contains("row 2"));
                assert!(msg.contains("`abc`"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_cell_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "risk.csv",
            "Age,BloodPressure,Glucose,Risk\n34,120,NaN,0\n",
        );

        let table = Table::from_csv_path(&path).unwrap();
        let err = table.select_features(&feature_names(), "Risk").unwrap_err();

        match err {
            PipelineError::Schema(msg) => {
                assert!(msg.contains("`Glucose`"));
                assert!(msg.contains("not a finite number"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_binary_label_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "risk.csv",
            "Age,BloodPressure,Glucose,Risk\n34,120,85,2\n",
        );

        let table = Table::from_csv_path(&path).unwrap();
        let err = table.select_features(&feature_names(), "Risk").unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }

    #[test]
    fn test_empty_file_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "risk.csv", "Age,BloodPressure,Glucose,Risk\n");

        let err = Table::from_csv_path(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }
}
