//! On-disk duration-matrix format.
//!
//! A duration matrix is a CSV table whose first row carries the time scale
//! (`start;goal;t0;t1;...`) and whose remaining rows each describe one
//! directed edge: origin, target, then one traversal duration per time-scale
//! breakpoint. Times are normalized so the scale starts at zero.

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::{
    environment::{Environment, EnvironmentConfig, LocationSpec},
    error::{Error, Result},
};

/// One edge row of a duration matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRow {
    pub origin: String,
    pub target: String,
    pub durations: Vec<f64>,
}

/// An in-memory duration matrix: a time scale plus edge rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationMatrix {
    time_scale: Vec<f64>,
    rows: Vec<EdgeRow>,
}

impl DurationMatrix {
    /// Assemble a matrix, checking every row against the time-scale width.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DurationTableMismatch`] on the first row whose
    /// duration count differs from the time-scale length.
    pub fn new(time_scale: Vec<f64>, rows: Vec<EdgeRow>) -> Result<Self> {
        for row in &rows {
            if row.durations.len() != time_scale.len() {
                return Err(Error::DurationTableMismatch {
                    origin: row.origin.clone(),
                    target: row.target.clone(),
                    expected: time_scale.len(),
                    got: row.durations.len(),
                });
            }
        }
        Ok(Self { time_scale, rows })
    }

    pub fn time_scale(&self) -> &[f64] {
        &self.time_scale
    }

    pub fn rows(&self) -> &[EdgeRow] {
        &self.rows
    }

    /// Parse a matrix from a CSV file with the given single-byte separator.
    ///
    /// The first cell of the time-scale row becomes the zero origin: all
    /// breakpoints are shifted by it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedMatrix`] on short rows or unparseable
    /// numbers (with the offending row index), [`Error::Csv`] on reader
    /// failures, and the width-mismatch error of [`DurationMatrix::new`].
    pub fn from_csv_path<P: AsRef<Path>>(path: P, separator: u8) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(separator)
            .has_headers(false)
            .flexible(true)
            .from_path(path.as_ref())?;

        let mut time_scale: Vec<f64> = Vec::new();
        let mut rows: Vec<EdgeRow> = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() < 3 {
                return Err(Error::MalformedMatrix {
                    row: index,
                    message: format!("expected at least 3 cells, got {}", record.len()),
                });
            }
            let values: Vec<f64> = record
                .iter()
                .skip(2)
                .map(|cell| {
                    cell.trim().parse::<f64>().map_err(|_| Error::MalformedMatrix {
                        row: index,
                        message: format!("cannot parse '{cell}' as a number"),
                    })
                })
                .collect::<Result<_>>()?;
            if index == 0 {
                let origin = values[0];
                time_scale = values.iter().map(|t| t - origin).collect();
            } else {
                rows.push(EdgeRow {
                    origin: record[0].trim().to_string(),
                    target: record[1].trim().to_string(),
                    durations: values,
                });
            }
        }
        if time_scale.is_empty() {
            return Err(Error::MalformedMatrix {
                row: 0,
                message: "missing time-scale row".to_string(),
            });
        }
        Self::new(time_scale, rows)
    }

    /// Write the matrix as CSV with the given single-byte separator.
    pub fn to_csv_path<P: AsRef<Path>>(&self, path: P, separator: u8) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(separator)
            .from_path(path.as_ref())?;
        let mut header: Vec<String> = vec!["start".to_string(), "goal".to_string()];
        header.extend(self.time_scale.iter().map(|t| t.to_string()));
        writer.write_record(&header)?;
        for row in &self.rows {
            let mut cells: Vec<String> = vec![row.origin.clone(), row.target.clone()];
            cells.extend(row.durations.iter().map(|d| d.to_string()));
            writer.write_record(&cells)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Environment {
    /// Build an environment from a duration matrix.
    ///
    /// Locations are created in first-appearance order (origin before
    /// target, row by row); the location named by `config.goal_location` is
    /// flagged as the goal.
    pub fn from_matrix(matrix: &DurationMatrix, config: &EnvironmentConfig) -> Result<Self> {
        let mut specs: Vec<LocationSpec> = Vec::new();
        let mut ensure = |name: &str, specs: &mut Vec<LocationSpec>| {
            if !specs.iter().any(|s| s.name == name) {
                specs.push(LocationSpec::new(name, name == config.goal_location));
            }
        };
        for row in matrix.rows() {
            ensure(&row.origin, &mut specs);
            ensure(&row.target, &mut specs);
        }
        for row in matrix.rows() {
            let spec = specs
                .iter_mut()
                .find(|s| s.name == row.origin)
                .expect("origin location was just ensured");
            spec.edges.push((row.target.clone(), row.durations.clone()));
        }
        Environment::new(config, matrix.time_scale().to_vec(), specs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> DurationMatrix {
        DurationMatrix::new(
            vec![0.0, 10.0],
            vec![
                EdgeRow {
                    origin: "A".to_string(),
                    target: "B".to_string(),
                    durations: vec![10.0, 20.0],
                },
                EdgeRow {
                    origin: "B".to_string(),
                    target: "goal".to_string(),
                    durations: vec![5.0, 5.0],
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.csv");
        let matrix = sample_matrix();
        matrix.to_csv_path(&path, b';').unwrap();
        let reloaded = DurationMatrix::from_csv_path(&path, b';').unwrap();
        assert_eq!(matrix, reloaded);
    }

    #[test]
    fn time_scale_is_normalized_to_zero_origin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.csv");
        std::fs::write(&path, "start;goal;100;110\nA;B;1;2\n").unwrap();
        let matrix = DurationMatrix::from_csv_path(&path, b';').unwrap();
        assert_eq!(matrix.time_scale(), &[0.0, 10.0]);
    }

    #[test]
    fn short_row_is_rejected_with_row_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.csv");
        std::fs::write(&path, "start;goal;0;10\nA;B\n").unwrap();
        let result = DurationMatrix::from_csv_path(&path, b';');
        assert!(matches!(result, Err(Error::MalformedMatrix { row: 1, .. })));
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let result = DurationMatrix::new(
            vec![0.0, 10.0],
            vec![EdgeRow {
                origin: "A".to_string(),
                target: "B".to_string(),
                durations: vec![1.0],
            }],
        );
        assert!(matches!(result, Err(Error::DurationTableMismatch { .. })));
    }

    #[test]
    fn environment_from_matrix_marks_goal() {
        let config = EnvironmentConfig::default();
        let env = Environment::from_matrix(&sample_matrix(), &config).unwrap();
        let goal = env.find_location("goal").unwrap();
        assert!(env.location(goal).is_goal());
        assert_eq!(env.locations().len(), 3);
        assert_eq!(env.location(env.find_location("A").unwrap()).edges().len(), 1);
    }
}
