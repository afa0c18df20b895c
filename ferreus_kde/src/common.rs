/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides dataset generation, CSV loading and line-per-point output helpers.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::error::{KdeError, KdeResult};
use csv::ReaderBuilder;
use faer::{Mat, MatRef};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Generate a matrix of random points in the unit hypercube.
///
/// # Parameters
/// - `n`: Number of points to generate (rows in the output matrix).
/// - `d`: Number of spatial dimensions per point (columns in the output matrix).
/// - `seed`: Optional random seed.
///   - If `Some(seed)` is provided, the same sequence of points will be generated
///     deterministically across runs and platforms (useful for reproducible tests).
///   - If `None`, the generator is seeded from the operating system's randomness source.
///
/// # Returns
/// A `Mat<f64>` of shape `(n, d)` where each element lies in `[0.0, 1.0)`.
///
/// # Example
/// ```
/// use ferreus_kde::generate_random_points;
///
/// // Generate 100 reproducible 3D points
/// let pts = generate_random_points(100, 3, Some(42));
/// assert_eq!(pts.ncols(), 3);
/// ```
pub fn generate_random_points(n: usize, d: usize, seed: Option<u64>) -> Mat<f64> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    Mat::from_fn(n, d, |_, _| rng.random_range(0.0..1.0))
}

/// Load a CSV file of point coordinates, one point per record.
///
/// # Arguments
/// * `file_path` - Path to the CSV file.
/// * `has_headers` - Whether the file has a single header row to skip.
///
/// # Returns
/// On success, a `Mat<f64>` with one row per record and one column per field.
pub fn csv_to_point_array<P: AsRef<Path>>(file_path: P, has_headers: bool) -> KdeResult<Mat<f64>> {
    let path_ref = file_path.as_ref();
    let file = File::open(path_ref).map_err(|e| KdeError::Io {
        path: path_ref.to_path_buf(),
        source: e,
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(has_headers)
        .from_reader(file);

    let mut data = Vec::new();
    let mut num_rows = 0;
    let mut num_cols = 0;

    for (record_index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| KdeError::Csv {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        if num_cols == 0 {
            num_cols = record.len();
        } else if record.len() != num_cols {
            return Err(KdeError::RaggedRecord {
                path: path_ref.to_path_buf(),
                record: record_index,
                expected: num_cols,
                found: record.len(),
            });
        }

        for value in record.iter() {
            let parsed_value: f64 = value.trim().parse().map_err(|_| KdeError::Parse {
                path: path_ref.to_path_buf(),
                record: record_index,
                value: value.to_string(),
            })?;
            data.push(parsed_value);
        }

        num_rows += 1;
    }

    Ok(MatRef::from_row_major_slice(data.as_slice(), num_rows, num_cols).to_owned())
}

/// Writes one value per line.
pub fn write_values<W: Write>(values: &[f64], writer: W) -> std::io::Result<()> {
    let mut w = BufWriter::new(writer);
    for value in values {
        writeln!(w, "{}", value)?;
    }
    w.flush()
}

/// Writes one value per line to the file at `path`, replacing it if it exists.
pub fn save_values<P: AsRef<Path>>(values: &[f64], path: P) -> KdeResult<()> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|e| KdeError::Io {
        path: path_ref.to_path_buf(),
        source: e,
    })?;
    write_values(values, file).map_err(|e| KdeError::Io {
        path: path_ref.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_round_trip_through_values() {
        let dir = std::env::temp_dir();
        let path = dir.join("ferreus_kde_points.csv");
        std::fs::write(&path, "x,y\n0.5,1.0\n-2.0,3.25\n").unwrap();

        let points = csv_to_point_array(&path, true).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(points.nrows(), 2);
        assert_eq!(points.ncols(), 2);
        assert_eq!(points[(1, 0)], -2.0);
        assert_eq!(points[(1, 1)], 3.25);
    }

    #[test]
    fn ragged_and_bad_records_are_reported() {
        let dir = std::env::temp_dir();
        let ragged = dir.join("ferreus_kde_ragged.csv");
        std::fs::write(&ragged, "1.0,2.0\n3.0\n").unwrap();
        let result = csv_to_point_array(&ragged, false);
        let _ = std::fs::remove_file(&ragged);
        assert!(matches!(
            result,
            Err(KdeError::RaggedRecord { .. }) | Err(KdeError::Csv { .. })
        ));

        let bad = dir.join("ferreus_kde_bad.csv");
        std::fs::write(&bad, "1.0,abc\n").unwrap();
        let result = csv_to_point_array(&bad, false);
        let _ = std::fs::remove_file(&bad);
        assert!(matches!(result, Err(KdeError::Parse { record: 0, .. })));
    }

    #[test]
    fn values_are_written_one_per_line() {
        let mut buffer = Vec::new();
        write_values(&[0.25, 1.0, 1e-20], &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let parsed: Vec<f64> = text.lines().map(|l| l.parse().unwrap()).collect();
        assert_eq!(parsed, vec![0.25, 1.0, 1e-20]);
    }

    #[test]
    fn seeded_points_are_reproducible() {
        let a = generate_random_points(20, 2, Some(5));
        let b = generate_random_points(20, 2, Some(5));
        assert_eq!(a, b);
    }
}
