/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the error type returned by density estimator construction and dataset I/O.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring a density estimate or moving data to and from disk.
///
/// Configuration errors are detected before any tree is built, so a
/// [`FastKde`](crate::FastKde) that constructs successfully always runs to completion.
#[derive(Debug, Error)]
pub enum KdeError {
    /// The kernel bandwidth is zero, negative or not finite.
    #[error("kernel bandwidth must be positive and finite, got {0}")]
    InvalidBandwidth(f64),

    /// The target relative error is zero, negative or not finite.
    #[error("relative error must be positive and finite, got {0}")]
    InvalidRelativeError(f64),

    /// Leaf nodes must be allowed to hold at least one point.
    #[error("leaf size must be at least 1, got {0}")]
    InvalidLeafSize(usize),

    /// Query and reference points live in different spaces.
    #[error("query points have {query} columns but reference points have {reference}")]
    DimensionMismatch { query: usize, reference: usize },

    /// The series expansion order is too high for the data dimension.
    #[error("expansion order {order} in {dimension} dimensions needs {num_terms} terms")]
    ExpansionTooLarge {
        order: usize,
        dimension: usize,
        num_terms: f64,
    },

    /// A point set has no rows or no columns.
    #[error("{which} point set is empty")]
    EmptyDataset { which: &'static str },

    /// A file could not be opened, created or written.
    #[error("I/O failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A CSV record could not be read or written.
    #[error("CSV failure on {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },

    /// A CSV field is not a number.
    #[error("could not parse '{value}' on record {record} of {}", .path.display())]
    Parse {
        path: PathBuf,
        record: usize,
        value: String,
    },

    /// A CSV record has a different number of fields from the first record.
    #[error("record {record} of {} has {found} fields, expected {expected}", .path.display())]
    RaggedRecord {
        path: PathBuf,
        record: usize,
        expected: usize,
        found: usize,
    },

    /// Parameters could not be serialized to or parsed from JSON.
    #[error("JSON failure on {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Convenience alias for results produced by this crate.
pub type KdeResult<T> = Result<T, KdeError>;
