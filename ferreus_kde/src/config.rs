/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares configuration types for the dual-tree density estimator.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Declares the run parameters for [`FastKde`](crate::FastKde) and the
//! series expansion order policy.
use crate::error::{KdeError, KdeResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Largest number of terms a series expansion may carry. Merging child
/// far-field expansions costs the square of this per tree node.
pub const MAX_EXPANSION_TERMS: usize = 1024;

/// Multi-index families available for the Gaussian series expansions.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExpansionFamily {
    /// Every coordinate of a multi-index is at most the order, giving
    /// `(order + 1)^dim` terms.
    Multiplicative,

    /// Coordinates of a multi-index sum to at most the order. Far fewer
    /// terms than [`ExpansionFamily::Multiplicative`] at equal order in
    /// higher dimensions.
    TotalDegree,
}

impl ExpansionFamily {
    /// Returns the default maximum expansion order for the given dimension.
    ///
    /// - `Multiplicative`: 5 up to 2D, 1 in 3D, 0 above.
    /// - `TotalDegree`: 7 up to 2D, 3 in 3D, 1 up to 5D, 0 above.
    ///
    /// Order 0 keeps only the leading coefficient, so expansions stay cheap
    /// (and rarely accepted) in high dimensions.
    pub fn default_max_order(&self, dimension: usize) -> usize {
        match self {
            ExpansionFamily::Multiplicative => match dimension {
                0..=2 => 5,
                3 => 1,
                _ => 0,
            },
            ExpansionFamily::TotalDegree => match dimension {
                0..=2 => 7,
                3 => 3,
                4 | 5 => 1,
                _ => 0,
            },
        }
    }

    /// Number of multi-indices of order at most `order` in `dimension` dimensions.
    /// Returned as a float so very large orders saturate instead of overflowing.
    pub fn num_terms(&self, order: usize, dimension: usize) -> f64 {
        match self {
            ExpansionFamily::Multiplicative => ((order + 1) as f64).powi(dimension as i32),
            // binomial(order + dimension, dimension)
            ExpansionFamily::TotalDegree => (1..=dimension)
                .map(|i| (order + i) as f64 / i as f64)
                .product::<f64>()
                .round(),
        }
    }
}

/// Parameters controlling a dual-tree kernel density estimate.
///
/// ### Default Values
/// - `relative_error`: `0.1`
/// - `leaf_size`: `20`
/// - `expansion_family`: [`ExpansionFamily::TotalDegree`]
/// - `expansion_order`: `None` (dimension dependent, see
///   [`ExpansionFamily::default_max_order`])
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct KdeParams {
    /// Maximum relative error allowed at every query point. Each estimate
    /// satisfies `|estimate - exact| <= relative_error * exact`.
    pub relative_error: f64,

    /// Maximum number of points held by a leaf of the query and reference trees.
    pub leaf_size: usize,

    /// Multi-index family used by the series expansions.
    pub expansion_family: ExpansionFamily,

    /// Maximum series expansion order. `None` uses the family's default for
    /// the data dimension.
    pub expansion_order: Option<usize>,
}

impl Default for KdeParams {
    fn default() -> Self {
        KdeParams {
            relative_error: 0.1,
            leaf_size: 20,
            expansion_family: ExpansionFamily::TotalDegree,
            expansion_order: None,
        }
    }
}

impl KdeParams {
    /// Returns a new [`KdeParamsBuilder`] populated with defaults.
    pub fn builder() -> KdeParamsBuilder {
        KdeParamsBuilder {
            params: KdeParams::default(),
        }
    }

    /// Maximum series expansion order used for data of the given dimension.
    pub fn max_expansion_order(&self, dimension: usize) -> usize {
        self.expansion_order
            .unwrap_or_else(|| self.expansion_family.default_max_order(dimension))
    }

    /// Checks the parameters are usable.
    pub fn validate(&self) -> KdeResult<()> {
        if !(self.relative_error.is_finite() && self.relative_error > 0.0) {
            return Err(KdeError::InvalidRelativeError(self.relative_error));
        }
        if self.leaf_size == 0 {
            return Err(KdeError::InvalidLeafSize(self.leaf_size));
        }
        Ok(())
    }

    /// Checks the series expansions stay within [`MAX_EXPANSION_TERMS`] for
    /// data of the given dimension.
    pub fn validate_expansion(&self, dimension: usize) -> KdeResult<()> {
        let order = self.max_expansion_order(dimension);
        let num_terms = self.expansion_family.num_terms(order, dimension);
        if num_terms > MAX_EXPANSION_TERMS as f64 {
            return Err(KdeError::ExpansionTooLarge {
                order,
                dimension,
                num_terms,
            });
        }
        Ok(())
    }

    /// Writes the parameters to `path` as pretty-printed JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> KdeResult<()> {
        let path_ref = path.as_ref();
        let file = File::create(path_ref).map_err(|e| KdeError::Io {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        let mut w = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut w, self).map_err(|e| KdeError::Json {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        w.flush().map_err(|e| KdeError::Io {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    /// Reads parameters previously written by [`KdeParams::save_json`] and validates them.
    pub fn load_json<P: AsRef<Path>>(path: P) -> KdeResult<Self> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref).map_err(|e| KdeError::Io {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        let params: KdeParams =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| KdeError::Json {
                path: path_ref.to_path_buf(),
                source: e,
            })?;
        params.validate()?;
        Ok(params)
    }
}

/// A convenience builder for constructing a [`KdeParams`] instance.
///
/// The builder should be called via the [`KdeParams::builder`] method.
///
/// See [`KdeParams`] for details on each field.
#[derive(Debug, Clone, Copy)]
pub struct KdeParamsBuilder {
    params: KdeParams,
}

impl KdeParamsBuilder {
    /// Sets the target relative error.
    pub fn relative_error(mut self, relative_error: f64) -> Self {
        self.params.relative_error = relative_error;
        self
    }

    /// Sets the maximum number of points per leaf.
    pub fn leaf_size(mut self, leaf_size: usize) -> Self {
        self.params.leaf_size = leaf_size;
        self
    }

    /// Sets the multi-index family used by the series expansions.
    pub fn expansion_family(mut self, expansion_family: ExpansionFamily) -> Self {
        self.params.expansion_family = expansion_family;
        self
    }

    /// Overrides the dimension dependent maximum expansion order.
    ///
    /// Pre-processing time grows with the square of the number of expansion
    /// terms, `(order + 1)^dim` for [`ExpansionFamily::Multiplicative`].
    /// Orders giving more than [`MAX_EXPANSION_TERMS`] terms are rejected
    /// when the estimator is built.
    pub fn expansion_order(mut self, expansion_order: usize) -> Self {
        self.params.expansion_order = Some(expansion_order);
        self
    }

    /// Builds and returns a [`KdeParams`] instance.
    pub fn build(self) -> KdeParams {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_orders_follow_dimension() {
        let p = KdeParams::default();
        assert_eq!(p.max_expansion_order(2), 7);
        assert_eq!(p.max_expansion_order(3), 3);
        assert_eq!(p.max_expansion_order(5), 1);
        assert_eq!(p.max_expansion_order(6), 0);

        let p = KdeParams::builder()
            .expansion_family(ExpansionFamily::Multiplicative)
            .build();
        assert_eq!(p.max_expansion_order(1), 5);
        assert_eq!(p.max_expansion_order(3), 1);
        assert_eq!(p.max_expansion_order(4), 0);

        let p = KdeParams::builder().expansion_order(2).build();
        assert_eq!(p.max_expansion_order(9), 2);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let p = KdeParams::builder().relative_error(0.0).build();
        assert!(matches!(p.validate(), Err(KdeError::InvalidRelativeError(_))));

        let p = KdeParams::builder().relative_error(f64::NAN).build();
        assert!(matches!(p.validate(), Err(KdeError::InvalidRelativeError(_))));

        let p = KdeParams::builder().leaf_size(0).build();
        assert!(matches!(p.validate(), Err(KdeError::InvalidLeafSize(0))));

        assert!(KdeParams::default().validate().is_ok());
    }

    #[test]
    fn term_counts_per_family() {
        assert_eq!(ExpansionFamily::Multiplicative.num_terms(5, 2), 36.0);
        assert_eq!(ExpansionFamily::TotalDegree.num_terms(7, 2), 36.0);
        assert_eq!(ExpansionFamily::TotalDegree.num_terms(3, 3), 20.0);
        assert_eq!(ExpansionFamily::TotalDegree.num_terms(0, 4), 1.0);
    }

    #[test]
    fn oversized_expansions_are_rejected() {
        // every default order fits
        for family in [ExpansionFamily::Multiplicative, ExpansionFamily::TotalDegree] {
            let p = KdeParams::builder().expansion_family(family).build();
            for dim in 1..=12 {
                assert!(p.validate_expansion(dim).is_ok(), "{family:?} in {dim}D");
            }
        }

        // 8^5 terms
        let p = KdeParams::builder()
            .expansion_family(ExpansionFamily::Multiplicative)
            .expansion_order(7)
            .build();
        assert!(p.validate_expansion(2).is_ok());
        assert!(matches!(
            p.validate_expansion(5),
            Err(KdeError::ExpansionTooLarge {
                order: 7,
                dimension: 5,
                ..
            })
        ));

        let p = KdeParams::builder().expansion_order(usize::MAX / 2).build();
        assert!(p.validate_expansion(3).is_err());
    }

    #[test]
    fn json_round_trip() {
        let path = std::env::temp_dir().join("ferreus_kde_params_round_trip.json");
        let params = KdeParams::builder()
            .relative_error(0.05)
            .leaf_size(8)
            .expansion_family(ExpansionFamily::Multiplicative)
            .expansion_order(3)
            .build();

        params.save_json(&path).unwrap();
        let loaded = KdeParams::load_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(params, loaded);
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("ferreus_kde_params_does_not_exist.json");
        assert!(matches!(KdeParams::load_json(path), Err(KdeError::Io { .. })));
    }
}
