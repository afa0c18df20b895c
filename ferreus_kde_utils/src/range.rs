/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements a closed real interval used for density and distance bounds.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, BitOr, BitOrAssign, Mul, MulAssign};

/// A closed interval `[lo, hi]` of real numbers.
///
/// Addition follows interval arithmetic, `|` takes the hull of two intervals
/// and multiplication by a non-negative scalar scales both ends.
///
/// # Examples
///
/// ```
/// use ferreus_kde_utils::Range;
///
/// let mut r = Range::new(1.0, 2.0);
/// r += Range::new(0.5, 0.5);
/// r |= Range::new(0.0, 1.0);
///
/// assert_eq!(r, Range::new(0.0, 2.5));
/// assert_eq!(r.width(), 2.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub lo: f64,
    pub hi: f64,
}

impl Range {
    /// Creates the interval `[lo, hi]`.
    #[inline(always)]
    pub const fn new(lo: f64, hi: f64) -> Self {
        Range { lo, hi }
    }

    /// The degenerate interval `[0, 0]`.
    #[inline(always)]
    pub const fn zero() -> Self {
        Range { lo: 0.0, hi: 0.0 }
    }

    /// The empty set, the identity of the hull operation.
    #[inline(always)]
    pub const fn empty() -> Self {
        Range {
            lo: f64::INFINITY,
            hi: f64::NEG_INFINITY,
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    #[inline(always)]
    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    #[inline(always)]
    pub fn mid(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }

    #[inline(always)]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }
}

impl Default for Range {
    fn default() -> Self {
        Range::zero()
    }
}

impl Add for Range {
    type Output = Range;

    #[inline(always)]
    fn add(self, rhs: Range) -> Range {
        Range::new(self.lo + rhs.lo, self.hi + rhs.hi)
    }
}

impl AddAssign for Range {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Range) {
        self.lo += rhs.lo;
        self.hi += rhs.hi;
    }
}

impl AddAssign<f64> for Range {
    #[inline(always)]
    fn add_assign(&mut self, rhs: f64) {
        self.lo += rhs;
        self.hi += rhs;
    }
}

impl Mul<f64> for Range {
    type Output = Range;

    #[inline(always)]
    fn mul(self, rhs: f64) -> Range {
        Range::new(self.lo * rhs, self.hi * rhs)
    }
}

impl MulAssign<f64> for Range {
    #[inline(always)]
    fn mul_assign(&mut self, rhs: f64) {
        self.lo *= rhs;
        self.hi *= rhs;
    }
}

impl BitOr for Range {
    type Output = Range;

    #[inline(always)]
    fn bitor(self, rhs: Range) -> Range {
        Range::new(self.lo.min(rhs.lo), self.hi.max(rhs.hi))
    }
}

impl BitOrAssign for Range {
    #[inline(always)]
    fn bitor_assign(&mut self, rhs: Range) {
        self.lo = self.lo.min(rhs.lo);
        self.hi = self.hi.max(rhs.hi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_hull_identity() {
        let mut r = Range::empty();
        assert!(r.is_empty());

        r |= Range::new(2.0, 3.0);
        assert_eq!(r, Range::new(2.0, 3.0));

        r |= Range::new(-1.0, 0.5);
        assert_eq!(r, Range::new(-1.0, 3.0));
    }

    #[test]
    fn scalar_ops() {
        let mut r = Range::new(1.0, 3.0);
        r += 1.0;
        assert_eq!(r, Range::new(2.0, 4.0));
        r *= 0.5;
        assert_eq!(r, Range::new(1.0, 2.0));
        assert_eq!(r.mid(), 1.5);
        assert!(r.contains(1.5));
        assert!(!r.contains(2.5));
    }
}
