//! Shared, copy-on-write histogram bin edges.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Bin boundaries (the X axis) shared between event lists.
///
/// Cloning is cheap and shares the underlying vector. Only
/// [`BinEdges::make_mut`] copies, and only when the vector is shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinEdges(Arc<Vec<f64>>);

impl BinEdges {
    /// Wraps a vector of edges without validating it.
    #[must_use]
    pub fn new(edges: Vec<f64>) -> Self {
        Self(Arc::new(edges))
    }

    /// Creates `bins` equal-width bins spanning `[min, max]`.
    ///
    /// # Errors
    /// Returns an error if `bins` is 0, the bounds are not finite, or
    /// `max <= min`.
    #[allow(clippy::cast_precision_loss)]
    pub fn uniform(min: f64, max: f64, bins: usize) -> Result<Self> {
        if bins == 0 {
            return Err(Error::invalid_argument("bin count must be at least 1"));
        }
        if !(min.is_finite() && max.is_finite()) || max <= min {
            return Err(Error::invalid_argument(format!(
                "invalid bin range [{min}, {max}]"
            )));
        }
        let width = (max - min) / bins as f64;
        let mut edges: Vec<f64> = (0..bins).map(|i| min + width * i as f64).collect();
        edges.push(max);
        Ok(Self::new(edges))
    }

    /// Read-only view of the edges. Never copies.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Mutable access, copying the vector first if it is shared.
    pub fn make_mut(&mut self) -> &mut Vec<f64> {
        Arc::make_mut(&mut self.0)
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of bins described (edges - 1).
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Returns true if another list currently shares this vector.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.0) > 1
    }

    /// Returns true if both handles point at the same vector.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Checks the edges are usable for histogramming.
    ///
    /// # Errors
    /// Returns an error if there are fewer than two edges or they are not
    /// strictly increasing.
    pub fn validate(&self) -> Result<()> {
        validate_edges(&self.0)
    }
}

impl From<Vec<f64>> for BinEdges {
    fn from(edges: Vec<f64>) -> Self {
        Self::new(edges)
    }
}

/// Checks that `edges` has at least two strictly increasing values.
///
/// # Errors
/// Returns [`Error::InvalidArgument`] describing the first violation.
pub fn validate_edges(edges: &[f64]) -> Result<()> {
    if edges.len() < 2 {
        return Err(Error::invalid_argument(format!(
            "need at least 2 bin edges, got {}",
            edges.len()
        )));
    }
    let unordered = edges
        .windows(2)
        .position(|w| w[0].partial_cmp(&w[1]) != Some(Ordering::Less));
    if let Some(i) = unordered {
        return Err(Error::invalid_argument(format!(
            "bin edges not strictly increasing at index {}: {} >= {}",
            i + 1,
            edges[i],
            edges[i + 1]
        )));
    }
    Ok(())
}
