//! Lobby Spatial Index
//!
//! An n-dimensional kd-tree answering inclusive axis-aligned range queries.
//!
//! # Model
//!
//! Every entry is a [`Point`] (one `f64` per dimension) paired with a value.
//! A query is a [`Bounds`] box; an entry matches when
//! `min[i] <= point[i] <= max[i]` holds for every dimension `i`.
//!
//! Duplicate points are legal. Two values inserted at the same coordinate are
//! both kept and both returned by any box that covers that coordinate.
//!
//! # Balancing
//!
//! [`KdTree::bulk_load`] builds a balanced tree by recursive median
//! partitioning on the axis of widest spread. Incremental inserts descend the
//! tree and rebuild it from scratch once the insertion depth exceeds
//! `2 * bit_length(len) + REBALANCE_SLACK`.
//!
//! # Dimensionality
//!
//! The dimension count is fixed when the tree is created. Inserting a point or
//! querying a box of another dimensionality is a caller contract violation and
//! is reported as [`IndexError::DimensionMismatch`].

mod kdtree;
mod point;

pub use kdtree::{Iter, KdTree};
pub use point::{Bounds, Point};

use thiserror::Error;

/// Extra depth tolerated above `2 * bit_length(len)` before a rebuild.
pub const REBALANCE_SLACK: usize = 4;

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Contract violations detected by the index.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    /// A point or box does not have the tree's dimensionality.
    #[error("dimension mismatch: index has {expected} dimensions, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A coordinate, bound, or radius is NaN or infinite.
    #[error("non-finite value {value} in dimension {dimension}")]
    NonFinite { dimension: usize, value: f64 },

    /// A box has `min > max` in some dimension.
    #[error("inverted bounds in dimension {dimension}: min {min} > max {max}")]
    InvertedBounds { dimension: usize, min: f64, max: f64 },
}

/// Operations the matching core needs from a spatial index.
///
/// [`KdTree`] is the production implementation; tests may substitute any
/// in-memory structure honouring the same contract.
pub trait SpatialIndex<V> {
    /// Number of dimensions every point and box must have.
    fn dimensions(&self) -> usize;

    /// Add a value at `point`. Duplicate coordinates are retained.
    fn insert(&mut self, point: Point, value: V) -> Result<()>;

    /// Every value whose point lies inside `bounds` (inclusive), in no
    /// particular order.
    fn range(&self, bounds: &Bounds) -> Result<Vec<&V>>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Whether the index holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
