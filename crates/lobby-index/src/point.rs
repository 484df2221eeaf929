//! Points and axis-aligned boxes in n-dimensional space.
//!
//! A [`Point`] is an owned vector of `f64` coordinates. A [`Bounds`] is an
//! inclusive hyper-rectangle `[min, max]` with one interval per dimension.

use std::ops::{Add, Index, Sub};

use crate::{IndexError, Result};

/// A position in n-dimensional attribute space.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point(Vec<f64>);

impl Point {
    /// A point with every coordinate equal to `value`.
    pub fn splat(dimensions: usize, value: f64) -> Self {
        Self(vec![value; dimensions])
    }

    /// Number of coordinates.
    #[inline]
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    /// Coordinate in `dimension`, if it exists.
    #[inline]
    pub fn get(&self, dimension: usize) -> Option<f64> {
        self.0.get(dimension).copied()
    }

    /// Fail unless every coordinate is finite.
    pub fn ensure_finite(&self) -> Result<()> {
        match self.0.iter().position(|c| !c.is_finite()) {
            Some(dimension) => Err(IndexError::NonFinite {
                dimension,
                value: self.0[dimension],
            }),
            None => Ok(()),
        }
    }

    /// Fail unless the point has exactly `expected` coordinates.
    pub fn ensure_dimensions(&self, expected: usize) -> Result<()> {
        if self.dimensions() != expected {
            return Err(IndexError::DimensionMismatch {
                expected,
                found: self.dimensions(),
            });
        }
        Ok(())
    }
}

impl From<Vec<f64>> for Point {
    fn from(coords: Vec<f64>) -> Self {
        Self(coords)
    }
}

impl<const N: usize> From<[f64; N]> for Point {
    fn from(coords: [f64; N]) -> Self {
        Self(coords.to_vec())
    }
}

impl FromIterator<f64> for Point {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Index<usize> for Point {
    type Output = f64;

    #[inline]
    fn index(&self, dimension: usize) -> &f64 {
        &self.0[dimension]
    }
}

// Component-wise arithmetic; both operands must share dimensionality.
impl Add<&Point> for &Point {
    type Output = Point;

    fn add(self, other: &Point) -> Point {
        debug_assert_eq!(self.dimensions(), other.dimensions());
        self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect()
    }
}

impl Sub<&Point> for &Point {
    type Output = Point;

    fn sub(self, other: &Point) -> Point {
        debug_assert_eq!(self.dimensions(), other.dimensions());
        self.0.iter().zip(&other.0).map(|(a, b)| a - b).collect()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, ")")
    }
}

/// An inclusive axis-aligned box.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    min: Point,
    max: Point,
}

impl Bounds {
    /// Create a box from its corners.
    ///
    /// Both corners must have the same dimensionality, be finite, and satisfy
    /// `min[i] <= max[i]`.
    pub fn new(min: Point, max: Point) -> Result<Self> {
        max.ensure_dimensions(min.dimensions())?;
        min.ensure_finite()?;
        max.ensure_finite()?;
        for dimension in 0..min.dimensions() {
            if min[dimension] > max[dimension] {
                return Err(IndexError::InvertedBounds {
                    dimension,
                    min: min[dimension],
                    max: max[dimension],
                });
            }
        }
        Ok(Self { min, max })
    }

    /// The box `[center - radii, center + radii]`.
    ///
    /// Edges that overflow saturate at `f64::MIN` / `f64::MAX`, so a huge
    /// radius covers the whole axis. A negative radius produces
    /// [`IndexError::InvertedBounds`].
    pub fn around(center: &Point, radii: &Point) -> Result<Self> {
        radii.ensure_dimensions(center.dimensions())?;
        center.ensure_finite()?;
        radii.ensure_finite()?;
        Self::new(saturate(center - radii), saturate(center + radii))
    }

    /// A box covering all of space in `dimensions` dimensions.
    pub fn everything(dimensions: usize) -> Self {
        Self {
            min: Point::splat(dimensions, f64::MIN),
            max: Point::splat(dimensions, f64::MAX),
        }
    }

    /// Lower corner.
    pub fn min(&self) -> &Point {
        &self.min
    }

    /// Upper corner.
    pub fn max(&self) -> &Point {
        &self.max
    }

    /// Number of dimensions.
    pub fn dimensions(&self) -> usize {
        self.min.dimensions()
    }

    /// Whether `point` lies inside the box, edges included.
    pub fn contains(&self, point: &Point) -> bool {
        point.dimensions() == self.dimensions()
            && (0..self.dimensions())
                .all(|d| self.min[d] <= point[d] && point[d] <= self.max[d])
    }
}

/// Clamp overflowed coordinates to the largest finite value of their sign.
fn saturate(point: Point) -> Point {
    point
        .0
        .into_iter()
        .map(|c| match c {
            c if c.is_finite() => c,
            c if c > 0.0 => f64::MAX,
            _ => f64::MIN,
        })
        .collect()
}

impl std::fmt::Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} .. {}]", self.min, self.max)
    }
}
