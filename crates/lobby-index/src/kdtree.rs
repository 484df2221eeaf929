//! kd-tree with median bulk loading and depth-triggered rebuilds.
//!
//! # Layout
//!
//! Each node stores one entry and the axis it splits on. Invariant for a node
//! splitting on axis `a` with coordinate `c`:
//!
//! - every entry in the left subtree has `point[a] <= c`
//! - every entry in the right subtree has `point[a] >= c`
//!
//! Ties may land on either side, so a range query descends left when
//! `min[a] <= c` and right when `max[a] >= c`.

use crate::{Bounds, IndexError, Point, Result, SpatialIndex, REBALANCE_SLACK};

struct Node<V> {
    point: Point,
    value: V,
    axis: usize,
    left: Option<Box<Node<V>>>,
    right: Option<Box<Node<V>>>,
}

impl<V> Node<V> {
    fn leaf(point: Point, value: V, axis: usize) -> Box<Self> {
        Box::new(Self {
            point,
            value,
            axis,
            left: None,
            right: None,
        })
    }

    /// Split coordinate; `None` only in a zero-dimensional tree.
    #[inline]
    fn split(&self) -> Option<f64> {
        self.point.get(self.axis)
    }
}

/// A kd-tree mapping n-dimensional points to values.
pub struct KdTree<V> {
    root: Option<Box<Node<V>>>,
    dimensions: usize,
    len: usize,
}

impl<V> KdTree<V> {
    /// Create an empty tree over `dimensions` dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            root: None,
            dimensions,
            len: 0,
        }
    }

    /// Build a balanced tree from `entries` in one pass.
    ///
    /// Fails on the first entry with the wrong dimensionality or a non-finite
    /// coordinate; no partial tree is returned.
    pub fn bulk_load<I>(dimensions: usize, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Point, V)>,
    {
        let entries = entries
            .into_iter()
            .map(|(point, value)| -> Result<_> {
                validate(&point, dimensions)?;
                Ok((point, value))
            })
            .collect::<Result<Vec<_>>>()?;

        let len = entries.len();
        Ok(Self {
            root: build(entries, dimensions),
            dimensions,
            len,
        })
    }

    /// Number of dimensions.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Longest root-to-leaf path, counted in nodes.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&Node<V>, usize)> =
            self.root.as_deref().map(|n| (n, 1)).into_iter().collect();
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.left.as_deref().map(|n| (n, depth + 1)));
            stack.extend(node.right.as_deref().map(|n| (n, depth + 1)));
        }
        deepest
    }

    /// Insert a value. Duplicate points are kept.
    pub fn insert(&mut self, point: Point, value: V) -> Result<()> {
        validate(&point, self.dimensions)?;

        let depth = insert_into(&mut self.root, point, value, 0, self.dimensions, 1);
        self.len += 1;

        if depth > max_balanced_depth(self.len) {
            self.rebalance();
        }
        Ok(())
    }

    /// Every value whose point lies inside `bounds`.
    pub fn range(&self, bounds: &Bounds) -> Result<Vec<&V>> {
        bounds.min().ensure_dimensions(self.dimensions)?;

        let mut found = Vec::new();
        let mut stack: Vec<&Node<V>> = self.root.as_deref().into_iter().collect();

        while let Some(node) = stack.pop() {
            if bounds.contains(&node.point) {
                found.push(&node.value);
            }

            match node.split() {
                Some(split) => {
                    if bounds.min()[node.axis] <= split {
                        stack.extend(node.left.as_deref());
                    }
                    if bounds.max()[node.axis] >= split {
                        stack.extend(node.right.as_deref());
                    }
                }
                None => {
                    stack.extend(node.left.as_deref());
                    stack.extend(node.right.as_deref());
                }
            }
        }

        Ok(found)
    }

    /// Iterate over all `(point, value)` entries in unspecified order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            stack: self.root.as_deref().into_iter().collect(),
        }
    }

    /// Remove every entry, keeping the dimensionality.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Rebuild the whole tree by median partitioning.
    pub fn rebalance(&mut self) {
        let entries = into_entries(self.root.take());
        self.root = build(entries, self.dimensions);
    }

    /// Consume the tree, returning its entries in unspecified order.
    pub fn into_entries(self) -> Vec<(Point, V)> {
        into_entries(self.root)
    }
}

impl<V> std::fmt::Debug for KdTree<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KdTree")
            .field("dimensions", &self.dimensions)
            .field("len", &self.len)
            .finish()
    }
}

impl<V> SpatialIndex<V> for KdTree<V> {
    fn dimensions(&self) -> usize {
        KdTree::dimensions(self)
    }

    fn insert(&mut self, point: Point, value: V) -> Result<()> {
        KdTree::insert(self, point, value)
    }

    fn range(&self, bounds: &Bounds) -> Result<Vec<&V>> {
        KdTree::range(self, bounds)
    }

    fn len(&self) -> usize {
        KdTree::len(self)
    }
}

/// Borrowing iterator over a [`KdTree`].
pub struct Iter<'a, V> {
    stack: Vec<&'a Node<V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a Point, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.left.as_deref());
        self.stack.extend(node.right.as_deref());
        Some((&node.point, &node.value))
    }
}

fn validate(point: &Point, dimensions: usize) -> Result<()> {
    if point.dimensions() != dimensions {
        return Err(IndexError::DimensionMismatch {
            expected: dimensions,
            found: point.dimensions(),
        });
    }
    point.ensure_finite()
}

/// Depth above which an incremental insert triggers a rebuild.
fn max_balanced_depth(len: usize) -> usize {
    let bit_length = (usize::BITS - len.leading_zeros()) as usize;
    2 * bit_length + REBALANCE_SLACK
}

#[inline]
fn next_axis(axis: usize, dimensions: usize) -> usize {
    if dimensions == 0 {
        0
    } else {
        (axis + 1) % dimensions
    }
}

/// Insert below `slot`, returning the depth of the new node.
fn insert_into<V>(
    slot: &mut Option<Box<Node<V>>>,
    point: Point,
    value: V,
    axis: usize,
    dimensions: usize,
    depth: usize,
) -> usize {
    match slot {
        None => {
            *slot = Some(Node::leaf(point, value, axis));
            depth
        }
        Some(node) => {
            let child_axis = next_axis(node.axis, dimensions);
            let goes_left = match (point.get(node.axis), node.split()) {
                (Some(coord), Some(split)) => coord < split,
                _ => false,
            };
            let child = if goes_left { &mut node.left } else { &mut node.right };
            insert_into(child, point, value, child_axis, dimensions, depth + 1)
        }
    }
}

/// Pick the axis with the largest coordinate spread.
fn widest_axis<V>(entries: &[(Point, V)], dimensions: usize) -> usize {
    let mut best_axis = 0;
    let mut best_spread = f64::NEG_INFINITY;

    for axis in 0..dimensions {
        let (low, high) = entries.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(low, high), (p, _)| (low.min(p[axis]), high.max(p[axis])),
        );
        let spread = high - low;
        if spread > best_spread {
            best_axis = axis;
            best_spread = spread;
        }
    }
    best_axis
}

fn build<V>(mut entries: Vec<(Point, V)>, dimensions: usize) -> Option<Box<Node<V>>> {
    if entries.is_empty() {
        return None;
    }

    let axis = widest_axis(&entries, dimensions);
    if dimensions > 0 {
        entries.sort_by(|(a, _), (b, _)| a[axis].total_cmp(&b[axis]));
    }

    let mid = entries.len() / 2;
    let right = entries.split_off(mid + 1);
    let (point, value) = entries.pop()?;
    let left = entries;

    Some(Box::new(Node {
        point,
        value,
        axis,
        left: build(left, dimensions),
        right: build(right, dimensions),
    }))
}

fn into_entries<V>(root: Option<Box<Node<V>>>) -> Vec<(Point, V)> {
    let mut entries = Vec::new();
    let mut stack: Vec<Box<Node<V>>> = root.into_iter().collect();

    while let Some(node) = stack.pop() {
        let Node {
            point,
            value,
            left,
            right,
            ..
        } = *node;
        stack.extend(left);
        stack.extend(right);
        entries.push((point, value));
    }
    entries
}
