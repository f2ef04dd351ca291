//! Contour extraction: trace the borders of white regions in an edge map.
//!
//! Border following is Suzuki-Abe via `imageproc::contours::find_contours`,
//! which reports every outer border and every hole border together with
//! the index of its enclosing border. The full hierarchy is kept in the
//! returned [`ContourSet`] even though rendering ignores it.
//!
//! Each traced border is then compressed with [`compress_chain`]: runs of
//! equal steps (horizontal, vertical, or diagonal) collapse to their end
//! points, so an axis-aligned rectangle becomes exactly its 4 corners.

use serde::{Deserialize, Serialize};

use crate::edge::EdgeMap;
use crate::types::Point;

/// Whether a border surrounds a foreground region or a hole in one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorderKind {
    /// Outer border of a connected white region.
    Outer,
    /// Border of a black hole inside a white region.
    Hole,
}

impl From<imageproc::contours::BorderType> for BorderKind {
    fn from(value: imageproc::contours::BorderType) -> Self {
        match value {
            imageproc::contours::BorderType::Outer => Self::Outer,
            imageproc::contours::BorderType::Hole => Self::Hole,
        }
    }
}

/// One traced border as a compressed, closed vertex sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contour {
    points: Vec<Point>,
    kind: BorderKind,
    parent: Option<usize>,
}

impl Contour {
    /// Create a contour from its vertices, kind, and enclosing contour index.
    #[must_use]
    pub const fn new(points: Vec<Point>, kind: BorderKind, parent: Option<usize>) -> Self {
        Self {
            points,
            kind,
            parent,
        }
    }

    /// The vertices, in traversal order. The last vertex connects back
    /// to the first.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Outer border or hole border.
    #[must_use]
    pub const fn kind(&self) -> BorderKind {
        self.kind
    }

    /// Index of the enclosing contour in the same [`ContourSet`].
    #[must_use]
    pub const fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Number of vertices.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the contour has no vertices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// All contours found in one edge map, in discovery (raster scan) order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContourSet(Vec<Contour>);

impl ContourSet {
    /// Build a set from contours whose `parent` indices refer to
    /// positions in `contours`.
    #[must_use]
    pub const fn from_contours(contours: Vec<Contour>) -> Self {
        Self(contours)
    }

    /// Number of contours.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no contours were found.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Contour at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Contour> {
        self.0.get(index)
    }

    /// Iterate over all contours regardless of nesting.
    pub fn iter(&self) -> std::slice::Iter<'_, Contour> {
        self.0.iter()
    }

    /// Indices of contours with no parent.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, c)| c.parent.is_none())
            .map(|(i, _)| i)
    }

    /// Indices of contours directly enclosed by `index`.
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.parent == Some(index))
            .map(|(i, _)| i)
    }

    /// Nesting depth of `index`: 0 for a root, 1 for its children, ...
    ///
    /// Returns `None` if `index` is out of range. A parent chain that
    /// cycles or dangles stops counting where it breaks.
    #[must_use]
    pub fn depth(&self, index: usize) -> Option<usize> {
        let mut current = self.0.get(index)?;
        let mut depth = 0;
        while let Some(parent) = current.parent.and_then(|p| self.0.get(p)) {
            depth += 1;
            if depth > self.0.len() {
                break;
            }
            current = parent;
        }
        Some(depth)
    }

    /// Total vertices across all contours.
    #[must_use]
    pub fn total_points(&self) -> usize {
        self.0.iter().map(Contour::len).sum()
    }

    /// Number of hole borders.
    #[must_use]
    pub fn hole_count(&self) -> usize {
        self.0.iter().filter(|c| c.kind == BorderKind::Hole).count()
    }
}

impl<'a> IntoIterator for &'a ContourSet {
    type Item = &'a Contour;
    type IntoIter = std::slice::Iter<'a, Contour>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Trace every border in the edge map and compress each one.
///
/// Returns an empty set when the map has no edge pixels.
#[must_use = "returns the traced contours"]
pub fn find_contours(edges: &EdgeMap) -> ContourSet {
    if edges.is_blank() {
        return ContourSet::default();
    }

    let traced: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(edges.as_image());

    ContourSet(
        traced
            .into_iter()
            .map(|c| {
                let chain: Vec<Point> = c.points.iter().map(|p| Point::new(p.x, p.y)).collect();
                Contour {
                    points: compress_chain(&chain),
                    kind: c.border_type.into(),
                    parent: c.parent,
                }
            })
            .collect(),
    )
}

/// Drop every vertex whose incoming and outgoing steps are equal.
///
/// The chain is treated as closed (last vertex connects to the first).
/// Chains of one or two vertices are returned unchanged.
#[must_use]
pub fn compress_chain(chain: &[Point]) -> Vec<Point> {
    let n = chain.len();
    if n <= 2 {
        return chain.to_vec();
    }

    chain
        .iter()
        .enumerate()
        .filter(|&(i, &p)| {
            let prev = chain[(i + n - 1) % n];
            let next = chain[(i + 1) % n];
            prev.step_to(p) != p.step_to(next)
        })
        .map(|(_, &p)| p)
        .collect()
}
