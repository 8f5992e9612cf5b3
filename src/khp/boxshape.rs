//! `BoxShape` implementations for the region types the KHP-tree is
//! instantiated over: [`Interval`] (1-D, used by the interval dependency
//! domain and the interval coherency controller) and [`Rect`] (2-D,
//! used by the matrix-tile dependency domain and coherency controller).

use crate::region::{Interval, Rect};

/// The axis-aligned-box operations a `KhpTree` needs from its leaf
/// shape: intersection test, inclusion test, intersection value, and
/// set subtraction (the pieces of `self` not covered by `other`).
pub trait BoxShape: Copy + PartialEq + std::fmt::Debug {
    fn intersects(&self, other: &Self) -> bool;
    fn contains(&self, other: &Self) -> bool;
    fn intersect(&self, other: &Self) -> Option<Self>
    where
        Self: Sized;
    fn subtract(&self, cut: &Self) -> Vec<Self>
    where
        Self: Sized;
}

impl BoxShape for Interval {
    fn intersects(&self, other: &Self) -> bool {
        Interval::intersects(self, other)
    }

    fn contains(&self, other: &Self) -> bool {
        Interval::contains(self, other)
    }

    fn intersect(&self, other: &Self) -> Option<Self> {
        self.intersection(other)
    }

    fn subtract(&self, cut: &Self) -> Vec<Self> {
        match self.intersection(cut) {
            None => vec![*self],
            Some(inter) => {
                let mut out = Vec::with_capacity(2);
                if self.start < inter.start {
                    out.push(Interval::new(self.start, inter.start));
                }
                if inter.end < self.end {
                    out.push(Interval::new(inter.end, self.end));
                }
                out
            }
        }
    }
}

impl BoxShape for Rect {
    fn intersects(&self, other: &Self) -> bool {
        Rect::intersects(self, other)
    }

    fn contains(&self, other: &Self) -> bool {
        Rect::contains(self, other)
    }

    fn intersect(&self, other: &Self) -> Option<Self> {
        let row = self.row.max(other.row);
        let col = self.col.max(other.col);
        let row_end = (self.row + self.rows).min(other.row + other.rows);
        let col_end = (self.col + self.cols).min(other.col + other.cols);
        if row < row_end && col < col_end {
            Some(Rect {
                row,
                col,
                rows: row_end - row,
                cols: col_end - col,
            })
        } else {
            None
        }
    }

    /// Standard rectangle-minus-rectangle decomposition into up to four
    /// axis-aligned bands: full-width top/bottom strips outside the
    /// intersection's row span, and left/right strips restricted to
    /// that row span.
    fn subtract(&self, cut: &Self) -> Vec<Self> {
        let inter = match BoxShape::intersect(self, cut) {
            Some(i) => i,
            None => return vec![*self],
        };

        let mut out = Vec::with_capacity(4);
        if inter.row > self.row {
            out.push(Rect {
                row: self.row,
                col: self.col,
                rows: inter.row - self.row,
                cols: self.cols,
            });
        }
        if self.row + self.rows > inter.row + inter.rows {
            out.push(Rect {
                row: inter.row + inter.rows,
                col: self.col,
                rows: (self.row + self.rows) - (inter.row + inter.rows),
                cols: self.cols,
            });
        }
        if inter.col > self.col {
            out.push(Rect {
                row: inter.row,
                col: self.col,
                rows: inter.rows,
                cols: inter.col - self.col,
            });
        }
        if self.col + self.cols > inter.col + inter.cols {
            out.push(Rect {
                row: inter.row,
                col: inter.col + inter.cols,
                rows: inter.rows,
                cols: (self.col + self.cols) - (inter.col + inter.cols),
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_subtract_produces_disjoint_bands_covering_the_difference() {
        let outer = Rect { row: 0, col: 0, rows: 10, cols: 10 };
        let cut = Rect { row: 3, col: 3, rows: 2, cols: 2 };
        let bands = BoxShape::subtract(&outer, &cut);
        let covered: usize = bands.iter().map(|b| b.volume()).sum();
        assert_eq!(covered, outer.volume() - cut.volume());
        for i in 0..bands.len() {
            for j in (i + 1)..bands.len() {
                assert!(!bands[i].intersects(&bands[j]));
            }
            assert!(!bands[i].intersects(&cut));
        }
    }
}
