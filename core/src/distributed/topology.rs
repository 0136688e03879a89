//! Virtual 2-D Cartesian process topologies.
//!
//! Ranks are laid out row-major over the grid: `rank = row * cols + col`.
//! Because this is the same order in which block-major buffers list their
//! grid cells, scattering block `p` to rank `p` puts every block on the
//! process that owns its grid cell.

use crate::error::{Error, Result};

/// A grid dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Moves between rows (changes the row coordinate).
    Row,
    /// Moves between columns (changes the column coordinate).
    Col,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::Row => 0,
            Axis::Col => 1,
        }
    }
}

/// Partners of a shift: where this rank's data goes and where its replacement comes from.
///
/// `None` means the shift falls off a non-periodic edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub source: Option<usize>,
    pub dest: Option<usize>,
}

/// A `rows x cols` Cartesian topology with per-dimension wraparound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartTopology {
    dims: [usize; 2],
    periods: [bool; 2],
}

impl CartTopology {
    /// Creates a topology covering exactly `world_size` ranks.
    pub fn new(dims: [usize; 2], periods: [bool; 2], world_size: usize) -> Result<Self> {
        if dims[0] == 0 || dims[1] == 0 || dims[0] * dims[1] != world_size {
            return Err(Error::InvalidWorld {
                processes: world_size,
                reason: format!("a {}x{} topology needs {} processes", dims[0], dims[1], dims[0] * dims[1]),
            });
        }
        Ok(Self { dims, periods })
    }

    pub fn dims(&self) -> [usize; 2] {
        self.dims
    }

    pub fn periods(&self) -> [bool; 2] {
        self.periods
    }

    pub fn size(&self) -> usize {
        self.dims[0] * self.dims[1]
    }

    /// `[row, col]` of `rank`.
    pub fn coords(&self, rank: usize) -> Result<[usize; 2]> {
        if rank >= self.size() {
            return Err(Error::InvalidRank {
                rank,
                size: self.size(),
            });
        }
        Ok([rank / self.dims[1], rank % self.dims[1]])
    }

    pub fn rank_of(&self, coords: [usize; 2]) -> Result<usize> {
        if coords[0] >= self.dims[0] || coords[1] >= self.dims[1] {
            return Err(Error::InvalidRank {
                rank: coords[0] * self.dims[1] + coords[1],
                size: self.size(),
            });
        }
        Ok(coords[0] * self.dims[1] + coords[1])
    }

    /// Shift by `disp` positions along `axis`.
    ///
    /// Data moves towards increasing coordinates for positive `disp`:
    /// `dest` is at `coord + disp` and `source` is at `coord - disp`.
    /// A negative `disp` therefore rotates data left (along [`Axis::Col`]) or
    /// up (along [`Axis::Row`]).
    pub fn shift(&self, rank: usize, axis: Axis, disp: isize) -> Result<Shift> {
        let coords = self.coords(rank)?;
        Ok(Shift {
            source: self.offset(coords, axis, -disp),
            dest: self.offset(coords, axis, disp),
        })
    }

    fn offset(&self, coords: [usize; 2], axis: Axis, delta: isize) -> Option<usize> {
        let dim = axis.index();
        let extent = self.dims[dim] as isize;
        let moved = coords[dim] as isize + delta;
        let moved = if self.periods[dim] {
            moved.rem_euclid(extent)
        } else if (0..extent).contains(&moved) {
            moved
        } else {
            return None;
        };

        let mut target = coords;
        target[dim] = moved as usize;
        Some(target[0] * self.dims[1] + target[1])
    }
}

/// Four single-hop neighbors on a periodic grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors {
    pub left: usize,
    pub right: usize,
    pub up: usize,
    pub down: usize,
}

/// Everything a rank needs to know about its place in the grid.
///
/// Built once per run and passed explicitly to the components that need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessContext {
    pub rank: usize,
    pub row: usize,
    pub col: usize,
    pub grid_side: usize,
    pub neighbors: Neighbors,
    topology: CartTopology,
}

impl ProcessContext {
    /// `(source, dest)` of a periodic shift by `disp` along `axis`.
    pub fn shift(&self, axis: Axis, disp: isize) -> Result<(usize, usize)> {
        let shift = self.topology.shift(self.rank, axis, disp)?;
        match (shift.source, shift.dest) {
            (Some(source), Some(dest)) => Ok((source, dest)),
            _ => Err(Error::InvalidState(format!(
                "rank {} has no partner for a shift of {disp} along {axis:?}",
                self.rank
            ))),
        }
    }
}

/// A square `side x side` grid, periodic in both dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessGrid {
    topology: CartTopology,
    side: usize,
}

impl ProcessGrid {
    /// Fails with [`Error::NotPerfectSquare`] unless `world_size` is `side * side`.
    pub fn new(world_size: usize) -> Result<Self> {
        let side = exact_sqrt(world_size).ok_or(Error::NotPerfectSquare {
            processes: world_size,
        })?;
        let topology = CartTopology::new([side, side], [true, true], world_size)?;
        Ok(Self { topology, side })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn size(&self) -> usize {
        self.topology.size()
    }

    pub fn topology(&self) -> &CartTopology {
        &self.topology
    }

    pub fn context(&self, rank: usize) -> Result<ProcessContext> {
        let [row, col] = self.topology.coords(rank)?;
        let partners = |axis| -> Result<(usize, usize)> {
            let shift = self.topology.shift(rank, axis, -1)?;
            // Both sides exist on a fully periodic grid.
            Ok((shift.source.unwrap_or(rank), shift.dest.unwrap_or(rank)))
        };
        let (right, left) = partners(Axis::Col)?;
        let (down, up) = partners(Axis::Row)?;

        Ok(ProcessContext {
            rank,
            row,
            col,
            grid_side: self.side,
            neighbors: Neighbors {
                left,
                right,
                up,
                down,
            },
            topology: self.topology.clone(),
        })
    }
}

/// Integer square root, if `n` is a non-zero perfect square.
pub fn exact_sqrt(n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let square = |r: usize| r.checked_mul(r);
    let mut root = (n as f64).sqrt() as usize;
    while square(root).map_or(true, |sq| sq > n) {
        root -= 1;
    }
    while square(root + 1).is_some_and(|sq| sq <= n) {
        root += 1;
    }
    (square(root) == Some(n)).then_some(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_sqrt() {
        assert_eq!(exact_sqrt(1), Some(1));
        assert_eq!(exact_sqrt(4), Some(2));
        assert_eq!(exact_sqrt(16), Some(4));
        assert_eq!(exact_sqrt(25), Some(5));
        for n in [0, 2, 3, 5, 6, 7, 8, 15, 17] {
            assert_eq!(exact_sqrt(n), None, "n={n}");
        }
    }

    #[test]
    fn test_exact_sqrt_near_usize_max() {
        let max_root = (1usize << (usize::BITS / 2)) - 1;
        assert_eq!(exact_sqrt(max_root * max_root), Some(max_root));
        assert_eq!(exact_sqrt(max_root * max_root + 5), None);
        assert_eq!(exact_sqrt(usize::MAX), None);
        assert_eq!(
            ProcessGrid::new(usize::MAX),
            Err(Error::NotPerfectSquare {
                processes: usize::MAX
            })
        );
    }

    #[test]
    fn test_grid_rejects_non_square() {
        for p in [2, 3, 5, 6, 7, 8] {
            assert_eq!(
                ProcessGrid::new(p),
                Err(Error::NotPerfectSquare { processes: p })
            );
        }
    }

    #[test]
    fn test_coords_row_major() {
        let grid = ProcessGrid::new(9).unwrap();
        assert_eq!(grid.side(), 3);
        assert_eq!(grid.topology().coords(5).unwrap(), [1, 2]);
        assert_eq!(grid.topology().rank_of([2, 1]).unwrap(), 7);
        assert!(grid.topology().coords(9).is_err());
    }

    #[test]
    fn test_neighbors_wrap_around() {
        let grid = ProcessGrid::new(9).unwrap();

        // (0, 0)
        let ctx = grid.context(0).unwrap();
        assert_eq!((ctx.row, ctx.col), (0, 0));
        assert_eq!(
            ctx.neighbors,
            Neighbors {
                left: 2,
                right: 1,
                up: 6,
                down: 3
            }
        );

        // (1, 2)
        let ctx = grid.context(5).unwrap();
        assert_eq!(
            ctx.neighbors,
            Neighbors {
                left: 4,
                right: 3,
                up: 2,
                down: 8
            }
        );
    }

    #[test]
    fn test_single_process_grid_is_its_own_neighbor() {
        let ctx = ProcessGrid::new(1).unwrap().context(0).unwrap();
        assert_eq!(
            ctx.neighbors,
            Neighbors {
                left: 0,
                right: 0,
                up: 0,
                down: 0
            }
        );
    }

    #[test]
    fn test_multi_hop_shift() {
        let grid = ProcessGrid::new(16).unwrap();
        // (2, 1) rotated 2 to the left: sends to (2, 3), receives from (2, 3).
        let ctx = grid.context(9).unwrap();
        assert_eq!(ctx.shift(Axis::Col, -2).unwrap(), (11, 11));
        // (2, 1) rotated 1 up: sends to (1, 1), receives from (3, 1).
        assert_eq!(ctx.shift(Axis::Row, -1).unwrap(), (13, 5));
    }

    #[test]
    fn test_non_periodic_edges() {
        let topo = CartTopology::new([2, 3], [false, true], 6).unwrap();
        // Rank 0 is (0, 0); moving down one row stays inside, moving up falls off.
        let down = topo.shift(0, Axis::Row, 1).unwrap();
        assert_eq!(down.dest, Some(3));
        assert_eq!(down.source, None);
        // Columns wrap.
        let right = topo.shift(2, Axis::Col, 1).unwrap();
        assert_eq!(right.dest, Some(0));
        assert_eq!(right.source, Some(1));
    }

    #[test]
    fn test_topology_size_mismatch() {
        assert!(matches!(
            CartTopology::new([2, 2], [true, true], 5),
            Err(Error::InvalidWorld { .. })
        ));
    }
}
