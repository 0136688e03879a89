use crate::error::{Error, Result};
use crate::matrix::{Matrix, MatrixElem};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

/// Matrices up to this dimension are small enough to print in full.
pub const PRINT_LIMIT: usize = 10;

/// How the root fills the input matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Fill {
    /// Uniform random digits `0..=9`.
    #[default]
    Random,
    /// `A[i][j] = (i*N + j) mod 10`, `B[i][j] = (i*N + j + 1) mod 10`.
    Sequence,
}

/// Parameters of one Cannon run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    /// Matrix dimension N.
    pub dim: usize,
    pub fill: Fill,
    /// Seed for [`Fill::Random`]. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl RunConfig {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            fill: Fill::default(),
            seed: None,
        }
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks that `dim` splits evenly over a grid with `grid_side` processes per side.
    pub fn validate(&self, grid_side: usize) -> Result<()> {
        validate_dim(self.dim, grid_side)
    }

    /// Generates the input pair `(A, B)`.
    pub fn generate<T: MatrixElem>(&self) -> (Matrix<T>, Matrix<T>) {
        match self.fill {
            Fill::Random => {
                let mut rng = match self.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_os_rng(),
                };
                let a = Matrix::random(self.dim, &mut rng);
                let b = Matrix::random(self.dim, &mut rng);
                (a, b)
            }
            Fill::Sequence => (Matrix::sequence(self.dim, 0), Matrix::sequence(self.dim, 1)),
        }
    }
}

pub(crate) fn validate_dim(dim: usize, grid_side: usize) -> Result<()> {
    if dim == 0 {
        return Err(Error::EmptyMatrix);
    }
    if dim.checked_mul(dim).is_none() {
        return Err(Error::DimensionTooLarge { dim });
    }
    if dim % grid_side != 0 {
        return Err(Error::IndivisibleDimension { dim, grid_side });
    }
    Ok(())
}
