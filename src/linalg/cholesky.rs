//! Cholesky factorisation of symmetric positive definite matrices.
//!
//! Covariance matrices are factorised as LL' with L lower triangular.
//! Used for sampling, density evaluation and for solving with SPD matrices in place of a generic inverse.

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};

use super::rcond;
use crate::error::{EstimateError, Result};

/// A factorised symmetric positive definite matrix.
#[derive(Clone, Debug)]
pub struct SpdFactor {
    cholesky: Cholesky<f64, Dyn>,
    rcond: f64,
}

impl SpdFactor {
    /// Factorise `m`. Only the lower triangle of `m` is used.
    ///
    /// Fails when `m` is not square, is not positive definite or the factor has non finite elements.
    pub fn new(m: &DMatrix<f64>, what: &str) -> Result<SpdFactor> {
        if !m.is_square() {
            return Err(EstimateError::precondition(format!(
                "{} not square: {}x{}",
                what,
                m.nrows(),
                m.ncols()
            )));
        }
        let cholesky = m
            .clone()
            .cholesky()
            .ok_or_else(|| EstimateError::numerical(format!("{} not PD", what)))?;
        let rcond = rcond::rcond_cholesky(cholesky.l_dirty());
        super::check_positive(rcond, &format!("{} not PD", what))?;
        Ok(SpdFactor { cholesky, rcond })
    }

    /// Factor of the identity matrix.
    pub fn identity(dim: usize) -> SpdFactor {
        SpdFactor {
            cholesky: Cholesky::new_unchecked(DMatrix::identity(dim, dim)),
            rcond: 1.,
        }
    }

    /// The reciprocal condition number estimate of the factorised matrix.
    pub fn rcond(&self) -> f64 {
        self.rcond
    }

    /// Lower triangular factor L.
    pub fn l(&self) -> DMatrix<f64> {
        self.cholesky.l()
    }

    /// Solve M.X = B.
    pub fn solve(&self, b: &DMatrix<f64>) -> DMatrix<f64> {
        self.cholesky.solve(b)
    }

    /// log of the determinant of M.
    pub fn ln_determinant(&self) -> f64 {
        let l = self.cholesky.l_dirty();
        2. * (0..l.nrows()).map(|i| l[(i, i)].ln()).sum::<f64>()
    }

    /// Mahalanobis distance squared, v'.inv(M).v
    pub fn mahalanobis2(&self, v: &DVector<f64>) -> Result<f64> {
        let z = self
            .cholesky
            .l_dirty()
            .solve_lower_triangular(v)
            .ok_or_else(|| EstimateError::numerical("singular factor in mahalanobis distance"))?;
        Ok(z.norm_squared())
    }
}
