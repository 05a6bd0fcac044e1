//! Multivariate Gaussian distribution.

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_core::RngCore;
use rand_distr::StandardNormal;

use super::Distribution;
use crate::error::{EstimateError, Result};
use crate::linalg::SpdFactor;
use crate::models::VariableKind;

/// Parameters of a Gaussian, the mean and covariance.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianParameter {
    pub mean: DVector<f64>,
    pub covariance: DMatrix<f64>,
}

/// Multivariate Gaussian distribution N(mean, covariance).
///
/// The covariance must be positive definite. Its Cholesky factor and the normalising constant are
/// computed when the distribution is parameterised and reused by sampling and density evaluation.
#[derive(Clone, Debug)]
pub struct Gaussian {
    mean: DVector<f64>,
    covariance: DMatrix<f64>,
    factor: SpdFactor,
    // log of the normalising constant
    ln_norm: f64,
}

impl Gaussian {
    pub fn new(mean: DVector<f64>, covariance: DMatrix<f64>) -> Result<Gaussian> {
        if covariance.nrows() != mean.nrows() || covariance.ncols() != mean.nrows() {
            return Err(EstimateError::construction(format!(
                "Gaussian mean of dimension {} with {}x{} covariance",
                mean.nrows(),
                covariance.nrows(),
                covariance.ncols()
            )));
        }
        let (factor, ln_norm) = Self::constants(&covariance)?;
        Ok(Gaussian {
            mean,
            covariance,
            factor,
            ln_norm,
        })
    }

    /// Zero mean, identity covariance Gaussian.
    pub fn standard(dim: usize) -> Gaussian {
        Gaussian {
            mean: DVector::zeros(dim),
            covariance: DMatrix::identity(dim, dim),
            factor: SpdFactor::identity(dim),
            ln_norm: -0.5 * dim as f64 * (2. * PI).ln(),
        }
    }

    pub fn dim(&self) -> usize {
        self.mean.nrows()
    }

    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// log of the density at `x`.
    pub fn log_likelihood(&self, x: &DVector<f64>) -> Result<f64> {
        if x.nrows() != self.dim() {
            return Err(EstimateError::precondition(format!(
                "Gaussian of dimension {} evaluated at dimension {}",
                self.dim(),
                x.nrows()
            )));
        }
        let m2 = self.factor.mahalanobis2(&(x - &self.mean))?;
        Ok(self.ln_norm - 0.5 * m2)
    }

    fn constants(covariance: &DMatrix<f64>) -> Result<(SpdFactor, f64)> {
        let factor = SpdFactor::new(covariance, "Gaussian covariance")?;
        let d = covariance.nrows() as f64;
        let ln_norm = -0.5 * (d * (2. * PI).ln() + factor.ln_determinant());
        Ok((factor, ln_norm))
    }
}

impl Default for Gaussian {
    fn default() -> Self {
        Gaussian::standard(1)
    }
}

impl Distribution for Gaussian {
    type Variable = DVector<f64>;
    type Parameter = GaussianParameter;

    fn variable_kind(&self) -> VariableKind {
        VariableKind::Vector(self.dim())
    }

    fn random(&self, rng: &mut dyn RngCore) -> DVector<f64> {
        let z = DVector::<f64>::from_fn(self.dim(), |_, _| rng.sample(StandardNormal));
        &self.mean + self.factor.l() * z
    }

    fn likelihood(&self, x: &DVector<f64>) -> Result<f64> {
        Ok(self.log_likelihood(x)?.exp())
    }

    fn parameterize(&mut self, parameter: GaussianParameter) -> Result<&mut Self> {
        let GaussianParameter { mean, covariance } = parameter;
        if mean.nrows() != self.dim() || covariance.nrows() != self.dim() || covariance.ncols() != self.dim() {
            return Err(EstimateError::precondition(format!(
                "Gaussian of dimension {} parameterised with mean {} and {}x{} covariance",
                self.dim(),
                mean.nrows(),
                covariance.nrows(),
                covariance.ncols()
            )));
        }
        let (factor, ln_norm) = Self::constants(&covariance)?;
        self.mean = mean;
        self.covariance = covariance;
        self.factor = factor;
        self.ln_norm = ln_norm;
        Ok(self)
    }
}
