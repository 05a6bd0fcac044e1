//! Categorical distribution over category indices 0..n.

use nalgebra::DVector;
use rand::Rng;
use rand_core::RngCore;

use super::Distribution;
use crate::error::{EstimateError, Result};
use crate::linalg;
use crate::models::VariableKind;

/// Tolerance on the sum of category probabilities.
const SUM_TOLERANCE: f64 = 1e-6;

/// Categorical distribution.
///
/// Parameterised by the vector of category probabilities.
#[derive(Clone, Debug, PartialEq)]
pub struct Categorical {
    p: DVector<f64>,
    // cumulative probabilities
    cdf: DVector<f64>,
}

impl Categorical {
    pub fn new(p: DVector<f64>) -> Result<Categorical> {
        let cdf = Self::cdf_of(&p)?;
        Ok(Categorical { p, cdf })
    }

    pub fn probabilities(&self) -> &DVector<f64> {
        &self.p
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.p.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.p.is_empty()
    }

    fn cdf_of(p: &DVector<f64>) -> Result<DVector<f64>> {
        let cdf = linalg::cumulative_sum(p)?;
        let total = cdf[cdf.nrows() - 1];
        if (total - 1.).abs() > SUM_TOLERANCE {
            return Err(EstimateError::precondition(format!(
                "category probabilities sum to {}",
                total
            )));
        }
        Ok(cdf)
    }
}

impl Default for Categorical {
    /// A single category with probability 1.
    fn default() -> Self {
        Categorical {
            p: DVector::from_element(1, 1.),
            cdf: DVector::from_element(1, 1.),
        }
    }
}

impl Distribution for Categorical {
    type Variable = usize;
    type Parameter = DVector<f64>;

    fn variable_kind(&self) -> VariableKind {
        VariableKind::Category
    }

    fn random(&self, rng: &mut dyn RngCore) -> usize {
        let u: f64 = rng.gen();
        // Rounding in the cdf may leave u above the last element
        self.cdf
            .iter()
            .position(|&c| u < c)
            .unwrap_or(self.len() - 1)
    }

    fn likelihood(&self, x: &usize) -> Result<f64> {
        self.p.get(*x).copied().ok_or_else(|| {
            EstimateError::precondition(format!("category {} of {}", x, self.len()))
        })
    }

    fn parameterize(&mut self, parameter: DVector<f64>) -> Result<&mut Self> {
        self.cdf = Self::cdf_of(&parameter)?;
        self.p = parameter;
        Ok(self)
    }
}
