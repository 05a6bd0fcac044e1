//! Probability distributions.
//!
//! A [`Distribution`] can be sampled, evaluated and re-parameterised.
//! A [`Conditional`] couples a distribution with a parameter map to realise p(x | y).
//!
//! [`Density`] and [`ConditionalDensity`] are the object safe views on these used by process layers and filters,
//! where random variables are represented as [`Variable`].

mod categorical;
mod conditional;
mod gaussian;

pub use categorical::Categorical;
pub use conditional::Conditional;
pub use gaussian::{Gaussian, GaussianParameter};

use rand_core::RngCore;

use crate::error::Result;
use crate::models::{RandomVariable, Variable, VariableKind};

/// A parameterised probability distribution.
pub trait Distribution {
    /// The random variable sampled.
    type Variable: RandomVariable;
    /// The parameters defining the distribution.
    type Parameter;

    /// The kind of random variable sampled.
    fn variable_kind(&self) -> VariableKind;

    /// Draw a sample.
    fn random(&self, rng: &mut dyn RngCore) -> Self::Variable;

    /// Probability density (or mass) at `x`.
    fn likelihood(&self, x: &Self::Variable) -> Result<f64>;

    /// Replace the parameters.
    fn parameterize(&mut self, parameter: Self::Parameter) -> Result<&mut Self>;
}

/// Object safe view of an unconditional distribution.
pub trait Density {
    fn variable_kind(&self) -> VariableKind;
    fn random(&self, rng: &mut dyn RngCore) -> Variable;
    fn likelihood(&self, x: &Variable) -> Result<f64>;
}

impl<D: Distribution> Density for D {
    fn variable_kind(&self) -> VariableKind {
        Distribution::variable_kind(self)
    }

    fn random(&self, rng: &mut dyn RngCore) -> Variable {
        Distribution::random(self, rng).into_variable()
    }

    fn likelihood(&self, x: &Variable) -> Result<f64> {
        Distribution::likelihood(self, &D::Variable::from_variable(x)?)
    }
}

/// Object safe view of a conditional distribution p(x | y0..yn).
///
/// Evaluation re-parameterises the underlying distribution so requires exclusive access.
pub trait ConditionalDensity {
    fn variable_kind(&self) -> VariableKind;

    /// Kinds of the condition variables y0..yn.
    fn condition_kinds(&self) -> Vec<VariableKind>;

    fn random(&mut self, conditions: &[Variable], rng: &mut dyn RngCore) -> Result<Variable>;

    fn likelihood(&mut self, x: &Variable, conditions: &[Variable]) -> Result<f64>;
}
