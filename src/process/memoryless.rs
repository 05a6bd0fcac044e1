//! Memoryless (independent) process.

use std::any::Any;

use rand_core::RngCore;

use super::Process;
use crate::distribution::{Conditional, ConditionalDensity, Distribution};
use crate::error::Result;
use crate::map::ParameterMap;
use crate::models::{RandomVariable, Variable, VariableKind};

/// A memoryless process x(k) ~ p(x(k) | y0..yn).
///
/// The process has no state, each draw depends only on the conditions given.
pub struct Memoryless<D, M> {
    conditional: Conditional<D, M>,
}

impl<D, M> Memoryless<D, M>
where
    D: Distribution,
    M: ParameterMap<Parameter = D::Parameter>,
{
    pub fn new(conditional: Conditional<D, M>) -> Self {
        Memoryless { conditional }
    }

    pub fn conditional(&self) -> &Conditional<D, M> {
        &self.conditional
    }

    /// A memoryless process has no sensible initial value.
    ///
    /// Returns the default of the random variable's kind, a zero vector or category 0,
    /// so that a hierarchy can initialise all its layers alike.
    pub fn initialize(&mut self) -> Variable {
        self.conditional.distribution().variable_kind().default_variable()
    }

    pub fn random(&mut self, conditions: &[Variable], rng: &mut dyn RngCore) -> Result<D::Variable> {
        self.conditional.random(conditions, rng)
    }

    pub fn likelihood(&mut self, x: &D::Variable, conditions: &[Variable]) -> Result<f64> {
        self.conditional.likelihood(x, conditions)
    }
}

impl<D, M> Process for Memoryless<D, M>
where
    D: Distribution + 'static,
    M: ParameterMap<Parameter = D::Parameter> + 'static,
{
    fn variable_kind(&self) -> VariableKind {
        self.conditional.distribution().variable_kind()
    }

    fn condition_kinds(&self) -> Vec<VariableKind> {
        self.conditional.condition_kinds()
    }

    fn initialize(&mut self, _rng: &mut dyn RngCore) -> Result<Variable> {
        Ok(Memoryless::initialize(self))
    }

    fn random(&mut self, conditions: &[Variable], rng: &mut dyn RngCore) -> Result<Variable> {
        Memoryless::random(self, conditions, rng).map(RandomVariable::into_variable)
    }

    fn likelihood(&mut self, x: &Variable, conditions: &[Variable]) -> Result<f64> {
        Memoryless::likelihood(self, &D::Variable::from_variable(x)?, conditions)
    }

    fn conditional_mut(&mut self) -> &mut dyn ConditionalDensity {
        &mut self.conditional
    }

    fn initial_density(&self) -> Option<&dyn crate::distribution::Density> {
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
