//! Conditional distribution p(x | y0..yn).

use rand_core::RngCore;

use super::{ConditionalDensity, Distribution};
use crate::error::{EstimateError, Result};
use crate::map::ParameterMap;
use crate::models::{check_conditions, RandomVariable, Variable, VariableKind};

/// A distribution whose parameters are a function of condition variables.
///
/// Each evaluation maps the conditions to parameters and re-parameterises the owned distribution.
/// Evaluation therefore mutates the distribution and an instance cannot be shared between callers.
#[derive(Clone, Debug)]
pub struct Conditional<D, M> {
    distribution: D,
    map: M,
}

impl<D, M> Conditional<D, M>
where
    D: Distribution,
    M: ParameterMap<Parameter = D::Parameter>,
{
    /// The map must produce parameters for variables of the distribution's kind.
    pub fn new(distribution: D, map: M) -> Result<Self> {
        if distribution.variable_kind() != map.output_kind() {
            return Err(EstimateError::construction(format!(
                "distribution of {:?} with a parameter map for {:?}",
                distribution.variable_kind(),
                map.output_kind()
            )));
        }
        Ok(Conditional { distribution, map })
    }

    pub fn distribution(&self) -> &D {
        &self.distribution
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn condition_kinds(&self) -> Vec<VariableKind> {
        self.map.condition_kinds()
    }

    /// Draw x given the conditions.
    pub fn random(&mut self, conditions: &[Variable], rng: &mut dyn RngCore) -> Result<D::Variable> {
        self.parameterize(conditions)?;
        Ok(self.distribution.random(rng))
    }

    /// p(x | conditions).
    pub fn likelihood(&mut self, x: &D::Variable, conditions: &[Variable]) -> Result<f64> {
        self.parameterize(conditions)?;
        self.distribution.likelihood(x)
    }

    fn parameterize(&mut self, conditions: &[Variable]) -> Result<()> {
        check_conditions(&self.map.condition_kinds(), conditions)?;
        let parameter = self.map.parameters(conditions)?;
        self.distribution.parameterize(parameter)?;
        Ok(())
    }
}

impl<D, M> ConditionalDensity for Conditional<D, M>
where
    D: Distribution,
    M: ParameterMap<Parameter = D::Parameter>,
{
    fn variable_kind(&self) -> VariableKind {
        self.distribution.variable_kind()
    }

    fn condition_kinds(&self) -> Vec<VariableKind> {
        self.map.condition_kinds()
    }

    fn random(&mut self, conditions: &[Variable], rng: &mut dyn RngCore) -> Result<Variable> {
        Conditional::random(self, conditions, rng).map(RandomVariable::into_variable)
    }

    fn likelihood(&mut self, x: &Variable, conditions: &[Variable]) -> Result<f64> {
        Conditional::likelihood(self, &D::Variable::from_variable(x)?, conditions)
    }
}
