//! First order Markov process.

use std::any::Any;

use rand_core::RngCore;

use super::Process;
use crate::distribution::{Conditional, ConditionalDensity, Distribution};
use crate::error::{EstimateError, Result};
use crate::map::ParameterMap;
use crate::models::{RandomVariable, Variable, VariableKind};

/// A first order Markov process x(k) ~ p(x(k) | x(k-1), y0..yn).
///
/// The process has a state, the last random variable drawn. It is initialised by a draw from the initial
/// distribution and advanced by draws from the transition distribution given the state and further conditions.
#[derive(Debug)]
pub struct Markov<D, M, I>
where
    D: Distribution,
{
    conditional: Conditional<D, M>,
    initial: I,
    state: Option<D::Variable>,
}

impl<D, M, I> Markov<D, M, I>
where
    D: Distribution,
    M: ParameterMap<Parameter = D::Parameter>,
    I: Distribution<Variable = D::Variable>,
{
    /// The transition's first condition variable and the initial distribution must both be of the state's kind.
    pub fn new(conditional: Conditional<D, M>, initial: I) -> Result<Self> {
        let kind = conditional.distribution().variable_kind();
        match conditional.condition_kinds().first() {
            Some(first) if *first == kind => {}
            first => {
                return Err(EstimateError::construction(format!(
                    "Markov state {:?} conditioned on {:?}",
                    kind, first
                )))
            }
        }
        if initial.variable_kind() != kind {
            return Err(EstimateError::construction(format!(
                "Markov state {:?} with initial distribution of {:?}",
                kind,
                initial.variable_kind()
            )));
        }
        Ok(Markov {
            conditional,
            initial,
            state: None,
        })
    }

    /// The current state, None until initialised.
    pub fn state(&self) -> Option<&D::Variable> {
        self.state.as_ref()
    }

    pub fn conditional(&self) -> &Conditional<D, M> {
        &self.conditional
    }

    pub fn initial(&self) -> &I {
        &self.initial
    }

    /// Draw the state from the initial distribution.
    pub fn initialize(&mut self, rng: &mut dyn RngCore) -> D::Variable {
        let x = self.initial.random(rng);
        self.state = Some(x.clone());
        x
    }

    /// Advance the state by a draw from the transition distribution.
    pub fn random(&mut self, conditions: &[Variable], rng: &mut dyn RngCore) -> Result<D::Variable> {
        let all = self.with_state(conditions)?;
        let x = self.conditional.random(&all, rng)?;
        self.state = Some(x.clone());
        Ok(x)
    }

    /// Transition likelihood of `x` from the current state.
    pub fn likelihood(&mut self, x: &D::Variable, conditions: &[Variable]) -> Result<f64> {
        let all = self.with_state(conditions)?;
        self.conditional.likelihood(x, &all)
    }

    fn with_state(&self, conditions: &[Variable]) -> Result<Vec<Variable>> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| EstimateError::precondition("Markov process used before initialize"))?;
        let mut all = Vec::with_capacity(conditions.len() + 1);
        all.push(state.clone().into_variable());
        all.extend_from_slice(conditions);
        Ok(all)
    }
}

impl<D, M, I> Process for Markov<D, M, I>
where
    D: Distribution + 'static,
    M: ParameterMap<Parameter = D::Parameter> + 'static,
    I: Distribution<Variable = D::Variable> + 'static,
{
    fn variable_kind(&self) -> VariableKind {
        self.conditional.distribution().variable_kind()
    }

    fn condition_kinds(&self) -> Vec<VariableKind> {
        self.conditional.condition_kinds().split_off(1)
    }

    fn initialize(&mut self, rng: &mut dyn RngCore) -> Result<Variable> {
        Ok(Markov::initialize(self, rng).into_variable())
    }

    fn random(&mut self, conditions: &[Variable], rng: &mut dyn RngCore) -> Result<Variable> {
        Markov::random(self, conditions, rng).map(RandomVariable::into_variable)
    }

    fn likelihood(&mut self, x: &Variable, conditions: &[Variable]) -> Result<f64> {
        Markov::likelihood(self, &D::Variable::from_variable(x)?, conditions)
    }

    fn conditional_mut(&mut self) -> &mut dyn ConditionalDensity {
        &mut self.conditional
    }

    fn initial_density(&self) -> Option<&dyn crate::distribution::Density> {
        Some(&self.initial)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
