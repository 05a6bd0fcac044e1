//! Stochastic processes.
//!
//! A process layer is either [`Markov`], with a state and an initial distribution, or [`Memoryless`].
//! Layers are stacked into a [`Hierarchical`] process, a dynamic Bayesian network in which the random
//! variable of each layer is the first condition variable of the layer below it.
//!
//! All layers are used through the object safe [`Process`] interface, on random variables represented as [`Variable`].

mod hierarchical;
mod markov;
mod memoryless;

pub use hierarchical::Hierarchical;
pub use markov::Markov;
pub use memoryless::Memoryless;

use std::any::Any;

use rand_core::RngCore;

use crate::distribution::{ConditionalDensity, Density};
use crate::error::Result;
use crate::models::{Variable, VariableKind};

/// A process layer.
pub trait Process: Any {
    /// Kind of the layer's random variable.
    fn variable_kind(&self) -> VariableKind;

    /// Kinds of the condition variables taken by [`random`](Process::random) and [`likelihood`](Process::likelihood).
    ///
    /// A Markov layer's own state is not included.
    fn condition_kinds(&self) -> Vec<VariableKind>;

    /// Start the process, returning its initial random variable.
    fn initialize(&mut self, rng: &mut dyn RngCore) -> Result<Variable>;

    /// Sample the next random variable given the conditions.
    fn random(&mut self, conditions: &[Variable], rng: &mut dyn RngCore) -> Result<Variable>;

    /// Likelihood of `x` as the next random variable given the conditions. Does not change the process.
    fn likelihood(&mut self, x: &Variable, conditions: &[Variable]) -> Result<f64>;

    /// The layer's conditional distribution.
    ///
    /// For a Markov layer the first condition variable is the previous state.
    fn conditional_mut(&mut self) -> &mut dyn ConditionalDensity;

    /// The initial state distribution, if the layer has one.
    fn initial_density(&self) -> Option<&dyn Density>;

    fn as_any(&self) -> &dyn Any;
}
