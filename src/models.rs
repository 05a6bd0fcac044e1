#![allow(non_snake_case)]

//! Bayesian state space models.
//!
//! Random variables of all process layers share one representation, [`Variable`].
//! Estimator beliefs are modeled as structs.
//! The recursive Bayesian filter operations common to all estimators are defined as a trait.

use nalgebra::{DMatrix, DVector};

use crate::error::{EstimateError, Result};

/// A random variable of a process layer.
#[derive(Clone, Debug, PartialEq)]
pub enum Variable {
    /// A real vector, such as a state or a measurement.
    Vector(DVector<f64>),
    /// A category index, such as a switching mode.
    Category(usize),
}

/// The type of a [`Variable`]. Vector kinds include the dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableKind {
    Vector(usize),
    Category,
}

impl Variable {
    pub fn kind(&self) -> VariableKind {
        match self {
            Variable::Vector(v) => VariableKind::Vector(v.nrows()),
            Variable::Category(_) => VariableKind::Category,
        }
    }

    pub fn as_vector(&self) -> Option<&DVector<f64>> {
        match self {
            Variable::Vector(v) => Some(v),
            Variable::Category(_) => None,
        }
    }

    pub fn as_category(&self) -> Option<usize> {
        match self {
            Variable::Category(k) => Some(*k),
            Variable::Vector(_) => None,
        }
    }
}

impl From<DVector<f64>> for Variable {
    fn from(v: DVector<f64>) -> Self {
        Variable::Vector(v)
    }
}

impl From<usize> for Variable {
    fn from(k: usize) -> Self {
        Variable::Category(k)
    }
}

impl VariableKind {
    /// The default value of this kind: a zero vector or category 0.
    pub fn default_variable(&self) -> Variable {
        match *self {
            VariableKind::Vector(d) => Variable::Vector(DVector::zeros(d)),
            VariableKind::Category => Variable::Category(0),
        }
    }
}

/// A concrete random variable type that a distribution samples.
pub trait RandomVariable: Clone + Sized + 'static {
    fn into_variable(self) -> Variable;
    fn from_variable(v: &Variable) -> Result<Self>;
}

impl RandomVariable for DVector<f64> {
    fn into_variable(self) -> Variable {
        Variable::Vector(self)
    }

    fn from_variable(v: &Variable) -> Result<Self> {
        v.as_vector()
            .cloned()
            .ok_or_else(|| EstimateError::precondition("expected a vector variable, got a category"))
    }
}

impl RandomVariable for usize {
    fn into_variable(self) -> Variable {
        Variable::Category(self)
    }

    fn from_variable(v: &Variable) -> Result<Self> {
        v.as_category()
            .ok_or_else(|| EstimateError::precondition("expected a category variable, got a vector"))
    }
}

/// Checks each condition variable matches its declared kind.
pub fn check_conditions(kinds: &[VariableKind], conditions: &[Variable]) -> Result<()> {
    if kinds.len() != conditions.len() {
        return Err(EstimateError::precondition(format!(
            "expected {} condition variables, got {}",
            kinds.len(),
            conditions.len()
        )));
    }
    for (i, (kind, condition)) in kinds.iter().zip(conditions).enumerate() {
        if condition.kind() != *kind {
            return Err(EstimateError::precondition(format!(
                "condition variable {} is {:?}, expected {:?}",
                i,
                condition.kind(),
                kind
            )));
        }
    }
    Ok(())
}

/// Kalman State.
///
/// Linear representation as a state vector and the state covariance (symmetric positive semi-definite) matrix.
#[derive(PartialEq, Clone, Debug)]
pub struct KalmanState {
    /// State vector
    pub x: DVector<f64>,
    /// State covariance matrix (symmetric positive semi-definite)
    pub X: DMatrix<f64>,
}

/// Particle State.
///
/// Sampled representation as state particles and their normalised weights.
#[derive(PartialEq, Clone, Debug)]
pub struct ParticleState {
    /// State particles, one per column
    pub s: DMatrix<f64>,
    /// Particle weights, sum to 1
    pub w: DVector<f64>,
}

impl ParticleState {
    /// Weighted mean of the particles.
    pub fn mean(&self) -> DVector<f64> {
        &self.s * &self.w
    }
}

/// Control variables of one filter step.
///
/// `predict` controls go to the state layer, `correct` controls to the measurement layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepControls {
    pub predict: Vec<Variable>,
    pub correct: Vec<Variable>,
}

/// A recursive Bayesian filter.
///
/// Estimators provide the initialize, predict and correct operations.
/// Stepping and filtering of measurement sequences is common to all.
pub trait RecursiveBayesian {
    /// The estimator's posterior summary of the state.
    type Belief;
    type Measurement;

    /// Initialise the belief from the model's initial state distribution.
    fn initialize(&mut self) -> Result<Self::Belief>;

    /// Predict the state with the state layer's conditional distribution.
    fn predict(&mut self, controls: &[Variable]) -> Result<()>;

    /// Correct the predicted state with a measurement.
    fn correct(&mut self, measurement: &Self::Measurement, controls: &[Variable]) -> Result<Self::Belief>;

    /// Predict then correct.
    fn step(&mut self, measurement: &Self::Measurement, controls: &StepControls) -> Result<Self::Belief> {
        self.predict(&controls.predict)?;
        self.correct(measurement, &controls.correct)
    }

    /// Filter a measurement sequence without controls.
    ///
    /// Returns the belief trajectory, the initial belief followed by the belief after each measurement.
    fn filter(&mut self, measurements: &[Self::Measurement]) -> Result<Vec<Self::Belief>> {
        let none = StepControls::default();
        let mut beliefs = Vec::with_capacity(measurements.len() + 1);
        beliefs.push(self.initialize()?);
        for z in measurements {
            beliefs.push(self.step(z, &none)?);
        }
        Ok(beliefs)
    }

    /// Filter a measurement sequence with the controls of each step.
    fn filter_with_controls(
        &mut self,
        measurements: &[Self::Measurement],
        controls: &[StepControls],
    ) -> Result<Vec<Self::Belief>> {
        if measurements.len() != controls.len() {
            return Err(EstimateError::precondition(format!(
                "{} measurements but {} step controls",
                measurements.len(),
                controls.len()
            )));
        }
        let mut beliefs = Vec::with_capacity(measurements.len() + 1);
        beliefs.push(self.initialize()?);
        for (z, c) in measurements.iter().zip(controls) {
            beliefs.push(self.step(z, c)?);
        }
        Ok(beliefs)
    }
}
