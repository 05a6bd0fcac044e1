//! Particle filter state estimation, sequential importance resampling.
//!
//! A recursive Bayesian estimator that uses a sampled representation [`ParticleState`] of the system state.
//! Particles are the columns of a matrix, each with a weight. Weights are normalised after every update.
//!
//! The filter is built from a two layer [`Hierarchical`] process. Layer 0 is the state layer: its initial
//! distribution seeds the particles and its conditional distribution, given a particle and controls, moves them.
//! Layer 1 is the measurement layer: its conditional likelihood of a measurement given a particle weights them.
//!
//! [`ParticleState`]: ../../models/struct.ParticleState.html

use nalgebra::{DMatrix, DVector};
use rand_core::RngCore;

use super::resampler::Resample;
use crate::error::{EstimateError, Result};
use crate::linalg;
use crate::models::{ParticleState, RecursiveBayesian, Variable, VariableKind};
use crate::process::Hierarchical;
use crate::random::ThreadGenerator;

/// Particle filter.
pub struct ParticleFilter<R> {
    process: Hierarchical,
    resampler: R,
    rng: Box<dyn RngCore>,
    // state dimension
    d: usize,
    /// Particles, one per column
    s: DMatrix<f64>,
    /// Normalised weights
    w: DVector<f64>,
    initialized: bool,
}

impl<R: Resample> ParticleFilter<R> {
    /// Construct a filter of `m` particles drawing from the thread's generator.
    pub fn new(process: Hierarchical, resampler: R, m: usize) -> Result<Self> {
        ParticleFilter::with_generator(process, resampler, m, Box::new(ThreadGenerator))
    }

    /// Construct a filter of `m` particles drawing from `rng`.
    pub fn with_generator(process: Hierarchical, resampler: R, m: usize, rng: Box<dyn RngCore>) -> Result<Self> {
        if process.depth() != 2 {
            return Err(EstimateError::construction(format!(
                "particle filter of a {} layer process",
                process.depth()
            )));
        }
        if m == 0 {
            return Err(EstimateError::construction("particle filter without particles"));
        }
        let state = process.process(0)?;
        if state.initial_density().is_none() {
            return Err(EstimateError::construction("particle filter state layer without an initial distribution"));
        }
        let d = match state.variable_kind() {
            VariableKind::Vector(d) => d,
            kind => {
                return Err(EstimateError::construction(format!(
                    "particle filter of a {:?} state",
                    kind
                )))
            }
        };
        // a Markov measurement layer would condition on its own state as well as the particle
        if process.process(1)?.initial_density().is_some() {
            return Err(EstimateError::construction("particle filter measurement layer must be memoryless"));
        }

        Ok(ParticleFilter {
            process,
            resampler,
            rng,
            d,
            s: DMatrix::zeros(d, m),
            w: DVector::from_element(m, 1. / m as f64),
            initialized: false,
        })
    }

    pub fn process(&self) -> &Hierarchical {
        &self.process
    }

    pub fn resampler(&self) -> &R {
        &self.resampler
    }

    /// Particles, one per column.
    pub fn particles(&self) -> &DMatrix<f64> {
        &self.s
    }

    /// Normalised particle weights.
    pub fn weights(&self) -> &DVector<f64> {
        &self.w
    }

    pub fn particle_count(&self) -> usize {
        self.s.ncols()
    }

    /// Weighted mean of the particles.
    pub fn state_mean(&self) -> DVector<f64> {
        &self.s * &self.w
    }

    fn belief(&self) -> ParticleState {
        ParticleState {
            s: self.s.clone(),
            w: self.w.clone(),
        }
    }

    fn check_initialized(&self, operation: &str) -> Result<()> {
        if !self.initialized {
            return Err(EstimateError::precondition(format!(
                "particle {} before initialize",
                operation
            )));
        }
        Ok(())
    }

    fn normalised(mut w: DVector<f64>) -> Result<DVector<f64>> {
        let wsum = w.sum();
        if !(wsum > 0.) || !wsum.is_finite() {
            return Err(EstimateError::numerical(format!(
                "particle weights sum to {}",
                wsum
            )));
        }
        w /= wsum;
        Ok(w)
    }

    // The condition variables of a layer given a particle
    fn conditions(x: DVector<f64>, controls: &[Variable]) -> Vec<Variable> {
        let mut conditions = Vec::with_capacity(controls.len() + 1);
        conditions.push(Variable::Vector(x));
        conditions.extend_from_slice(controls);
        conditions
    }
}

impl<R: Resample> RecursiveBayesian for ParticleFilter<R> {
    type Belief = ParticleState;
    type Measurement = Variable;

    /// Draw the particles from the initial distribution, weighted by their initial likelihood.
    fn initialize(&mut self) -> Result<ParticleState> {
        let initial = self
            .process
            .process(0)?
            .initial_density()
            .ok_or_else(|| EstimateError::construction("state layer without an initial distribution"))?;
        let mut s = DMatrix::zeros(self.d, self.s.ncols());
        let mut w = DVector::zeros(self.s.ncols());
        for j in 0..s.ncols() {
            let x = initial.random(&mut *self.rng);
            let v = x
                .as_vector()
                .ok_or_else(|| EstimateError::numerical("initial distribution sampled a category"))?;
            s.set_column(j, v);
            w[j] = initial.likelihood(&x)?;
        }
        self.w = Self::normalised(w)?;
        self.s = s;
        self.initialized = true;
        log::trace!("particle initialize of {} particles", self.s.ncols());
        Ok(self.belief())
    }

    /// Move each particle by a draw from the state transition given the particle and the controls.
    fn predict(&mut self, controls: &[Variable]) -> Result<()> {
        self.check_initialized("predict")?;
        let transition = self.process.process_mut(0)?.conditional_mut();
        let mut s = DMatrix::zeros(self.d, self.s.ncols());
        for j in 0..s.ncols() {
            let conditions = Self::conditions(self.s.column(j).into_owned(), controls);
            let x = transition.random(&conditions, &mut *self.rng)?;
            match x.as_vector() {
                Some(v) if v.nrows() == self.d => s.set_column(j, v),
                _ => {
                    return Err(EstimateError::numerical(format!(
                        "state transition sampled {:?}",
                        x.kind()
                    )))
                }
            }
        }
        linalg::check_finite(s.iter(), "predicted particles")?;
        self.s = s;
        log::trace!("particle predict");
        Ok(())
    }

    /// Weight each particle by the likelihood of the measurement, normalise, then resample.
    fn correct(&mut self, measurement: &Variable, controls: &[Variable]) -> Result<ParticleState> {
        self.check_initialized("correct")?;
        // weights are only replaced once the whole update succeeds
        let observation = self.process.process_mut(1)?.conditional_mut();
        let mut w = self.w.clone();
        for j in 0..self.s.ncols() {
            let conditions = Self::conditions(self.s.column(j).into_owned(), controls);
            w[j] *= observation.likelihood(measurement, &conditions)?;
        }
        self.w = Self::normalised(w)?;
        let resampled = self.resampler.resample(&mut self.s, &mut self.w, &mut *self.rng)?;
        log::trace!("particle correct, resampled {}", resampled);
        Ok(self.belief())
    }
}
