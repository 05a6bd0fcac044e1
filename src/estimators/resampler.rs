//! Particle resampling.
//!
//! A [`Resampler`] combines a [`Criterion`], deciding whether a population is resampled, with a [`Method`]
//! generating the ordered uniform numbers used to pick the resampled particles.
//!
//! Algorithm:
//!  A particle is chosen once each time its cumulative weight is the first to exceed an ordered number.
//!  The particle population is replaced by the chosen particles and their weights reset to 1/M.
//!
//! J. D. Hol, T. B. Schon and F. Gustafsson, "On Resampling Algorithms for Particle Filters",
//! Nonlinear Statistical Signal Processing Workshop, 2006.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_core::RngCore;

use crate::error::{EstimateError, Result};
use crate::linalg;

/// Resampling of a particle population.
pub trait Resample {
    /// Resample the particles `s` (one per column) with normalised weights `w`.
    ///
    /// Returns true if the population was resampled.
    fn resample(&mut self, s: &mut DMatrix<f64>, w: &mut DVector<f64>, rng: &mut dyn RngCore) -> Result<bool>;
}

/// A predicate over the weights deciding whether to resample.
pub trait Criterion {
    fn should_resample(&self, w: &DVector<f64>) -> bool;
}

impl<F: Fn(&DVector<f64>) -> bool> Criterion for F {
    fn should_resample(&self, w: &DVector<f64>) -> bool {
        self(w)
    }
}

/// Always resample.
#[derive(Clone, Copy, Debug, Default)]
pub struct Always;

impl Criterion for Always {
    fn should_resample(&self, _w: &DVector<f64>) -> bool {
        true
    }
}

/// Never resample.
#[derive(Clone, Copy, Debug, Default)]
pub struct Never;

impl Criterion for Never {
    fn should_resample(&self, _w: &DVector<f64>) -> bool {
        false
    }
}

/// Effective sample size, (sum w)^2 / sum w^2.
///
/// For normalised weights this is 1 / sum w^2, M for uniform weights and 1 when one particle has all the weight.
pub fn effective_sample_size(w: &DVector<f64>) -> f64 {
    let sum = w.sum();
    sum * sum / w.norm_squared()
}

/// Resample when the effective sample size falls below a threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectiveSampleSize {
    /// Minimum number of effective samples.
    pub threshold: f64,
}

impl EffectiveSampleSize {
    pub fn new(threshold: f64) -> Self {
        EffectiveSampleSize { threshold }
    }
}

impl Criterion for EffectiveSampleSize {
    fn should_resample(&self, w: &DVector<f64>) -> bool {
        effective_sample_size(w) < self.threshold
    }
}

/// Generates M ordered numbers in [0,1).
pub trait Method {
    fn ordered_numbers(&self, m: usize, rng: &mut dyn RngCore) -> DVector<f64>;
}

/// Systematic resampling.
///
/// One uniform draw u0 in [0,1) gives the numbers (k + u0) / M, k = 0..M-1.
#[derive(Clone, Copy, Debug, Default)]
pub struct Systematic;

impl Method for Systematic {
    fn ordered_numbers(&self, m: usize, rng: &mut dyn RngCore) -> DVector<f64> {
        let u0: f64 = rng.gen();
        let mf = m as f64;
        DVector::from_fn(m, |k, _| (k as f64 + u0) / mf)
    }
}

/// Multinomial resampling.
///
/// M independent uniform draws, sorted. Complexity O(M log M).
#[derive(Clone, Copy, Debug, Default)]
pub struct Multinomial;

impl Method for Multinomial {
    fn ordered_numbers(&self, m: usize, rng: &mut dyn RngCore) -> DVector<f64> {
        let mut ur: Vec<f64> = (0..m).map(|_| rng.gen()).collect();
        ur.sort_by(|a, b| a.total_cmp(b));
        DVector::from_vec(ur)
    }
}

/// A resampling method gated by a criterion.
#[derive(Clone, Debug)]
pub struct Resampler<M, C> {
    method: M,
    criterion: C,
}

impl<M: Method, C: Criterion> Resampler<M, C> {
    pub fn new(method: M, criterion: C) -> Self {
        Resampler { method, criterion }
    }

    pub fn method(&self) -> &M {
        &self.method
    }

    pub fn criterion(&self) -> &C {
        &self.criterion
    }
}

impl<C: Criterion> Resampler<Systematic, C> {
    pub fn systematic(criterion: C) -> Self {
        Resampler::new(Systematic, criterion)
    }
}

impl<M: Method, C: Criterion> Resample for Resampler<M, C> {
    fn resample(&mut self, s: &mut DMatrix<f64>, w: &mut DVector<f64>, rng: &mut dyn RngCore) -> Result<bool> {
        if s.ncols() != w.nrows() {
            return Err(EstimateError::precondition(format!(
                "{} particles with {} weights",
                s.ncols(),
                w.nrows()
            )));
        }
        if !self.criterion.should_resample(w) {
            return Ok(false);
        }
        let m = w.nrows();
        let u = self.method.ordered_numbers(m, rng);
        let picks = select(w, &u)?;
        log::debug!(
            "resampled {} particles, {} unique, effective sample size was {}",
            m,
            unique_count(&picks),
            effective_sample_size(w)
        );

        let old = s.clone();
        for (j, &i) in picks.iter().enumerate() {
            s.set_column(j, &old.column(i));
        }
        w.fill(1. / m as f64);
        Ok(true)
    }
}

/// Never resamples.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl Resample for Identity {
    fn resample(&mut self, _s: &mut DMatrix<f64>, _w: &mut DVector<f64>, _rng: &mut dyn RngCore) -> Result<bool> {
        Ok(false)
    }
}

/// Inverse CDF selection.
///
/// For each of the ordered numbers `u` the index of the first particle whose cumulative weight exceeds it.
/// Weights need not be normalised, the ordered numbers are scaled to the cumulative weight sum.
pub fn select(w: &DVector<f64>, u: &DVector<f64>) -> Result<Vec<usize>> {
    let cum = linalg::cumulative_sum(w)?;
    let m = cum.nrows();
    let wcum = cum[m - 1];
    let mut picks = Vec::with_capacity(u.nrows());
    let mut i = 0;
    for &uk in u.iter() {
        let uk = uk * wcum;
        while i < m && cum[i] <= uk {
            i += 1;
        }
        if i == m {
            // rounding in the cumulative sum, the last particle with weight takes the pick
            i = (0..m).rev().find(|&k| w[k] > 0.).unwrap_or(m - 1);
        }
        picks.push(i);
    }
    Ok(picks)
}

fn unique_count(picks: &[usize]) -> usize {
    // picks are ordered
    let mut unique = 0;
    let mut last = None;
    for &p in picks {
        if last != Some(p) {
            unique += 1;
            last = Some(p);
        }
    }
    unique
}
