//! Bayesian state estimators built on hierarchical processes.

pub mod kalman;
pub mod particle;
pub mod resampler;
