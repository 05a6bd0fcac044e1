//! Bayesian state space models and recursive Bayesian estimation.
//!
//! Bayesian filtering combines a concise probabilistic formulation of a system with observations of that system.
//! Probability distributions represent the state of the system, conditional distributions the relationships
//! between its variables. For dynamic systems the formulation results in a naturally recursive solution:
//! each observation is fused with a prediction of the state made by the system's dynamic model.
//!
//! Systems are modeled as hierarchical stochastic processes, a dynamic Bayesian network of layers.
//! Each layer is a [`Markov`](process::Markov) process, with a state and an initial distribution, or a
//! [`Memoryless`](process::Memoryless) one. The random variable of a layer conditions the layer below it.
//! A two layer process of a state and a measurement is the classic state space model.
//!
//! Estimators take the process and implement the [`RecursiveBayesian`](models::RecursiveBayesian) operations
//! initialize, predict and correct for their state representation.
//! The [`KalmanFilter`](estimators::kalman::KalmanFilter) is the closed form solution for linear Gaussian models.
//! The [`ParticleFilter`](estimators::particle::ParticleFilter) handles any model by sequential importance resampling.

pub mod distribution;
pub mod error;
pub mod estimators;
pub mod linalg;
pub mod map;
pub mod models;
pub mod process;
pub mod random;

pub use error::{EstimateError, Result};
pub use models::{KalmanState, ParticleState, RecursiveBayesian, StepControls, Variable, VariableKind};
