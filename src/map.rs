#![allow(non_snake_case)]

//! Parameter maps.
//!
//! A parameter map is a pure function from condition variables y0..yn to the parameters of a distribution.
//! Maps declare the kinds of condition variables they take so compositions can be checked when they are built.
//!
//! The linear Gaussian maps also implement [`LinearGaussianModel`], exposing the transfer matrix and noise
//! covariance that linear estimators such as the Kalman filter need.

use nalgebra::{DMatrix, DVector};

use crate::distribution::GaussianParameter;
use crate::error::{EstimateError, Result};
use crate::models::{Variable, VariableKind};

/// A map from condition variables to distribution parameters.
pub trait ParameterMap {
    type Parameter;

    /// Kinds of the condition variables, in argument order.
    fn condition_kinds(&self) -> Vec<VariableKind>;

    /// Kind of the random variable whose distribution the parameters define.
    fn output_kind(&self) -> VariableKind;

    /// Parameters given the conditions.
    ///
    /// `conditions` must match [`condition_kinds`](ParameterMap::condition_kinds).
    fn parameters(&self, conditions: &[Variable]) -> Result<Self::Parameter>;
}

/// A linear Gaussian model x ~ N(F.y + u, Q), with u an additive term that depends on further conditions.
pub trait LinearGaussianModel: ParameterMap<Parameter = GaussianParameter> {
    /// Transfer matrix F of the first condition variable.
    fn transfer(&self) -> &DMatrix<f64>;

    /// Additive noise covariance Q.
    fn covariance(&self) -> &DMatrix<f64>;
}

fn vector_condition<'a>(conditions: &'a [Variable], i: usize) -> Result<&'a DVector<f64>> {
    conditions
        .get(i)
        .and_then(Variable::as_vector)
        .ok_or_else(|| EstimateError::precondition(format!("condition {} must be a vector", i)))
}

fn category_condition(conditions: &[Variable], i: usize) -> Result<usize> {
    conditions
        .get(i)
        .and_then(Variable::as_category)
        .ok_or_else(|| EstimateError::precondition(format!("condition {} must be a category", i)))
}

fn check_transfer_noise(Fx: &DMatrix<f64>, Q: &DMatrix<f64>) -> Result<()> {
    if Q.nrows() != Fx.nrows() || Q.ncols() != Fx.nrows() {
        return Err(EstimateError::construction(format!(
            "{}x{} transfer with {}x{} noise covariance",
            Fx.nrows(),
            Fx.ncols(),
            Q.nrows(),
            Q.ncols()
        )));
    }
    Ok(())
}

/// Linear Gaussian map y -> (F.y, Q).
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGaussian {
    /// Transfer matrix
    pub Fx: DMatrix<f64>,
    /// Noise covariance
    pub Q: DMatrix<f64>,
}

impl LinearGaussian {
    pub fn new(Fx: DMatrix<f64>, Q: DMatrix<f64>) -> Result<Self> {
        check_transfer_noise(&Fx, &Q)?;
        Ok(LinearGaussian { Fx, Q })
    }
}

impl ParameterMap for LinearGaussian {
    type Parameter = GaussianParameter;

    fn condition_kinds(&self) -> Vec<VariableKind> {
        vec![VariableKind::Vector(self.Fx.ncols())]
    }

    fn output_kind(&self) -> VariableKind {
        VariableKind::Vector(self.Fx.nrows())
    }

    fn parameters(&self, conditions: &[Variable]) -> Result<GaussianParameter> {
        let y = vector_condition(conditions, 0)?;
        Ok(GaussianParameter {
            mean: &self.Fx * y,
            covariance: self.Q.clone(),
        })
    }
}

impl LinearGaussianModel for LinearGaussian {
    fn transfer(&self) -> &DMatrix<f64> {
        &self.Fx
    }

    fn covariance(&self) -> &DMatrix<f64> {
        &self.Q
    }
}

/// Linear Gaussian map with a control input (y, u) -> (F.y + B.u, Q).
#[derive(Clone, Debug, PartialEq)]
pub struct ControlledLinearGaussian {
    /// Transfer matrix
    pub Fx: DMatrix<f64>,
    /// Control matrix
    pub B: DMatrix<f64>,
    /// Noise covariance
    pub Q: DMatrix<f64>,
}

impl ControlledLinearGaussian {
    pub fn new(Fx: DMatrix<f64>, B: DMatrix<f64>, Q: DMatrix<f64>) -> Result<Self> {
        check_transfer_noise(&Fx, &Q)?;
        if B.nrows() != Fx.nrows() {
            return Err(EstimateError::construction(format!(
                "{}x{} transfer with {}x{} control matrix",
                Fx.nrows(),
                Fx.ncols(),
                B.nrows(),
                B.ncols()
            )));
        }
        Ok(ControlledLinearGaussian { Fx, B, Q })
    }
}

impl ParameterMap for ControlledLinearGaussian {
    type Parameter = GaussianParameter;

    fn condition_kinds(&self) -> Vec<VariableKind> {
        vec![
            VariableKind::Vector(self.Fx.ncols()),
            VariableKind::Vector(self.B.ncols()),
        ]
    }

    fn output_kind(&self) -> VariableKind {
        VariableKind::Vector(self.Fx.nrows())
    }

    fn parameters(&self, conditions: &[Variable]) -> Result<GaussianParameter> {
        let y = vector_condition(conditions, 0)?;
        let u = vector_condition(conditions, 1)?;
        Ok(GaussianParameter {
            mean: &self.Fx * y + &self.B * u,
            covariance: self.Q.clone(),
        })
    }
}

impl LinearGaussianModel for ControlledLinearGaussian {
    fn transfer(&self) -> &DMatrix<f64> {
        &self.Fx
    }

    fn covariance(&self) -> &DMatrix<f64> {
        &self.Q
    }
}

/// Linear Gaussian map with a switched additive bias (y, k) -> (F.y + b_k, Q).
///
/// Column k of `biases` is the bias of mode k.
#[derive(Clone, Debug, PartialEq)]
pub struct SwitchingAdditiveLinearGaussian {
    /// Transfer matrix
    pub Fx: DMatrix<f64>,
    /// Noise covariance
    pub Q: DMatrix<f64>,
    /// Bias of each mode, one per column
    pub biases: DMatrix<f64>,
}

impl SwitchingAdditiveLinearGaussian {
    pub fn new(Fx: DMatrix<f64>, Q: DMatrix<f64>, biases: DMatrix<f64>) -> Result<Self> {
        check_transfer_noise(&Fx, &Q)?;
        if biases.nrows() != Fx.nrows() || biases.ncols() == 0 {
            return Err(EstimateError::construction(format!(
                "{}x{} transfer with {}x{} biases",
                Fx.nrows(),
                Fx.ncols(),
                biases.nrows(),
                biases.ncols()
            )));
        }
        Ok(SwitchingAdditiveLinearGaussian { Fx, Q, biases })
    }
}

impl ParameterMap for SwitchingAdditiveLinearGaussian {
    type Parameter = GaussianParameter;

    fn condition_kinds(&self) -> Vec<VariableKind> {
        vec![VariableKind::Vector(self.Fx.ncols()), VariableKind::Category]
    }

    fn output_kind(&self) -> VariableKind {
        VariableKind::Vector(self.Fx.nrows())
    }

    fn parameters(&self, conditions: &[Variable]) -> Result<GaussianParameter> {
        let y = vector_condition(conditions, 0)?;
        let k = category_condition(conditions, 1)?;
        if k >= self.biases.ncols() {
            return Err(EstimateError::precondition(format!(
                "mode {} of {}",
                k,
                self.biases.ncols()
            )));
        }
        Ok(GaussianParameter {
            mean: &self.Fx * y + self.biases.column(k),
            covariance: self.Q.clone(),
        })
    }
}

impl LinearGaussianModel for SwitchingAdditiveLinearGaussian {
    fn transfer(&self) -> &DMatrix<f64> {
        &self.Fx
    }

    fn covariance(&self) -> &DMatrix<f64> {
        &self.Q
    }
}

/// Markov chain transition map k -> column k of T.
///
/// T(i,j) is the probability of moving to category i from category j, so each column sums to 1.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionMatrix {
    pub T: DMatrix<f64>,
}

impl TransitionMatrix {
    pub fn new(T: DMatrix<f64>) -> Result<Self> {
        if !T.is_square() || T.is_empty() {
            return Err(EstimateError::construction(format!(
                "transition matrix {}x{} not square",
                T.nrows(),
                T.ncols()
            )));
        }
        Ok(TransitionMatrix { T })
    }
}

impl ParameterMap for TransitionMatrix {
    type Parameter = DVector<f64>;

    fn condition_kinds(&self) -> Vec<VariableKind> {
        vec![VariableKind::Category]
    }

    fn output_kind(&self) -> VariableKind {
        VariableKind::Category
    }

    fn parameters(&self, conditions: &[Variable]) -> Result<DVector<f64>> {
        let k = category_condition(conditions, 0)?;
        if k >= self.T.ncols() {
            return Err(EstimateError::precondition(format!(
                "category {} of {}",
                k,
                self.T.ncols()
            )));
        }
        Ok(self.T.column(k).into_owned())
    }
}
