#![allow(non_snake_case)]

//! Kalman filter state estimation.
//!
//! A recursive Bayesian estimator that uses a Kalman state representation [`KalmanState`] of the system.
//! The Kalman state is simply the x,X pair, the dimensions of both are the dimensions of the system.
//!
//! The filter is built from a two layer [`Hierarchical`] process: a [`Markov`] state layer and a [`Memoryless`]
//! measurement layer, both Gaussian with [`LinearGaussianModel`] maps. The transfer matrices and noise covariances
//! of the models are the F, Q and H, R of the filter.
//! The full maps, including any additive control terms, are used for the predicted state and the predicted measurement.
//!
//! [`KalmanState`]: ../../models/struct.KalmanState.html

use nalgebra::{DMatrix, DVector};

use crate::distribution::Gaussian;
use crate::error::{EstimateError, Result};
use crate::linalg::{self, SpdFactor};
use crate::map::LinearGaussianModel;
use crate::models::{check_conditions, KalmanState, RecursiveBayesian, Variable};
use crate::process::{Hierarchical, Markov, Memoryless, Process};

/// The state layer of a Kalman filter process.
pub type KalmanStateLayer<SM> = Markov<Gaussian, SM, Gaussian>;
/// The measurement layer of a Kalman filter process.
pub type KalmanMeasurementLayer<OM> = Memoryless<Gaussian, OM>;

/// Kalman filter.
///
/// `SM` is the state transition model and `OM` the measurement model.
pub struct KalmanFilter<SM, OM> {
    process: Hierarchical,
    state_model: SM,
    measurement_model: OM,
    initial: KalmanState,
    // predicted state x(t|t-1), X(t|t-1)
    predicted: Option<KalmanState>,
    // corrected state x(t|t), X(t|t)
    corrected: Option<KalmanState>,
}

impl<SM, OM> KalmanFilter<SM, OM>
where
    SM: LinearGaussianModel + Clone + 'static,
    OM: LinearGaussianModel + Clone + 'static,
{
    /// Construct a Kalman filter with the models of a two layer process.
    ///
    /// Layer 0 must be a [`KalmanStateLayer<SM>`] and layer 1 a [`KalmanMeasurementLayer<OM>`].
    pub fn new(process: Hierarchical) -> Result<Self> {
        if process.depth() != 2 {
            return Err(EstimateError::construction(format!(
                "Kalman filter of a {} layer process",
                process.depth()
            )));
        }
        let state_layer = process.layer::<KalmanStateLayer<SM>>(0)?;
        let measurement_layer = process.layer::<KalmanMeasurementLayer<OM>>(1)?;
        let state_model = state_layer.conditional().map().clone();
        let measurement_model = measurement_layer.conditional().map().clone();
        let initial = KalmanState {
            x: state_layer.initial().mean().clone(),
            X: state_layer.initial().covariance().clone(),
        };

        let d = initial.x.nrows();
        let Fx = state_model.transfer();
        let Hx = measurement_model.transfer();
        if Fx.nrows() != d || Fx.ncols() != d {
            return Err(EstimateError::construction(format!(
                "{}x{} state transition for state dimension {}",
                Fx.nrows(),
                Fx.ncols(),
                d
            )));
        }
        if Hx.ncols() != d {
            return Err(EstimateError::construction(format!(
                "{}x{} measurement matrix for state dimension {}",
                Hx.nrows(),
                Hx.ncols(),
                d
            )));
        }
        let z = measurement_model.covariance().nrows();
        if Hx.nrows() != z || measurement_model.covariance().ncols() != z {
            return Err(EstimateError::construction(format!(
                "{}x{} measurement matrix with {}x{} measurement noise",
                Hx.nrows(),
                Hx.ncols(),
                z,
                measurement_model.covariance().ncols()
            )));
        }

        Ok(KalmanFilter {
            process,
            state_model,
            measurement_model,
            initial,
            predicted: None,
            corrected: None,
        })
    }

    /// Construct a Kalman filter from its state and measurement layers.
    pub fn from_layers(state: KalmanStateLayer<SM>, measurement: KalmanMeasurementLayer<OM>) -> Result<Self> {
        let layers: Vec<Box<dyn Process>> = vec![Box::new(state), Box::new(measurement)];
        KalmanFilter::new(Hierarchical::new(layers)?)
    }

    pub fn process(&self) -> &Hierarchical {
        &self.process
    }

    /// State transition matrix F.
    pub fn state_transition(&self) -> &DMatrix<f64> {
        self.state_model.transfer()
    }

    /// State noise covariance Q.
    pub fn state_noise(&self) -> &DMatrix<f64> {
        self.state_model.covariance()
    }

    /// Measurement matrix H.
    pub fn measurement_matrix(&self) -> &DMatrix<f64> {
        self.measurement_model.transfer()
    }

    /// Measurement noise covariance R.
    pub fn measurement_noise(&self) -> &DMatrix<f64> {
        self.measurement_model.covariance()
    }

    /// The last predicted state.
    pub fn predicted(&self) -> Option<&KalmanState> {
        self.predicted.as_ref()
    }

    /// The last corrected state.
    pub fn corrected(&self) -> Option<&KalmanState> {
        self.corrected.as_ref()
    }

    fn map_mean<M: LinearGaussianModel>(model: &M, x: &DVector<f64>, controls: &[Variable]) -> Result<DVector<f64>> {
        let mut conditions = Vec::with_capacity(controls.len() + 1);
        conditions.push(Variable::Vector(x.clone()));
        conditions.extend_from_slice(controls);
        check_conditions(&model.condition_kinds(), &conditions)?;
        Ok(model.parameters(&conditions)?.mean)
    }
}

impl<SM, OM> RecursiveBayesian for KalmanFilter<SM, OM>
where
    SM: LinearGaussianModel + Clone + 'static,
    OM: LinearGaussianModel + Clone + 'static,
{
    type Belief = KalmanState;
    type Measurement = DVector<f64>;

    fn initialize(&mut self) -> Result<KalmanState> {
        self.predicted = None;
        self.corrected = Some(self.initial.clone());
        Ok(self.initial.clone())
    }

    /// x(t|t-1) = f(x(t-1|t-1), controls), X(t|t-1) = F.X(t-1|t-1).F' + Q
    fn predict(&mut self, controls: &[Variable]) -> Result<()> {
        let corrected = self
            .corrected
            .as_ref()
            .ok_or_else(|| EstimateError::precondition("Kalman predict before initialize"))?;
        let Fx = self.state_model.transfer();

        let x = Self::map_mean(&self.state_model, &corrected.x, controls)?;
        let X = Fx * &corrected.X * Fx.transpose() + self.state_model.covariance();
        linalg::check_finite(x.iter().chain(X.iter()), "predicted state")?;
        log::trace!("Kalman predict x={:?}", x.as_slice());

        self.predicted = Some(KalmanState { x, X });
        Ok(())
    }

    /// Innovation s = z - h(x(t|t-1), controls), S = H.X(t|t-1).H' + R, W = X(t|t-1).H'.inv(S),
    /// x(t|t) = x(t|t-1) + W.s, X(t|t) = X(t|t-1) - W.H.X(t|t-1)
    fn correct(&mut self, measurement: &DVector<f64>, controls: &[Variable]) -> Result<KalmanState> {
        let predicted = self
            .predicted
            .as_ref()
            .ok_or_else(|| EstimateError::precondition("Kalman correct before predict"))?;
        let Hx = self.measurement_model.transfer();
        if measurement.nrows() != Hx.nrows() {
            return Err(EstimateError::precondition(format!(
                "measurement of dimension {} for a {} dimensional measurement model",
                measurement.nrows(),
                Hx.nrows()
            )));
        }

        let s = measurement - Self::map_mean(&self.measurement_model, &predicted.x, controls)?;
        let HX = Hx * &predicted.X;
        // S = Hx.X.Hx' + R
        let S = &HX * Hx.transpose() + self.measurement_model.covariance();
        let S_factor = SpdFactor::new(&S, "S in correct")?;
        if S_factor.rcond() <= f64::EPSILON {
            return Err(EstimateError::numerical(format!(
                "S in correct near singular: rcond {:e}",
                S_factor.rcond()
            )));
        }
        // Kalman gain W = X.Hx'.inv(S), by solving S.W' = Hx.X
        let W = S_factor.solve(&HX).transpose();

        let x = &predicted.x + &W * s;
        let X = &predicted.X - &W * &HX;
        linalg::check_finite(x.iter().chain(X.iter()), "corrected state")?;
        log::trace!("Kalman correct x={:?}", x.as_slice());

        let state = KalmanState { x, X };
        self.corrected = Some(state.clone());
        Ok(state)
    }
}
