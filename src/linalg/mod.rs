//! Linear algebra support for the distributions and filters.

pub mod cholesky;
pub mod rcond;

pub use cholesky::SpdFactor;

use nalgebra::DVector;

use crate::error::{EstimateError, Result};

/// Minimum reciprocal condition number of a PD matrix below which a warning is logged.
///
/// 1e5 * epsilon gives 5 decimal digits of headroom.
pub const LIMIT_PD: f64 = f64::EPSILON * 1e5;

/// Checks the reciprocal condition number is > 0.
///
/// IEC 559 NaN values are never true
pub fn check_positive(rcond: f64, message: &str) -> Result<f64> {
    if rcond > 0. {
        if rcond < LIMIT_PD {
            log::warn!("{}: ill-conditioned, rcond {:e}", message, rcond);
        }
        Ok(rcond)
    } else {
        Err(EstimateError::numerical(format!("{}: rcond {}", message, rcond)))
    }
}

/// Cumulative sum of weights using the Kahan algorithm.
///
/// Fails on a negative weight, a zero total or a NaN in the sum.
/// Any numerical failure cascades into the cumulative sum so only the total need be checked for NaN.
pub fn cumulative_sum(w: &DVector<f64>) -> Result<DVector<f64>> {
    let mut cum = DVector::zeros(w.nrows());
    let mut wcum = 0.;
    let mut c = 0.;
    for (i, &wi) in w.iter().enumerate() {
        if wi < 0. {
            return Err(EstimateError::numerical("negative weight"));
        }
        let y = wi - c;
        let t = wcum + y;
        c = (t - wcum) - y;
        wcum = t;
        cum[i] = t;
    }
    if wcum.is_nan() {
        return Err(EstimateError::numerical("NaN cumulative weight sum"));
    }
    if wcum <= 0. {
        return Err(EstimateError::numerical("zero cumulative weight sum"));
    }
    Ok(cum)
}

/// Checks every element of a vector is finite.
pub fn check_finite<'a, I: IntoIterator<Item = &'a f64>>(values: I, what: &str) -> Result<()> {
    if values.into_iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(EstimateError::numerical(format!("{} not finite", what)))
    }
}
