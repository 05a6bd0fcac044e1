//! Numerical comparison of reciprocal condition numbers.
//!
//! Required for all linear algebra in distributions and filters.

use nalgebra::{DMatrix, DVector};

/// Estimate the reciprocal condition number of a diagonal matrix for inversion.
///
/// The diagonal matrix is passed as a vector of its diagonal elements.
///
/// The condition number is defined from a matrix norm.
/// The max element of `dv` is the norm of the original matrix and the min element the norm of its inverse,
/// therefore rcond = min/max.
///
/// Defined to be 0 for a semi-definite or empty matrix, 0 for max and min infinite,
/// and <0 for a negative matrix (an element < 0) or with any NaN element.
/// By definition rcond <= 1 as min <= max.
pub fn rcond_vec(dv: &DVector<f64>) -> f64 {
    if dv.is_empty() {
        return 0.;
    }
    let mut mind = dv[0];
    let mut maxd = mind;

    for &d in dv.iter() {
        if d.is_nan() {
            mind = -1.;
            break;
        }
        if d < mind {
            mind = d;
        }
        if d > maxd {
            maxd = d;
        }
    }

    rcond_min_max(mind, maxd)
}

/// Estimate the reciprocal condition number of a symmetric matrix from its diagonal.
///
/// Exact for a diagonal matrix, and for the d factor of a UdU' or LdL' factorisation.
pub fn rcond_symetric(sm: &DMatrix<f64>) -> f64 {
    rcond_vec(&sm.diagonal())
}

/// Estimate the reciprocal condition number of a PD matrix from its Cholesky factor L, where the matrix is LL'.
///
/// The rcond of the original matrix is the square of the rcond of diagonal(L).
pub fn rcond_cholesky(l: &DMatrix<f64>) -> f64 {
    let rcond = rcond_symetric(l);
    // Square, keeping rcond's sign
    if rcond < 0. {
        -(rcond * rcond)
    } else {
        rcond * rcond
    }
}

fn rcond_min_max(mind: f64, maxd: f64) -> f64 {
    if mind < 0. {
        // matrix is negative, mind does not represent a rcond
        mind
    } else {
        let rcond = mind / maxd;
        if rcond.is_nan() {
            // singular due to (mind == maxd) == (zero or infinity)
            0.
        } else {
            rcond
        }
    }
}
