//! Estimation of the quadratic discharge-potential model.
//!
//! The piezometric potential is modeled as a quadratic trend around a
//! chosen origin,
//!
//! ```text
//! Phi(x, y) = A dx² + B dy² + C dx dy + D dx + E dy + F
//! ```
//!
//! with `dx = x - x0`, `dy = y - y0`, plus the deterministic contribution
//! of a well field of known discharges. Each piezometer observes head with
//! an independent normal error, which maps (through the unconfined or
//! confined potential relation) to a mean and standard deviation of the
//! potential itself. Dividing every design row by that standard deviation
//! makes ordinary least squares the maximum-likelihood estimate, and the
//! same weighted system yields the posterior covariance of the six
//! coefficients under a flat prior.
//!
//! The fit is a pure function of its inputs and the sampler state: holding
//! the seed fixed, repeated runs reproduce mean, covariance and
//! realizations exactly.

use chrono::Local;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::gauss::GaussianSampler;
use crate::linsys;
use crate::matrix::{Matrix, ops};

/// Number of model coefficients [A, B, C, D, E, F].
const N_COEF: usize = 6;

const FOUR_PI: f64 = 4.0 * std::f64::consts::PI;

/// Aquifer description shared by all observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aquifer {
    /// Hydraulic conductivity [L/T]. Must be positive.
    pub conductivity: f64,
    /// Aquifer thickness [L]. Must be positive.
    pub thickness: f64,
    /// Elevation of the aquifer base [L].
    pub base: f64,
}

/// A discharge-specified well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Well {
    pub x: f64,
    pub y: f64,
    /// Discharge [L³/T]; positive for extraction.
    pub discharge: f64,
}

/// A head observation with measurement uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Piezometer {
    pub x: f64,
    pub y: f64,
    /// Expected head [L].
    pub head: f64,
    /// Standard deviation of the head [L]. Must be positive.
    pub head_std: f64,
}

/// Everything the fit produces. The sample matrix is owned by the report;
/// each of its rows is one equiprobable realization of [A, B, C, D, E, F].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    /// Crate version that produced the report.
    pub version: String,
    /// Wall-clock time of the run, RFC 3339.
    pub run_time: String,
    /// Posterior mean of the coefficients.
    pub mu: [f64; N_COEF],
    /// Posterior covariance of the coefficients.
    pub cov: [[f64; N_COEF]; N_COEF],
    /// Number of realizations requested (and produced).
    pub n_sims: usize,
    /// `n_sims` x 6 matrix of simulated coefficient vectors.
    pub samples: Matrix,
}

/// Mean and standard deviation of the discharge potential at one
/// piezometer, derived from the observed head distribution.
///
/// Below the aquifer top the relation is Phi = ½k·h², so the expectation
/// picks up the head variance (E[h²] = E[h]² + Var[h]) and the standard
/// deviation is the linearization k·h·s. At or above the top the aquifer
/// is confined, the relation is linear in h, and both moments follow
/// directly.
fn potential_moments(aquifer: &Aquifer, piezometer: &Piezometer) -> (f64, f64) {
    let head = piezometer.head - aquifer.base;
    let k = aquifer.conductivity;
    let s = piezometer.head_std;

    if head < aquifer.thickness {
        (0.5 * k * (head * head + s * s), k * head * s)
    } else {
        let kh = k * aquifer.thickness;
        (kh * (head - 0.5 * aquifer.thickness), kh * s)
    }
}

/// Combined well-field potential at (x, y).
///
/// Written as (Q/4π)·ln(d²): leaving the squared distance under the log
/// folds the factor 2 of ln d² = 2 ln d into the conventional Q/(2π)
/// coefficient. Preserve this form; rewriting it as 2 ln d with Q/(2π)
/// changes nothing mathematically but invites sign and factor slips.
fn well_potential(wells: &[Well], x: f64, y: f64) -> f64 {
    wells
        .iter()
        .map(|w| {
            let dx = x - w.x;
            let dy = y - w.y;
            w.discharge / FOUR_PI * (dx * dx + dy * dy).ln()
        })
        .sum()
}

fn validate(aquifer: &Aquifer, piezometers: &[Piezometer]) -> Result<()> {
    if !(aquifer.conductivity > 0.0) {
        return Err(Error::InvalidArgument(format!(
            "hydraulic conductivity must be positive, got {}",
            aquifer.conductivity
        )));
    }
    if !(aquifer.thickness > 0.0) {
        return Err(Error::InvalidArgument(format!(
            "aquifer thickness must be positive, got {}",
            aquifer.thickness
        )));
    }
    if piezometers.len() < N_COEF {
        return Err(Error::InvalidArgument(format!(
            "at least {N_COEF} piezometers are required to identify {N_COEF} \
             coefficients, got {}",
            piezometers.len()
        )));
    }
    for (i, p) in piezometers.iter().enumerate() {
        if !(p.head_std > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "piezometer {i} has non-positive head standard deviation {}",
                p.head_std
            )));
        }
    }
    Ok(())
}

/// Fit the six-coefficient potential model to the piezometer observations
/// and draw `n_sims` equiprobable coefficient vectors from the posterior.
///
/// Fails with `InvalidArgument` on out-of-range inputs and with
/// `SingularSystem` when the piezometer geometry cannot identify all six
/// coefficients (the weighted normal matrix is then not positive
/// definite). Numerical failures are final; no retry is attempted.
pub fn fit(
    aquifer: &Aquifer,
    wells: &[Well],
    piezometers: &[Piezometer],
    x0: f64,
    y0: f64,
    n_sims: usize,
    sampler: &mut GaussianSampler,
) -> Result<FitReport> {
    validate(aquifer, piezometers)?;

    // Weighted design matrix and response, one row per piezometer.
    let n_piez = piezometers.len();
    let mut a = Matrix::zeros(n_piez, N_COEF);
    let mut b = Matrix::zeros(n_piez, 1);

    for (p, piezometer) in piezometers.iter().enumerate() {
        let (mu_phi, sigma_phi) = potential_moments(aquifer, piezometer);
        let phi_wells = well_potential(wells, piezometer.x, piezometer.y);

        let dx = piezometer.x - x0;
        let dy = piezometer.y - y0;

        a[(p, 0)] = dx * dx / sigma_phi;
        a[(p, 1)] = dy * dy / sigma_phi;
        a[(p, 2)] = dx * dy / sigma_phi;
        a[(p, 3)] = dx / sigma_phi;
        a[(p, 4)] = dy / sigma_phi;
        a[(p, 5)] = 1.0 / sigma_phi;

        b[(p, 0)] = (mu_phi - phi_wells) / sigma_phi;
    }
    debug!(
        "assembled weighted system: {n_piez} piezometers, {} wells",
        wells.len()
    );

    // Posterior covariance and mean share the same normal matrix.
    let ata = ops::mul_tn(&a, &a)?;
    let cov = linsys::spd_inverse(&ata)?;
    let mu = linsys::least_squares_solve(&a, &b)?;
    debug!("posterior solved; trend coefficients ({}, {})", mu[(0, 0)], mu[(1, 0)]);

    // Equiprobable realizations. The sampler expects a row mean; an empty
    // request never touches the sampler.
    let samples = if n_sims == 0 {
        Matrix::zeros(0, N_COEF)
    } else {
        let mu_row = ops::transpose(&mu)?;
        sampler.multivariate(n_sims, &mu_row, &cov)?
    };
    debug!("drew {n_sims} coefficient realizations");

    let mut mu_out = [0.0; N_COEF];
    let mut cov_out = [[0.0; N_COEF]; N_COEF];
    for i in 0..N_COEF {
        mu_out[i] = mu[(i, 0)];
        for j in 0..N_COEF {
            cov_out[i][j] = cov[(i, j)];
        }
    }

    Ok(FitReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        run_time: Local::now().to_rfc3339(),
        mu: mu_out,
        cov: cov_out,
        n_sims,
        samples,
    })
}
