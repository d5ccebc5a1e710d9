//! SGS fields from averaged coefficients, with clipping.
//!
//! ```text
//! ν_t  = max(cD Δ² |D|, −ν)
//! k    = max(cI Δ² |D|², kMin)
//! Ce   = max(Ce, 0)
//! DkEff = max(ν_t + ν, 0)
//! ```

use crate::support::field::Field;

/// A field after clipping, with the number of cells that hit the bound.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Clipped {
    pub(crate) values: Field<f64>,
    pub(crate) clipped: usize,
}

/// Eddy viscosity, bounded below by the negative molecular viscosity.
///
/// Backscatter (`ν_t < 0`) is kept as long as `ν + ν_t ≥ 0`.
pub(crate) fn nut(
    cd: &Field<f64>,
    delta: &Field<f64>,
    mag_d: &Field<f64>,
    nu: &Field<f64>,
) -> Clipped {
    let unclipped = Field::from_fn(cd.len(), |i| cd[i] * delta[i].powi(2) * mag_d[i]);
    clip_below(&unclipped, |i| -nu[i])
}

/// SGS kinetic energy, bounded below by `k_min`.
pub(crate) fn k(ci: &Field<f64>, delta: &Field<f64>, mag_d: &Field<f64>, k_min: f64) -> Clipped {
    let unclipped = Field::from_fn(ci.len(), |i| ci[i] * (delta[i] * mag_d[i]).powi(2));
    clip_below(&unclipped, |_| k_min)
}

/// Dissipation coefficient, bounded below by zero.
pub(crate) fn clip_ce(ce: &Field<f64>) -> Clipped {
    clip_below(ce, |_| 0.0)
}

/// Effective diffusivity for the SGS energy equation, `ν_t + ν`.
///
/// The bound is `≥ 0`, not strictly positive. Cells where [`nut`] clipped to
/// `−ν` give exactly zero, and a host diffusion operator must accept a zero
/// coefficient there. A positive floor would add molecular-scale diffusion
/// the closure did not predict.
pub(crate) fn dk_eff(nut: &Field<f64>, nu: &Field<f64>) -> Field<f64> {
    nut.zip_map(nu, |nut, nu| (nut + nu).max(0.0))
}

fn clip_below<F>(field: &Field<f64>, bound: F) -> Clipped
where
    F: Fn(usize) -> f64 + Sync + Send,
{
    let values = Field::from_fn(field.len(), |i| field[i].max(bound(i)));
    let clipped = field
        .iter()
        .zip(&values)
        .filter(|(raw, clipped)| raw != clipped)
        .count();
    Clipped { values, clipped }
}
