//! Germano-identity coefficients for compressible flow.
//!
//! The model closes the deviatoric and isotropic parts of the SGS stress with
//! two coefficients (Martin, Piomelli & Candler, 2000):
//!
//! ```text
//! τ_d  = −2 cD ρ Δ² |D| D
//! τ_kk =  2 cI ρ Δ² |D|²
//! ```
//!
//! Applying the same closure at the test-filter scale `Δ̂ = r Δ` and
//! subtracting the test-filtered grid-scale closure gives the resolved
//! Leonard stress in terms of the unknown coefficient:
//!
//! ```text
//! L   = ρU⊗U^ − ρU^ ⊗ ρU^ / ρ^
//! M   = 2Δ² ( (ρ|D|D)^ − β ρ^ |D̃| D̃ )
//! m   = 2Δ² ( β ρ^ |D̃|² − (ρ|D|²)^ )
//! cD  = (dev(L) : M) / (M : M)
//! cI  = (tr(L) m) / (m m)
//! ```
//!
//! where `^` is the test filter, `β = r²`, and `D̃ = (ρD)^ / ρ^` is the
//! Favre test-filtered strain rate.
//!
//! The dissipation coefficient follows from the resolved test-scale energy
//! `KK = ½ tr(L) / ρ^`:
//!
//! ```text
//! Ce = 2Δ ν_eff ( (D:D)^ − D^:D^ ) / KK^(3/2)
//! ```
//!
//! Every ratio is guarded: when the denominator magnitude is at or below the
//! configured floor, or the quotient is not finite, the coefficient takes the
//! neutral value zero and the cell is counted as degenerate.

use crate::support::{
    field::{Field, Tensor, Vector, dev, double_dot, mag_sqr, outer},
    filter::TestFilter,
    mesh::Mesh,
};

/// A coefficient field before local averaging.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Raw {
    pub(crate) values: Field<f64>,

    /// Number of cells where the ratio was guarded.
    pub(crate) degenerate: usize,
}

/// Evaluates raw dynamic coefficients for one resolved flow state.
///
/// Filtered density, momentum and the Leonard stress are computed once at
/// construction and shared by all coefficients.
pub(crate) struct CoefficientCalculator<'a, M, F> {
    mesh: &'a M,
    filter: &'a F,
    delta: &'a Field<f64>,
    rho: &'a Field<f64>,
    rho_hat: Field<f64>,
    leonard: Field<Tensor>,
    beta: f64,
    floor: f64,
}

impl<'a, M: Mesh, F: TestFilter + Sync> CoefficientCalculator<'a, M, F> {
    /// Prepares the test-filtered fields.
    ///
    /// `rho` is the phase-weighted density `αρ`.
    pub(crate) fn new(
        mesh: &'a M,
        filter: &'a F,
        delta: &'a Field<f64>,
        rho: &'a Field<f64>,
        u: &Field<Vector>,
        beta: f64,
        floor: f64,
    ) -> Self {
        let n = mesh.n_cells();

        let rho_hat = filter.apply(mesh, rho);
        let rho_u_hat = filter.apply(mesh, &Field::from_fn(n, |i| u[i] * rho[i]));
        let rho_uu_hat = filter.apply(mesh, &Field::from_fn(n, |i| outer(&u[i], &u[i]) * rho[i]));

        let leonard = Field::from_fn(n, |i| {
            rho_uu_hat[i] - outer(&rho_u_hat[i], &rho_u_hat[i]) * inverse(rho_hat[i])
        });

        Self {
            mesh,
            filter,
            delta,
            rho,
            rho_hat,
            leonard,
            beta,
            floor,
        }
    }

    /// Raw deviatoric (eddy-viscosity) coefficient `cD`.
    pub(crate) fn cd(&self, d: &Field<Tensor>, mag_d: &Field<f64>) -> Raw {
        let n = self.mesh.n_cells();
        let rho = self.rho;

        let d_tilde = self.favre(d);
        let rho_mag_d_d = self
            .filter
            .apply(self.mesh, &Field::from_fn(n, |i| d[i] * (rho[i] * mag_d[i])));

        let ratios = Field::from_fn(n, |i| {
            let mag_d_tilde = (2.0 * mag_sqr(&d_tilde[i])).sqrt();
            let mm = (rho_mag_d_d[i] - d_tilde[i] * (self.beta * self.rho_hat[i] * mag_d_tilde))
                * (2.0 * self.delta[i].powi(2));

            self.ratio(double_dot(&dev(&self.leonard[i]), &mm), mag_sqr(&mm))
        });

        Raw::from_ratios(&ratios)
    }

    /// Raw isotropic (SGS kinetic energy) coefficient `cI`.
    pub(crate) fn ci(&self, d: &Field<Tensor>, mag_d: &Field<f64>) -> Raw {
        let n = self.mesh.n_cells();
        let rho = self.rho;

        let d_tilde = self.favre(d);
        let rho_mag_sqr_d = self
            .filter
            .apply(self.mesh, &Field::from_fn(n, |i| rho[i] * mag_d[i].powi(2)));

        let ratios = Field::from_fn(n, |i| {
            let mag_sqr_d_tilde = 2.0 * mag_sqr(&d_tilde[i]);
            let mm = 2.0
                * self.delta[i].powi(2)
                * (self.beta * self.rho_hat[i] * mag_sqr_d_tilde - rho_mag_sqr_d[i]);

            self.ratio(self.leonard[i].trace() * mm, mm * mm)
        });

        Raw::from_ratios(&ratios)
    }

    /// Resolved kinetic energy between the grid and test scales, `KK`.
    pub(crate) fn kk(&self) -> Field<f64> {
        Field::from_fn(self.mesh.n_cells(), |i| {
            (0.5 * self.leonard[i].trace() * inverse(self.rho_hat[i])).max(0.0)
        })
    }

    /// Raw dissipation coefficient `Ce`.
    ///
    /// `kk` is the resolved test-scale energy from [`Self::kk`] and `nu_eff`
    /// the effective kinematic viscosity `ν + ν_t`.
    pub(crate) fn ce(&self, d: &Field<Tensor>, kk: &Field<f64>, nu_eff: &Field<f64>) -> Raw {
        let n = self.mesh.n_cells();

        let d_hat = self.filter.apply(self.mesh, d);
        let mag_sqr_d_hat = self.filter.apply(self.mesh, &d.map(mag_sqr));

        let ratios = Field::from_fn(n, |i| {
            let production = nu_eff[i] * (mag_sqr_d_hat[i] - mag_sqr(&d_hat[i]));
            self.ratio(2.0 * self.delta[i] * production, kk[i].powf(1.5))
        });

        Raw::from_ratios(&ratios)
    }

    /// Favre test filter, `(ρX)^ / ρ^`.
    fn favre(&self, x: &Field<Tensor>) -> Field<Tensor> {
        let n = self.mesh.n_cells();
        let rho_x_hat = self
            .filter
            .apply(self.mesh, &Field::from_fn(n, |i| x[i] * self.rho[i]));
        Field::from_fn(n, |i| rho_x_hat[i] * inverse(self.rho_hat[i]))
    }

    fn ratio(&self, numerator: f64, denominator: f64) -> Option<f64> {
        guarded_ratio(numerator, denominator, self.floor)
    }
}

impl Raw {
    fn from_ratios(ratios: &Field<Option<f64>>) -> Self {
        Self {
            values: ratios.map(|ratio| ratio.unwrap_or(0.0)),
            degenerate: ratios.iter().filter(|ratio| ratio.is_none()).count(),
        }
    }
}

/// Returns `numerator / denominator`, or `None` if `|denominator| ≤ floor`
/// or the quotient is not finite.
pub(crate) fn guarded_ratio(numerator: f64, denominator: f64, floor: f64) -> Option<f64> {
    if denominator.is_nan() || denominator.abs() <= floor {
        return None;
    }
    let ratio = numerator / denominator;
    ratio.is_finite().then_some(ratio)
}

/// `1/x` for positive `x`, zero otherwise.
///
/// A filtered density of zero only occurs where every weighted density in
/// the stencil is zero, so every filtered product it divides is zero too.
fn inverse(x: f64) -> f64 {
    if x > 0.0 { x.recip() } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::models::les::dynamic_smagorinsky::core::{
        strain::{strain_magnitude, strain_rate},
        test_support::{line_mesh, linear_flow, uniform_flow},
    };
    use crate::support::{delta::Delta, filter::SimpleFilter};

    const FLOOR: f64 = 1e-30;

    #[test]
    fn guarded_ratio_is_neutral_for_degenerate_denominators() {
        assert_eq!(guarded_ratio(1.0, 2.0, FLOOR), Some(0.5));
        assert_eq!(guarded_ratio(1.0, 0.0, FLOOR), None);
        assert_eq!(guarded_ratio(1.0, -1e-31, FLOOR), None);
        assert_eq!(guarded_ratio(1.0, f64::NAN, FLOOR), None);
        assert_eq!(guarded_ratio(f64::INFINITY, 1.0, FLOOR), None);
        assert_eq!(guarded_ratio(1e300, 1e-20, FLOOR), None);
    }

    #[test]
    fn uniform_velocity_gives_neutral_coefficients() {
        let mesh = line_mesh(4);
        let flow = uniform_flow(4);
        let delta = Delta::default().evaluate(&mesh);
        let rho = flow.alpha_rho();

        let calc =
            CoefficientCalculator::new(&mesh, &SimpleFilter, &delta, &rho, &flow.u, 4.0, FLOOR);
        let d = strain_rate(&flow.grad_u);
        let mag_d = strain_magnitude(&d);

        let cd = calc.cd(&d, &mag_d);
        let ci = calc.ci(&d, &mag_d);
        let kk = calc.kk();
        let ce = calc.ce(&d, &kk, &Field::uniform(4, 1e-3));

        for raw in [&cd, &ci, &ce] {
            assert_eq!(raw.degenerate, 4);
            assert!(raw.values.iter().all(|&c| c == 0.0));
        }
        assert!(kk.iter().all(|&k| k == 0.0));
    }

    #[test]
    fn linear_profile_on_two_cells() {
        // U = (x, 0, 0) with unit cells: L = diag(3/16, 0, 0), |D|² = 4/3,
        // M = −6|D|D and m = 6|D|², so cD = −1/(32|D|) and cI = 3/128.
        let mesh = line_mesh(2);
        let flow = linear_flow(2);
        let delta = Delta::default().evaluate(&mesh);
        let rho = flow.alpha_rho();

        let calc =
            CoefficientCalculator::new(&mesh, &SimpleFilter, &delta, &rho, &flow.u, 4.0, FLOOR);
        let d = strain_rate(&flow.grad_u);
        let mag_d = strain_magnitude(&d);

        let cd = calc.cd(&d, &mag_d);
        let ci = calc.ci(&d, &mag_d);
        let kk = calc.kk();

        assert_eq!(cd.degenerate, 0);
        assert_eq!(ci.degenerate, 0);
        for cell in 0..2 {
            assert_relative_eq!(
                cd.values[cell],
                -1.0 / (32.0 * mag_d[cell]),
                max_relative = 1e-12
            );
            assert_relative_eq!(ci.values[cell], 3.0 / 128.0, max_relative = 1e-12);
            assert_relative_eq!(kk[cell], 3.0 / 32.0, max_relative = 1e-12);
        }

        // Uniform strain has no test-scale strain fluctuation.
        let ce = calc.ce(&d, &kk, &Field::uniform(2, 1e-3));
        assert_eq!(ce.degenerate, 0);
        for value in &ce.values {
            assert_relative_eq!(*value, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn coefficients_do_not_depend_on_density_scale() {
        let mesh = line_mesh(5);
        let flow = linear_flow(5);
        let delta = Delta::default().evaluate(&mesh);
        let d = strain_rate(&flow.grad_u);
        let mag_d = strain_magnitude(&d);

        let rho = Field::uniform(5, 1.0);
        let heavy = Field::uniform(5, 800.0);

        let light =
            CoefficientCalculator::new(&mesh, &SimpleFilter, &delta, &rho, &flow.u, 4.0, FLOOR);
        let dense =
            CoefficientCalculator::new(&mesh, &SimpleFilter, &delta, &heavy, &flow.u, 4.0, FLOOR);

        let (a, b) = (light.cd(&d, &mag_d), dense.cd(&d, &mag_d));
        for (a, b) in a.values.iter().zip(&b.values) {
            assert_relative_eq!(*a, *b, max_relative = 1e-10);
        }
        let (a, b) = (light.ci(&d, &mag_d), dense.ci(&d, &mag_d));
        for (a, b) in a.values.iter().zip(&b.values) {
            assert_relative_eq!(*a, *b, max_relative = 1e-10);
        }
    }
}
