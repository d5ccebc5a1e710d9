//! Dynamic Smagorinsky procedure with local coefficient averaging.
//!
//! One evaluation runs, without iteration:
//!
//! 1. strain rate `D` and its magnitude from the velocity gradient,
//! 2. raw `cD`, `cI`, `Ce` from the Germano identity at the test-filter scale,
//! 3. a neighbourhood average of each raw coefficient,
//! 4. SGS fields from the averaged coefficients, clipped once.

mod closure;
mod coefficients;
mod config;
mod flow;
mod local_average;
mod strain;
mod update;

#[cfg(test)]
pub(crate) mod test_support;

pub use closure::{DynamicSmagorinsky, ModelState};
pub use config::{ConfigError, DynamicSmagorinskyConfig};
pub use flow::{CorrectError, FlowFields, Fluxes};
pub use local_average::LocalAverage;

use crate::support::{
    field::{Field, Tensor},
    filter::TestFilter,
    mesh::Mesh,
};

use coefficients::CoefficientCalculator;
use strain::{strain_magnitude, strain_rate};

/// SGS fields produced by one evaluation of the closure.
#[derive(Debug, Clone, PartialEq)]
pub struct SgsFields {
    /// Averaged eddy-viscosity coefficient.
    pub cd: Field<f64>,

    /// Averaged SGS kinetic energy coefficient.
    pub ci: Field<f64>,

    /// Averaged dissipation coefficient, clipped to be non-negative.
    pub ce: Field<f64>,

    /// SGS kinetic energy, in m²/s².
    pub k: Field<f64>,

    /// Eddy viscosity, in m²/s.
    pub nut: Field<f64>,

    pub report: ClipReport,
}

/// Number of cells where a safeguard changed a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipReport {
    /// Cells where `k` was raised to its lower bound.
    pub k_clipped: usize,

    /// Cells where `ν_t` was raised to `−ν`.
    pub nut_clipped: usize,

    /// Cells where the averaged `Ce` was raised to zero.
    pub ce_clipped: usize,

    /// Cells where a coefficient ratio had a degenerate denominator.
    pub degenerate: usize,
}

/// Everything an evaluation reads besides the flow state.
pub(crate) struct Setup<'a, M, F> {
    pub(crate) mesh: &'a M,
    pub(crate) filter: &'a F,
    pub(crate) config: &'a DynamicSmagorinskyConfig,
    pub(crate) delta: &'a Field<f64>,
}

/// Eddy viscosity and the work shared with the remaining coefficients.
struct EddyViscosity<'a, M, F> {
    calc: CoefficientCalculator<'a, M, F>,
    d: Field<Tensor>,
    mag_d: Field<f64>,
    cd: Field<f64>,
    nut: Field<f64>,
    report: ClipReport,
}

/// Runs the full procedure.
///
/// `flow` must already be validated against the mesh; `nu` is the molecular
/// kinematic viscosity per cell.
pub(crate) fn evaluate<M, F>(
    setup: &Setup<'_, M, F>,
    flow: &FlowFields,
    nu: &Field<f64>,
) -> SgsFields
where
    M: Mesh,
    F: TestFilter + Sync,
{
    let Setup {
        mesh,
        config,
        delta,
        ..
    } = *setup;
    let rho = flow.alpha_rho();

    let EddyViscosity {
        calc,
        d,
        mag_d,
        cd,
        nut,
        mut report,
    } = eddy_viscosity_with(setup, flow, &rho, nu);

    let ci_raw = calc.ci(&d, &mag_d);
    let ci = config.local_average.apply(mesh, &ci_raw.values);
    let k = update::k(&ci, delta, &mag_d, config.k_min);

    let kk = calc.kk();
    let nu_eff = update::dk_eff(&nut, nu);
    let ce_raw = calc.ce(&d, &kk, &nu_eff);
    let ce = update::clip_ce(&config.local_average.apply(mesh, &ce_raw.values));

    report.k_clipped = k.clipped;
    report.ce_clipped = ce.clipped;
    report.degenerate += ci_raw.degenerate + ce_raw.degenerate;

    log::debug!(
        "dynamic Smagorinsky: clipped k in {} cells, nut in {}, Ce in {}; {} degenerate ratios",
        report.k_clipped,
        report.nut_clipped,
        report.ce_clipped,
        report.degenerate,
    );
    trace_range("cI", &ci);
    trace_range("Ce", &ce.values);

    SgsFields {
        cd,
        ci,
        ce: ce.values,
        k: k.values,
        nut,
        report,
    }
}

/// Runs the procedure up to the eddy viscosity only.
///
/// Returns the averaged `cD`, the clipped `ν_t`, and a report whose `k` and
/// `Ce` counts are zero.
pub(crate) fn eddy_viscosity<M, F>(
    setup: &Setup<'_, M, F>,
    flow: &FlowFields,
    nu: &Field<f64>,
) -> (Field<f64>, Field<f64>, ClipReport)
where
    M: Mesh,
    F: TestFilter + Sync,
{
    let rho = flow.alpha_rho();
    let EddyViscosity {
        cd, nut, report, ..
    } = eddy_viscosity_with(setup, flow, &rho, nu);

    log::debug!(
        "dynamic Smagorinsky: clipped nut in {} cells; {} degenerate ratios",
        report.nut_clipped,
        report.degenerate,
    );

    (cd, nut, report)
}

fn eddy_viscosity_with<'a, M, F>(
    setup: &Setup<'a, M, F>,
    flow: &FlowFields,
    rho: &'a Field<f64>,
    nu: &Field<f64>,
) -> EddyViscosity<'a, M, F>
where
    M: Mesh,
    F: TestFilter + Sync,
{
    let Setup {
        mesh,
        filter,
        config,
        delta,
    } = *setup;

    let d = strain_rate(&flow.grad_u);
    let mag_d = strain_magnitude(&d);

    let calc = CoefficientCalculator::new(
        mesh,
        filter,
        delta,
        rho,
        &flow.u,
        config.beta(),
        config.denominator_floor,
    );

    let cd_raw = calc.cd(&d, &mag_d);
    let cd = config.local_average.apply(mesh, &cd_raw.values);
    let nut = update::nut(&cd, delta, &mag_d, nu);
    trace_range("cD", &cd);

    EddyViscosity {
        calc,
        d,
        mag_d,
        cd,
        nut: nut.values,
        report: ClipReport {
            nut_clipped: nut.clipped,
            degenerate: cd_raw.degenerate,
            ..ClipReport::default()
        },
    }
}

fn trace_range(name: &str, field: &Field<f64>) {
    if let (Some(min), Some(max)) = (field.min(), field.max()) {
        log::trace!("dynamic Smagorinsky: {name} in [{min:.6e}, {max:.6e}]");
    }
}
