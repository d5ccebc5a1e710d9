//! Dynamic Smagorinsky SGS closure with locally averaged coefficients.
//!
//! The eddy-viscosity coefficient `cD` and the SGS energy coefficient `cI`
//! are computed from the resolved flow at every correction with Germano's
//! identity between the grid filter and an explicit test filter. Instead of
//! the classical domain-wide average, each coefficient is averaged over the
//! cell and its face neighbours before the eddy viscosity and SGS kinetic
//! energy are formed.
//!
//! Safeguards keep the host solver stable:
//!
//! - `k ≥ kMin ≥ 0`
//! - `ν_t ≥ −ν`, so local backscatter is allowed but `ν + ν_t ≥ 0`
//! - degenerate coefficient ratios resolve to zero instead of `NaN`
//!
//! [`DynamicSmagorinsky`] holds the SGS fields between corrections. Its
//! [`twine_core::Model`] implementation evaluates a flow state without
//! touching them.

pub(crate) mod core;

pub use self::core::{
    ClipReport, ConfigError, CorrectError, DynamicSmagorinsky, DynamicSmagorinskyConfig,
    FlowFields, Fluxes, LocalAverage, ModelState, SgsFields,
};

use twine_core::Model;

use crate::support::{mesh::Mesh, transport::Transport};

impl<M: Mesh, T: Transport> Model for DynamicSmagorinsky<M, T> {
    type Input = FlowFields;
    type Output = SgsFields;
    type Error = CorrectError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        self.evaluate(input)
    }
}
