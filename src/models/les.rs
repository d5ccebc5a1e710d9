//! Large-eddy simulation closures.
//!
//! Subgrid-scale models that supply the eddy viscosity and related transport
//! coefficients for the resolved flow equations.

pub mod dynamic_smagorinsky;
