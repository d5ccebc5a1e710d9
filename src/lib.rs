//! # Twine LES
//!
//! Subgrid-scale closures for large-eddy simulation of compressible flow,
//! built as [Twine](https://github.com/isentropic-dev/twine) models.
//!
//! ## Crate layout
//!
//! - [`models`]: Closure models with [`twine_core::Model`] implementations.
//! - [`support`]: Fields, mesh connectivity, filters, and transport properties
//!   used by models.
//!
//! ## Host solver integration
//!
//! A closure never owns the mesh or the resolved flow. The host solver
//! implements [`support::mesh::Mesh`] over its own connectivity, passes the
//! resolved state as [`models::les::dynamic_smagorinsky::FlowFields`], and
//! reads the eddy viscosity and SGS kinetic energy back after each
//! correction.
//!
//! Diagnostics are emitted through the [`log`] facade. The crate never
//! installs a logger.
//!
//! ## Utility code lifecycle
//!
//! Modules in [`support`] are part of the public API because they're useful,
//! but their APIs are not stable. Breaking changes may occur as needed.
//!
//! Note: Only utilities at the crate-level (in [`support`]) are part of the public API.
//! Model-specific utility code remains private.

pub mod models;
pub mod support;
