//! Supporting utilities used by closures.
//!
//! These are the narrow views of the host solver a closure needs: per-cell
//! fields, mesh connectivity, test filters, the grid filter width, and
//! molecular transport properties.

pub mod constraint;
pub mod delta;
pub mod field;
pub mod filter;
pub mod mesh;
pub mod transport;
