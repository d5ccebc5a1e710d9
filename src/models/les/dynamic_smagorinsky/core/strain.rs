//! Resolved strain rate.

use crate::support::field::{Field, Tensor, dev, mag_sqr, symm};

/// Deviatoric strain-rate tensor, `D = dev(symm(∇U))`.
pub(crate) fn strain_rate(grad_u: &Field<Tensor>) -> Field<Tensor> {
    grad_u.map(|grad| dev(&symm(grad)))
}

/// Strain-rate magnitude, `|D| = √(2 D:D)`.
pub(crate) fn strain_magnitude(d: &Field<Tensor>) -> Field<f64> {
    d.map(|d| (2.0 * mag_sqr(d)).sqrt())
}
