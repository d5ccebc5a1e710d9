mod error;

pub use error::CorrectError;

use crate::support::{
    constraint::{Constraint, NonNegative, StrictlyPositive},
    field::{Field, Tensor, Vector},
    mesh::Mesh,
};

/// Resolved flow state read by a correction.
///
/// The closure never mutates these fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowFields {
    /// Phase fraction per cell.
    pub alpha: Field<f64>,

    /// Density per cell, in kg/m³.
    pub rho: Field<f64>,

    /// Resolved velocity per cell, in m/s.
    pub u: Field<Vector>,

    /// Velocity gradient per cell, in 1/s.
    ///
    /// Entry `(i, j)` holds `∂u_j/∂x_i`.
    pub grad_u: Field<Tensor>,

    /// Face fluxes of the host solver, if available.
    pub fluxes: Option<Fluxes>,
}

/// Face fluxes describing the transport context.
#[derive(Debug, Clone, PartialEq)]
pub struct Fluxes {
    /// Phase mass flux per face, in kg/s.
    pub alpha_rho_phi: Field<f64>,

    /// Volumetric flux per face, in m³/s.
    pub phi: Field<f64>,
}

impl FlowFields {
    /// Single-phase flow with unit density.
    ///
    /// Kinematic quantities then coincide with their density-weighted
    /// counterparts.
    #[must_use]
    pub fn incompressible(u: Field<Vector>, grad_u: Field<Tensor>) -> Self {
        let n = u.len();
        Self::compressible(Field::uniform(n, 1.0), u, grad_u)
    }

    /// Single-phase flow with variable density.
    #[must_use]
    pub fn compressible(rho: Field<f64>, u: Field<Vector>, grad_u: Field<Tensor>) -> Self {
        Self {
            alpha: Field::uniform(rho.len(), 1.0),
            rho,
            u,
            grad_u,
            fluxes: None,
        }
    }

    /// Replaces the phase fraction.
    #[must_use]
    pub fn with_alpha(mut self, alpha: Field<f64>) -> Self {
        self.alpha = alpha;
        self
    }

    /// Attaches face fluxes.
    #[must_use]
    pub fn with_fluxes(mut self, fluxes: Fluxes) -> Self {
        self.fluxes = Some(fluxes);
        self
    }

    /// Phase-weighted density, `αρ`.
    #[must_use]
    pub fn alpha_rho(&self) -> Field<f64> {
        self.alpha.zip_map(&self.rho, |alpha, rho| alpha * rho)
    }

    /// Checks field sizes against `mesh` and the ranges of `α` and `ρ`.
    ///
    /// # Errors
    ///
    /// Returns a [`CorrectError`] for the first violation found.
    pub fn validate<M: Mesh>(&self, mesh: &M) -> Result<(), CorrectError> {
        let n_cells = mesh.n_cells();
        CorrectError::check_size("alpha", n_cells, self.alpha.len())?;
        CorrectError::check_size("rho", n_cells, self.rho.len())?;
        CorrectError::check_size("U", n_cells, self.u.len())?;
        CorrectError::check_size("grad(U)", n_cells, self.grad_u.len())?;

        if let Some(fluxes) = &self.fluxes {
            let n_faces = mesh.n_faces();
            CorrectError::check_size("alphaRhoPhi", n_faces, fluxes.alpha_rho_phi.len())?;
            CorrectError::check_size("phi", n_faces, fluxes.phi.len())?;
        }

        for (cell, &rho) in self.rho.iter().enumerate() {
            if !rho.is_finite() || StrictlyPositive::check(&rho).is_err() {
                return Err(CorrectError::Density { cell, rho });
            }
        }
        for (cell, &alpha) in self.alpha.iter().enumerate() {
            if !alpha.is_finite() || NonNegative::check(&alpha).is_err() {
                return Err(CorrectError::Alpha { cell, alpha });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::les::dynamic_smagorinsky::core::test_support::{line_mesh, linear_flow};

    #[test]
    fn incompressible_flow_has_unit_density() {
        let flow = linear_flow(3);
        assert_eq!(flow.alpha_rho().into_inner(), vec![1.0; 3]);
        assert!(flow.validate(&line_mesh(3)).is_ok());
    }

    #[test]
    fn phase_fraction_weights_density() {
        let flow = FlowFields::compressible(
            Field::new(vec![2.0, 4.0]),
            Field::uniform(2, Vector::zeros()),
            Field::uniform(2, Tensor::zeros()),
        )
        .with_alpha(Field::new(vec![0.5, 0.25]));

        assert_eq!(flow.alpha_rho().into_inner(), vec![1.0, 1.0]);
    }

    #[test]
    fn rejects_mis_sized_fields() {
        let mesh = line_mesh(3);

        let flow = linear_flow(2);
        assert_eq!(
            flow.validate(&mesh),
            Err(CorrectError::FieldSize {
                field: "alpha",
                expected: 3,
                actual: 2
            })
        );

        let flow = linear_flow(3).with_fluxes(Fluxes {
            alpha_rho_phi: Field::uniform(4, 0.0),
            phi: Field::uniform(3, 0.0),
        });
        assert_eq!(
            flow.validate(&mesh),
            Err(CorrectError::FieldSize {
                field: "phi",
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn rejects_non_physical_density_and_phase_fraction() {
        let mesh = line_mesh(2);

        let mut flow = linear_flow(2);
        flow.rho = Field::new(vec![1.0, 0.0]);
        assert_eq!(
            flow.validate(&mesh),
            Err(CorrectError::Density { cell: 1, rho: 0.0 })
        );

        let flow = linear_flow(2).with_alpha(Field::new(vec![-0.1, 1.0]));
        assert_eq!(
            flow.validate(&mesh),
            Err(CorrectError::Alpha {
                cell: 0,
                alpha: -0.1
            })
        );
    }
}
