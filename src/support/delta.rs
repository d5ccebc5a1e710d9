//! Grid filter width for LES closures.

use serde::{Deserialize, Serialize};
use uom::si::{f64::Length, length::meter};

use super::{
    constraint::{Constrained, Constraint, ConstraintError, StrictlyPositive},
    field::Field,
    mesh::Mesh,
};

/// How the grid filter width `Δ` is derived from the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", deny_unknown_fields)]
pub enum Delta {
    /// `Δ = deltaCoeff · V^(1/3)`.
    CubeRootVol {
        #[serde(rename = "deltaCoeff", default = "unit_coeff")]
        delta_coeff: f64,
    },

    /// The same width in every cell, in metres.
    Uniform { value: f64 },
}

fn unit_coeff() -> f64 {
    1.0
}

impl Default for Delta {
    fn default() -> Self {
        Self::CubeRootVol { delta_coeff: 1.0 }
    }
}

impl Delta {
    /// Creates a uniform filter width.
    #[must_use]
    pub fn uniform(width: Constrained<Length, StrictlyPositive>) -> Self {
        Self::Uniform {
            value: width.into_inner().get::<meter>(),
        }
    }

    /// Checks that the coefficient or width is strictly positive.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintError`] naming the violated bound.
    pub fn validate(&self) -> Result<(), ConstraintError> {
        match *self {
            Self::CubeRootVol { delta_coeff } => StrictlyPositive::check(&delta_coeff),
            Self::Uniform { value } => StrictlyPositive::check(&value),
        }
    }

    /// Evaluates the filter width in every cell of `mesh`.
    pub fn evaluate<M: Mesh>(&self, mesh: &M) -> Field<f64> {
        match *self {
            Self::CubeRootVol { delta_coeff } => (0..mesh.n_cells())
                .map(|cell| delta_coeff * mesh.cell_volume(cell).cbrt())
                .collect(),
            Self::Uniform { value } => Field::uniform(mesh.n_cells(), value),
        }
    }
}
