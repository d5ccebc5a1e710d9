//! Neighbourhood averaging of dynamic coefficients.
//!
//! Point-wise dynamic coefficients oscillate strongly from cell to cell. Each
//! coefficient is replaced by its weighted mean over the cell and its face
//! neighbours:
//!
//! ```text
//! c̄_P = Σ_{Q ∈ {P} ∪ N(P)} w_Q c_Q / Σ w_Q
//! ```
//!
//! The average always reads the raw field. Clipping happens afterwards, once.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::support::{field::Field, mesh::Mesh};

/// Weighting used when averaging dynamic coefficients over a cell neighbourhood.
///
/// The same weighting is applied to `cD`, `cI` and `Ce`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocalAverage {
    /// Every cell in the neighbourhood counts equally.
    #[default]
    Uniform,

    /// Cells are weighted by their volume.
    VolumeWeighted,
}

impl LocalAverage {
    /// Returns the neighbourhood average of `raw`.
    ///
    /// Halo values are refreshed through [`Mesh::exchange`] first.
    pub(crate) fn apply<M: Mesh>(self, mesh: &M, raw: &Field<f64>) -> Field<f64> {
        let mut raw = raw.clone();
        mesh.exchange(&mut raw);

        let weight = |cell: usize| match self {
            Self::Uniform => 1.0,
            Self::VolumeWeighted => mesh.cell_volume(cell),
        };

        let averaged: Vec<f64> = (0..mesh.n_cells())
            .into_par_iter()
            .map(|cell| {
                let own = weight(cell);
                let (sum, total) = mesh.cell_neighbours(cell).fold(
                    (own * raw[cell], own),
                    |(sum, total), neighbour| {
                        let w = weight(neighbour);
                        (sum + w * raw[neighbour], total + w)
                    },
                );
                sum / total
            })
            .collect();

        Field::new(averaged)
    }
}
