use uom::si::{
    area::square_meter,
    diffusion_coefficient::square_meter_per_second,
    f64::{Area, Length},
    length::meter,
};

use crate::support::{
    constraint::{NonNegative, StrictlyPositive},
    field::{Field, Tensor, Vector},
    mesh::PolyMesh,
    transport::{ConstantKinematicViscosity, KinematicViscosity},
};

use super::FlowFields;

/// Molecular kinematic viscosity used by the test scenarios, in m²/s.
pub(crate) const NU: f64 = 1e-3;

/// A row of `n` unit cubes along `x`, so `Δ = 1` with the default width.
pub(crate) fn line_mesh(n: usize) -> PolyMesh {
    PolyMesh::line(
        n,
        StrictlyPositive::new(Length::new::<meter>(1.0)).unwrap(),
        StrictlyPositive::new(Area::new::<square_meter>(1.0)).unwrap(),
    )
}

/// `U = (x, 0, 0)` sampled at the centres of [`line_mesh`] cells.
pub(crate) fn linear_flow(n: usize) -> FlowFields {
    let u = Field::from_fn(n, |i| Vector::new(cell_centre(i), 0.0, 0.0));
    let grad_u = Field::uniform(n, Tensor::from_diagonal(&Vector::new(1.0, 0.0, 0.0)));
    FlowFields::incompressible(u, grad_u)
}

/// A uniform velocity, so the strain rate vanishes everywhere.
pub(crate) fn uniform_flow(n: usize) -> FlowFields {
    FlowFields::incompressible(
        Field::uniform(n, Vector::new(3.0, -1.0, 0.5)),
        Field::uniform(n, Tensor::zeros()),
    )
}

pub(crate) fn transport() -> ConstantKinematicViscosity {
    let nu = KinematicViscosity::new::<square_meter_per_second>(NU);
    ConstantKinematicViscosity::new(NonNegative::new(nu).unwrap())
}

#[allow(clippy::cast_precision_loss)]
fn cell_centre(cell: usize) -> f64 {
    cell as f64 + 0.5
}
