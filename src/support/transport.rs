//! Molecular transport properties consumed by eddy-viscosity closures.
//!
//! A closure needs the molecular kinematic viscosity `ν` to bound the eddy
//! viscosity and to form effective diffusivities. How `ν` is obtained depends
//! on the flow context, so it is exposed through the [`Transport`] capability:
//!
//! - [`ConstantKinematicViscosity`]: incompressible flow, `ν` fixed
//! - [`ConstantDynamicViscosity`]: compressible flow, `ν = μ / ρ`

use uom::si::{
    diffusion_coefficient::square_meter_per_second,
    dynamic_viscosity::pascal_second,
    f64::{DiffusionCoefficient, DynamicViscosity},
};

use super::{
    constraint::{Constrained, NonNegative},
    field::Field,
};

/// Kinematic viscosity, in m²/s.
///
/// `uom` names this dimension after mass diffusivity.
pub type KinematicViscosity = DiffusionCoefficient;

/// Provides the molecular kinematic viscosity of the resolved flow.
pub trait Transport {
    /// Returns `ν` in m²/s for every cell, given the cell densities in kg/m³.
    fn nu(&self, rho: &Field<f64>) -> Field<f64>;
}

/// A fluid with constant kinematic viscosity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantKinematicViscosity {
    nu: KinematicViscosity,
}

impl ConstantKinematicViscosity {
    #[must_use]
    pub fn new(nu: Constrained<KinematicViscosity, NonNegative>) -> Self {
        Self {
            nu: nu.into_inner(),
        }
    }
}

impl Transport for ConstantKinematicViscosity {
    fn nu(&self, rho: &Field<f64>) -> Field<f64> {
        Field::uniform(rho.len(), self.nu.get::<square_meter_per_second>())
    }
}

/// A fluid with constant dynamic viscosity, `ν = μ / ρ`.
///
/// Densities must be strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantDynamicViscosity {
    mu: DynamicViscosity,
}

impl ConstantDynamicViscosity {
    #[must_use]
    pub fn new(mu: Constrained<DynamicViscosity, NonNegative>) -> Self {
        Self {
            mu: mu.into_inner(),
        }
    }
}

impl Transport for ConstantDynamicViscosity {
    fn nu(&self, rho: &Field<f64>) -> Field<f64> {
        let mu = self.mu.get::<pascal_second>();
        rho.map(|rho| mu / rho)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{f64::MassDensity, mass_density::kilogram_per_cubic_meter};

    #[test]
    fn kinematic_viscosity_is_dynamic_viscosity_over_density() {
        let mu = DynamicViscosity::new::<pascal_second>(1.8e-5);
        let rho = MassDensity::new::<kilogram_per_cubic_meter>(1.2);

        let nu: KinematicViscosity = mu / rho;
        assert_relative_eq!(
            nu.get::<square_meter_per_second>(),
            1.5e-5,
            max_relative = 1e-12
        );
    }

    #[test]
    fn constant_kinematic_viscosity_ignores_density() {
        let nu = KinematicViscosity::new::<square_meter_per_second>(1e-3);
        let transport = ConstantKinematicViscosity::new(NonNegative::new(nu).unwrap());

        let nu = transport.nu(&Field::new(vec![1.0, 2.0, 0.5]));
        assert_eq!(nu.into_inner(), vec![1e-3; 3]);
    }

    #[test]
    fn dynamic_viscosity_divides_by_density() {
        let mu = DynamicViscosity::new::<pascal_second>(1.8e-5);
        let transport = ConstantDynamicViscosity::new(NonNegative::new(mu).unwrap());

        let nu = transport.nu(&Field::new(vec![1.2, 0.6]));
        assert_relative_eq!(nu[0], 1.5e-5, max_relative = 1e-12);
        assert_relative_eq!(nu[1], 3.0e-5, max_relative = 1e-12);
    }
}
