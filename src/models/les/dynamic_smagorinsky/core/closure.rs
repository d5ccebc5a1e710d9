use serde_json::Value;

use crate::support::{
    field::{Field, Tensor},
    filter::TestFilterKind,
    mesh::Mesh,
    transport::Transport,
};

use super::{
    ClipReport, ConfigError, CorrectError, DynamicSmagorinskyConfig, FlowFields, SgsFields, Setup,
    eddy_viscosity, evaluate,
    strain::strain_rate,
    update,
};

/// Lifecycle of a [`DynamicSmagorinsky`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// Coefficients are read but no flow state has been corrected yet.
    Configured,

    /// `k`, `ν_t` and `Ce` match the flow state of the last [`DynamicSmagorinsky::correct`].
    Corrected,
}

/// Dynamic Smagorinsky SGS closure with locally averaged coefficients.
///
/// The closure owns the SGS kinetic energy `k`, the eddy viscosity `ν_t` and
/// the dissipation coefficient `Ce`. Only [`correct`](Self::correct) and
/// [`correct_nut`](Self::correct_nut) write them.
///
/// # Example
///
/// ```
/// use twine_les::models::les::dynamic_smagorinsky::{
///     DynamicSmagorinsky, DynamicSmagorinskyConfig, FlowFields, ModelState,
/// };
/// use twine_les::support::{
///     constraint::{NonNegative, StrictlyPositive},
///     field::{Field, Tensor, Vector},
///     filter::TestFilterKind,
///     mesh::PolyMesh,
///     transport::{ConstantKinematicViscosity, KinematicViscosity},
/// };
/// use uom::si::{diffusion_coefficient::square_meter_per_second, f64::Length, length::meter};
///
/// let spacing = StrictlyPositive::new(Length::new::<meter>(0.1)).unwrap();
/// let mesh = PolyMesh::cartesian(4, 4, 4, spacing);
/// let nu = KinematicViscosity::new::<square_meter_per_second>(1.5e-5);
/// let transport = ConstantKinematicViscosity::new(NonNegative::new(nu).unwrap());
/// let config = DynamicSmagorinskyConfig::new(TestFilterKind::Simple);
///
/// let mut model = DynamicSmagorinsky::new(mesh, transport, config).unwrap();
/// assert_eq!(model.state(), ModelState::Configured);
///
/// let flow = FlowFields::incompressible(
///     Field::uniform(64, Vector::new(1.0, 0.0, 0.0)),
///     Field::uniform(64, Tensor::zeros()),
/// );
/// model.correct(&flow).unwrap();
///
/// assert_eq!(model.state(), ModelState::Corrected);
/// assert!(model.k().iter().all(|&k| k == 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct DynamicSmagorinsky<M, T> {
    mesh: M,
    transport: T,
    config: DynamicSmagorinskyConfig,
    delta: Field<f64>,
    k: Field<f64>,
    nut: Field<f64>,
    ce: Field<f64>,
    state: ModelState,
}

impl<M: Mesh, T: Transport> DynamicSmagorinsky<M, T> {
    /// Creates a closure on `mesh` with zero SGS fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a coefficient is out of range.
    pub fn new(
        mesh: M,
        transport: T,
        config: DynamicSmagorinskyConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let n = mesh.n_cells();
        let delta = config.delta.evaluate(&mesh);

        Ok(Self {
            mesh,
            transport,
            config,
            delta,
            k: Field::uniform(n, 0.0),
            nut: Field::uniform(n, 0.0),
            ce: Field::uniform(n, 0.0),
            state: ModelState::Configured,
        })
    }

    /// Re-reads the model coefficients.
    ///
    /// Returns `Ok(true)` if any entry changed. On error the current
    /// configuration is kept.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if an entry is missing, unknown, or out of range.
    pub fn read(&mut self, coeffs: &Value) -> Result<bool, ConfigError> {
        let config = DynamicSmagorinskyConfig::from_value(coeffs)?;
        if config == self.config {
            return Ok(false);
        }

        if config.delta != self.config.delta {
            self.delta = config.delta.evaluate(&self.mesh);
        }
        log::info!("dynamic Smagorinsky: coefficients changed to {config:?}");
        self.config = config;

        Ok(true)
    }

    /// Recomputes `ν_t` only.
    ///
    /// `k` and `Ce` keep their previous values.
    ///
    /// # Errors
    ///
    /// Returns a [`CorrectError`] if `flow` does not match the mesh.
    pub fn correct_nut(&mut self, flow: &FlowFields) -> Result<ClipReport, CorrectError> {
        let nu = self.nu(flow)?;
        let (_, nut, report) = eddy_viscosity(&self.setup(), flow, &nu);
        self.nut = nut;
        Ok(report)
    }

    /// Recomputes `k`, `ν_t` and `Ce` from the current flow state.
    ///
    /// Includes the [`correct_nut`](Self::correct_nut) step: `ν_t` is formed
    /// first, and `Ce` is evaluated with the updated `ν_t + ν`.
    ///
    /// # Errors
    ///
    /// Returns a [`CorrectError`] if `flow` does not match the mesh.
    pub fn correct(&mut self, flow: &FlowFields) -> Result<ClipReport, CorrectError> {
        let SgsFields {
            ce, k, nut, report, ..
        } = self.evaluate(flow)?;

        self.k = k;
        self.nut = nut;
        self.ce = ce;
        self.state = ModelState::Corrected;

        Ok(report)
    }

    /// Evaluates the full procedure without changing the stored fields.
    ///
    /// # Errors
    ///
    /// Returns a [`CorrectError`] if `flow` does not match the mesh.
    pub fn evaluate(&self, flow: &FlowFields) -> Result<SgsFields, CorrectError> {
        let nu = self.nu(flow)?;
        Ok(evaluate(&self.setup(), flow, &nu))
    }

    /// Molecular kinematic viscosity for `flow`, in m²/s.
    ///
    /// # Errors
    ///
    /// Returns a [`CorrectError`] if `flow` does not match the mesh.
    pub fn nu(&self, flow: &FlowFields) -> Result<Field<f64>, CorrectError> {
        flow.validate(&self.mesh)?;
        Ok(self.transport.nu(&flow.rho))
    }

    /// Effective diffusivity for the SGS energy equation, `ν_t + ν`.
    ///
    /// Computed from the current `ν_t` on every call. The value is clipped at
    /// zero, which the `ν_t ≥ −ν` bound reaches exactly in cells of maximal
    /// backscatter.
    ///
    /// # Errors
    ///
    /// Returns a [`CorrectError`] if `flow` does not match the mesh.
    pub fn dk_eff(&self, flow: &FlowFields) -> Result<Field<f64>, CorrectError> {
        Ok(update::dk_eff(&self.nut, &self.nu(flow)?))
    }

    /// SGS dissipation rate, `ε = Ce k^(3/2) / Δ`, in m²/s³.
    #[must_use]
    pub fn epsilon(&self) -> Field<f64> {
        let (ce, k, delta) = (&self.ce, &self.k, &self.delta);
        Field::from_fn(k.len(), |i| ce[i] * k[i].powf(1.5) / delta[i])
    }

    /// Dynamic eddy viscosity, `ρ ν_t`, in Pa·s.
    ///
    /// # Errors
    ///
    /// Returns a [`CorrectError`] if `flow` does not match the mesh.
    pub fn mu_t(&self, flow: &FlowFields) -> Result<Field<f64>, CorrectError> {
        flow.validate(&self.mesh)?;
        Ok(flow.rho.zip_map(&self.nut, |rho, nut| rho * nut))
    }

    /// Turbulent thermal diffusivity, `ρ ν_t / Prt`, in kg/(m·s).
    ///
    /// # Errors
    ///
    /// Returns a [`CorrectError`] if `flow` does not match the mesh.
    pub fn alphat(&self, flow: &FlowFields) -> Result<Field<f64>, CorrectError> {
        let prt = self.config.prt;
        Ok(self.mu_t(flow)?.map(|mu_t| mu_t / prt))
    }

    /// SGS stress, `R = ⅔ k I − 2 ν_t D`, in m²/s².
    ///
    /// # Errors
    ///
    /// Returns a [`CorrectError`] if `flow` does not match the mesh.
    pub fn sgs_stress(&self, flow: &FlowFields) -> Result<Field<Tensor>, CorrectError> {
        flow.validate(&self.mesh)?;
        let d = strain_rate(&flow.grad_u);
        let (k, nut) = (&self.k, &self.nut);
        Ok(Field::from_fn(d.len(), |i| {
            Tensor::identity() * (2.0 / 3.0 * k[i]) - d[i] * (2.0 * nut[i])
        }))
    }

    /// Current model coefficients.
    #[must_use]
    pub fn config(&self) -> &DynamicSmagorinskyConfig {
        &self.config
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> ModelState {
        self.state
    }

    /// Mesh the fields are defined on.
    #[must_use]
    pub fn mesh(&self) -> &M {
        &self.mesh
    }

    /// Grid filter width per cell, in metres.
    #[must_use]
    pub fn delta(&self) -> &Field<f64> {
        &self.delta
    }

    /// SGS kinetic energy per cell, in m²/s².
    #[must_use]
    pub fn k(&self) -> &Field<f64> {
        &self.k
    }

    /// Eddy viscosity per cell, in m²/s.
    #[must_use]
    pub fn nut(&self) -> &Field<f64> {
        &self.nut
    }

    /// Dissipation coefficient per cell.
    #[must_use]
    pub fn ce(&self) -> &Field<f64> {
        &self.ce
    }

    fn setup(&self) -> Setup<'_, M, TestFilterKind> {
        Setup {
            mesh: &self.mesh,
            filter: &self.config.filter,
            config: &self.config,
            delta: &self.delta,
        }
    }
}
