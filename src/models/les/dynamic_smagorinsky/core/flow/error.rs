use thiserror::Error;

/// Errors detected in the resolved flow state passed to a correction.
///
/// Numerical degeneracy and unphysical intermediate results are handled
/// locally and never reported here.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum CorrectError {
    /// A field does not have one value per cell (or per face, for fluxes).
    #[error("field `{field}` has {actual} values, expected {expected}")]
    FieldSize {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A cell density is zero, negative, or not finite.
    #[error("density {rho} in cell {cell} is not strictly positive")]
    Density { cell: usize, rho: f64 },

    /// A cell phase fraction is negative or not finite.
    #[error("phase fraction {alpha} in cell {cell} is negative")]
    Alpha { cell: usize, alpha: f64 },
}

impl CorrectError {
    /// Checks that `actual` matches the `expected` count.
    pub(super) fn check_size(
        field: &'static str,
        expected: usize,
        actual: usize,
    ) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::FieldSize {
                field,
                expected,
                actual,
            })
        }
    }
}
