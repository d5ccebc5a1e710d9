//! Explicit test filters for dynamic subgrid-scale procedures.
//!
//! A test filter is a linear, local, low-pass operator applied at a scale
//! coarser than the grid. Dynamic procedures compare resolved quantities at the
//! grid and test scales, so the filter must satisfy:
//!
//! - **Linearity**: `filter(aX + bY) = a·filter(X) + b·filter(Y)`.
//! - **Consistency**: a uniform field is left unchanged.
//! - **Locality**: a cell's filtered value depends only on the cell and its
//!   face neighbours, so one halo layer suffices on a decomposed mesh.
//!
//! Two filters are provided:
//!
//! - [`SimpleFilter`]: face-area-weighted average of face-interpolated values
//! - [`BoxFilter`]: volume-weighted top-hat over the cell and its neighbours
//!
//! [`TestFilterKind`] selects one of them from configuration and is the
//! strategy object a model holds.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{
    field::{Field, FieldValue},
    mesh::Mesh,
};

/// A linear, local, low-pass filter over cell fields.
pub trait TestFilter {
    /// Returns the filtered field.
    ///
    /// The input is refreshed through [`Mesh::exchange`] before any neighbour
    /// value is read.
    fn apply<M: Mesh, T: FieldValue>(&self, mesh: &M, field: &Field<T>) -> Field<T>;
}

/// Face-area-weighted average of linearly interpolated face values.
///
/// ```text
/// φ̂_P = Σ_f A_f φ_f / Σ_f A_f
/// φ_f = w φ_P + (1 − w) φ_N    (internal faces)
/// φ_f = φ_P                    (boundary faces)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimpleFilter;

impl TestFilter for SimpleFilter {
    fn apply<M: Mesh, T: FieldValue>(&self, mesh: &M, field: &Field<T>) -> Field<T> {
        let mut field = field.clone();
        mesh.exchange(&mut field);

        let filtered: Vec<T> = (0..mesh.n_cells())
            .into_par_iter()
            .map(|cell| {
                let mut sum = T::zero();
                let mut total_area = 0.0;

                for &index in mesh.cell_faces(cell) {
                    let face = mesh.face(index);
                    let value = match face.neighbour {
                        Some(neighbour) => {
                            field[face.owner] * face.weight
                                + field[neighbour] * (1.0 - face.weight)
                        }
                        None => field[cell],
                    };
                    sum = sum + value * face.area;
                    total_area += face.area;
                }

                if total_area > 0.0 {
                    sum * total_area.recip()
                } else {
                    field[cell]
                }
            })
            .collect();

        Field::new(filtered)
    }
}

/// Volume-weighted top-hat over a cell and its face neighbours.
///
/// ```text
/// φ̂_P = (V_P φ_P + Σ_N V_N φ_N) / (V_P + Σ_N V_N)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoxFilter;

impl TestFilter for BoxFilter {
    fn apply<M: Mesh, T: FieldValue>(&self, mesh: &M, field: &Field<T>) -> Field<T> {
        let mut field = field.clone();
        mesh.exchange(&mut field);

        let filtered: Vec<T> = (0..mesh.n_cells())
            .into_par_iter()
            .map(|cell| {
                let own = mesh.cell_volume(cell);
                let (sum, volume) = mesh.cell_neighbours(cell).fold(
                    (field[cell] * own, own),
                    |(sum, volume), neighbour| {
                        let v = mesh.cell_volume(neighbour);
                        (sum + field[neighbour] * v, volume + v)
                    },
                );
                sum * volume.recip()
            })
            .collect();

        Field::new(filtered)
    }
}

/// Test filter selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestFilterKind {
    /// See [`SimpleFilter`].
    Simple,
    /// See [`BoxFilter`].
    Box,
}

impl TestFilter for TestFilterKind {
    fn apply<M: Mesh, T: FieldValue>(&self, mesh: &M, field: &Field<T>) -> Field<T> {
        match self {
            Self::Simple => SimpleFilter.apply(mesh, field),
            Self::Box => BoxFilter.apply(mesh, field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use approx::assert_relative_eq;

    use crate::support::{
        field::{Tensor, Vector},
        mesh::{Face, PolyMesh},
    };

    const FILTERS: [TestFilterKind; 2] = [TestFilterKind::Simple, TestFilterKind::Box];

    fn mesh() -> PolyMesh {
        // Five cells of unequal volume in a row, with a non-midpoint face.
        let mut faces = vec![
            Face::internal(0, 1, 1.0),
            Face::internal(1, 2, 1.0),
            Face::internal(2, 3, 2.0),
            Face::internal(3, 4, 1.0),
            Face::boundary(0, 1.0),
            Face::boundary(4, 1.0),
        ];
        faces[1].weight = 0.3;
        PolyMesh::new(vec![1.0, 2.0, 1.5, 1.0, 0.5], faces).unwrap()
    }

    #[test]
    fn uniform_fields_are_unchanged() {
        let mesh = mesh();
        for filter in FILTERS {
            let filtered = filter.apply(&mesh, &Field::uniform(5, 3.5));
            for value in &filtered {
                assert_relative_eq!(*value, 3.5, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn linear_for_scalars_vectors_and_tensors() {
        let mesh = mesh();
        let (a, b) = (2.0, -0.75);

        let x: Field<f64> = (0..5).map(|i| f64::from(i).powi(2)).collect();
        let y: Field<f64> = (0..5).map(|i| (f64::from(i)).sin()).collect();

        let u: Field<Vector> = (0..5)
            .map(|i| Vector::new(f64::from(i), 1.0, -f64::from(i)))
            .collect();
        let v: Field<Vector> = (0..5)
            .map(|i| Vector::new(0.5, f64::from(i).cos(), 2.0))
            .collect();

        let s: Field<Tensor> = (0..5)
            .map(|i| Tensor::from_diagonal(&Vector::new(f64::from(i), 2.0, 0.0)))
            .collect();
        let t: Field<Tensor> = (0..5)
            .map(|i| Tensor::from_element(f64::from(i) - 2.0))
            .collect();

        for filter in FILTERS {
            let lhs = filter.apply(&mesh, &x.zip_map(&y, |x, y| *x * a + *y * b));
            let rhs = filter
                .apply(&mesh, &x)
                .zip_map(&filter.apply(&mesh, &y), |x, y| *x * a + *y * b);
            for (l, r) in lhs.iter().zip(&rhs) {
                assert_relative_eq!(*l, *r, epsilon = 1e-12);
            }

            let lhs = filter.apply(&mesh, &u.zip_map(&v, |u, v| u * a + v * b));
            let rhs = filter
                .apply(&mesh, &u)
                .zip_map(&filter.apply(&mesh, &v), |u, v| u * a + v * b);
            for (l, r) in lhs.iter().zip(&rhs) {
                assert!((l - r).norm() < 1e-12);
            }

            let lhs = filter.apply(&mesh, &s.zip_map(&t, |s, t| s * a + t * b));
            let rhs = filter
                .apply(&mesh, &s)
                .zip_map(&filter.apply(&mesh, &t), |s, t| s * a + t * b);
            for (l, r) in lhs.iter().zip(&rhs) {
                assert!((l - r).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn reaches_only_face_neighbours() {
        let mesh = mesh();
        let spike = Field::new(vec![0.0, 0.0, 1.0, 0.0, 0.0]);

        for filter in FILTERS {
            let filtered = filter.apply(&mesh, &spike);
            assert_eq!(filtered[0], 0.0);
            assert_eq!(filtered[4], 0.0);
            assert!(filtered[1] > 0.0);
            assert!(filtered[2] > 0.0 && filtered[2] < 1.0);
            assert!(filtered[3] > 0.0);
        }
    }

    #[test]
    fn simple_filter_weights_faces() {
        let mesh = mesh();
        let field = Field::new(vec![0.0, 10.0, 0.0, 0.0, 0.0]);
        let filtered = SimpleFilter.apply(&mesh, &field);

        // Cell 0: boundary face (0) and the midpoint face to cell 1 (5).
        assert_relative_eq!(filtered[0], 2.5);
        // Cell 2: face owned by cell 1 with weight 0.3 gives 3, area 1;
        // face to cell 3 gives 0, area 2.
        assert_relative_eq!(filtered[2], 1.0);
    }

    #[test]
    fn box_filter_weights_volumes() {
        let mesh = mesh();
        let field = Field::new(vec![0.0, 10.0, 0.0, 0.0, 0.0]);
        let filtered = BoxFilter.apply(&mesh, &field);

        assert_relative_eq!(filtered[0], 20.0 / 3.0);
        assert_relative_eq!(filtered[1], 20.0 / 4.5);
    }

    struct CountingMesh {
        inner: PolyMesh,
        exchanges: AtomicUsize,
    }

    impl Mesh for CountingMesh {
        fn n_cells(&self) -> usize {
            self.inner.n_cells()
        }

        fn n_faces(&self) -> usize {
            self.inner.n_faces()
        }

        fn cell_volume(&self, cell: usize) -> f64 {
            self.inner.cell_volume(cell)
        }

        fn cell_faces(&self, cell: usize) -> &[usize] {
            self.inner.cell_faces(cell)
        }

        fn face(&self, face: usize) -> Face {
            self.inner.face(face)
        }

        fn exchange<T: FieldValue>(&self, _field: &mut Field<T>) {
            self.exchanges.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn refreshes_halo_before_reading_neighbours() {
        let mesh = CountingMesh {
            inner: mesh(),
            exchanges: AtomicUsize::new(0),
        };
        let field = Field::uniform(5, 1.0);

        SimpleFilter.apply(&mesh, &field);
        BoxFilter.apply(&mesh, &field);

        assert_eq!(mesh.exchanges.load(Ordering::Relaxed), 2);
    }
}
