//! Face-based finite-volume mesh connectivity.
//!
//! Closures only need a narrow view of the mesh: cell volumes, the faces of
//! each cell, and for every face its owner, its neighbour (if internal), its
//! area, and the owner-side interpolation weight. The [`Mesh`] trait exposes
//! exactly that, so a host solver can implement it over its own mesh storage.
//!
//! [`PolyMesh`] is a small owned implementation with builders for line and
//! Cartesian block meshes.
//!
//! # Decomposed meshes
//!
//! Neighbour stencils are the only place where data crosses subdomain
//! boundaries. Every stencil operation in this crate calls [`Mesh::exchange`]
//! on its input before reading neighbour values. A serial mesh leaves the
//! default no-op in place; a decomposed mesh refreshes its halo cells there.

use thiserror::Error;
use uom::si::{
    area::square_meter,
    f64::{Area, Length},
    length::meter,
};

use super::{
    constraint::{Constrained, Constraint, StrictlyPositive},
    field::{Field, FieldValue},
};

/// A mesh face as seen from the cells it separates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Cell that owns the face.
    pub owner: usize,

    /// Cell on the other side, or `None` for a boundary face.
    pub neighbour: Option<usize>,

    /// Face area in square metres.
    pub area: f64,

    /// Weight of the owner value when interpolating to the face.
    ///
    /// The neighbour value gets `1 − weight`.
    pub weight: f64,
}

impl Face {
    /// Creates an internal face with linear interpolation weight `½`.
    #[must_use]
    pub fn internal(owner: usize, neighbour: usize, area: f64) -> Self {
        Self {
            owner,
            neighbour: Some(neighbour),
            area,
            weight: 0.5,
        }
    }

    /// Creates a boundary face.
    #[must_use]
    pub fn boundary(owner: usize, area: f64) -> Self {
        Self {
            owner,
            neighbour: None,
            area,
            weight: 1.0,
        }
    }

    /// Returns the cell across this face from `cell`, if any.
    #[must_use]
    pub fn other(&self, cell: usize) -> Option<usize> {
        let neighbour = self.neighbour?;
        Some(if self.owner == cell {
            neighbour
        } else {
            self.owner
        })
    }
}

/// Mesh connectivity and geometry consumed by closures.
pub trait Mesh: Sync {
    fn n_cells(&self) -> usize;

    fn n_faces(&self) -> usize;

    /// Cell volume in cubic metres.
    fn cell_volume(&self, cell: usize) -> f64;

    /// Indices of the faces bounding `cell`.
    fn cell_faces(&self, cell: usize) -> &[usize];

    fn face(&self, face: usize) -> Face;

    /// Cells sharing a face with `cell`.
    fn cell_neighbours(&self, cell: usize) -> impl Iterator<Item = usize> + '_ {
        self.cell_faces(cell)
            .iter()
            .filter_map(move |&face| self.face(face).other(cell))
    }

    /// Brings halo values of `field` up to date before a stencil reads them.
    fn exchange<T: FieldValue>(&self, _field: &mut Field<T>) {}
}

impl<M: Mesh> Mesh for &M {
    fn n_cells(&self) -> usize {
        (**self).n_cells()
    }

    fn n_faces(&self) -> usize {
        (**self).n_faces()
    }

    fn cell_volume(&self, cell: usize) -> f64 {
        (**self).cell_volume(cell)
    }

    fn cell_faces(&self, cell: usize) -> &[usize] {
        (**self).cell_faces(cell)
    }

    fn face(&self, face: usize) -> Face {
        (**self).face(face)
    }

    fn exchange<T: FieldValue>(&self, field: &mut Field<T>) {
        (**self).exchange(field);
    }
}

/// Errors detected while assembling a [`PolyMesh`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    #[error("face {face} references cell {cell}, but the mesh has {n_cells} cells")]
    CellOutOfRange {
        face: usize,
        cell: usize,
        n_cells: usize,
    },

    #[error("face {face} has the same owner and neighbour")]
    SelfNeighbour { face: usize },

    #[error("cell {cell} has non-positive volume {volume}")]
    Volume { cell: usize, volume: f64 },

    #[error("face {face} has non-positive area {area}")]
    Area { face: usize, area: f64 },

    #[error("face {face} has interpolation weight {weight} outside [0, 1]")]
    Weight { face: usize, weight: f64 },
}

/// An owned, face-based polyhedral mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyMesh {
    volumes: Vec<f64>,
    faces: Vec<Face>,
    cell_faces: Vec<Vec<usize>>,
}

impl PolyMesh {
    /// Assembles a mesh from cell volumes and faces.
    ///
    /// # Errors
    ///
    /// Returns a [`MeshError`] if a face references a missing cell or itself,
    /// or if a volume, area, or interpolation weight is out of range.
    pub fn new(volumes: Vec<f64>, faces: Vec<Face>) -> Result<Self, MeshError> {
        let n_cells = volumes.len();

        for (cell, &volume) in volumes.iter().enumerate() {
            if StrictlyPositive::check(&volume).is_err() {
                return Err(MeshError::Volume { cell, volume });
            }
        }

        for (index, face) in faces.iter().enumerate() {
            for cell in std::iter::once(face.owner).chain(face.neighbour) {
                if cell >= n_cells {
                    return Err(MeshError::CellOutOfRange {
                        face: index,
                        cell,
                        n_cells,
                    });
                }
            }
            if face.neighbour == Some(face.owner) {
                return Err(MeshError::SelfNeighbour { face: index });
            }
            if StrictlyPositive::check(&face.area).is_err() {
                return Err(MeshError::Area {
                    face: index,
                    area: face.area,
                });
            }
            if !(0.0..=1.0).contains(&face.weight) {
                return Err(MeshError::Weight {
                    face: index,
                    weight: face.weight,
                });
            }
        }

        Ok(Self::assemble(volumes, faces))
    }

    /// Builds a one-dimensional row of `n_cells` equal cells along `x`.
    ///
    /// Only the faces normal to `x` are created, so the row behaves like a
    /// one-dimensional mesh with empty lateral boundaries.
    #[must_use]
    pub fn line(
        n_cells: usize,
        spacing: Constrained<Length, StrictlyPositive>,
        cross_section: Constrained<Area, StrictlyPositive>,
    ) -> Self {
        let dx = spacing.into_inner().get::<meter>();
        let area = cross_section.into_inner().get::<square_meter>();

        let mut faces: Vec<Face> = (1..n_cells)
            .map(|cell| Face::internal(cell - 1, cell, area))
            .collect();
        if n_cells > 0 {
            faces.push(Face::boundary(0, area));
            faces.push(Face::boundary(n_cells - 1, area));
        }

        Self::assemble(vec![dx * area; n_cells], faces)
    }

    /// Builds an `nx × ny × nz` block of cubic cells with edge length `spacing`.
    ///
    /// Cells are numbered `i + nx·(j + ny·k)`. All six sides of the block are
    /// boundary faces.
    #[must_use]
    pub fn cartesian(
        nx: usize,
        ny: usize,
        nz: usize,
        spacing: Constrained<Length, StrictlyPositive>,
    ) -> Self {
        let h = spacing.into_inner().get::<meter>();
        let area = h * h;
        let id = |i: usize, j: usize, k: usize| i + nx * (j + ny * k);
        let dims = [nx, ny, nz];

        let mut faces = Vec::new();
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let ijk = [i, j, k];
                    let cell = id(i, j, k);
                    for axis in 0..3 {
                        let mut next = ijk;
                        next[axis] += 1;
                        if next[axis] < dims[axis] {
                            faces.push(Face::internal(
                                cell,
                                id(next[0], next[1], next[2]),
                                area,
                            ));
                        } else {
                            faces.push(Face::boundary(cell, area));
                        }
                        if ijk[axis] == 0 {
                            faces.push(Face::boundary(cell, area));
                        }
                    }
                }
            }
        }

        Self::assemble(vec![h * area; nx * ny * nz], faces)
    }

    fn assemble(volumes: Vec<f64>, faces: Vec<Face>) -> Self {
        let mut cell_faces = vec![Vec::new(); volumes.len()];
        for (index, face) in faces.iter().enumerate() {
            cell_faces[face.owner].push(index);
            if let Some(neighbour) = face.neighbour {
                cell_faces[neighbour].push(index);
            }
        }
        Self {
            volumes,
            faces,
            cell_faces,
        }
    }
}

impl Mesh for PolyMesh {
    fn n_cells(&self) -> usize {
        self.volumes.len()
    }

    fn n_faces(&self) -> usize {
        self.faces.len()
    }

    fn cell_volume(&self, cell: usize) -> f64 {
        self.volumes[cell]
    }

    fn cell_faces(&self, cell: usize) -> &[usize] {
        &self.cell_faces[cell]
    }

    fn face(&self, face: usize) -> Face {
        self.faces[face]
    }
}
