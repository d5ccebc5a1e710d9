//! Per-cell field storage and the tensor algebra used by closures.
//!
//! A [`Field`] is an ordered collection of values indexed by cell (or face) id.
//! The ordering is defined by the mesh and is never changed by any operation here.
//!
//! Vectors and tensors are [`nalgebra`] types:
//!
//! - [`Vector`]: `Vector3<f64>`
//! - [`Tensor`]: `Matrix3<f64>`, also used for symmetric tensors
//!
//! Element-wise operations ([`Field::map`], [`Field::zip_map`]) run in parallel
//! with [`rayon`]. Each output element depends only on its own inputs, so the
//! result does not depend on scheduling.

use std::ops::{Add, Index, Mul, Sub};

use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;

/// A three-component vector.
pub type Vector = Vector3<f64>;

/// A second-order tensor.
pub type Tensor = Matrix3<f64>;

/// A value that can be stored in a [`Field`] and combined linearly.
///
/// Filters and averages only ever form weighted sums, so linear operations
/// and an additive identity are all that is required.
pub trait FieldValue:
    Copy + Send + Sync + Add<Output = Self> + Sub<Output = Self> + Mul<f64, Output = Self>
{
    /// Returns the additive identity.
    fn zero() -> Self;
}

impl FieldValue for f64 {
    fn zero() -> Self {
        0.0
    }
}

impl FieldValue for Vector {
    fn zero() -> Self {
        Vector::zeros()
    }
}

impl FieldValue for Tensor {
    fn zero() -> Self {
        Tensor::zeros()
    }
}

/// Ordered per-cell (or per-face) values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Field<T>(Vec<T>);

impl<T> Field<T> {
    /// Wraps a vector of values.
    #[must_use]
    pub fn new(values: Vec<T>) -> Self {
        Self(values)
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the field holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// Mutable access to the values, used by [`Mesh::exchange`] to write halo cells.
    ///
    /// [`Mesh::exchange`]: super::mesh::Mesh::exchange
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.0
    }

    /// Consumes the field and returns its values.
    #[must_use]
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T: Clone> Field<T> {
    /// Creates a field of `len` copies of `value`.
    #[must_use]
    pub fn uniform(len: usize, value: T) -> Self {
        Self(vec![value; len])
    }
}

impl<T: Send> Field<T> {
    /// Builds a field of `len` values where value `i` is `f(i)`.
    pub fn from_fn<F>(len: usize, f: F) -> Self
    where
        F: Fn(usize) -> T + Sync + Send,
    {
        Self((0..len).into_par_iter().map(f).collect())
    }
}

impl<T: Sync> Field<T> {
    /// Applies `f` to every value.
    pub fn map<U, F>(&self, f: F) -> Field<U>
    where
        U: Send,
        F: Fn(&T) -> U + Sync + Send,
    {
        Field(self.0.par_iter().map(f).collect())
    }

    /// Applies `f` to every pair of values from `self` and `other`.
    ///
    /// Both fields must have the same length.
    pub fn zip_map<S, U, F>(&self, other: &Field<S>, f: F) -> Field<U>
    where
        S: Sync,
        U: Send,
        F: Fn(&T, &S) -> U + Sync + Send,
    {
        debug_assert_eq!(self.len(), other.len(), "zipped fields differ in length");
        Field(
            self.0
                .par_iter()
                .zip(other.0.par_iter())
                .map(|(a, b)| f(a, b))
                .collect(),
        )
    }
}

impl Field<f64> {
    /// Returns the smallest value, ignoring `NaN`.
    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.0.iter().copied().reduce(f64::min)
    }

    /// Returns the largest value, ignoring `NaN`.
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.0.iter().copied().reduce(f64::max)
    }
}

impl<T> Index<usize> for Field<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.0[index]
    }
}

impl<T> From<Vec<T>> for Field<T> {
    fn from(values: Vec<T>) -> Self {
        Self(values)
    }
}

impl<T> FromIterator<T> for Field<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a Field<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Symmetric part, `½(T + Tᵀ)`.
#[must_use]
pub fn symm(t: &Tensor) -> Tensor {
    (t + t.transpose()) * 0.5
}

/// Deviatoric part, `T − ⅓ tr(T) I`.
#[must_use]
pub fn dev(t: &Tensor) -> Tensor {
    t - Tensor::identity() * (t.trace() / 3.0)
}

/// Double inner product, `A : B = Σ A_ij B_ij`.
#[must_use]
pub fn double_dot(a: &Tensor, b: &Tensor) -> f64 {
    a.dot(b)
}

/// Outer product, `a ⊗ b`.
#[must_use]
pub fn outer(a: &Vector, b: &Vector) -> Tensor {
    a * b.transpose()
}

/// Squared magnitude, `T : T`.
#[must_use]
pub fn mag_sqr(t: &Tensor) -> f64 {
    t.norm_squared()
}
