//! Owned, explicitly-dimensioned multi-dimensional containers.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A dense row-major N-dimensional matrix.
///
/// Indexed by `[usize; N]`. Bounds are checked per dimension in debug
/// builds; release builds only rely on the flat slice bound check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NdMatrix<T, const N: usize> {
    dims: Vec<usize>,
    data: Vec<T>,
}

impl<T: Clone, const N: usize> NdMatrix<T, N> {
    /// Creates a matrix of the given dimensions with every element set to `fill`.
    pub fn new(dims: [usize; N], fill: T) -> Self {
        let len = dims.iter().product();
        Self {
            dims: dims.to_vec(),
            data: vec![fill; len],
        }
    }

    /// Sets every element to `value`.
    pub fn fill(&mut self, value: T) {
        for slot in &mut self.data {
            *slot = value.clone();
        }
    }
}

impl<T, const N: usize> NdMatrix<T, N> {
    /// Size of dimension `d`.
    pub fn dim(&self, d: usize) -> usize {
        self.dims[d]
    }

    /// All dimensions.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if any dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there are `N` dimensions and their product is the
    /// element count. Always holds for matrices built with [`NdMatrix::new`];
    /// deserialized ones must be checked before indexing.
    pub fn is_well_formed(&self) -> bool {
        self.dims.len() == N
            && self
                .dims
                .iter()
                .try_fold(1usize, |acc, &d| acc.checked_mul(d))
                .is_some_and(|len| len == self.data.len())
    }

    /// Returns `true` if `idx` lies inside every dimension.
    pub fn contains(&self, idx: [usize; N]) -> bool {
        idx.iter().zip(&self.dims).all(|(i, d)| i < d)
    }

    /// Returns the element at `idx`, or `None` when out of bounds.
    pub fn get(&self, idx: [usize; N]) -> Option<&T> {
        if self.contains(idx) {
            Some(&self.data[self.offset(idx)])
        } else {
            None
        }
    }

    /// Iterates all elements in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Iterates all elements mutably in row-major order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    fn offset(&self, idx: [usize; N]) -> usize {
        let mut flat = 0;
        for (d, &i) in idx.iter().enumerate() {
            debug_assert!(
                i < self.dims[d],
                "index {i} out of bounds for dimension {d} of size {}",
                self.dims[d]
            );
            flat = flat * self.dims[d] + i;
        }
        flat
    }
}

impl<T, const N: usize> Index<[usize; N]> for NdMatrix<T, N> {
    type Output = T;

    fn index(&self, idx: [usize; N]) -> &T {
        &self.data[self.offset(idx)]
    }
}

impl<T, const N: usize> IndexMut<[usize; N]> for NdMatrix<T, N> {
    fn index_mut(&mut self, idx: [usize; N]) -> &mut T {
        let offset = self.offset(idx);
        &mut self.data[offset]
    }
}
