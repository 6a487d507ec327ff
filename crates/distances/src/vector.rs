//! Dense and sparse vectors of `f64`.

use crate::{DistanceError, kernels};

/// A sparse vector: a sorted set of `(index, value)` pairs with implicit zeros elsewhere.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SparseVector {
    /// The length of the vector, including implicit zeros.
    dim: usize,
    /// Strictly increasing indices of the non-zero values.
    indices: Vec<usize>,
    /// The non-zero values, parallel to `indices`.
    values: Vec<f64>,
}

impl SparseVector {
    /// Creates a sparse vector of length `dim` from `(index, value)` pairs given in any order.
    ///
    /// Explicit zeros are dropped.
    ///
    /// # Errors
    ///
    /// - If any index is not less than `dim`.
    /// - If an index appears more than once.
    pub fn new(dim: usize, mut pairs: Vec<(usize, f64)>) -> Result<Self, DistanceError> {
        pairs.sort_by_key(|&(i, _)| i);
        if let Some(&(i, _)) = pairs.last()
            && i >= dim
        {
            return Err(DistanceError::InvalidSparseVector(format!("index {i} is out of bounds for dimension {dim}")));
        }
        if let Some(w) = pairs.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(DistanceError::InvalidSparseVector(format!("index {} appears more than once", w[0].0)));
        }

        let (indices, values) = pairs.into_iter().filter(|&(_, v)| v != 0.0).unzip();
        Ok(Self { dim, indices, values })
    }

    /// Returns the length of the vector, including implicit zeros.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the number of explicitly stored (non-zero) values.
    #[must_use]
    pub const fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Returns the value at index `i`, which is zero if it is not stored.
    #[must_use]
    pub fn get(&self, i: usize) -> f64 {
        self.indices.binary_search(&i).map_or(0.0, |pos| self.values[pos])
    }

    /// Iterates over the stored `(index, value)` pairs in increasing order of index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }
}

/// A vector of `f64`, either dense or sparse.
///
/// Equality is by representation and content; a dense vector and a sparse vector with the same values are not equal. Use
/// [`Vector::to_dense`] to compare by value alone.
#[derive(Clone, Debug, PartialEq)]
pub enum Vector {
    /// All values are stored.
    Dense(Vec<f64>),
    /// Only non-zero values are stored.
    Sparse(SparseVector),
}

impl Vector {
    /// Returns the length of the vector.
    #[must_use]
    pub fn dim(&self) -> usize {
        match self {
            Self::Dense(v) => v.len(),
            Self::Sparse(v) => v.dim(),
        }
    }

    /// Returns the value at index `i`.
    ///
    /// # Panics
    ///
    /// If `i` is out of bounds for a dense vector. Sparse vectors return zero instead.
    #[must_use]
    pub fn get(&self, i: usize) -> f64 {
        match self {
            Self::Dense(v) => v[i],
            Self::Sparse(v) => v.get(i),
        }
    }

    /// Returns a dense copy of the values.
    #[must_use]
    pub fn to_dense(&self) -> Vec<f64> {
        match self {
            Self::Dense(v) => v.clone(),
            Self::Sparse(v) => {
                let mut dense = vec![0.0; v.dim()];
                for (i, x) in v.iter() {
                    dense[i] = x;
                }
                dense
            }
        }
    }

    /// Returns the dot product with `other`.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        match (self, other) {
            (Self::Dense(a), Self::Dense(b)) => kernels::dot_product(a, b),
            (Self::Dense(a), Self::Sparse(b)) | (Self::Sparse(b), Self::Dense(a)) => b.iter().map(|(i, x)| a[i] * x).sum(),
            (Self::Sparse(a), Self::Sparse(b)) => {
                let mut sum = 0.0;
                merge_join(a, b, |x, y| sum += x * y);
                sum
            }
        }
    }

    /// Returns the squared L2-norm.
    #[must_use]
    pub fn norm_sq(&self) -> f64 {
        match self {
            Self::Dense(v) => kernels::norm_l2_sq(v),
            Self::Sparse(v) => v.iter().map(|(_, x)| x * x).sum(),
        }
    }

    /// Calls `f` with `|self[i] - other[i]|` for every index `i` at which either vector may be non-zero.
    ///
    /// For two sparse vectors, indices where both are implicitly zero are skipped. Every p-norm ignores zero differences, so this is
    /// enough to compute any of them.
    pub fn for_each_abs_diff<F: FnMut(f64)>(&self, other: &Self, mut f: F) {
        match (self, other) {
            (Self::Dense(a), Self::Dense(b)) => a.iter().zip(b).for_each(|(&x, &y)| f((x - y).abs())),
            (Self::Dense(a), Self::Sparse(b)) | (Self::Sparse(b), Self::Dense(a)) => {
                let mut nz = b.iter().peekable();
                for (i, &x) in a.iter().enumerate() {
                    let y = match nz.peek() {
                        Some(&(j, y)) if j == i => {
                            nz.next();
                            y
                        }
                        _ => 0.0,
                    };
                    f((x - y).abs());
                }
            }
            (Self::Sparse(a), Self::Sparse(b)) => {
                let (mut ia, mut ib) = (a.iter().peekable(), b.iter().peekable());
                loop {
                    match (ia.peek().copied(), ib.peek().copied()) {
                        (Some((i, x)), Some((j, y))) => {
                            if i == j {
                                f((x - y).abs());
                                ia.next();
                                ib.next();
                            } else if i < j {
                                f(x.abs());
                                ia.next();
                            } else {
                                f(y.abs());
                                ib.next();
                            }
                        }
                        (Some((_, x)), None) => {
                            f(x.abs());
                            ia.next();
                        }
                        (None, Some((_, y))) => {
                            f(y.abs());
                            ib.next();
                        }
                        (None, None) => break,
                    }
                }
            }
        }
    }

    /// Checks that `other` has the same dimension as `self`.
    ///
    /// # Errors
    ///
    /// If the dimensions differ.
    pub fn check_dim(&self, other: &Self) -> Result<(), DistanceError> {
        if self.dim() == other.dim() {
            Ok(())
        } else {
            Err(DistanceError::DimensionMismatch {
                expected: self.dim(),
                found: other.dim(),
            })
        }
    }
}

/// Calls `f` for every index stored in both sparse vectors.
fn merge_join<F: FnMut(f64, f64)>(a: &SparseVector, b: &SparseVector, mut f: F) {
    let (mut i, mut j) = (0, 0);
    while i < a.indices.len() && j < b.indices.len() {
        match a.indices[i].cmp(&b.indices[j]) {
            core::cmp::Ordering::Less => i += 1,
            core::cmp::Ordering::Greater => j += 1,
            core::cmp::Ordering::Equal => {
                f(a.values[i], b.values[j]);
                i += 1;
                j += 1;
            }
        }
    }
}

impl AsRef<Self> for Vector {
    fn as_ref(&self) -> &Self {
        self
    }
}

impl From<Vec<f64>> for Vector {
    fn from(values: Vec<f64>) -> Self {
        Self::Dense(values)
    }
}

impl From<SparseVector> for Vector {
    fn from(values: SparseVector) -> Self {
        Self::Sparse(values)
    }
}
