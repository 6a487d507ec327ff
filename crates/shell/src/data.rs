//! Synthetic datasets.

use distances::Vector;
use rand::prelude::*;

/// How the generated vectors are distributed.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    /// Uniformly at random in the unit cube centered at the origin.
    Uniform,
    /// In a few tight Gaussian-like clusters with uniformly random centers.
    Clustered,
}

impl core::fmt::Display for Distribution {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Uniform => "uniform",
            Self::Clustered => "clustered",
        };
        write!(f, "{name}")
    }
}

impl Distribution {
    /// Generates `car` vectors of dimension `dim`.
    ///
    /// # Errors
    ///
    /// - If `dim` is zero.
    pub fn generate<R: Rng>(self, car: usize, dim: usize, rng: &mut R) -> Result<Vec<Vector>, String> {
        if dim == 0 {
            return Err("Vectors must have at least one dimension".to_string());
        }

        let data = match self {
            Self::Uniform => (0..car).map(|_| uniform(dim, -1.0, 1.0, rng)).collect(),
            Self::Clustered => {
                let n_clusters = car.isqrt().clamp(1, 32);
                let centers = (0..n_clusters).map(|_| uniform(dim, -10.0, 10.0, rng)).collect::<Vec<_>>();
                (0..car)
                    .map(|i| {
                        let center = &centers[i % n_clusters];
                        center.iter().map(|&c| c + jitter(rng)).collect()
                    })
                    .collect::<Vec<Vec<f64>>>()
            }
        };
        Ok(data.into_iter().map(Vector::from).collect())
    }
}

/// A vector with coordinates drawn uniformly from `[min, max)`.
fn uniform<R: Rng>(dim: usize, min: f64, max: f64, rng: &mut R) -> Vec<f64> {
    (0..dim).map(|_| rng.random_range(min..max)).collect()
}

/// A small, roughly normal offset, as the mean of a few uniform draws.
fn jitter<R: Rng>(rng: &mut R) -> f64 {
    (0..4).map(|_| rng.random_range(-0.5..0.5)).sum::<f64>() / 4.0
}
