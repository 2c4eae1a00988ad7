//! Vector distance metrics used by the vector index.
//!
//! Every metric returns a value where smaller means closer, so inner
//! product is negated.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistanceType {
    #[default]
    L2,
    Cosine,
    InnerProduct,
}

impl DistanceType {
    #[must_use]
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::L2 => euclidean(a, b),
            Self::Cosine => cosine(a, b),
            Self::InnerProduct => inner_product(a, b),
        }
    }

    pub fn from_name(name: &str) -> Result<Self, DatabaseError> {
        match name.to_ascii_lowercase().as_str() {
            "l2" | "l2_distance" => Ok(Self::L2),
            "cosine" | "cosine_distance" => Ok(Self::Cosine),
            "inner_product" | "ip" => Ok(Self::InnerProduct),
            _ => Err(DatabaseError::InvalidArgument(format!("unknown distance type '{name}'"))),
        }
    }
}

impl fmt::Display for DistanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L2 => write!(f, "L2"),
            Self::Cosine => write!(f, "COSINE"),
            Self::InnerProduct => write!(f, "INNER_PRODUCT"),
        }
    }
}

#[must_use]
pub fn euclidean_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[must_use]
pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    euclidean_squared(a, b).sqrt()
}

#[must_use]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[must_use]
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    -dot_product(a, b)
}

/// `1 - cos(a, b)`; a zero vector is at distance 1 from everything
#[must_use]
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = dot_product(a, a).sqrt();
    let norm_b = dot_product(b, b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot_product(a, b) / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean() {
        assert!((euclidean(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine() {
        assert!(cosine(&[1.0, 0.0], &[2.0, 0.0]).abs() < 1e-6);
        assert!((cosine(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((cosine(&[0.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_inner_product_is_negated() {
        let near = DistanceType::InnerProduct.distance(&[1.0, 1.0], &[2.0, 2.0]);
        let far = DistanceType::InnerProduct.distance(&[1.0, 1.0], &[-1.0, 0.0]);
        assert!(near < far);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(DistanceType::from_name("COSINE").unwrap(), DistanceType::Cosine);
        assert!(DistanceType::from_name("manhattan").is_err());
    }
}
