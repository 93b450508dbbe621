//! Errors raised while building or evaluating Jacobian calculators.
use crate::element::ElementType;
use crate::quadrature::QuadratureKey;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Library-wide error type.
///
/// None of these are recovered from inside the crate. They signal malformed input from the
/// surrounding simulation and are meant to abort the current operation.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum JacobianError {
    /// The key names an element type or rule that cannot be serviced.
    UnsupportedQuadrature { key: QuadratureKey },
    /// The element handed to a calculator is not of the calculator's element type.
    ContractViolation { expected: ElementType, actual: ElementType },
    /// The Jacobian (or metric) determinant is not positive at a quadrature point.
    InvertedElement { quadrature_point: usize, jacobian: f64 },
    /// The biquadratic kernel was configured with a rule that is not a tensor product.
    TensorProductExpected { key: QuadratureKey },
    /// The reference dimension exceeds the spatial dimension, or the spatial dimension is
    /// not in `1..=3`.
    DimensionMismatch { reference_dim: usize, spatial_dim: usize },
}

impl Display for JacobianError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedQuadrature { key } => {
                write!(f, "No quadrature rule available for {}", key)
            }
            Self::ContractViolation { expected, actual } => {
                write!(f, "Calculator for {} elements was given a {} element", expected, actual)
            }
            Self::InvertedElement {
                quadrature_point,
                jacobian,
            } => {
                write!(
                    f,
                    "Non-positive Jacobian {:e} at quadrature point {} (inverted or degenerate element)",
                    jacobian, quadrature_point
                )
            }
            Self::TensorProductExpected { key } => {
                write!(f, "Quadrature rule {} is not a tensor product rule", key)
            }
            Self::DimensionMismatch {
                reference_dim,
                spatial_dim,
            } => {
                write!(
                    f,
                    "Cannot map a {}-dimensional reference element into {}-dimensional space",
                    reference_dim, spatial_dim
                )
            }
        }
    }
}

impl std::error::Error for JacobianError {}
