//! Quadrature rules for finite element reference cells.
//!
//! The rules in this crate back the reference library of `jxw`, but they only depend on
//! plain `f64` arrays and can be used on their own.
//!
//! Reference domains follow the usual Lagrange conventions:
//!
//! - intervals, quadrilaterals and hexahedra are `[-1, 1]^d`,
//! - triangles and tetrahedra are the unit simplices with a vertex at the origin.
//!
//! Tensor-product rules are laid out with the first coordinate varying fastest, so that
//! point `q` of a 2D rule built from an `n`-point 1D rule is `(p[q % n], p[q / n])`.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod simplex;
pub mod tensor;
pub mod univariate;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable => {
                write!(f, "There is no quadrature rule satisfying the requirements available")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A D-dimensional rule, given as `(weights, points)`.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A one-dimensional quadrature rule.
pub type Rule1d = Rule<1>;

/// A two-dimensional quadrature rule.
pub type Rule2d = Rule<2>;

/// A three-dimensional quadrature rule.
pub type Rule3d = Rule<3>;

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights.iter().zip(points).map(|(w, p)| w * f(p)).sum()
}
