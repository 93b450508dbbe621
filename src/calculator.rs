//! Jacobian calculators.
//!
//! A calculator is bound to a single [`QuadratureKey`]. Everything that only depends on the
//! reference element (quadrature points, weights, shape function derivatives) is computed
//! when the calculator is built, so that evaluating an element reduces to gathering its
//! node coordinates and a fixed amount of arithmetic per quadrature point.
//!
//! The kernels form a closed set, collected in [`CalculatorKernel`]. The generic
//! [`LagrangeJacobianCalculator`] handles every element type; the remaining kernels are
//! closed-form specializations that produce the same values up to round-off.
use crate::element::{Element, ElementType};
use crate::error::JacobianError;
use crate::nalgebra::Matrix3;
use crate::quadrature::{QuadratureKey, QuadratureRule, ReferencePoint};

mod lagrange;
mod quadrilateral;
mod tetrahedron;
mod triangle;

pub use lagrange::*;
pub use quadrilateral::*;
pub use tetrahedron::*;
pub use triangle::*;

/// Computes the integration weights `JxW` of elements of a single type and quadrature rule.
pub trait JacobianKernel {
    fn key(&self) -> QuadratureKey;

    fn quadrature(&self) -> &QuadratureRule;

    /// Writes `JxW` for each quadrature point of `element` into `out`.
    ///
    /// # Errors
    ///
    /// Returns [`JacobianError::ContractViolation`] if `element` is not of the calculator's
    /// element type and [`JacobianError::InvertedElement`] if the Jacobian determinant is not
    /// strictly positive at some quadrature point. `out` is left in an unspecified state on
    /// error.
    ///
    /// # Panics
    ///
    /// Panics if `out.len()` differs from the number of quadrature points.
    fn jxw_into<E>(&self, element: &E, out: &mut [f64]) -> Result<(), JacobianError>
    where
        E: Element + ?Sized;
}

/// The kernels a [`JacobianCalculator`] can be built from.
#[derive(Debug, Clone)]
pub enum CalculatorKernel {
    Lagrange(LagrangeJacobianCalculator),
    Triangle3(AffineTriangle3),
    Tet4(AffineTet4),
    Quad4(BilinearQuad4),
    Quad9(BiquadraticQuad9),
}

impl CalculatorKernel {
    /// A short human-readable name of the kernel.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lagrange(_) => "Lagrange",
            Self::Triangle3(_) => "AffineTriangle3",
            Self::Tet4(_) => "AffineTet4",
            Self::Quad4(_) => "BilinearQuad4",
            Self::Quad9(_) => "BiquadraticQuad9",
        }
    }
}

impl JacobianKernel for CalculatorKernel {
    fn key(&self) -> QuadratureKey {
        match self {
            Self::Lagrange(kernel) => kernel.key(),
            Self::Triangle3(kernel) => kernel.key(),
            Self::Tet4(kernel) => kernel.key(),
            Self::Quad4(kernel) => kernel.key(),
            Self::Quad9(kernel) => kernel.key(),
        }
    }

    fn quadrature(&self) -> &QuadratureRule {
        match self {
            Self::Lagrange(kernel) => kernel.quadrature(),
            Self::Triangle3(kernel) => kernel.quadrature(),
            Self::Tet4(kernel) => kernel.quadrature(),
            Self::Quad4(kernel) => kernel.quadrature(),
            Self::Quad9(kernel) => kernel.quadrature(),
        }
    }

    fn jxw_into<E>(&self, element: &E, out: &mut [f64]) -> Result<(), JacobianError>
    where
        E: Element + ?Sized,
    {
        match self {
            Self::Lagrange(kernel) => kernel.jxw_into(element, out),
            Self::Triangle3(kernel) => kernel.jxw_into(element, out),
            Self::Tet4(kernel) => kernel.jxw_into(element, out),
            Self::Quad4(kernel) => kernel.jxw_into(element, out),
            Self::Quad9(kernel) => kernel.jxw_into(element, out),
        }
    }
}

macro_rules! impl_from_kernel {
    ($($kernel:ident => $variant:ident),*) => {
        $(
            impl From<$kernel> for CalculatorKernel {
                fn from(kernel: $kernel) -> Self {
                    Self::$variant(kernel)
                }
            }
        )*
    };
}

impl_from_kernel!(
    LagrangeJacobianCalculator => Lagrange,
    AffineTriangle3 => Triangle3,
    AffineTet4 => Tet4,
    BilinearQuad4 => Quad4,
    BiquadraticQuad9 => Quad9
);

/// A kernel together with the buffer its results are written to.
///
/// [`jxw`](Self::jxw) overwrites the buffer on every call and returns a view of it, which
/// stays valid until the next call. Use [`jxw_into`](Self::jxw_into) to share one
/// calculator between threads with caller-owned output storage.
#[derive(Debug, Clone)]
pub struct JacobianCalculator {
    kernel: CalculatorKernel,
    jxw: Vec<f64>,
}

impl JacobianCalculator {
    pub fn new(kernel: impl Into<CalculatorKernel>) -> Self {
        let kernel = kernel.into();
        let num_points = kernel.quadrature().len();
        Self {
            kernel,
            jxw: vec![0.0; num_points],
        }
    }

    pub fn key(&self) -> QuadratureKey {
        self.kernel.key()
    }

    pub fn kernel(&self) -> &CalculatorKernel {
        &self.kernel
    }

    pub fn quadrature(&self) -> &QuadratureRule {
        self.kernel.quadrature()
    }

    pub fn weights(&self) -> &[f64] {
        self.quadrature().weights()
    }

    pub fn points(&self) -> &[ReferencePoint] {
        self.quadrature().points()
    }

    pub fn num_points(&self) -> usize {
        self.jxw.len()
    }

    /// Computes `JxW` at every quadrature point of `element`.
    pub fn jxw<E>(&mut self, element: &E) -> Result<&[f64], JacobianError>
    where
        E: Element + ?Sized,
    {
        self.kernel.jxw_into(element, &mut self.jxw)?;
        Ok(&self.jxw)
    }

    /// Computes `JxW` at every quadrature point of `element` into `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out.len()` differs from the number of quadrature points.
    pub fn jxw_into<E>(&self, element: &E, out: &mut [f64]) -> Result<(), JacobianError>
    where
        E: Element + ?Sized,
    {
        self.kernel.jxw_into(element, out)
    }
}

fn check_element_type(expected: ElementType, actual: ElementType) -> Result<(), JacobianError> {
    if expected == actual {
        Ok(())
    } else {
        Err(JacobianError::ContractViolation { expected, actual })
    }
}

fn assert_output_len(out: &[f64], rule: &QuadratureRule) {
    assert_eq!(
        out.len(),
        rule.len(),
        "Output length must match the number of quadrature points"
    );
}

/// Accepts `jacobian` if it is strictly positive. NaN is rejected.
#[inline]
fn check_positive(quadrature_point: usize, jacobian: f64) -> Result<f64, JacobianError> {
    if jacobian > 0.0 {
        Ok(jacobian)
    } else {
        Err(JacobianError::InvertedElement {
            quadrature_point,
            jacobian,
        })
    }
}

/// Determinant of the leading `dim x dim` block of `m`.
#[inline]
fn leading_determinant(m: &Matrix3<f64>, dim: usize) -> f64 {
    match dim {
        1 => m[(0, 0)],
        2 => m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
        _ => m.determinant(),
    }
}

/// The volume change of the map whose (zero-padded) Jacobian is `f`.
///
/// This is `det F` for square maps and `sqrt(det(F^T F))` for elements embedded in a space
/// of higher dimension.
#[inline]
fn metric_determinant(f: &Matrix3<f64>, reference_dim: usize, spatial_dim: usize) -> f64 {
    if reference_dim == spatial_dim {
        leading_determinant(f, reference_dim)
    } else {
        leading_determinant(&f.tr_mul(f), reference_dim).sqrt()
    }
}
