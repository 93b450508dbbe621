//! Element Jacobian kernels for finite element quadrature.
//!
//! Given a reference element, a quadrature rule and the physical nodes of an element, the
//! calculators in this crate produce the integration weights
//! <div>$$
//!   \mathrm{JxW}_q = w_q \, \left| \det J(\xi_q) \right|
//! $$</div>
//! or, for elements embedded in a higher-dimensional space, $w_q \sqrt{\det(J^T J)}$.
//! Everything that only depends on the reference element is computed once, when a
//! calculator is built, so that evaluating an element costs a fixed amount of arithmetic
//! and no allocation.
//!
//! The usual entry point is [`CalculatorRegistry`](registry::CalculatorRegistry):
//!
//! ```
//! use jxw::element::{ElementType, NodalElement};
//! use jxw::quadrature::{Order, QuadratureFamily, QuadratureKey};
//! use jxw::registry::CalculatorRegistry;
//! use jxw::nalgebra::Point2;
//!
//! let mut registry = CalculatorRegistry::new(2);
//! let key = QuadratureKey::new(ElementType::Tri3, QuadratureFamily::Gauss, Order(1));
//! let triangle = NodalElement::from_points2(
//!     ElementType::Tri3,
//!     &[Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), Point2::new(0.0, 3.0)],
//! );
//! let jxw = registry.jxw(key, &triangle).unwrap();
//! assert!((jxw.iter().sum::<f64>() - 3.0).abs() < 1e-14);
//! ```

pub mod calculator;
pub mod element;
pub mod error;
pub mod quadrature;
pub mod reference;
pub mod registry;

#[cfg(feature = "proptest-support")]
pub mod proptest;

pub extern crate nalgebra;

pub use error::JacobianError;
