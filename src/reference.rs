//! The reference-element library: quadrature rules and Lagrange shape functions.
//!
//! Calculators only talk to [`ReferenceRuleProvider`], so any FEM backend that can produce
//! points, weights and shape derivatives may stand in for [`LagrangeReference`].
use crate::element::ElementType;
use crate::error::JacobianError;
use crate::quadrature::{Order, QuadratureFamily, QuadratureKey, QuadratureRule, ReferencePoint};
use jxw_quadrature::simplex::{tetrahedron_gauss, tetrahedron_grid, triangle_gauss, triangle_grid};
use jxw_quadrature::tensor::{hexahedron_tensor_product, quadrilateral_tensor_product};
use jxw_quadrature::univariate::{gauss, midpoint, try_gauss_lobatto};
use jxw_quadrature::Rule1d;

mod lagrange;

/// Source of reference-space data for the calculators.
pub trait ReferenceRuleProvider {
    /// Builds the quadrature rule identified by `key`.
    fn rule(&self, key: QuadratureKey) -> Result<QuadratureRule, JacobianError>;

    /// Returns the 1D rule whose tensor product (first coordinate fastest) is `rule(key)`,
    /// if there is one.
    ///
    /// Registries check the factor against `rule(key)` and use the generic kernel when the
    /// two disagree.
    fn tensor_factor(&self, _key: QuadratureKey) -> Option<QuadratureRule> {
        None
    }

    fn num_nodes(&self, element_type: ElementType) -> usize {
        element_type.num_nodes()
    }

    /// The order of the basis that interpolates the geometry of `element_type`.
    fn default_order(&self, element_type: ElementType) -> Order {
        element_type.default_order()
    }

    /// Value of the shape function of `node` at `xi`.
    fn shape(&self, element_type: ElementType, order: Order, node: usize, xi: &ReferencePoint) -> f64;

    /// Derivative of the shape function of `node` along reference axis `axis` at `xi`.
    fn shape_deriv(&self, element_type: ElementType, order: Order, node: usize, axis: usize, xi: &ReferencePoint)
        -> f64;
}

/// Lagrange elements on the conventional reference cells.
///
/// Intervals, quadrilaterals and hexahedra live on `[-1, 1]^d`; triangles and tetrahedra on
/// the unit simplex with a vertex at the origin. Rules are exact for polynomials of the
/// degree given by the key's order:
///
/// - `Gauss`: Gauss-Legendre products with `order / 2 + 1` points per axis on tensor cells,
///   symmetric or collapsed Gauss rules on simplices.
/// - `GaussLobatto`: Gauss-Lobatto-Legendre products, tensor cells only.
/// - `Grid`: uniform midpoint products with `order + 1` points per axis, exact for
///   multilinear functions on tensor cells. On simplices the rule is a collapsed midpoint
///   rule that integrates constants exactly, with the tetrahedron weights rescaled to the
///   volume.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LagrangeReference;

impl LagrangeReference {
    /// The largest order for which rules are produced.
    pub const MAX_ORDER: Order = Order(43);

    /// Reference coordinates of the nodes of `element_type`, padded with zeros to three
    /// components.
    ///
    /// Corners come first, ordered counter-clockwise (bottom face first for hexahedra),
    /// followed by edge midpoints, face centers and the cell center:
    ///
    /// - `Edge3`: the midpoint is node 2.
    /// - `Tri6`: edges `(0,1), (1,2), (2,0)`.
    /// - `Quad9`: edges `(0,1), (1,2), (2,3), (3,0)`, then the center.
    /// - `Tet10`: edges `(0,1), (1,2), (2,0), (0,3), (1,3), (2,3)`.
    /// - `Hex27`: bottom edges, vertical edges, top edges, then the faces
    ///   `z = -1, y = -1, x = 1, y = 1, x = -1, z = 1`, then the center.
    pub fn reference_nodes(element_type: ElementType) -> &'static [[f64; 3]] {
        lagrange::reference_nodes(element_type)
    }

    fn univariate_rule(family: QuadratureFamily, order: Order) -> Result<Rule1d, jxw_quadrature::Error> {
        let order = order.get();
        match family {
            QuadratureFamily::Gauss => Ok(gauss(order / 2 + 1)),
            QuadratureFamily::GaussLobatto => try_gauss_lobatto(usize::max(2, (order + 4) / 2)),
            QuadratureFamily::Grid => Ok(midpoint(order + 1)),
        }
    }

    fn assert_geometric_order(element_type: ElementType, order: Order) {
        assert_eq!(
            order,
            element_type.default_order(),
            "{} elements only provide the basis of order {}",
            element_type,
            element_type.default_order()
        );
    }
}

impl ReferenceRuleProvider for LagrangeReference {
    fn rule(&self, key: QuadratureKey) -> Result<QuadratureRule, JacobianError> {
        if key.order > Self::MAX_ORDER {
            return Err(JacobianError::UnsupportedQuadrature { key });
        }

        if !key.element_type.is_simplex() {
            let rule1d = Self::univariate_rule(key.family, key.order)
                .map_err(|_| JacobianError::UnsupportedQuadrature { key })?;
            return Ok(match key.reference_dim() {
                1 => QuadratureRule::from_rule1d(rule1d),
                2 => QuadratureRule::from_rule2d(quadrilateral_tensor_product(&rule1d)),
                _ => QuadratureRule::from_rule3d(hexahedron_tensor_product(&rule1d)),
            });
        }

        let strength = key.order.get();
        let n = strength + 1;
        match (key.reference_dim(), key.family) {
            (2, QuadratureFamily::Gauss) => Ok(QuadratureRule::from_rule2d(triangle_gauss(strength))),
            (3, QuadratureFamily::Gauss) => Ok(QuadratureRule::from_rule3d(tetrahedron_gauss(strength))),
            (2, QuadratureFamily::Grid) => Ok(QuadratureRule::from_rule2d(triangle_grid(n))),
            (3, QuadratureFamily::Grid) => Ok(QuadratureRule::from_rule3d(tetrahedron_grid(n))),
            _ => Err(JacobianError::UnsupportedQuadrature { key }),
        }
    }

    fn tensor_factor(&self, key: QuadratureKey) -> Option<QuadratureRule> {
        if key.element_type.is_simplex() || key.order > Self::MAX_ORDER {
            return None;
        }
        Self::univariate_rule(key.family, key.order)
            .ok()
            .map(QuadratureRule::from_rule1d)
    }

    fn shape(&self, element_type: ElementType, order: Order, node: usize, xi: &ReferencePoint) -> f64 {
        Self::assert_geometric_order(element_type, order);
        lagrange::basis(element_type, node, xi).0
    }

    fn shape_deriv(
        &self,
        element_type: ElementType,
        order: Order,
        node: usize,
        axis: usize,
        xi: &ReferencePoint,
    ) -> f64 {
        Self::assert_geometric_order(element_type, order);
        assert!(
            axis < element_type.reference_dim(),
            "{} elements have no reference axis {}",
            element_type,
            axis
        );
        lagrange::basis(element_type, node, xi).1[axis]
    }
}
