use crate::calculator::{assert_output_len, check_element_type, check_positive, JacobianKernel};
use crate::element::{Element, ElementType};
use crate::error::JacobianError;
use crate::nalgebra::{Point3, Vector2};
use crate::quadrature::{Order, QuadratureKey, QuadratureRule};
use crate::reference::ReferenceRuleProvider;
use itertools::izip;
use std::sync::Arc;

/// Closed-form kernel for bilinear quadrilaterals in the plane.
///
/// Writing the map from `[-1, 1]^2` as
/// `x(ξ, η) = x̄ + a ξ + b η + c ξη` (component-wise), the Jacobian is
/// `(a1 + c1 η)(b2 + c2 ξ) - (b1 + c1 ξ)(a2 + c2 η)`.
#[derive(Debug, Clone)]
pub struct BilinearQuad4 {
    key: QuadratureKey,
    rule: Arc<QuadratureRule>,
}

impl BilinearQuad4 {
    pub fn new(key: QuadratureKey, rule: Arc<QuadratureRule>) -> Result<Self, JacobianError> {
        check_element_type(ElementType::Quad4, key.element_type)?;
        assert_eq!(rule.reference_dim(), 2);
        Ok(Self { key, rule })
    }
}

impl JacobianKernel for BilinearQuad4 {
    fn key(&self) -> QuadratureKey {
        self.key
    }

    fn quadrature(&self) -> &QuadratureRule {
        &self.rule
    }

    fn jxw_into<E>(&self, element: &E, out: &mut [f64]) -> Result<(), JacobianError>
    where
        E: Element + ?Sized,
    {
        check_element_type(self.key.element_type, element.element_type())?;
        assert_output_len(out, &self.rule);

        let [p0, p1, p2, p3] = [0, 1, 2, 3].map(|i| element.point(i).xy());
        let a = 0.25 * (-p0.coords + p1.coords + p2.coords - p3.coords);
        let b = 0.25 * (-p0.coords - p1.coords + p2.coords + p3.coords);
        let c = 0.25 * (p0.coords - p1.coords + p2.coords - p3.coords);
        let (a1, b1, c1) = (a.x, b.x, c.x);
        let (a2, b2, c2) = (a.y, b.y, c.y);

        for (q, (jxw, w, xi)) in izip!(out, self.rule.weights(), self.rule.points()).enumerate() {
            let (xi, eta) = (xi.x, xi.y);
            let jacobian = (a1 + c1 * eta) * (b2 + c2 * xi) - (b1 + c1 * xi) * (a2 + c2 * eta);
            *jxw = w * check_positive(q, jacobian)?;
        }
        Ok(())
    }
}

/// Edge3 nodes ordered from left to right along the reference interval.
const EDGE3_LEFT_TO_RIGHT: [usize; 3] = [0, 2, 1];

/// Quad9 nodes arranged on the `3 x 3` tensor grid, indexed `[row][column]` with rows
/// running along `η` and columns along `ξ`.
#[rustfmt::skip]
const QUAD9_GRID: [[usize; 3]; 3] = [
    [0, 4, 1],
    [7, 8, 5],
    [3, 6, 2],
];

/// Tensor-product kernel for biquadratic quadrilaterals in the plane.
///
/// The rule must be the tensor product of a 1D rule with `Q1` points, laid out with the
/// first coordinate running fastest. The 1D shape functions and their derivatives are
/// tabulated at the `Q1` points only, and the Jacobian is accumulated row by row of the
/// node grid.
#[derive(Debug, Clone)]
pub struct BiquadraticQuad9 {
    key: QuadratureKey,
    rule: Arc<QuadratureRule>,
    // Shape functions and derivatives at 1D point i, in left-to-right node order
    phi: Vec<[f64; 3]>,
    dphi: Vec<[f64; 3]>,
}

impl BiquadraticQuad9 {
    /// Builds the kernel from the 2D rule and the 1D rule it is the tensor product of.
    ///
    /// # Errors
    ///
    /// Returns [`JacobianError::TensorProductExpected`] if `rule` is not the tensor
    /// product of `rule1d`.
    pub fn new<P>(
        key: QuadratureKey,
        rule: Arc<QuadratureRule>,
        rule1d: &QuadratureRule,
        provider: &P,
    ) -> Result<Self, JacobianError>
    where
        P: ReferenceRuleProvider + ?Sized,
    {
        check_element_type(ElementType::Quad9, key.element_type)?;
        if !is_tensor_product_of(&rule, rule1d) {
            return Err(JacobianError::TensorProductExpected { key });
        }

        let phi = tabulate_edge3(rule1d, |node, xi| provider.shape(ElementType::Edge3, Order::SECOND, node, xi));
        let dphi = tabulate_edge3(rule1d, |node, xi| {
            provider.shape_deriv(ElementType::Edge3, Order::SECOND, node, 0, xi)
        });

        Ok(Self { key, rule, phi, dphi })
    }

    /// The number of points of the underlying 1D rule.
    pub fn num_points_1d(&self) -> usize {
        self.phi.len()
    }
}

fn tabulate_edge3(rule1d: &QuadratureRule, f: impl Fn(usize, &Point3<f64>) -> f64) -> Vec<[f64; 3]> {
    rule1d
        .points()
        .iter()
        .map(|xi| EDGE3_LEFT_TO_RIGHT.map(|node| f(node, xi)))
        .collect()
}

fn is_tensor_product_of(rule: &QuadratureRule, rule1d: &QuadratureRule) -> bool {
    let tol = 4.0 * f64::EPSILON;
    let n = rule1d.len();
    rule.reference_dim() == 2
        && rule1d.reference_dim() == 1
        && rule.len() == n * n
        && rule.points().iter().enumerate().all(|(q, xi)| {
            let (i, j) = (q % n, q / n);
            (xi.x - rule1d.points()[i].x).abs() <= tol && (xi.y - rule1d.points()[j].x).abs() <= tol
        })
}

impl JacobianKernel for BiquadraticQuad9 {
    fn key(&self) -> QuadratureKey {
        self.key
    }

    fn quadrature(&self) -> &QuadratureRule {
        &self.rule
    }

    fn jxw_into<E>(&self, element: &E, out: &mut [f64]) -> Result<(), JacobianError>
    where
        E: Element + ?Sized,
    {
        check_element_type(self.key.element_type, element.element_type())?;
        assert_output_len(out, &self.rule);

        let x = QUAD9_GRID.map(|row| row.map(|node| element.point(node).xy().coords));
        let n = self.num_points_1d();

        for (q, (jxw, w)) in izip!(out, self.rule.weights()).enumerate() {
            let (i, j) = (q % n, q / n);
            let mut dx_dxi = Vector2::<f64>::zeros();
            let mut dx_deta = Vector2::<f64>::zeros();
            for (x_row, phi_row, dphi_row) in izip!(&x, &self.phi[j], &self.dphi[j]) {
                let mut row_dxi = Vector2::<f64>::zeros();
                let mut row_value = Vector2::<f64>::zeros();
                for (x_node, phi, dphi) in izip!(x_row, &self.phi[i], &self.dphi[i]) {
                    row_dxi += x_node * *dphi;
                    row_value += x_node * *phi;
                }
                dx_dxi += row_dxi * *phi_row;
                dx_deta += row_value * *dphi_row;
            }
            let jacobian = dx_dxi.x * dx_deta.y - dx_deta.x * dx_dxi.y;
            *jxw = w * check_positive(q, jacobian)?;
        }
        Ok(())
    }
}
