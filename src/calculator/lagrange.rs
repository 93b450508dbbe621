use crate::calculator::{assert_output_len, check_element_type, check_positive, metric_determinant, JacobianKernel};
use crate::element::{Element, ElementType, MAX_NODES};
use crate::error::JacobianError;
use crate::nalgebra::Matrix3;
use crate::quadrature::{Order, QuadratureKey, QuadratureRule};
use crate::reference::ReferenceRuleProvider;
use itertools::izip;
use std::sync::Arc;

/// Reference gradients of every shape function at every quadrature point.
///
/// Entry `(q, n, k)` is the derivative of the shape function of node `n` along reference
/// axis `k`, evaluated at quadrature point `q`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDerivativeTable {
    num_points: usize,
    num_nodes: usize,
    reference_dim: usize,
    derivatives: Vec<f64>,
}

impl ShapeDerivativeTable {
    pub fn new<P>(provider: &P, element_type: ElementType, order: Order, rule: &QuadratureRule) -> Self
    where
        P: ReferenceRuleProvider + ?Sized,
    {
        let num_nodes = provider.num_nodes(element_type);
        let reference_dim = element_type.reference_dim();
        let mut derivatives = Vec::with_capacity(rule.len() * num_nodes * reference_dim);
        for xi in rule.points() {
            for n in 0..num_nodes {
                for k in 0..reference_dim {
                    derivatives.push(provider.shape_deriv(element_type, order, n, k, xi));
                }
            }
        }
        Self {
            num_points: rule.len(),
            num_nodes,
            reference_dim,
            derivatives,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn reference_dim(&self) -> usize {
        self.reference_dim
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    /// The gradients at quadrature point `q`, node after node.
    pub fn at_point(&self, q: usize) -> &[f64] {
        let stride = self.num_nodes * self.reference_dim;
        &self.derivatives[q * stride..(q + 1) * stride]
    }

    pub fn get(&self, q: usize, node: usize, axis: usize) -> f64 {
        assert!(axis < self.reference_dim);
        self.at_point(q)[node * self.reference_dim + axis]
    }
}

/// Generic calculator for any Lagrange element of reference dimension `d` embedded in
/// `s`-dimensional space, with `d <= s <= 3`.
#[derive(Debug, Clone)]
pub struct LagrangeJacobianCalculator {
    key: QuadratureKey,
    spatial_dim: usize,
    rule: Arc<QuadratureRule>,
    shape_derivatives: ShapeDerivativeTable,
}

impl LagrangeJacobianCalculator {
    pub fn new<P>(
        key: QuadratureKey,
        rule: Arc<QuadratureRule>,
        spatial_dim: usize,
        provider: &P,
    ) -> Result<Self, JacobianError>
    where
        P: ReferenceRuleProvider + ?Sized,
    {
        let reference_dim = key.reference_dim();
        if !(1..=3).contains(&spatial_dim) || reference_dim > spatial_dim {
            return Err(JacobianError::DimensionMismatch {
                reference_dim,
                spatial_dim,
            });
        }
        assert_eq!(
            rule.reference_dim(),
            reference_dim,
            "Quadrature rule does not live on the reference element of {}",
            key.element_type
        );

        let order = provider.default_order(key.element_type);
        let shape_derivatives = ShapeDerivativeTable::new(provider, key.element_type, order, &rule);
        assert!(shape_derivatives.num_nodes() <= MAX_NODES);
        Ok(Self {
            key,
            spatial_dim,
            rule,
            shape_derivatives,
        })
    }

    pub fn spatial_dim(&self) -> usize {
        self.spatial_dim
    }

    pub fn reference_dim(&self) -> usize {
        self.shape_derivatives.reference_dim()
    }

    pub fn shape_derivatives(&self) -> &ShapeDerivativeTable {
        &self.shape_derivatives
    }
}

impl JacobianKernel for LagrangeJacobianCalculator {
    fn key(&self) -> QuadratureKey {
        self.key
    }

    fn quadrature(&self) -> &QuadratureRule {
        &self.rule
    }

    #[allow(non_snake_case)]
    fn jxw_into<E>(&self, element: &E, out: &mut [f64]) -> Result<(), JacobianError>
    where
        E: Element + ?Sized,
    {
        check_element_type(self.key.element_type, element.element_type())?;
        assert_output_len(out, &self.rule);

        let (d, s) = (self.reference_dim(), self.spatial_dim);
        let num_nodes = self.shape_derivatives.num_nodes();

        let mut X = [[0.0; 3]; MAX_NODES];
        for (n, x_n) in X.iter_mut().enumerate().take(num_nodes) {
            let p = element.point(n);
            x_n[..s].copy_from_slice(&p.coords.as_slice()[..s]);
        }

        for (q, (w, jxw)) in izip!(self.rule.weights(), out.iter_mut()).enumerate() {
            let G = self.shape_derivatives.at_point(q);
            let mut F = Matrix3::<f64>::zeros();
            for (x_n, g_n) in izip!(&X[..num_nodes], G.chunks_exact(d)) {
                for i in 0..s {
                    for j in 0..d {
                        F[(i, j)] += x_n[i] * g_n[j];
                    }
                }
            }
            let jacobian = check_positive(q, metric_determinant(&F, d, s))?;
            *jxw = w * jacobian;
        }
        Ok(())
    }
}
