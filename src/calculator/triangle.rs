use crate::calculator::{assert_output_len, check_element_type, check_positive, JacobianKernel};
use crate::element::{Element, ElementType};
use crate::error::JacobianError;
use crate::quadrature::{QuadratureKey, QuadratureRule};
use itertools::izip;
use std::sync::Arc;

/// Closed-form kernel for linear triangles in the plane.
///
/// The map from the reference triangle is affine, so the Jacobian is the same at every
/// quadrature point and `JxW` is the rule's weights scaled by twice the triangle area.
#[derive(Debug, Clone)]
pub struct AffineTriangle3 {
    key: QuadratureKey,
    rule: Arc<QuadratureRule>,
}

impl AffineTriangle3 {
    pub fn new(key: QuadratureKey, rule: Arc<QuadratureRule>) -> Result<Self, JacobianError> {
        check_element_type(ElementType::Tri3, key.element_type)?;
        assert_eq!(rule.reference_dim(), 2);
        Ok(Self { key, rule })
    }
}

impl JacobianKernel for AffineTriangle3 {
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

        let [p0, p1, p2] = [0, 1, 2].map(|i| element.point(i));
        let jacobian = (p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y);
        let jacobian = check_positive(0, jacobian)?;

        for (jxw, w) in izip!(out, self.rule.weights()) {
            *jxw = w * jacobian;
        }
        Ok(())
    }
}
