use crate::calculator::{assert_output_len, check_element_type, check_positive, JacobianKernel};
use crate::element::{Element, ElementType};
use crate::error::JacobianError;
use crate::nalgebra::Matrix3;
use crate::quadrature::{QuadratureKey, QuadratureRule};
use itertools::izip;
use std::sync::Arc;

/// Closed-form kernel for linear tetrahedra.
///
/// The Jacobian is `det[p1 - p0 | p2 - p0 | p3 - p0]` at every quadrature point.
#[derive(Debug, Clone)]
pub struct AffineTet4 {
    key: QuadratureKey,
    rule: Arc<QuadratureRule>,
}

impl AffineTet4 {
    pub fn new(key: QuadratureKey, rule: Arc<QuadratureRule>) -> Result<Self, JacobianError> {
        check_element_type(ElementType::Tet4, key.element_type)?;
        assert_eq!(rule.reference_dim(), 3);
        Ok(Self { key, rule })
    }
}

impl JacobianKernel for AffineTet4 {
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

        let [p0, p1, p2, p3] = [0, 1, 2, 3].map(|i| element.point(i));
        let edges = Matrix3::from_columns(&[p1 - p0, p2 - p0, p3 - p0]);
        let jacobian = check_positive(0, edges.determinant())?;

        for (jxw, w) in izip!(out, self.rule.weights()) {
            *jxw = w * jacobian;
        }
        Ok(())
    }
}
