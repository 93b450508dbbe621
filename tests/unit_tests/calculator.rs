use crate::unit_tests::{gauss, generic_calculator, reference_element, reference_measure};
use jxw::calculator::{
    AffineTriangle3, BiquadraticQuad9, CalculatorKernel, JacobianCalculator, JacobianKernel,
    LagrangeJacobianCalculator, ShapeDerivativeTable,
};
use jxw::element::{Element, ElementType, NodalElement};
use jxw::nalgebra::{Matrix3xX, Point1, Point2, Point3};
use jxw::proptest::{affine_element, element_configuration, perturbed_element};
use jxw::quadrature::{Order, QuadratureCache, QuadratureFamily, QuadratureKey, QuadratureRule, ReferencePoint};
use jxw::reference::{LagrangeReference, ReferenceRuleProvider};
use jxw::registry::CalculatorRegistry;
use jxw::JacobianError;
use matrixcompare::assert_scalar_eq;
use proptest::prelude::*;
use std::sync::Arc;
use util::{assert_approx_slice_eq, planar_rigid_motion, rigid_motion, scale};

fn unit_triangle() -> NodalElement {
    NodalElement::from_points2(
        ElementType::Tri3,
        &[Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)],
    )
}

fn unit_square() -> NodalElement {
    NodalElement::from_points2(
        ElementType::Quad4,
        &[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ],
    )
}

/// The unit square as a Quad9 element, with mid-side and center nodes.
fn unit_square_quad9() -> NodalElement {
    NodalElement::from_points2(
        ElementType::Quad9,
        &[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.5, 0.0),
            Point2::new(1.0, 0.5),
            Point2::new(0.5, 1.0),
            Point2::new(0.0, 0.5),
            Point2::new(0.5, 0.5),
        ],
    )
}

/// Computes JxW with the calculator the registry picks for the element's type.
fn registry_jxw(spatial_dim: usize, key: QuadratureKey, element: &NodalElement) -> Result<Vec<f64>, JacobianError> {
    CalculatorRegistry::new(spatial_dim)
        .jxw(key, element)
        .map(|jxw| jxw.to_vec())
}

#[test]
fn unit_triangle_jxw() {
    let jxw = registry_jxw(2, gauss(ElementType::Tri3, 1), &unit_triangle()).unwrap();
    assert_eq!(jxw, vec![0.5]);
}

#[test]
fn scaled_triangle_jxw() {
    let triangle = NodalElement::from_points2(
        ElementType::Tri3,
        &[Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), Point2::new(0.0, 3.0)],
    );
    let jxw = registry_jxw(2, gauss(ElementType::Tri3, 1), &triangle).unwrap();
    assert_eq!(jxw, vec![3.0]);
}

#[test]
fn unit_tetrahedron_jxw() {
    let tet = NodalElement::from_points3(
        ElementType::Tet4,
        &[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ],
    );
    let jxw = registry_jxw(3, gauss(ElementType::Tet4, 1), &tet).unwrap();
    assert_eq!(jxw.len(), 1);
    assert_scalar_eq!(jxw[0], 1.0 / 6.0, comp = abs, tol = 1e-15);
}

#[test]
fn grid_rules_give_reference_measure() {
    for ty in ElementType::ALL {
        for order in 0..=4 {
            let key = QuadratureKey::new(ty, QuadratureFamily::Grid, Order(order));
            let jxw = registry_jxw(ty.reference_dim(), key, &reference_element(ty)).unwrap();
            assert_eq!(jxw.len(), (order as usize + 1).pow(ty.reference_dim() as u32));
            assert_scalar_eq!(jxw.iter().sum::<f64>(), reference_measure(ty), comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn grid_rule_tetrahedron_volume() {
    let tet = NodalElement::from_points3(
        ElementType::Tet4,
        &[
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(3.0, 1.0, 1.0),
            Point3::new(1.0, 4.0, 1.0),
            Point3::new(1.0, 1.0, 2.0),
        ],
    );
    for order in 0..=3 {
        let key = QuadratureKey::new(ElementType::Tet4, QuadratureFamily::Grid, Order(order));
        let jxw = registry_jxw(3, key, &tet).unwrap();
        assert_scalar_eq!(jxw.iter().sum::<f64>(), 1.0, comp = abs, tol = 1e-13);
    }
}

#[test]
fn unit_square_jxw() {
    let key = gauss(ElementType::Quad4, 2);
    let jxw = registry_jxw(2, key, &unit_square()).unwrap();
    assert_eq!(jxw.len(), 4);
    assert_approx_slice_eq!(jxw, [0.25; 4], reltol = 1e-15);
}

#[test]
fn rectangle_jxw() {
    let rectangle = NodalElement::from_points2(
        ElementType::Quad4,
        &[
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(0.0, 1.0),
        ],
    );
    let jxw = registry_jxw(2, gauss(ElementType::Quad4, 2), &rectangle).unwrap();
    assert_approx_slice_eq!(jxw, [0.5; 4], reltol = 1e-15);
    assert_scalar_eq!(jxw.iter().sum::<f64>(), 2.0, comp = abs, tol = 1e-14);
}

#[test]
fn unit_square_quad9_matches_quad4() {
    let quad9 = registry_jxw(2, gauss(ElementType::Quad9, 3), &unit_square_quad9()).unwrap();
    let quad4 = registry_jxw(2, gauss(ElementType::Quad4, 3), &unit_square()).unwrap();
    assert_eq!(quad9.len(), 4);
    assert_approx_slice_eq!(quad9, quad4, reltol = 1e-14);
    assert_scalar_eq!(quad9.iter().sum::<f64>(), 1.0, comp = abs, tol = 1e-14);
}

#[test]
fn segment_in_3d_jxw() {
    let segment = NodalElement::from_points3(
        ElementType::Edge2,
        &[Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 2.0)],
    );
    let mut registry = CalculatorRegistry::new(3);
    let calculator = registry.get(gauss(ElementType::Edge2, 1)).unwrap();
    let weights = calculator.weights().to_vec();
    let jxw = calculator.jxw(&segment).unwrap();

    // |x1 - x0| = 3 on a reference interval of length 2
    for (jxw_q, w_q) in jxw.iter().zip(&weights) {
        assert_scalar_eq!(jxw_q / w_q, 1.5, comp = abs, tol = 1e-14);
    }
    assert_scalar_eq!(jxw.iter().sum::<f64>(), 3.0, comp = abs, tol = 1e-14);
}

#[test]
fn segments_in_every_dimension() {
    for spatial_dim in 1..=3 {
        let mut nodes = [Point3::origin(), Point3::origin()];
        nodes[1][spatial_dim - 1] = 4.0;
        let segment = NodalElement::from_points3(ElementType::Edge2, &nodes);
        let jxw = registry_jxw(spatial_dim, gauss(ElementType::Edge2, 3), &segment).unwrap();
        assert_scalar_eq!(jxw.iter().sum::<f64>(), 4.0, comp = abs, tol = 1e-14);
    }

    let segment = NodalElement::from_points1(ElementType::Edge3, &[Point1::new(1.0), Point1::new(2.0), Point1::new(1.5)]);
    let jxw = registry_jxw(1, gauss(ElementType::Edge3, 2), &segment).unwrap();
    assert_scalar_eq!(jxw.iter().sum::<f64>(), 1.0, comp = abs, tol = 1e-14);
}

#[test]
fn reference_elements_have_reference_measure() {
    for ty in ElementType::ALL {
        for spatial_dim in ty.reference_dim()..=3 {
            let jxw = registry_jxw(spatial_dim, gauss(ty, 2), &reference_element(ty)).unwrap();
            assert_scalar_eq!(jxw.iter().sum::<f64>(), reference_measure(ty), comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn curved_quad9_area() {
    // Unit square whose top edge bulges to y = 1 + t (1 - (2x - 1)^2)
    let t = 0.2;
    let mut nodes = unit_square_quad9().nodes().to_vec();
    nodes[6].y += t;
    nodes[8].y += 0.5 * t;
    let element = NodalElement::new(ElementType::Quad9, nodes);

    // The exact area is 1 + 2t/3, and the integrand is polynomial of degree 3 per axis
    let key = gauss(ElementType::Quad9, 4);
    let specialized = registry_jxw(2, key, &element).unwrap();
    let generic = generic_calculator(key, 2).jxw(&element).unwrap().to_vec();
    assert_scalar_eq!(specialized.iter().sum::<f64>(), 1.0 + 2.0 * t / 3.0, comp = abs, tol = 1e-14);
    assert_approx_slice_eq!(specialized, generic, reltol = 1e-13);
}

#[test]
fn repeated_evaluation_is_deterministic() {
    let mut registry = CalculatorRegistry::new(2);
    let key = gauss(ElementType::Quad9, 5);
    let element = unit_square_quad9().map_nodes(|x| Point3::new(x.x + 0.1 * x.y * x.y, x.y, 0.0));
    let first = registry.jxw(key, &element).unwrap().to_vec();

    registry.jxw(key, &unit_square_quad9()).unwrap();
    let second = registry.jxw(key, &element).unwrap().to_vec();
    assert_eq!(first, second);
}

#[test]
fn jxw_into_matches_buffered_jxw() {
    let key = gauss(ElementType::Hex27, 4);
    let element = reference_element(ElementType::Hex27).map_nodes(|x| Point3::new(2.0 * x.x, x.y + 0.1 * x.x, x.z));
    let mut calculator = generic_calculator(key, 3);

    let mut out = vec![0.0; calculator.num_points()];
    calculator.jxw_into(&element, &mut out).unwrap();
    let buffered = calculator.jxw(&element).unwrap();
    assert_eq!(out.as_slice(), buffered);
}

#[test]
#[should_panic(expected = "Output length must match the number of quadrature points")]
fn jxw_into_rejects_wrong_output_length() {
    let calculator = generic_calculator(gauss(ElementType::Quad4, 3), 2);
    let mut out = vec![0.0; calculator.num_points() + 1];
    let _ = calculator.jxw_into(&unit_square(), &mut out);
}

#[test]
fn inverted_triangle_is_rejected() {
    let clockwise = NodalElement::from_points2(
        ElementType::Tri3,
        &[Point2::new(0.0, 0.0), Point2::new(0.0, 1.0), Point2::new(1.0, 0.0)],
    );
    let key = gauss(ElementType::Tri3, 2);
    let expected = JacobianError::InvertedElement {
        quadrature_point: 0,
        jacobian: -1.0,
    };
    assert_eq!(registry_jxw(2, key, &clockwise), Err(expected.clone()));
    assert_eq!(generic_calculator(key, 2).jxw(&clockwise).map(|_| ()), Err(expected));
}

#[test]
fn inverted_quadrilateral_is_rejected() {
    let clockwise = unit_square().map_nodes(|x| Point3::new(x.y, x.x, 0.0));
    let key = gauss(ElementType::Quad4, 3);
    for result in [
        registry_jxw(2, key, &clockwise).map(|_| ()),
        generic_calculator(key, 2).jxw(&clockwise).map(|_| ()),
    ] {
        match result {
            Err(JacobianError::InvertedElement {
                quadrature_point,
                jacobian,
            }) => {
                assert_eq!(quadrature_point, 0);
                assert_scalar_eq!(jacobian, -0.25, comp = abs, tol = 1e-15);
            }
            other => panic!("Expected inverted element, got {:?}", other),
        }
    }
}

#[test]
fn degenerate_elements_are_rejected() {
    let collinear = NodalElement::from_points2(
        ElementType::Tri3,
        &[Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)],
    );
    let result = registry_jxw(2, gauss(ElementType::Tri3, 1), &collinear);
    assert!(matches!(result, Err(JacobianError::InvertedElement { .. })));

    let point_like = NodalElement::from_points3(ElementType::Edge2, &[Point3::new(1.0, 1.0, 1.0); 2]);
    let result = registry_jxw(3, gauss(ElementType::Edge2, 1), &point_like);
    assert!(matches!(result, Err(JacobianError::InvertedElement { .. })));
}

#[test]
fn nan_coordinates_are_rejected() {
    let mut nodes = unit_square().nodes().to_vec();
    nodes[2].x = f64::NAN;
    let element = NodalElement::new(ElementType::Quad4, nodes);
    let result = registry_jxw(2, gauss(ElementType::Quad4, 1), &element);
    assert!(matches!(result, Err(JacobianError::InvertedElement { .. })));
}

#[test]
fn wrong_element_type_is_a_contract_violation() {
    let mut registry = CalculatorRegistry::new(2);
    let calculator = registry.get(gauss(ElementType::Tri3, 1)).unwrap();
    assert_eq!(
        calculator.jxw(&unit_square()),
        Err(JacobianError::ContractViolation {
            expected: ElementType::Tri3,
            actual: ElementType::Quad4,
        })
    );

    let mut generic = generic_calculator(gauss(ElementType::Quad9, 2), 2);
    assert_eq!(
        generic.jxw(&unit_square()),
        Err(JacobianError::ContractViolation {
            expected: ElementType::Quad9,
            actual: ElementType::Quad4,
        })
    );
}

#[test]
fn specialized_kernels_check_their_key() {
    let rule = QuadratureCache::new().rule(gauss(ElementType::Quad4, 1)).unwrap();
    let result = AffineTriangle3::new(gauss(ElementType::Quad4, 1), rule);
    assert!(matches!(
        result,
        Err(JacobianError::ContractViolation {
            expected: ElementType::Tri3,
            actual: ElementType::Quad4
        })
    ));
}

#[test]
fn reference_dimension_must_not_exceed_spatial_dimension() {
    let cache = QuadratureCache::new();
    let key = gauss(ElementType::Tet4, 1);
    let rule = cache.rule(key).unwrap();
    let result = LagrangeJacobianCalculator::new(key, rule.clone(), 2, &LagrangeReference);
    assert!(matches!(
        result,
        Err(JacobianError::DimensionMismatch {
            reference_dim: 3,
            spatial_dim: 2
        })
    ));

    for spatial_dim in [0, 4] {
        let result = LagrangeJacobianCalculator::new(key, rule.clone(), spatial_dim, &LagrangeReference);
        assert!(matches!(result, Err(JacobianError::DimensionMismatch { .. })));
    }
}

#[test]
fn quad9_requires_a_tensor_product_rule() {
    let provider = LagrangeReference;
    let key = gauss(ElementType::Quad9, 3);
    let rule = Arc::new(provider.rule(key).unwrap());

    // Too many 1D points
    let rule1d = provider.tensor_factor(gauss(ElementType::Quad9, 5)).unwrap();
    let result = BiquadraticQuad9::new(key, rule.clone(), &rule1d, &provider);
    assert!(matches!(result, Err(JacobianError::TensorProductExpected { .. })));

    // Right number of points, wrong positions
    let lobatto = QuadratureKey::new(ElementType::Quad9, QuadratureFamily::GaussLobatto, Order::CONSTANT);
    let rule1d = provider.tensor_factor(lobatto).unwrap();
    assert_eq!(rule1d.len(), 2);
    let result = BiquadraticQuad9::new(key, rule.clone(), &rule1d, &provider);
    assert_eq!(result.err(), Some(JacobianError::TensorProductExpected { key }));

    let rule1d = provider.tensor_factor(key).unwrap();
    let kernel = BiquadraticQuad9::new(key, rule, &rule1d, &provider).unwrap();
    assert_eq!(kernel.num_points_1d(), 2);
}

/// Provider whose elements have no nodes at all.
struct NodelessReference;

impl ReferenceRuleProvider for NodelessReference {
    fn rule(&self, key: QuadratureKey) -> Result<QuadratureRule, JacobianError> {
        LagrangeReference.rule(key)
    }

    fn num_nodes(&self, _element_type: ElementType) -> usize {
        0
    }

    fn shape(&self, element_type: ElementType, order: Order, node: usize, xi: &ReferencePoint) -> f64 {
        LagrangeReference.shape(element_type, order, node, xi)
    }

    fn shape_deriv(
        &self,
        element_type: ElementType,
        order: Order,
        node: usize,
        axis: usize,
        xi: &ReferencePoint,
    ) -> f64 {
        LagrangeReference.shape_deriv(element_type, order, node, axis, xi)
    }
}

#[test]
fn shape_derivative_table_without_nodes_keeps_point_count() {
    let key = gauss(ElementType::Quad4, 2);
    let rule = NodelessReference.rule(key).unwrap();
    let table = ShapeDerivativeTable::new(&NodelessReference, ElementType::Quad4, Order::FIRST, &rule);
    assert_eq!(table.num_nodes(), 0);
    assert_eq!(table.num_points(), 4);
    assert!(table.at_point(3).is_empty());
}

#[test]
fn shape_derivative_table_matches_provider() {
    let provider = LagrangeReference;
    let key = gauss(ElementType::Tet10, 2);
    let rule = provider.rule(key).unwrap();
    let table = ShapeDerivativeTable::new(&provider, ElementType::Tet10, Order::SECOND, &rule);
    assert_eq!(table.num_points(), rule.len());
    assert_eq!(table.num_nodes(), 10);
    assert_eq!(table.at_point(1).len(), 30);
    for (q, xi) in rule.points().iter().enumerate() {
        for n in 0..10 {
            for k in 0..3 {
                assert_eq!(table.get(q, n, k), provider.shape_deriv(ElementType::Tet10, Order::SECOND, n, k, xi));
            }
        }
    }
}

#[test]
fn calculator_exposes_its_rule() {
    let key = gauss(ElementType::Quad4, 5);
    let mut registry = CalculatorRegistry::new(2);
    let calculator = registry.get(key).unwrap();
    let rule = LagrangeReference.rule(key).unwrap();
    assert_eq!(calculator.key(), key);
    assert_eq!(calculator.num_points(), 9);
    assert_eq!(calculator.weights(), rule.weights());
    assert_eq!(calculator.points(), rule.points());
    assert_eq!(calculator.kernel().key(), key);
}

#[test]
fn kernels_convert_into_calculators() {
    let key = gauss(ElementType::Tri3, 2);
    let rule = QuadratureCache::new().rule(key).unwrap();
    let mut calculator = JacobianCalculator::new(AffineTriangle3::new(key, rule).unwrap());
    assert!(matches!(calculator.kernel(), CalculatorKernel::Triangle3(_)));
    let jxw = calculator.jxw(&unit_triangle()).unwrap();
    assert_approx_slice_eq!(jxw, [1.0 / 6.0; 3], reltol = 1e-15);
}

/// The factor by which an affine element scales the measure of its reference cell.
fn affine_volume_ratio(element: &NodalElement) -> f64 {
    // Recover the linear part of the map from vertices that differ from vertex 0 along
    // a single reference axis
    let ty = element.element_type();
    let reference = LagrangeReference::reference_nodes(ty);
    let columns: Vec<_> = (0..ty.reference_dim())
        .map(|k| {
            let vertex = if ty.is_simplex() { k + 1 } else { [1, 3, 4][k] };
            let length = reference[vertex][k] - reference[0][k];
            (element.point(vertex) - element.point(0)) / length
        })
        .collect();
    let f = Matrix3xX::from_columns(&columns);
    (f.transpose() * &f).determinant().sqrt()
}

proptest! {
    #[test]
    fn affine_elements_have_constant_jacobian(
        (element, spatial_dim) in element_configuration()
            .prop_flat_map(|(ty, s)| (affine_element(ty, s), Just(s)))
    ) {
        let ty = element.element_type();
        let key = gauss(ty, 3);
        let mut registry = CalculatorRegistry::new(spatial_dim);
        let calculator = registry.get(key).unwrap();
        let weights = calculator.weights().to_vec();
        let jxw = calculator.jxw(&element).unwrap();

        let expected = affine_volume_ratio(&element);
        for (jxw_q, w_q) in jxw.iter().zip(&weights) {
            prop_assert!(*jxw_q > 0.0);
            prop_assert!((jxw_q / w_q - expected).abs() <= 1e-12 * expected);
        }
        let measure = expected * reference_measure(ty);
        prop_assert!((jxw.iter().sum::<f64>() - measure).abs() <= 1e-12 * measure);
    }

    #[test]
    fn specialized_and_generic_kernels_agree(
        (element, spatial_dim) in prop_oneof![
            perturbed_element(ElementType::Tri3, 2).prop_map(|e| (e, 2)),
            perturbed_element(ElementType::Tet4, 3).prop_map(|e| (e, 3)),
            perturbed_element(ElementType::Quad4, 2).prop_map(|e| (e, 2)),
            perturbed_element(ElementType::Quad9, 2).prop_map(|e| (e, 2)),
        ],
        order in 0..6u32
    ) {
        let key = gauss(element.element_type(), order);
        let mut registry = CalculatorRegistry::new(spatial_dim);
        let specialized = registry.get(key).unwrap();
        prop_assert!(!matches!(specialized.kernel(), CalculatorKernel::Lagrange(_)));
        let specialized = specialized.jxw(&element).unwrap();
        let mut generic = generic_calculator(key, spatial_dim);
        let generic = generic.jxw(&element).unwrap();
        assert_approx_slice_eq!(specialized, generic, reltol = 1e-13);
    }

    #[test]
    fn jxw_is_invariant_under_rigid_motions(
        (element, spatial_dim) in element_configuration()
            .prop_flat_map(|(ty, s)| (perturbed_element(ty, s), Just(s))),
        angle in 0.0..std::f64::consts::TAU,
        axis in [-1.0..1.0, -1.0..1.0, 0.1..1.0f64],
        translation in [-5.0..5.0, -5.0..5.0, -5.0..5.0f64]
    ) {
        let motion = match spatial_dim {
            1 => planar_rigid_motion(0.0, [translation[0], 0.0]),
            2 => planar_rigid_motion(angle, [translation[0], translation[1]]),
            _ => rigid_motion(axis, angle, translation),
        };
        let moved = element.map_nodes(|x| motion * x);

        let key = gauss(element.element_type(), 4);
        let mut registry = CalculatorRegistry::new(spatial_dim);
        let original = registry.jxw(key, &element).unwrap().to_vec();
        let moved = registry.jxw(key, &moved).unwrap();
        assert_approx_slice_eq!(moved, original, reltol = 1e-11);
    }

    #[test]
    fn jxw_scales_with_reference_dimension(
        (element, spatial_dim) in element_configuration()
            .prop_flat_map(|(ty, s)| (perturbed_element(ty, s), Just(s))),
        factor in 0.1..10.0f64
    ) {
        let ty = element.element_type();
        let key = gauss(ty, 3);
        let mut registry = CalculatorRegistry::new(spatial_dim);
        let original = registry.jxw(key, &element).unwrap().to_vec();
        let scaled = registry.jxw(key, &element.map_nodes(scale(factor))).unwrap();

        let expected: Vec<f64> = original.iter().map(|v| v * factor.powi(ty.reference_dim() as i32)).collect();
        assert_approx_slice_eq!(scaled, expected, reltol = 1e-12);
    }
}
