//! Proptest strategies for valid (positively oriented, non-degenerate) elements.
use crate::element::{ElementType, NodalElement};
use crate::nalgebra::{Matrix3, Point3, Vector3};
use crate::reference::LagrangeReference;
use ::proptest::collection::vec;
use ::proptest::prelude::*;

/// Every supported pair of element type and spatial dimension.
pub fn element_configuration() -> impl Strategy<Value = (ElementType, usize)> {
    let configurations: Vec<_> = ElementType::ALL
        .iter()
        .flat_map(|&ty| (ty.reference_dim()..=3).map(move |s| (ty, s)))
        .collect();
    prop::sample::select(configurations)
}

/// An affine map from reference space into `spatial_dim` dimensions, as a zero-padded
/// linear part and a translation.
///
/// The leading `reference_dim x reference_dim` block of the linear part is strictly
/// diagonally dominant with a positive diagonal, so the map preserves orientation and its
/// Jacobian determinant is bounded away from zero.
pub fn affine_map(reference_dim: usize, spatial_dim: usize) -> impl Strategy<Value = (Matrix3<f64>, Vector3<f64>)> {
    assert!(reference_dim <= spatial_dim && spatial_dim <= 3);
    let diagonal = [0.5..2.0, 0.5..2.0, 0.5..2.0];
    let entries = vec(-1.0..1.0, 9);
    let translation = [-10.0..10.0, -10.0..10.0, -10.0..10.0];
    (diagonal, entries, translation).prop_map(move |(diagonal, entries, translation)| {
        let mut linear = Matrix3::<f64>::zeros();
        for i in 0..spatial_dim {
            for j in 0..reference_dim {
                linear[(i, j)] = if i == j {
                    diagonal[i]
                } else if i < reference_dim {
                    0.05 * entries[3 * i + j]
                } else {
                    entries[3 * i + j]
                };
            }
        }
        let mut t = Vector3::<f64>::zeros();
        t.rows_mut(0, spatial_dim)
            .copy_from(&Vector3::from(translation).rows(0, spatial_dim));
        (linear, t)
    })
}

/// Elements whose nodes are the reference nodes under an orientation-preserving affine map.
pub fn affine_element(element_type: ElementType, spatial_dim: usize) -> impl Strategy<Value = NodalElement> {
    affine_map(element_type.reference_dim(), spatial_dim).prop_map(move |(linear, translation)| {
        let nodes = LagrangeReference::reference_nodes(element_type)
            .iter()
            .map(|xi| Point3::from(linear * Vector3::from(*xi) + translation))
            .collect();
        NodalElement::new(element_type, nodes)
    })
}

/// Affine elements whose nodes are additionally displaced by a small amount, giving
/// elements with a non-constant (but positive) Jacobian for non-simplex types.
pub fn perturbed_element(element_type: ElementType, spatial_dim: usize) -> impl Strategy<Value = NodalElement> {
    let displacement = [-0.005..0.005, -0.005..0.005, -0.005..0.005];
    let displacements = vec(displacement, element_type.num_nodes());
    (affine_element(element_type, spatial_dim), displacements).prop_map(move |(element, displacements)| {
        let nodes = element
            .nodes()
            .iter()
            .zip(displacements)
            .map(|(x, u)| {
                let mut x = *x;
                for k in 0..spatial_dim {
                    x[k] += u[k];
                }
                x
            })
            .collect();
        NodalElement::new(element_type, nodes)
    })
}
