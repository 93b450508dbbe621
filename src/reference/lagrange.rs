//! Lagrange basis functions on the supported reference cells.
//!
//! Tensor-product cells build their basis from 1D Lagrange polynomials on `[-1, 1]`,
//! identified by the reference coordinate `alpha` of the node they interpolate.
//! Simplices build theirs from barycentric coordinates.
use crate::element::ElementType;
use crate::nalgebra::{Point3, Vector3};

#[rustfmt::skip]
const EDGE2_NODES: [[f64; 3]; 2] = [
    [-1.0, 0.0, 0.0],
    [ 1.0, 0.0, 0.0],
];

#[rustfmt::skip]
const EDGE3_NODES: [[f64; 3]; 3] = [
    [-1.0, 0.0, 0.0],
    [ 1.0, 0.0, 0.0],
    [ 0.0, 0.0, 0.0],
];

#[rustfmt::skip]
const TRI3_NODES: [[f64; 3]; 3] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
];

#[rustfmt::skip]
const TRI6_NODES: [[f64; 3]; 6] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.5, 0.0, 0.0],
    [0.5, 0.5, 0.0],
    [0.0, 0.5, 0.0],
];

#[rustfmt::skip]
const QUAD4_NODES: [[f64; 3]; 4] = [
    [-1.0, -1.0, 0.0],
    [ 1.0, -1.0, 0.0],
    [ 1.0,  1.0, 0.0],
    [-1.0,  1.0, 0.0],
];

#[rustfmt::skip]
const QUAD9_NODES: [[f64; 3]; 9] = [
    [-1.0, -1.0, 0.0],
    [ 1.0, -1.0, 0.0],
    [ 1.0,  1.0, 0.0],
    [-1.0,  1.0, 0.0],
    [ 0.0, -1.0, 0.0],
    [ 1.0,  0.0, 0.0],
    [ 0.0,  1.0, 0.0],
    [-1.0,  0.0, 0.0],
    [ 0.0,  0.0, 0.0],
];

#[rustfmt::skip]
const TET4_NODES: [[f64; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

#[rustfmt::skip]
const TET10_NODES: [[f64; 3]; 10] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.5, 0.0, 0.0],
    [0.5, 0.5, 0.0],
    [0.0, 0.5, 0.0],
    [0.0, 0.0, 0.5],
    [0.5, 0.0, 0.5],
    [0.0, 0.5, 0.5],
];

#[rustfmt::skip]
const HEX8_NODES: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0],
    [ 1.0,  1.0, -1.0],
    [-1.0,  1.0, -1.0],
    [-1.0, -1.0,  1.0],
    [ 1.0, -1.0,  1.0],
    [ 1.0,  1.0,  1.0],
    [-1.0,  1.0,  1.0],
];

#[rustfmt::skip]
const HEX27_NODES: [[f64; 3]; 27] = [
    // Vertex nodes
    [-1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0],
    [ 1.0,  1.0, -1.0],
    [-1.0,  1.0, -1.0],
    [-1.0, -1.0,  1.0],
    [ 1.0, -1.0,  1.0],
    [ 1.0,  1.0,  1.0],
    [-1.0,  1.0,  1.0],
    // Edge nodes, bottom face, vertical edges, top face
    [ 0.0, -1.0, -1.0],
    [ 1.0,  0.0, -1.0],
    [ 0.0,  1.0, -1.0],
    [-1.0,  0.0, -1.0],
    [-1.0, -1.0,  0.0],
    [ 1.0, -1.0,  0.0],
    [ 1.0,  1.0,  0.0],
    [-1.0,  1.0,  0.0],
    [ 0.0, -1.0,  1.0],
    [ 1.0,  0.0,  1.0],
    [ 0.0,  1.0,  1.0],
    [-1.0,  0.0,  1.0],
    // Face nodes
    [ 0.0,  0.0, -1.0],
    [ 0.0, -1.0,  0.0],
    [ 1.0,  0.0,  0.0],
    [ 0.0,  1.0,  0.0],
    [-1.0,  0.0,  0.0],
    [ 0.0,  0.0,  1.0],
    // Center node
    [ 0.0,  0.0,  0.0],
];

/// Vertex pairs of the edge nodes of quadratic simplices, in node order.
const TRI6_EDGES: [[usize; 2]; 3] = [[0, 1], [1, 2], [2, 0]];
const TET10_EDGES: [[usize; 2]; 6] = [[0, 1], [1, 2], [2, 0], [0, 3], [1, 3], [2, 3]];

pub(crate) fn reference_nodes(element_type: ElementType) -> &'static [[f64; 3]] {
    use ElementType::*;
    match element_type {
        Edge2 => &EDGE2_NODES,
        Edge3 => &EDGE3_NODES,
        Tri3 => &TRI3_NODES,
        Tri6 => &TRI6_NODES,
        Quad4 => &QUAD4_NODES,
        Quad9 => &QUAD9_NODES,
        Tet4 => &TET4_NODES,
        Tet10 => &TET10_NODES,
        Hex8 => &HEX8_NODES,
        Hex27 => &HEX27_NODES,
    }
}

/// Linear basis function on the interval [-1, 1], equal to one at `x == alpha`.
#[inline(always)]
fn phi_linear_1d(alpha: f64, xi: f64) -> f64 {
    (1.0 + alpha * xi) / 2.0
}

#[inline(always)]
fn phi_linear_1d_grad(alpha: f64) -> f64 {
    alpha / 2.0
}

/// Quadratic basis function on the interval [-1, 1].
///
/// `alpha` is the position of the node the function interpolates: `-1`, `0` or `1`.
#[inline(always)]
pub(crate) fn phi_quadratic_1d(alpha: f64, xi: f64) -> f64 {
    let alpha2 = alpha * alpha;
    (1.5 * alpha2 - 1.0) * xi * xi + 0.5 * alpha * xi + 1.0 - alpha2
}

#[inline(always)]
pub(crate) fn phi_quadratic_1d_grad(alpha: f64, xi: f64) -> f64 {
    let alpha2 = alpha * alpha;
    2.0 * (1.5 * alpha2 - 1.0) * xi + 0.5 * alpha
}

fn tensor_basis(element_type: ElementType, node: usize, xi: &Point3<f64>) -> (f64, Vector3<f64>) {
    let dim = element_type.reference_dim();
    let alpha = &reference_nodes(element_type)[node];
    let quadratic = matches!(element_type, ElementType::Edge3 | ElementType::Quad9 | ElementType::Hex27);

    let mut phi = [1.0; 3];
    let mut dphi = [0.0; 3];
    for k in 0..dim {
        if quadratic {
            phi[k] = phi_quadratic_1d(alpha[k], xi[k]);
            dphi[k] = phi_quadratic_1d_grad(alpha[k], xi[k]);
        } else {
            phi[k] = phi_linear_1d(alpha[k], xi[k]);
            dphi[k] = phi_linear_1d_grad(alpha[k]);
        }
    }

    let value = phi.iter().product();
    let mut gradient = Vector3::zeros();
    for k in 0..dim {
        gradient[k] = (0..dim)
            .map(|l| if l == k { dphi[l] } else { phi[l] })
            .product();
    }
    (value, gradient)
}

fn simplex_basis(element_type: ElementType, node: usize, xi: &Point3<f64>) -> (f64, Vector3<f64>) {
    let dim = element_type.reference_dim();

    // Barycentric coordinates and their (constant) gradients
    let mut lambda = [0.0; 4];
    let mut lambda_grad = [Vector3::zeros(); 4];
    lambda[0] = 1.0 - (0..dim).map(|k| xi[k]).sum::<f64>();
    for k in 0..dim {
        lambda[k + 1] = xi[k];
        lambda_grad[0][k] = -1.0;
        lambda_grad[k + 1][k] = 1.0;
    }

    let num_vertices = dim + 1;
    match element_type {
        ElementType::Tri3 | ElementType::Tet4 => (lambda[node], lambda_grad[node]),
        _ if node < num_vertices => {
            let l = lambda[node];
            (l * (2.0 * l - 1.0), lambda_grad[node] * (4.0 * l - 1.0))
        }
        _ => {
            let edges: &[[usize; 2]] = match element_type {
                ElementType::Tri6 => &TRI6_EDGES,
                _ => &TET10_EDGES,
            };
            let [i, j] = edges[node - num_vertices];
            let value = 4.0 * lambda[i] * lambda[j];
            let gradient = lambda_grad[i] * (4.0 * lambda[j]) + lambda_grad[j] * (4.0 * lambda[i]);
            (value, gradient)
        }
    }
}

/// Value and reference gradient of the basis function of `node` at `xi`.
///
/// Gradient components beyond the reference dimension are zero.
pub(crate) fn basis(element_type: ElementType, node: usize, xi: &Point3<f64>) -> (f64, Vector3<f64>) {
    assert!(
        node < element_type.num_nodes(),
        "{} elements have no node {}",
        element_type,
        node
    );
    if element_type.is_simplex() {
        simplex_basis(element_type, node, xi)
    } else {
        tensor_basis(element_type, node, xi)
    }
}
