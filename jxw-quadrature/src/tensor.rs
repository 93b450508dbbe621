//! 2D and 3D quadrature rules formed by tensor products of 1D rules.
//!
//! The first coordinate varies fastest. For a 2D rule built from an `n`-point rule with
//! points `p`, point `q = j * n + i` is `(p[i], p[j])`, which is the layout the
//! tensor-product Jacobian kernels rely on.

use crate::univariate::gauss;
use crate::Rule;

/// Tensor product of a 1D rule with itself on the reference quadrilateral.
pub fn quadrilateral_tensor_product(rule1d: &Rule<1>) -> Rule<2> {
    let (weights1d, points1d) = rule1d;
    let n = weights1d.len();
    let mut weights2d = Vec::with_capacity(n * n);
    let mut points2d = Vec::with_capacity(n * n);

    let rule1d_iter = || weights1d.iter().zip(points1d);

    for (&wy, &[y]) in rule1d_iter() {
        for (&wx, &[x]) in rule1d_iter() {
            weights2d.push(wx * wy);
            points2d.push([x, y]);
        }
    }

    (weights2d, points2d)
}

/// Tensor product of a 1D rule with itself on the reference hexahedron.
pub fn hexahedron_tensor_product(rule1d: &Rule<1>) -> Rule<3> {
    let (weights1d, points1d) = rule1d;
    let n = weights1d.len();
    let mut weights3d = Vec::with_capacity(n * n * n);
    let mut points3d = Vec::with_capacity(n * n * n);

    let rule1d_iter = || weights1d.iter().zip(points1d);

    for (&wz, &[z]) in rule1d_iter() {
        for (&wy, &[y]) in rule1d_iter() {
            for (&wx, &[x]) in rule1d_iter() {
                weights3d.push(wx * wy * wz);
                points3d.push([x, y, z]);
            }
        }
    }

    (weights3d, points3d)
}

/// A Gauss quadrature rule for the reference quadrilateral.
///
/// The rule is constructed as a tensor product from 1D rules, with the provided number of
/// points per dimension.
pub fn quadrilateral_gauss(num_points_per_dim: usize) -> Rule<2> {
    quadrilateral_tensor_product(&gauss(num_points_per_dim))
}

/// A Gauss quadrature rule for the reference hexahedron.
///
/// The rule is constructed as a tensor product from 1D rules, with the provided number of
/// points per dimension.
pub fn hexahedron_gauss(num_points_per_dim: usize) -> Rule<3> {
    hexahedron_tensor_product(&gauss(num_points_per_dim))
}
