//! Quadrature rules for the unit triangle and the unit tetrahedron.
//!
//! Low strengths use the classical symmetric rules. Everything else is obtained by
//! collapsing a tensor product rule on `[-1, 1]^d` onto the simplex (the Duffy
//! transformation), which gives rules of arbitrary strength with positive weights.

use crate::univariate::{gauss, midpoint};
use crate::Rule;

/// Collapses a tensor product of the rules `u` (fastest) and `v` onto the unit triangle.
///
/// The map is `xi = (1 + u)(1 - v) / 4`, `eta = (1 + v) / 2`, with Jacobian `(1 - v) / 8`.
pub fn collapsed_triangle(u: &Rule<1>, v: &Rule<1>) -> Rule<2> {
    let (u_weights, u_points) = u;
    let (v_weights, v_points) = v;
    let capacity = u_weights.len() * v_weights.len();
    let mut weights = Vec::with_capacity(capacity);
    let mut points = Vec::with_capacity(capacity);

    for (&wv, &[v]) in v_weights.iter().zip(v_points) {
        for (&wu, &[u]) in u_weights.iter().zip(u_points) {
            let xi = 0.25 * (1.0 + u) * (1.0 - v);
            let eta = 0.5 * (1.0 + v);
            weights.push(wu * wv * (1.0 - v) / 8.0);
            points.push([xi, eta]);
        }
    }

    (weights, points)
}

/// Collapses a tensor product of the rules `u` (fastest), `v` and `w` onto the unit
/// tetrahedron.
///
/// The map is `xi = (1 + u)(1 - v)(1 - w) / 8`, `eta = (1 + v)(1 - w) / 4`,
/// `zeta = (1 + w) / 2`, with Jacobian `(1 - v)(1 - w)^2 / 64`.
pub fn collapsed_tetrahedron(u: &Rule<1>, v: &Rule<1>, w: &Rule<1>) -> Rule<3> {
    let (u_weights, u_points) = u;
    let (v_weights, v_points) = v;
    let (w_weights, w_points) = w;
    let capacity = u_weights.len() * v_weights.len() * w_weights.len();
    let mut weights = Vec::with_capacity(capacity);
    let mut points = Vec::with_capacity(capacity);

    for (&ww, &[w]) in w_weights.iter().zip(w_points) {
        for (&wv, &[v]) in v_weights.iter().zip(v_points) {
            for (&wu, &[u]) in u_weights.iter().zip(u_points) {
                let xi = 0.125 * (1.0 + u) * (1.0 - v) * (1.0 - w);
                let eta = 0.25 * (1.0 + v) * (1.0 - w);
                let zeta = 0.5 * (1.0 + w);
                weights.push(wu * wv * ww * (1.0 - v) * (1.0 - w) * (1.0 - w) / 64.0);
                points.push([xi, eta, zeta]);
            }
        }
    }

    (weights, points)
}

/// The collapsed midpoint rule on the unit triangle, with `n` points along each collapsed axis.
///
/// The collapse Jacobian is linear in `v`, so the weights sum to the area of the triangle.
pub fn triangle_grid(n: usize) -> Rule<2> {
    collapsed_triangle(&midpoint(n), &midpoint(n))
}

/// The collapsed midpoint rule on the unit tetrahedron, with `n` points along each collapsed
/// axis.
///
/// The collapse Jacobian is quadratic in `w`, which the midpoint rule underintegrates, so the
/// weights are rescaled to sum to the volume `1/6`. Only constants are integrated exactly.
pub fn tetrahedron_grid(n: usize) -> Rule<3> {
    let (mut weights, points) = collapsed_tetrahedron(&midpoint(n), &midpoint(n), &midpoint(n));
    let total: f64 = weights.iter().sum();
    let scale = (1.0 / 6.0) / total;
    for w in &mut weights {
        *w *= scale;
    }
    (weights, points)
}

/// A Gauss-type rule on the unit triangle exact for polynomials of total degree `strength`.
pub fn triangle_gauss(strength: usize) -> Rule<2> {
    match strength {
        0 | 1 => (vec![0.5], vec![[1.0 / 3.0, 1.0 / 3.0]]),
        2 => {
            let a = 1.0 / 6.0;
            let b = 2.0 / 3.0;
            (vec![1.0 / 6.0; 3], vec![[a, a], [b, a], [a, b]])
        }
        // The collapsed integrand gains one degree in v
        _ => collapsed_triangle(&gauss(strength / 2 + 1), &gauss((strength + 1) / 2 + 1)),
    }
}

/// A Gauss-type rule on the unit tetrahedron exact for polynomials of total degree
/// `strength`.
pub fn tetrahedron_gauss(strength: usize) -> Rule<3> {
    match strength {
        0 | 1 => (vec![1.0 / 6.0], vec![[0.25, 0.25, 0.25]]),
        2 => {
            let sqrt5 = 5.0f64.sqrt();
            let a = (5.0 - sqrt5) / 20.0;
            let b = (5.0 + 3.0 * sqrt5) / 20.0;
            (vec![1.0 / 24.0; 4], vec![[a, a, a], [b, a, a], [a, b, a], [a, a, b]])
        }
        // The collapsed integrand gains one degree in v and two in w
        _ => collapsed_tetrahedron(
            &gauss(strength / 2 + 1),
            &gauss((strength + 1) / 2 + 1),
            &gauss((strength + 2) / 2 + 1),
        ),
    }
}
