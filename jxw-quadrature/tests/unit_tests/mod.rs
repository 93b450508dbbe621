
/// Exact integral of `x^alpha` over [-1, 1].
pub fn monomial_integral_1d(alpha: i32) -> f64 {
    (1.0 - (-1.0f64).powi(alpha + 1)) / (alpha as f64 + 1.0)
}

pub fn factorial(n: i32) -> f64 {
    (1..=n).map(f64::from).product()
}
