//! Finite difference utilities for derivative verification.
//!
//! Provides numerical Jacobians for testing the AD backends.

/// Compute a Jacobian using central finite differences.
///
/// # Arguments
/// * `f` - Vector function of the input values
/// * `point` - The point at which to differentiate
/// * `eps` - Step size (typically 1e-7 to 1e-5)
///
/// # Returns
/// Row-major Jacobian: `result[i][j]` is d f_i / d x_j at `point`.
///
/// # Example
/// ```
/// use autogen_core::finite_diff_jacobian;
///
/// // f(x, y) = [x^2 + y^2, x * y]
/// let f = |v: &[f64]| vec![v[0] * v[0] + v[1] * v[1], v[0] * v[1]];
/// let jac = finite_diff_jacobian(f, &[3.0, 4.0], 1e-7);
///
/// assert!((jac[0][0] - 6.0).abs() < 1e-5);
/// assert!((jac[0][1] - 8.0).abs() < 1e-5);
/// assert!((jac[1][0] - 4.0).abs() < 1e-5);
/// ```
pub fn finite_diff_jacobian<F>(f: F, point: &[f64], eps: f64) -> Vec<Vec<f64>>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n = point.len();
    let mut columns = Vec::with_capacity(n);
    let mut perturbed = point.to_vec();

    for i in 0..n {
        // Central difference: (f(x + eps) - f(x - eps)) / (2 * eps)
        perturbed[i] = point[i] + eps;
        let f_plus = f(&perturbed);

        perturbed[i] = point[i] - eps;
        let f_minus = f(&perturbed);

        perturbed[i] = point[i]; // restore

        let column: Vec<f64> = f_plus
            .iter()
            .zip(f_minus.iter())
            .map(|(p, m)| (p - m) / (2.0 * eps))
            .collect();
        columns.push(column);
    }

    let m = columns.first().map_or(0, Vec::len);
    (0..m)
        .map(|row| columns.iter().map(|col| col[row]).collect())
        .collect()
}

/// Maximum absolute difference between two Jacobians of equal shape.
pub fn max_abs_error(a: &[Vec<f64>], b: &[Vec<f64>]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .flat_map(|(ra, rb)| {
            assert_eq!(ra.len(), rb.len());
            ra.iter().zip(rb.iter()).map(|(x, y)| (x - y).abs())
        })
        .fold(0.0, f64::max)
}
