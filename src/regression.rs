//! Ridge-regularized polynomial least squares.
//!
//! The temporal-extrapolation policy fits low-degree polynomials over a
//! handful of points, so the solver works on small dense systems: normal
//! equations with a Tikhonov term, solved by Gaussian elimination with
//! partial pivoting.

use crate::error::{Error, Result};

const PIVOT_EPSILON: f64 = 1e-12;

/// Fit `y ≈ c0 + c1·x + … + c_degree·x^degree`, returning the coefficients
/// in ascending-power order.
///
/// `regularization` is the L2 penalty weight added to the normal-equation
/// diagonal; zero gives an ordinary least-squares fit.
///
/// # Errors
///
/// Returns [`Error::DegenerateRegression`] when the (regularized) normal
/// equations are singular, e.g. an unregularized fit through too few
/// distinct inputs.
pub fn polynomial_regression(
    inputs: &[f64],
    outputs: &[f64],
    degree: usize,
    regularization: f64,
) -> Result<Vec<f64>> {
    assert_eq!(
        inputs.len(),
        outputs.len(),
        "regression inputs and outputs must pair up"
    );
    let unknowns = degree + 1;

    // phi^T phi and phi^T y accumulated directly, without materializing phi.
    let mut lhs = vec![vec![0.0; unknowns]; unknowns];
    let mut rhs = vec![0.0; unknowns];
    for (&x, &y) in inputs.iter().zip(outputs) {
        let mut powers = Vec::with_capacity(2 * unknowns - 1);
        let mut value = 1.0;
        for _ in 0..(2 * unknowns - 1) {
            powers.push(value);
            value *= x;
        }
        for row in 0..unknowns {
            for column in 0..unknowns {
                lhs[row][column] += powers[row + column];
            }
            rhs[row] += y * powers[row];
        }
    }
    for (row, entry) in lhs.iter_mut().enumerate() {
        entry[row] += regularization;
    }

    solve(lhs, rhs).ok_or(Error::DegenerateRegression { degree })
}

/// Evaluate a polynomial given in ascending-power order.
pub fn predict(coefficients: &[f64], x: f64) -> f64 {
    coefficients
        .iter()
        .rev()
        .fold(0.0, |value, &coefficient| value * x + coefficient)
}

/// Gaussian elimination with partial pivoting; `None` on a singular system.
fn solve(mut lhs: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    let n = rhs.len();
    for column in 0..n {
        let pivot_row = (column..n)
            .max_by(|&a, &b| {
                lhs[a][column]
                    .abs()
                    .partial_cmp(&lhs[b][column].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("non-empty pivot search");
        if lhs[pivot_row][column].abs() < PIVOT_EPSILON {
            return None;
        }
        lhs.swap(column, pivot_row);
        rhs.swap(column, pivot_row);
        for row in (column + 1)..n {
            let factor = lhs[row][column] / lhs[column][column];
            for k in column..n {
                lhs[row][k] -= factor * lhs[column][k];
            }
            rhs[row] -= factor * rhs[column];
        }
    }
    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let mut value = rhs[row];
        for column in (row + 1)..n {
            value -= lhs[row][column] * solution[column];
        }
        solution[row] = value / lhs[row][row];
    }
    Some(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_an_exact_line() {
        let coefficients =
            polynomial_regression(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0], 1, 0.0).unwrap();
        assert!((coefficients[0] - 1.0).abs() < 1e-9);
        assert!((coefficients[1] - 2.0).abs() < 1e-9);
        assert!((predict(&coefficients, 3.0) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn constant_data_predicts_the_constant_at_zero() {
        let inputs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let outputs = [3.0; 5];
        for degree in 0..=2 {
            let coefficients = polynomial_regression(&inputs, &outputs, degree, 0.0).unwrap();
            assert!(
                (predict(&coefficients, 0.0) - 3.0).abs() < 1e-8,
                "degree {degree}"
            );
        }
    }

    #[test]
    fn fits_an_exact_quadratic() {
        let inputs: Vec<f64> = (0..5).map(f64::from).collect();
        let outputs: Vec<f64> = inputs.iter().map(|x| 2.0 * x * x - x + 0.5).collect();
        let coefficients = polynomial_regression(&inputs, &outputs, 2, 0.0).unwrap();
        assert!((coefficients[0] - 0.5).abs() < 1e-8);
        assert!((coefficients[1] + 1.0).abs() < 1e-8);
        assert!((coefficients[2] - 2.0).abs() < 1e-8);
    }

    #[test]
    fn regularization_shrinks_coefficients() {
        let inputs = [0.0, 1.0, 2.0, 3.0];
        let outputs = [0.0, 2.0, 4.0, 6.0];
        let plain = polynomial_regression(&inputs, &outputs, 1, 0.0).unwrap();
        let ridged = polynomial_regression(&inputs, &outputs, 1, 10.0).unwrap();
        assert!(ridged[1].abs() < plain[1].abs());
    }

    #[test]
    fn singular_unregularized_fit_is_reported() {
        // One distinct input cannot pin down a line without regularization.
        let result = polynomial_regression(&[2.0, 2.0], &[1.0, 3.0], 1, 0.0);
        assert!(matches!(result, Err(Error::DegenerateRegression { degree: 1 })));
    }

    #[test]
    fn regularization_rescues_the_singular_case() {
        let coefficients = polynomial_regression(&[2.0, 2.0], &[1.0, 3.0], 1, 0.1).unwrap();
        assert!(coefficients.iter().all(|c| c.is_finite()));
    }
}
