//! Dense linear system solver.

use nalgebra::{ComplexField, DMatrix, DVector};

use crate::error::{Error, Result};

/// Relative pivot threshold: a factorization whose smallest pivot falls
/// below `PIVOT_EPS * ‖A‖∞` is treated as singular.
const PIVOT_EPS: f64 = 1e-14;

/// Solve `Ax = b` by LU decomposition with partial pivoting.
///
/// One implementation serves both scalar types the engine needs: `f64`
/// for DC and transient systems, `Complex<f64>` for the AC sweep.
pub fn solve_dense<T>(a: &DMatrix<T>, b: &DVector<T>) -> Result<DVector<T>>
where
    T: ComplexField<RealField = f64>,
{
    if a.nrows() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if a.nrows() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }

    let inf_norm = a
        .row_iter()
        .map(|row| row.iter().map(|v| v.clone().modulus()).sum::<f64>())
        .fold(0.0_f64, f64::max);

    let lu = a.clone().lu();

    if a.nrows() > 0 {
        let min_pivot = lu
            .u()
            .diagonal()
            .iter()
            .map(|v| v.clone().modulus())
            .fold(f64::INFINITY, f64::min);
        if min_pivot <= PIVOT_EPS * inf_norm || min_pivot == 0.0 {
            return Err(Error::SingularMatrix);
        }
    }

    lu.solve(b).ok_or(Error::SingularMatrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{dmatrix, dvector};
    use num_complex::Complex;

    #[test]
    fn solves_small_real_system() {
        // 2x + y = 5, x + 3y = 6
        let a = dmatrix![2.0, 1.0; 1.0, 3.0];
        let b = dvector![5.0, 6.0];

        let x = solve_dense(&a, &b).unwrap();

        assert!((x[0] - 1.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn solves_complex_system() {
        // (1+j)x = 2  ->  x = 1-j
        let a = DMatrix::from_element(1, 1, Complex::new(1.0, 1.0));
        let b = DVector::from_element(1, Complex::new(2.0, 0.0));

        let x = solve_dense(&a, &b).unwrap();

        assert!((x[0] - Complex::new(1.0, -1.0)).norm() < 1e-12);
    }

    #[test]
    fn rejects_singular_matrix() {
        let a = dmatrix![1.0, 2.0; 2.0, 4.0];
        let b = dvector![1.0, 2.0];

        assert!(matches!(solve_dense(&a, &b), Err(Error::SingularMatrix)));
    }

    #[test]
    fn rejects_near_singular_matrix() {
        // Second row is the first plus noise far below the pivot floor.
        let a = dmatrix![1.0, 2.0; 1.0, 2.0 + 1e-16];
        let b = dvector![1.0, 1.0];

        assert!(matches!(solve_dense(&a, &b), Err(Error::SingularMatrix)));
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let a = dmatrix![1.0, 2.0; 3.0, 4.0];
        let b = dvector![1.0, 2.0, 3.0];

        assert!(matches!(
            solve_dense(&a, &b),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn empty_system_is_trivial() {
        let a = DMatrix::<f64>::zeros(0, 0);
        let b = DVector::<f64>::zeros(0);

        assert_eq!(solve_dense(&a, &b).unwrap().len(), 0);
    }
}
