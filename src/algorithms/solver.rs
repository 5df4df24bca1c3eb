use crate::error::SolveError;
use nalgebra::{DMatrix, DVector};

/// Accumulator for the ridge-regularized normal equations of one user.
///
/// Each observed `(item factors v, rating r, item bias b)` adds `v vᵀ` to the
/// Gram matrix and `λ (r - b) v` to the right-hand side. Solving yields the
/// latent user vector `u` of `(λ G + τ I) u = rhs`.
#[derive(Debug, Clone)]
pub struct NormalEquations {
    gram: DMatrix<f64>,
    rhs: DVector<f64>,
    lambda: f64,
    tau: f64,
    observations: usize,
}

impl NormalEquations {
    pub fn new(dimension: usize, lambda: f64, tau: f64) -> Self {
        Self {
            gram: DMatrix::zeros(dimension, dimension),
            rhs: DVector::zeros(dimension),
            lambda,
            tau,
            observations: 0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.rhs.len()
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn accumulate(&mut self, factors: &[f64], rating: f64, bias: f64) {
        debug_assert_eq!(factors.len(), self.dimension());
        let v = DVector::from_column_slice(factors);
        self.gram.ger(1.0, &v, &v, 1.0);
        self.rhs.axpy(self.lambda * (rating - bias), &v, 1.0);
        self.observations += 1;
    }

    /// `λ G + τ I`.
    pub fn system_matrix(&self) -> DMatrix<f64> {
        let k = self.dimension();
        self.gram.scale(self.lambda) + DMatrix::identity(k, k) * self.tau
    }

    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }

    /// Solves by Cholesky factorization; the system is symmetric
    /// positive-definite whenever `τ > 0`.
    pub fn solve(&self) -> Result<DVector<f64>, SolveError> {
        let dimension = self.dimension();
        let cholesky = self
            .system_matrix()
            .cholesky()
            .ok_or(SolveError::NotPositiveDefinite { dimension })?;

        let user_vector = cholesky.solve(&self.rhs);
        if user_vector.iter().all(|x| x.is_finite()) {
            Ok(user_vector)
        } else {
            Err(SolveError::NonFiniteSolution)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_single_rating_closed_form() {
        let mut eq = NormalEquations::new(2, 0.02, 0.02);
        eq.accumulate(&[1.0, 0.0], 5.0, 0.0);

        let a = eq.system_matrix();
        assert_close(a[(0, 0)], 0.04);
        assert_close(a[(0, 1)], 0.0);
        assert_close(a[(1, 0)], 0.0);
        assert_close(a[(1, 1)], 0.02);
        assert_close(eq.rhs()[0], 0.1);
        assert_close(eq.rhs()[1], 0.0);

        let u = eq.solve().unwrap();
        assert_close(u[0], 2.5);
        assert_close(u[1], 0.0);
    }

    #[test]
    fn test_bias_is_subtracted_from_rating() {
        let mut eq = NormalEquations::new(1, 1.0, 1.0);
        eq.accumulate(&[2.0], 4.0, 1.0);
        // (1*4 + 1) u = 1 * (4 - 1) * 2
        let u = eq.solve().unwrap();
        assert_close(u[0], 6.0 / 5.0);
    }

    #[test]
    fn test_solution_satisfies_system() {
        let rows = [
            [0.3, -1.2, 0.7],
            [1.1, 0.4, -0.2],
            [-0.5, 0.9, 1.3],
            [0.0, 0.2, -0.8],
        ];
        let ratings = [4.0, 2.5, 5.0, 1.0];
        let biases = [0.2, -0.1, 0.4, 0.0];

        let mut eq = NormalEquations::new(3, 0.02, 0.02);
        for ((row, r), b) in rows.iter().zip(ratings).zip(biases) {
            eq.accumulate(row, r, b);
        }
        assert_eq!(eq.observations(), 4);

        let a = eq.system_matrix();
        assert_eq!(a, a.transpose());
        assert!(a.clone().cholesky().is_some());

        let u = eq.solve().unwrap();
        let residual = &a * &u - eq.rhs();
        assert!(residual.norm() < 1e-9);
    }

    #[test]
    fn test_positive_definite_for_any_observations_with_tau() {
        // Rank-deficient data: the same direction rated twice in K=3.
        let mut eq = NormalEquations::new(3, 0.02, 1e-6);
        eq.accumulate(&[1.0, 1.0, 0.0], 5.0, 0.0);
        eq.accumulate(&[2.0, 2.0, 0.0], 1.0, 0.0);
        assert!(eq.system_matrix().cholesky().is_some());
        assert!(eq.solve().is_ok());
    }

    #[test]
    fn test_zero_tau_rank_deficient_is_reported() {
        let mut eq = NormalEquations::new(2, 0.02, 0.0);
        eq.accumulate(&[1.0, 0.0], 5.0, 0.0);
        assert_eq!(
            eq.solve().unwrap_err(),
            SolveError::NotPositiveDefinite { dimension: 2 }
        );
    }

    #[test]
    fn test_non_finite_rating_is_reported() {
        let mut eq = NormalEquations::new(2, 0.02, 0.02);
        eq.accumulate(&[1.0, 0.0], f64::INFINITY, 0.0);
        assert!(eq.solve().is_err());
    }
}
