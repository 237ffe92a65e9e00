//! Newton-Raphson nonlinear solver.

use krets_core::mna::MnaSystem;
use nalgebra::DVector;

use crate::error::{Error, Result};
use crate::linear::solve_dense;

/// Convergence criteria for Newton-Raphson iteration.
#[derive(Debug, Clone)]
pub struct ConvergenceCriteria {
    /// Absolute tolerance on the solution update.
    pub abstol: f64,
    /// Relative tolerance on the solution update.
    pub reltol: f64,
    /// Maximum iterations before giving up.
    pub max_iterations: usize,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            abstol: 1e-9,
            reltol: 1e-6,
            max_iterations: 100,
        }
    }
}

/// Callback for stamping the circuit at each iteration point.
///
/// Given the current solution guess, the implementation stamps every
/// device, linearizing nonlinear ones about the guess.
pub trait NonlinearStamper {
    /// Stamp the full system for the given solution guess.
    fn stamp_at(&self, mna: &mut MnaSystem, solution: &DVector<f64>);
}

/// Result of a converged Newton-Raphson run.
#[derive(Debug, Clone)]
pub struct NrResult {
    /// Converged solution vector.
    pub solution: DVector<f64>,
    /// Number of iterations performed.
    pub iterations: usize,
}

/// Solve a nonlinear system by Newton-Raphson iteration.
///
/// Each pass stamps the linearization at the current guess, solves it,
/// and accepts the result when
/// `‖x_{k+1} − x_k‖∞ ≤ abstol + reltol · ‖x_{k+1}‖∞`.
/// Exceeding `max_iterations` is an error; the caller keeps whatever
/// state it had before the call.
pub fn solve_newton_raphson(
    num_nodes: usize,
    num_branches: usize,
    stamper: &dyn NonlinearStamper,
    criteria: &ConvergenceCriteria,
    initial_guess: Option<&DVector<f64>>,
) -> Result<NrResult> {
    let size = num_nodes + num_branches;
    let mut solution = match initial_guess {
        Some(guess) => guess.clone(),
        None => DVector::zeros(size),
    };

    let mut mna = MnaSystem::new(num_nodes, num_branches);

    for iteration in 0..criteria.max_iterations {
        mna.clear();
        stamper.stamp_at(&mut mna, &solution);

        let next = solve_dense(mna.matrix(), mna.rhs())?;

        let delta = (&next - &solution).amax();
        let tol = criteria.abstol + criteria.reltol * next.amax();
        log::trace!("newton iteration {}: |dx| = {:.3e}", iteration + 1, delta);

        solution = next;

        if delta <= tol {
            log::debug!("newton converged in {} iterations", iteration + 1);
            return Ok(NrResult {
                solution,
                iterations: iteration + 1,
            });
        }
    }

    Err(Error::DidNotConverge {
        iterations: criteria.max_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Series resistor + exponential diode to ground.
    struct DiodeCircuitStamper {
        v_source: f64,
        resistance: f64,
        i0: f64,
        m: f64,
        v0: f64,
    }

    impl NonlinearStamper for DiodeCircuitStamper {
        fn stamp_at(&self, mna: &mut MnaSystem, solution: &DVector<f64>) {
            // node 0: source output, node 1: diode anode
            mna.stamp_voltage_source(Some(0), None, 0, self.v_source);
            mna.stamp_conductance(Some(0), Some(1), 1.0 / self.resistance);

            let vd = solution[1];
            let exponent = (self.m * (vd - self.v0)).min(80.0);
            let id = self.i0 * exponent.exp();
            let gd = (self.m * id).max(1e-12);
            let ieq = id - gd * vd;

            mna.stamp_conductance(Some(1), None, gd);
            mna.stamp_current_source(Some(1), None, -ieq);
        }
    }

    #[test]
    fn diode_circuit_converges() {
        let stamper = DiodeCircuitStamper {
            v_source: 5.0,
            resistance: 0.1,
            i0: 1e-5,
            m: 3.0,
            v0: 0.5,
        };

        let criteria = ConvergenceCriteria::default();
        let result = solve_newton_raphson(2, 1, &stamper, &criteria, None).unwrap();

        assert!(result.iterations < 50);
        assert!((result.solution[0] - 5.0).abs() < 1e-9);
        // Known operating point of this circuit.
        assert!((result.solution[1] - 4.7018).abs() < 1e-3);
    }

    #[test]
    fn linear_system_converges_in_two_iterations() {
        struct Divider;
        impl NonlinearStamper for Divider {
            fn stamp_at(&self, mna: &mut MnaSystem, _solution: &DVector<f64>) {
                mna.stamp_voltage_source(Some(0), None, 0, 10.0);
                mna.stamp_conductance(Some(0), Some(1), 1e-3);
                mna.stamp_conductance(Some(1), None, 1e-3);
            }
        }

        let result =
            solve_newton_raphson(2, 1, &Divider, &ConvergenceCriteria::default(), None).unwrap();
        // First pass lands on the exact answer, second confirms it.
        assert_eq!(result.iterations, 2);
        assert!((result.solution[1] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn exhausted_iterations_is_an_error() {
        // A stamper whose fixed point keeps moving: x = x_prev + 1.
        struct Runaway;
        impl NonlinearStamper for Runaway {
            fn stamp_at(&self, mna: &mut MnaSystem, solution: &DVector<f64>) {
                mna.add_element(0, 0, 1.0);
                mna.add_rhs(0, solution[0] + 1.0);
            }
        }

        let criteria = ConvergenceCriteria {
            max_iterations: 5,
            ..Default::default()
        };
        let result = solve_newton_raphson(1, 0, &Runaway, &criteria, None);
        assert!(matches!(
            result,
            Err(Error::DidNotConverge { iterations: 5 })
        ));
    }
}
