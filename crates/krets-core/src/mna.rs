//! Modified Nodal Analysis (MNA) matrix structures.
//!
//! The system `Ax = b` holds one KCL row per non-ground node followed by
//! one constitutive row per branch unknown (voltage sources, inductors).
//! Real matrices serve DC and transient analysis; [`ComplexMna`] is the
//! frequency-domain counterpart used by the AC sweep.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex;

/// Real-valued MNA system.
#[derive(Debug, Clone)]
pub struct MnaSystem {
    matrix: DMatrix<f64>,
    rhs: DVector<f64>,
    num_nodes: usize,
    num_branches: usize,
}

impl MnaSystem {
    /// Create a zeroed system for `num_nodes` node voltages and
    /// `num_branches` branch currents.
    pub fn new(num_nodes: usize, num_branches: usize) -> Self {
        let size = num_nodes + num_branches;
        Self {
            matrix: DMatrix::zeros(size, size),
            rhs: DVector::zeros(size),
            num_nodes,
            num_branches,
        }
    }

    /// Total number of unknowns.
    pub fn size(&self) -> usize {
        self.num_nodes + self.num_branches
    }

    /// Number of node-voltage unknowns.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of branch-current unknowns.
    pub fn num_branches(&self) -> usize {
        self.num_branches
    }

    /// Reset the matrix and RHS to zeros, keeping dimensions.
    pub fn clear(&mut self) {
        self.matrix.fill(0.0);
        self.rhs.fill(0.0);
    }

    /// Absolute column/row of branch unknown `branch_idx`.
    pub fn branch_row(&self, branch_idx: usize) -> usize {
        self.num_nodes + branch_idx
    }

    /// Accumulate into the coefficient matrix.
    pub fn add_element(&mut self, row: usize, col: usize, value: f64) {
        self.matrix[(row, col)] += value;
    }

    /// Accumulate into the right-hand side.
    pub fn add_rhs(&mut self, row: usize, value: f64) {
        self.rhs[row] += value;
    }

    /// Stamp a conductance between two nodes (`None` is ground).
    ///
    /// Adds `g` on both diagonals and `-g` on the off-diagonals.
    pub fn stamp_conductance(&mut self, node_i: Option<usize>, node_j: Option<usize>, g: f64) {
        if let Some(i) = node_i {
            self.matrix[(i, i)] += g;
        }
        if let Some(j) = node_j {
            self.matrix[(j, j)] += g;
        }
        if let (Some(i), Some(j)) = (node_i, node_j) {
            self.matrix[(i, j)] -= g;
            self.matrix[(j, i)] -= g;
        }
    }

    /// Stamp a current source driving `current` from `node_neg` into
    /// `node_pos`.
    pub fn stamp_current_source(
        &mut self,
        node_pos: Option<usize>,
        node_neg: Option<usize>,
        current: f64,
    ) {
        if let Some(p) = node_pos {
            self.rhs[p] += current;
        }
        if let Some(n) = node_neg {
            self.rhs[n] -= current;
        }
    }

    /// Stamp a voltage source `V(pos) - V(neg) = voltage` with its branch
    /// current as unknown `branch_idx`.
    pub fn stamp_voltage_source(
        &mut self,
        node_pos: Option<usize>,
        node_neg: Option<usize>,
        branch_idx: usize,
        voltage: f64,
    ) {
        let row = self.branch_row(branch_idx);
        if let Some(p) = node_pos {
            self.matrix[(p, row)] += 1.0;
            self.matrix[(row, p)] += 1.0;
        }
        if let Some(n) = node_neg {
            self.matrix[(n, row)] -= 1.0;
            self.matrix[(row, n)] -= 1.0;
        }
        self.rhs[row] += voltage;
    }

    /// The coefficient matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// The right-hand side vector.
    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }
}

/// Complex-valued MNA system for small-signal AC analysis.
///
/// Mirrors [`MnaSystem`] with admittance stamps; the unknown layout is
/// identical so AC results line up column-for-column with the real
/// analyses.
#[derive(Debug, Clone)]
pub struct ComplexMna {
    matrix: DMatrix<Complex<f64>>,
    rhs: DVector<Complex<f64>>,
    num_nodes: usize,
    num_branches: usize,
}

impl ComplexMna {
    /// Create a zeroed complex system.
    pub fn new(num_nodes: usize, num_branches: usize) -> Self {
        let size = num_nodes + num_branches;
        Self {
            matrix: DMatrix::from_element(size, size, Complex::ZERO),
            rhs: DVector::from_element(size, Complex::ZERO),
            num_nodes,
            num_branches,
        }
    }

    /// Total number of unknowns.
    pub fn size(&self) -> usize {
        self.num_nodes + self.num_branches
    }

    /// Number of node-voltage unknowns.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Absolute column/row of branch unknown `branch_idx`.
    pub fn branch_row(&self, branch_idx: usize) -> usize {
        self.num_nodes + branch_idx
    }

    /// Accumulate into the coefficient matrix.
    pub fn add_element(&mut self, row: usize, col: usize, value: Complex<f64>) {
        self.matrix[(row, col)] += value;
    }

    /// Accumulate into the right-hand side.
    pub fn add_rhs(&mut self, row: usize, value: Complex<f64>) {
        self.rhs[row] += value;
    }

    /// Stamp a complex admittance between two nodes.
    pub fn stamp_admittance(
        &mut self,
        node_i: Option<usize>,
        node_j: Option<usize>,
        y: Complex<f64>,
    ) {
        if let Some(i) = node_i {
            self.matrix[(i, i)] += y;
        }
        if let Some(j) = node_j {
            self.matrix[(j, j)] += y;
        }
        if let (Some(i), Some(j)) = (node_i, node_j) {
            self.matrix[(i, j)] -= y;
            self.matrix[(j, i)] -= y;
        }
    }

    /// Stamp a real conductance between two nodes.
    pub fn stamp_conductance(&mut self, node_i: Option<usize>, node_j: Option<usize>, g: f64) {
        self.stamp_admittance(node_i, node_j, Complex::new(g, 0.0));
    }

    /// Stamp a voltage source `V(pos) - V(neg) = voltage`.
    pub fn stamp_voltage_source(
        &mut self,
        node_pos: Option<usize>,
        node_neg: Option<usize>,
        branch_idx: usize,
        voltage: Complex<f64>,
    ) {
        let row = self.branch_row(branch_idx);
        let one = Complex::new(1.0, 0.0);
        if let Some(p) = node_pos {
            self.matrix[(p, row)] += one;
            self.matrix[(row, p)] += one;
        }
        if let Some(n) = node_neg {
            self.matrix[(n, row)] -= one;
            self.matrix[(row, n)] -= one;
        }
        self.rhs[row] += voltage;
    }

    /// Stamp an inductor branch: `V(pos) - V(neg) - jωL·i = 0`.
    pub fn stamp_inductor(
        &mut self,
        node_pos: Option<usize>,
        node_neg: Option<usize>,
        branch_idx: usize,
        omega: f64,
        inductance: f64,
    ) {
        let row = self.branch_row(branch_idx);
        let one = Complex::new(1.0, 0.0);
        if let Some(p) = node_pos {
            self.matrix[(p, row)] += one;
            self.matrix[(row, p)] += one;
        }
        if let Some(n) = node_neg {
            self.matrix[(n, row)] -= one;
            self.matrix[(row, n)] -= one;
        }
        self.matrix[(row, row)] -= Complex::new(0.0, omega * inductance);
    }

    /// The coefficient matrix.
    pub fn matrix(&self) -> &DMatrix<Complex<f64>> {
        &self.matrix
    }

    /// The right-hand side vector.
    pub fn rhs(&self) -> &DVector<Complex<f64>> {
        &self.rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_system_dimensions() {
        let sys = MnaSystem::new(3, 2);
        assert_eq!(sys.size(), 5);
        assert_eq!(sys.num_nodes(), 3);
        assert_eq!(sys.branch_row(1), 4);
    }

    #[test]
    fn conductance_stamp() {
        let mut sys = MnaSystem::new(2, 0);
        sys.stamp_conductance(Some(0), Some(1), 1.0 / 500.0);

        assert_eq!(sys.matrix()[(0, 0)], 2e-3);
        assert_eq!(sys.matrix()[(1, 1)], 2e-3);
        assert_eq!(sys.matrix()[(0, 1)], -2e-3);
        assert_eq!(sys.matrix()[(1, 0)], -2e-3);
    }

    #[test]
    fn conductance_stamp_to_ground() {
        let mut sys = MnaSystem::new(2, 0);
        sys.stamp_conductance(Some(0), None, 1.0);

        assert_eq!(sys.matrix()[(0, 0)], 1.0);
        assert_eq!(sys.matrix()[(1, 1)], 0.0);
    }

    #[test]
    fn current_source_stamp() {
        let mut sys = MnaSystem::new(2, 0);
        sys.stamp_current_source(Some(0), None, 1e-3);

        assert_eq!(sys.rhs()[0], 1e-3);
        assert_eq!(sys.rhs()[1], 0.0);
    }

    #[test]
    fn voltage_source_stamp() {
        let mut sys = MnaSystem::new(2, 1);
        sys.stamp_voltage_source(Some(0), None, 0, 5.0);

        assert_eq!(sys.matrix()[(0, 2)], 1.0);
        assert_eq!(sys.matrix()[(2, 0)], 1.0);
        assert_eq!(sys.rhs()[2], 5.0);
    }

    #[test]
    fn complex_admittance_stamp() {
        let mut sys = ComplexMna::new(2, 0);
        let y = Complex::new(0.0, 1e-3);
        sys.stamp_admittance(Some(0), Some(1), y);

        assert_eq!(sys.matrix()[(0, 0)], y);
        assert_eq!(sys.matrix()[(0, 1)], -y);
    }

    #[test]
    fn complex_inductor_stamp() {
        let mut sys = ComplexMna::new(1, 1);
        sys.stamp_inductor(Some(0), None, 0, 2.0, 3.0);

        assert_eq!(sys.matrix()[(0, 1)], Complex::new(1.0, 0.0));
        assert_eq!(sys.matrix()[(1, 0)], Complex::new(1.0, 0.0));
        assert_eq!(sys.matrix()[(1, 1)], Complex::new(0.0, -6.0));
    }
}
