//! Independent voltage source.

use krets_core::mna::{ComplexMna, MnaSystem};
use krets_core::NodeId;
use num_complex::Complex;

/// An independent voltage source enforcing `V(pos) - V(neg) = value`.
///
/// Introduces one branch-current unknown. In the AC sweep the DC value
/// doubles as the stimulus amplitude, so transfer functions read
/// directly as `V(probe)/value`.
#[derive(Debug, Clone)]
pub struct VoltageSource {
    /// Positive terminal node.
    pub node_pos: NodeId,
    /// Negative terminal node.
    pub node_neg: NodeId,
    /// Source voltage in volts.
    pub value: f64,
    /// Branch-current column, assigned at build.
    pub(crate) branch: Option<usize>,
}

impl VoltageSource {
    /// Create a new voltage source.
    pub fn new(node_pos: NodeId, node_neg: NodeId, value: f64) -> Self {
        Self {
            node_pos,
            node_neg,
            value,
            branch: None,
        }
    }

    /// The branch-current column of this source.
    pub fn branch_index(&self) -> Option<usize> {
        self.branch
    }

    pub(crate) fn stamp(&self, mna: &mut MnaSystem) {
        mna.stamp_voltage_source(
            self.node_pos.matrix_index(),
            self.node_neg.matrix_index(),
            self.branch.expect("source branch index assigned at build"),
            self.value,
        );
    }

    pub(crate) fn stamp_ac(&self, mna: &mut ComplexMna) {
        mna.stamp_voltage_source(
            self.node_pos.matrix_index(),
            self.node_neg.matrix_index(),
            self.branch.expect("source branch index assigned at build"),
            Complex::new(self.value, 0.0),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_shape() {
        let mut vs = VoltageSource::new(NodeId::new(1), NodeId::GROUND, 2.5);
        vs.branch = Some(0);

        let mut mna = MnaSystem::new(1, 1);
        vs.stamp(&mut mna);

        assert_eq!(mna.matrix()[(0, 1)], 1.0);
        assert_eq!(mna.matrix()[(1, 0)], 1.0);
        assert_eq!(mna.rhs()[1], 2.5);
    }
}
