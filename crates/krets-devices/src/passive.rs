//! Passive device models: Resistor, Capacitor, Inductor.
//!
//! Reactive elements carry their backward-Euler companion state
//! (`v_prev`, `i_prev`) across transient steps; the stamps they produce
//! depend on the [`AnalysisMode`](crate::AnalysisMode) selected by the
//! equation builder.

use krets_core::mna::{ComplexMna, MnaSystem};
use krets_core::NodeId;

use crate::error::{Error, Result};

/// A resistor.
#[derive(Debug, Clone)]
pub struct Resistor {
    /// Positive terminal node.
    pub node_pos: NodeId,
    /// Negative terminal node.
    pub node_neg: NodeId,
    /// Resistance in ohms.
    pub resistance: f64,
}

impl Resistor {
    /// Create a new resistor. The resistance must be positive.
    pub fn new(node_pos: NodeId, node_neg: NodeId, resistance: f64) -> Result<Self> {
        if resistance <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "resistance must be positive, got {resistance}"
            )));
        }
        Ok(Self {
            node_pos,
            node_neg,
            resistance,
        })
    }

    /// Conductance (1/R).
    pub fn conductance(&self) -> f64 {
        1.0 / self.resistance
    }

    pub(crate) fn stamp(&self, mna: &mut MnaSystem) {
        mna.stamp_conductance(
            self.node_pos.matrix_index(),
            self.node_neg.matrix_index(),
            self.conductance(),
        );
    }

    pub(crate) fn stamp_ac(&self, mna: &mut ComplexMna) {
        mna.stamp_conductance(
            self.node_pos.matrix_index(),
            self.node_neg.matrix_index(),
            self.conductance(),
        );
    }
}

/// A capacitor with optional initial conditions.
///
/// Open in DC. In transient analysis it becomes its backward-Euler
/// Norton companion: `G_eq = C/h` in parallel with `I_eq = G_eq·V_prev`.
/// The capacitor introduces no persistent unknown; its branch column is
/// used only by the initial-conditions solve that pins `V = v0` at the
/// start of a transient run.
#[derive(Debug, Clone)]
pub struct Capacitor {
    /// Positive terminal node.
    pub node_pos: NodeId,
    /// Negative terminal node.
    pub node_neg: NodeId,
    /// Capacitance in farads.
    pub capacitance: f64,
    /// Initial voltage across the device.
    pub v0: f64,
    /// Initial current through the device.
    pub i0: f64,
    /// Voltage at the previously accepted step.
    pub(crate) v_prev: f64,
    /// Current at the previously accepted step.
    pub(crate) i_prev: f64,
    /// Branch column used by the initial-conditions solve.
    pub(crate) start_branch: Option<usize>,
}

impl Capacitor {
    /// Create a new capacitor. The capacitance must be positive.
    pub fn new(node_pos: NodeId, node_neg: NodeId, capacitance: f64, v0: f64, i0: f64) -> Result<Self> {
        if capacitance <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "capacitance must be positive, got {capacitance}"
            )));
        }
        Ok(Self {
            node_pos,
            node_neg,
            capacitance,
            v0,
            i0,
            v_prev: v0,
            i_prev: i0,
            start_branch: None,
        })
    }

    /// Current through the device at the last accepted solution.
    pub fn current(&self) -> f64 {
        self.i_prev
    }

    /// Reset companion state to the initial conditions.
    pub(crate) fn reset_state(&mut self) {
        self.v_prev = self.v0;
        self.i_prev = self.i0;
    }

    /// Stamp the backward-Euler companion for a step of size `h`.
    pub(crate) fn stamp_companion(&self, mna: &mut MnaSystem, h: f64) {
        let geq = self.capacitance / h;
        let ieq = geq * self.v_prev;
        let pos = self.node_pos.matrix_index();
        let neg = self.node_neg.matrix_index();
        mna.stamp_conductance(pos, neg, geq);
        mna.stamp_current_source(pos, neg, ieq);
    }

    /// Stamp the initial-conditions constraint `V(pos) - V(neg) = v_prev`
    /// using the temporary branch column.
    pub(crate) fn stamp_start(&self, mna: &mut MnaSystem) {
        let branch = self
            .start_branch
            .expect("capacitor branch index assigned at build");
        mna.stamp_voltage_source(
            self.node_pos.matrix_index(),
            self.node_neg.matrix_index(),
            branch,
            self.v_prev,
        );
    }

    pub(crate) fn stamp_ac(&self, mna: &mut ComplexMna, omega: f64) {
        let y = num_complex::Complex::new(0.0, omega * self.capacitance);
        mna.stamp_admittance(
            self.node_pos.matrix_index(),
            self.node_neg.matrix_index(),
            y,
        );
    }

    /// Accept a solved step: derive the new current from the voltage
    /// change, then roll the voltage forward.
    pub(crate) fn update_after_step(&mut self, v_new: f64, h: f64) {
        self.i_prev = self.capacitance / h * (v_new - self.v_prev);
        self.v_prev = v_new;
    }
}

/// An inductor with optional initial conditions.
///
/// The inductor always owns a branch-current unknown. Its constitutive
/// row depends on the analysis: a short (`V = 0`) in DC, the
/// backward-Euler relation `i = I_prev + (h/L)·V` in transient, and the
/// impedance `V = jωL·i` in AC.
#[derive(Debug, Clone)]
pub struct Inductor {
    /// Positive terminal node.
    pub node_pos: NodeId,
    /// Negative terminal node.
    pub node_neg: NodeId,
    /// Inductance in henries.
    pub inductance: f64,
    /// Initial voltage across the device (accepted, unused by the
    /// backward-Euler companion).
    pub v0: f64,
    /// Initial current through the device.
    pub i0: f64,
    /// Current at the previously accepted step.
    pub(crate) i_prev: f64,
    /// Branch-current column, assigned at build.
    pub(crate) branch: Option<usize>,
}

impl Inductor {
    /// Create a new inductor. The inductance must be positive.
    pub fn new(node_pos: NodeId, node_neg: NodeId, inductance: f64, v0: f64, i0: f64) -> Result<Self> {
        if inductance <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "inductance must be positive, got {inductance}"
            )));
        }
        Ok(Self {
            node_pos,
            node_neg,
            inductance,
            v0,
            i0,
            i_prev: i0,
            branch: None,
        })
    }

    /// The branch-current column of this inductor.
    pub fn branch_index(&self) -> Option<usize> {
        self.branch
    }

    pub(crate) fn reset_state(&mut self) {
        self.i_prev = self.i0;
    }

    fn stamp_kcl(&self, mna: &mut MnaSystem, row: usize) {
        if let Some(p) = self.node_pos.matrix_index() {
            mna.add_element(p, row, 1.0);
        }
        if let Some(n) = self.node_neg.matrix_index() {
            mna.add_element(n, row, -1.0);
        }
    }

    /// Stamp the DC short: `V(pos) - V(neg) = 0`.
    pub(crate) fn stamp_dc(&self, mna: &mut MnaSystem) {
        let row = mna.branch_row(self.branch.expect("inductor branch index assigned at build"));
        self.stamp_kcl(mna, row);
        if let Some(p) = self.node_pos.matrix_index() {
            mna.add_element(row, p, 1.0);
        }
        if let Some(n) = self.node_neg.matrix_index() {
            mna.add_element(row, n, -1.0);
        }
    }

    /// Stamp the initial-conditions constraint `i = i_prev`.
    pub(crate) fn stamp_start(&self, mna: &mut MnaSystem) {
        let row = mna.branch_row(self.branch.expect("inductor branch index assigned at build"));
        self.stamp_kcl(mna, row);
        mna.add_element(row, row, 1.0);
        mna.add_rhs(row, self.i_prev);
    }

    /// Stamp the backward-Euler relation for a step of size `h`:
    /// `i - (h/L)·(V(pos) - V(neg)) = I_prev`.
    pub(crate) fn stamp_companion(&self, mna: &mut MnaSystem, h: f64) {
        let row = mna.branch_row(self.branch.expect("inductor branch index assigned at build"));
        let g = h / self.inductance;
        self.stamp_kcl(mna, row);
        if let Some(p) = self.node_pos.matrix_index() {
            mna.add_element(row, p, -g);
        }
        if let Some(n) = self.node_neg.matrix_index() {
            mna.add_element(row, n, g);
        }
        mna.add_element(row, row, 1.0);
        mna.add_rhs(row, self.i_prev);
    }

    pub(crate) fn stamp_ac(&self, mna: &mut ComplexMna, omega: f64) {
        mna.stamp_inductor(
            self.node_pos.matrix_index(),
            self.node_neg.matrix_index(),
            self.branch.expect("inductor branch index assigned at build"),
            omega,
            self.inductance,
        );
    }

    /// Accept a solved step: read the branch current back.
    pub(crate) fn update_after_step(&mut self, branch_current: f64) {
        self.i_prev = branch_current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resistor_stamp() {
        let r = Resistor::new(NodeId::new(1), NodeId::GROUND, 500.0).unwrap();
        let mut mna = MnaSystem::new(1, 0);
        r.stamp(&mut mna);
        assert!((mna.matrix()[(0, 0)] - 2e-3).abs() < 1e-15);
    }

    #[test]
    fn resistor_rejects_nonpositive_value() {
        assert!(Resistor::new(NodeId::new(1), NodeId::GROUND, 0.0).is_err());
        assert!(Resistor::new(NodeId::new(1), NodeId::GROUND, -10.0).is_err());
    }

    #[test]
    fn capacitor_companion_stamp() {
        let mut c = Capacitor::new(NodeId::new(1), NodeId::GROUND, 1e-6, 2.5, 0.0).unwrap();
        c.reset_state();

        let mut mna = MnaSystem::new(1, 0);
        c.stamp_companion(&mut mna, 1e-6);

        // Geq = C/h = 1, Ieq = Geq * v_prev = 2.5
        assert!((mna.matrix()[(0, 0)] - 1.0).abs() < 1e-12);
        assert!((mna.rhs()[0] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn capacitor_update_tracks_current() {
        let mut c = Capacitor::new(NodeId::new(1), NodeId::GROUND, 2e-6, 0.0, 0.0).unwrap();
        c.update_after_step(1.0, 1e-3);
        // i = C/h * dv = 2e-6/1e-3 * 1.0
        assert!((c.current() - 2e-3).abs() < 1e-12);
        assert!((c.v_prev - 1.0).abs() < 1e-15);
    }

    #[test]
    fn inductor_dc_is_a_short() {
        let mut l = Inductor::new(NodeId::new(1), NodeId::new(2), 1e-3, 0.0, 0.0).unwrap();
        l.branch = Some(0);

        let mut mna = MnaSystem::new(2, 1);
        l.stamp_dc(&mut mna);

        // Branch row enforces V(1) - V(2) = 0.
        assert_eq!(mna.matrix()[(2, 0)], 1.0);
        assert_eq!(mna.matrix()[(2, 1)], -1.0);
        assert_eq!(mna.rhs()[2], 0.0);
        // KCL coupling.
        assert_eq!(mna.matrix()[(0, 2)], 1.0);
        assert_eq!(mna.matrix()[(1, 2)], -1.0);
    }

    #[test]
    fn inductor_companion_row() {
        let mut l = Inductor::new(NodeId::new(1), NodeId::GROUND, 0.5, 0.0, 0.25).unwrap();
        l.branch = Some(0);
        l.reset_state();

        let mut mna = MnaSystem::new(1, 1);
        l.stamp_companion(&mut mna, 1e-3);

        // i - (h/L) V = i_prev with h/L = 2e-3
        assert!((mna.matrix()[(1, 0)] + 2e-3).abs() < 1e-15);
        assert_eq!(mna.matrix()[(1, 1)], 1.0);
        assert!((mna.rhs()[1] - 0.25).abs() < 1e-15);
    }
}
