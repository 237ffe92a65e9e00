//! Exponential diode model.
//!
//! Device equation: `I = i0 · exp(m · (V − v0))` with `V` the voltage
//! from anode to cathode. Nonlinear analyses linearize about the current
//! guess and stamp the resulting Norton pair.

use krets_core::mna::{ComplexMna, MnaSystem};
use krets_core::NodeId;
use nalgebra::DVector;

use crate::error::{Error, Result};

/// Exponent clamp so `exp()` stays finite for wild Newton guesses.
const EXP_LIMIT: f64 = 80.0;

/// Conductance floor; keeps a hard-off diode from producing a singular
/// matrix when it is the only path out of a node.
const GMIN: f64 = 1e-12;

/// An exponential diode.
#[derive(Debug, Clone)]
pub struct Diode {
    /// Anode node.
    pub node_pos: NodeId,
    /// Cathode node.
    pub node_neg: NodeId,
    /// Scale current (A).
    pub i0: f64,
    /// Exponential slope (1/V).
    pub m: f64,
    /// Voltage offset (V).
    pub v0: f64,
}

impl Diode {
    /// Create a new diode. `i0` and `m` must be positive.
    pub fn new(node_pos: NodeId, node_neg: NodeId, i0: f64, m: f64, v0: f64) -> Result<Self> {
        if m <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "diode slope m must be positive, got {m}"
            )));
        }
        if i0 <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "diode scale current i0 must be positive, got {i0}"
            )));
        }
        Ok(Self {
            node_pos,
            node_neg,
            i0,
            m,
            v0,
        })
    }

    /// Evaluate current and conductance at a device voltage.
    ///
    /// Returns `(I, g)` with `g = dI/dV = m·I`, floored at a small
    /// minimum conductance.
    pub fn evaluate(&self, vd: f64) -> (f64, f64) {
        let exponent = (self.m * (vd - self.v0)).min(EXP_LIMIT);
        let id = self.i0 * exponent.exp();
        let gd = (self.m * id).max(GMIN);
        (id, gd)
    }

    /// Device voltage `V(anode) − V(cathode)` read from a solution.
    pub fn voltage_from(&self, solution: &DVector<f64>) -> f64 {
        let vp = self.node_pos.matrix_index().map_or(0.0, |i| solution[i]);
        let vn = self.node_neg.matrix_index().map_or(0.0, |i| solution[i]);
        vp - vn
    }

    /// Stamp the linearization about the guess in `solution`: parallel
    /// conductance `g` plus the current source `I(V*) − g·V*` between the
    /// terminals.
    pub(crate) fn stamp_linearized(&self, mna: &mut MnaSystem, solution: &DVector<f64>) {
        let vd = self.voltage_from(solution);
        let (id, gd) = self.evaluate(vd);
        let ieq = id - gd * vd;

        let pos = self.node_pos.matrix_index();
        let neg = self.node_neg.matrix_index();
        mna.stamp_conductance(pos, neg, gd);
        // ieq flows anode -> cathode through the device.
        mna.stamp_current_source(neg, pos, ieq);
    }

    /// Stamp the small-signal conductance at the DC bias.
    pub(crate) fn stamp_ac(&self, mna: &mut ComplexMna, dc_solution: &DVector<f64>) {
        let (_, gd) = self.evaluate(self.voltage_from(dc_solution));
        mna.stamp_conductance(
            self.node_pos.matrix_index(),
            self.node_neg.matrix_index(),
            gd,
        );
    }
}
