//! The device variants and their per-mode stamp dispatch.

use krets_core::mna::{ComplexMna, MnaSystem};
use krets_core::NodeId;
use nalgebra::DVector;

use crate::diode::Diode;
use crate::passive::{Capacitor, Inductor, Resistor};
use crate::sources::VoltageSource;

/// Which real-valued system is being assembled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalysisMode {
    /// DC operating point: capacitors open, inductors short.
    Dc,
    /// Initial-conditions solve at the start of a transient run:
    /// capacitors pinned to their initial voltage through a temporary
    /// branch column, inductors pinned to their initial current.
    TransientStart,
    /// One backward-Euler step of size `h`.
    TransientStep {
        /// Step size in seconds.
        h: f64,
    },
}

/// A circuit device, tagged by variant.
#[derive(Debug, Clone)]
pub enum DeviceKind {
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    VoltageSource(VoltageSource),
    Diode(Diode),
}

impl DeviceKind {
    /// Auto-naming prefix for this variant (`R1`, `VG2`, ...).
    pub fn prefix(&self) -> &'static str {
        match self {
            DeviceKind::Resistor(_) => "R",
            DeviceKind::Capacitor(_) => "C",
            DeviceKind::Inductor(_) => "L",
            DeviceKind::VoltageSource(_) => "VG",
            DeviceKind::Diode(_) => "D",
        }
    }

    /// Terminal nodes `(pos, neg)`.
    pub fn nodes(&self) -> (NodeId, NodeId) {
        match self {
            DeviceKind::Resistor(r) => (r.node_pos, r.node_neg),
            DeviceKind::Capacitor(c) => (c.node_pos, c.node_neg),
            DeviceKind::Inductor(l) => (l.node_pos, l.node_neg),
            DeviceKind::VoltageSource(v) => (v.node_pos, v.node_neg),
            DeviceKind::Diode(d) => (d.node_pos, d.node_neg),
        }
    }

    /// Whether the device requires Newton iteration.
    pub fn is_nonlinear(&self) -> bool {
        matches!(self, DeviceKind::Diode(_))
    }

    /// Number of persistent branch-current unknowns.
    pub fn num_branches(&self) -> usize {
        match self {
            DeviceKind::Inductor(_) | DeviceKind::VoltageSource(_) => 1,
            _ => 0,
        }
    }
}

/// A named device with its mutation-dirty flag.
#[derive(Debug, Clone)]
pub struct Device {
    name: String,
    dirty: bool,
    kind: DeviceKind,
}

impl Device {
    pub(crate) fn new(name: String, kind: DeviceKind) -> Self {
        Self {
            name,
            dirty: false,
            kind,
        }
    }

    /// The user-facing device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The device variant.
    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut DeviceKind {
        &mut self.kind
    }

    /// Whether a mutation is pending acknowledgement by the builder.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Device voltage `V(pos) − V(neg)` read from a solution vector.
    pub fn voltage_from(&self, solution: &DVector<f64>) -> f64 {
        let (pos, neg) = self.kind.nodes();
        let vp = pos.matrix_index().map_or(0.0, |i| solution[i]);
        let vn = neg.matrix_index().map_or(0.0, |i| solution[i]);
        vp - vn
    }

    /// Stamp this device into a real system for the given mode.
    ///
    /// `solution` is the current guess; only nonlinear devices read it.
    pub fn stamp(&self, mna: &mut MnaSystem, mode: AnalysisMode, solution: &DVector<f64>) {
        match (&self.kind, mode) {
            (DeviceKind::Resistor(r), _) => r.stamp(mna),
            (DeviceKind::VoltageSource(v), _) => v.stamp(mna),
            (DeviceKind::Diode(d), _) => d.stamp_linearized(mna, solution),

            (DeviceKind::Capacitor(_), AnalysisMode::Dc) => {}
            (DeviceKind::Capacitor(c), AnalysisMode::TransientStart) => c.stamp_start(mna),
            (DeviceKind::Capacitor(c), AnalysisMode::TransientStep { h }) => {
                c.stamp_companion(mna, h)
            }

            (DeviceKind::Inductor(l), AnalysisMode::Dc) => l.stamp_dc(mna),
            (DeviceKind::Inductor(l), AnalysisMode::TransientStart) => l.stamp_start(mna),
            (DeviceKind::Inductor(l), AnalysisMode::TransientStep { h }) => {
                l.stamp_companion(mna, h)
            }
        }
    }

    /// Stamp this device into the complex system at angular frequency
    /// `omega`, linearizing nonlinear devices at the DC bias.
    pub fn stamp_ac(&self, mna: &mut ComplexMna, omega: f64, dc_solution: &DVector<f64>) {
        match &self.kind {
            DeviceKind::Resistor(r) => r.stamp_ac(mna),
            DeviceKind::Capacitor(c) => c.stamp_ac(mna, omega),
            DeviceKind::Inductor(l) => l.stamp_ac(mna, omega),
            DeviceKind::VoltageSource(v) => v.stamp_ac(mna),
            DeviceKind::Diode(d) => d.stamp_ac(mna, dc_solution),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacitor_is_open_in_dc() {
        let cap = Capacitor::new(NodeId::new(1), NodeId::GROUND, 1e-6, 0.0, 0.0).unwrap();
        let dev = Device::new("C1".into(), DeviceKind::Capacitor(cap));

        let mut mna = MnaSystem::new(1, 0);
        dev.stamp(&mut mna, AnalysisMode::Dc, &DVector::zeros(1));

        assert_eq!(mna.matrix()[(0, 0)], 0.0);
        assert_eq!(mna.rhs()[0], 0.0);
    }

    #[test]
    fn prefixes() {
        let r = Resistor::new(NodeId::new(1), NodeId::GROUND, 1.0).unwrap();
        assert_eq!(DeviceKind::Resistor(r).prefix(), "R");
        let v = VoltageSource::new(NodeId::new(1), NodeId::GROUND, 1.0);
        assert_eq!(DeviceKind::VoltageSource(v).prefix(), "VG");
    }
}
