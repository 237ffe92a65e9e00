//! Probe resolution: from dotted names to solution-vector extractors.
//!
//! Probe names are resolved once, at the start of an analysis, to a
//! [`ProbeTarget`]; reading a sample is then a plain index or a closed
//! form over the device state. Supported names:
//!
//! - `<node>` - node voltage (`gnd`/`0` read as 0)
//! - `<component>.voltage` - voltage across any component
//! - `<component>.current` - current through any component
//! - `<diode>.internal_node` - the diode's internal node voltage

use krets_core::NodeTable;
use krets_devices::{DeviceKind, DeviceSet};
use nalgebra::DVector;
use num_complex::Complex;

use crate::error::{Error, Result};

/// A resolved probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProbeTarget {
    /// The ground reference, always 0 V.
    Ground,
    /// A node voltage by matrix index.
    NodeVoltage(usize),
    /// Voltage across a device, by device index.
    DeviceVoltage(usize),
    /// Current through a device, by device index.
    DeviceCurrent(usize),
    /// A diode's internal node voltage, by device index.
    DiodeInternalNode(usize),
}

/// Resolve a probe name against the node and device tables.
pub(crate) fn resolve(name: &str, nodes: &NodeTable, devices: &DeviceSet) -> Result<ProbeTarget> {
    if let Some(id) = nodes.get(name) {
        return Ok(match id.matrix_index() {
            None => ProbeTarget::Ground,
            Some(index) => ProbeTarget::NodeVoltage(index),
        });
    }

    if let Some((device, field)) = name.split_once('.') {
        if let Some(index) = devices.index_of(device) {
            match field {
                "voltage" => return Ok(ProbeTarget::DeviceVoltage(index)),
                "current" => return Ok(ProbeTarget::DeviceCurrent(index)),
                "internal_node" => {
                    if matches!(devices.device(index).kind(), DeviceKind::Diode(_)) {
                        return Ok(ProbeTarget::DiodeInternalNode(index));
                    }
                }
                _ => {}
            }
        }
    }

    Err(Error::UnknownVariable(name.to_string()))
}

/// Read a probe from a real solution vector.
pub(crate) fn read(
    target: ProbeTarget,
    solution: &DVector<f64>,
    devices: &DeviceSet,
    num_nodes: usize,
) -> f64 {
    match target {
        ProbeTarget::Ground => 0.0,
        ProbeTarget::NodeVoltage(index) => solution[index],
        ProbeTarget::DeviceVoltage(index) => devices.device(index).voltage_from(solution),
        ProbeTarget::DeviceCurrent(index) => {
            let device = devices.device(index);
            match device.kind() {
                DeviceKind::Resistor(r) => r.conductance() * device.voltage_from(solution),
                DeviceKind::Capacitor(c) => c.current(),
                DeviceKind::Inductor(l) => {
                    solution[num_nodes + l.branch_index().expect("assigned at build")]
                }
                DeviceKind::VoltageSource(v) => {
                    solution[num_nodes + v.branch_index().expect("assigned at build")]
                }
                DeviceKind::Diode(d) => d.evaluate(d.voltage_from(solution)).0,
            }
        }
        ProbeTarget::DiodeInternalNode(index) => match devices.device(index).kind() {
            DeviceKind::Diode(d) => {
                let v_cathode = d.node_neg.matrix_index().map_or(0.0, |i| solution[i]);
                // The linearized drop places the internal node 1/m above
                // the cathode once the iteration has settled.
                v_cathode + 1.0 / d.m
            }
            _ => unreachable!("resolved against a diode"),
        },
    }
}

/// Read a probe from a complex AC solution at angular frequency `omega`.
///
/// Nonlinear devices read through their small-signal model at the DC
/// bias in `dc_solution`.
pub(crate) fn read_complex(
    target: ProbeTarget,
    solution: &DVector<Complex<f64>>,
    devices: &DeviceSet,
    num_nodes: usize,
    omega: f64,
    dc_solution: &DVector<f64>,
) -> Complex<f64> {
    let device_voltage = |index: usize| {
        let (pos, neg) = devices.device(index).kind().nodes();
        let vp = pos.matrix_index().map_or(Complex::ZERO, |i| solution[i]);
        let vn = neg.matrix_index().map_or(Complex::ZERO, |i| solution[i]);
        vp - vn
    };

    match target {
        ProbeTarget::Ground => Complex::ZERO,
        ProbeTarget::NodeVoltage(index) => solution[index],
        ProbeTarget::DeviceVoltage(index) => device_voltage(index),
        ProbeTarget::DeviceCurrent(index) => match devices.device(index).kind() {
            DeviceKind::Resistor(r) => device_voltage(index) * r.conductance(),
            DeviceKind::Capacitor(c) => {
                device_voltage(index) * Complex::new(0.0, omega * c.capacitance)
            }
            DeviceKind::Inductor(l) => {
                solution[num_nodes + l.branch_index().expect("assigned at build")]
            }
            DeviceKind::VoltageSource(v) => {
                solution[num_nodes + v.branch_index().expect("assigned at build")]
            }
            DeviceKind::Diode(d) => {
                let (_, gd) = d.evaluate(d.voltage_from(dc_solution));
                device_voltage(index) * gd
            }
        },
        ProbeTarget::DiodeInternalNode(index) => match devices.device(index).kind() {
            DeviceKind::Diode(d) => {
                let v_anode = d
                    .node_pos
                    .matrix_index()
                    .map_or(Complex::ZERO, |i| solution[i]);
                let v_offset = d.voltage_from(dc_solution) - 1.0 / d.m;
                v_anode - Complex::new(v_offset, 0.0)
            }
            _ => unreachable!("resolved against a diode"),
        },
    }
}
