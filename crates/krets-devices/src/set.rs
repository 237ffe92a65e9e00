//! The ordered device store and its mutation protocol.

use indexmap::IndexMap;
use krets_core::mna::{ComplexMna, MnaSystem};
use nalgebra::DVector;

use crate::device::{AnalysisMode, Device, DeviceKind};
use crate::error::{Error, Result};

/// Insertion-ordered set of devices.
///
/// Owns auto-naming (`R1`, `VG2`, ... per kind), name lookup, the
/// dirty-flag mutation protocol and the assignment of branch-current
/// columns. Iteration order is insertion order, which fixes both the
/// unknown layout and the floating-point summation order.
#[derive(Debug, Default)]
pub struct DeviceSet {
    devices: Vec<Device>,
    names: IndexMap<String, usize>,
    kind_counts: IndexMap<&'static str, usize>,
    num_branches: usize,
    num_start_branches: usize,
}

impl DeviceSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device, auto-naming it when `name` is `None`.
    ///
    /// The ordinal counts all devices of the same kind, so the n-th
    /// resistor added without a name becomes `R<n>`.
    pub fn add(&mut self, kind: DeviceKind, name: Option<String>) -> Result<()> {
        let prefix = kind.prefix();
        let ordinal = self.kind_counts.entry(prefix).or_insert(0);
        *ordinal += 1;

        let name = match name {
            Some(name) => {
                check_name(&name)?;
                name
            }
            None => format!("{prefix}{ordinal}"),
        };

        if self.names.contains_key(&name) {
            return Err(Error::DuplicateName(name));
        }

        self.names.insert(name.clone(), self.devices.len());
        self.devices.push(Device::new(name, kind));
        Ok(())
    }

    /// Assign branch-current columns: voltage sources first, then
    /// inductors, then the temporary capacitor columns used only by the
    /// initial-conditions solve.
    pub fn assign_indices(&mut self) {
        let mut next = 0;
        for dev in &mut self.devices {
            if let DeviceKind::VoltageSource(v) = dev.kind_mut() {
                v.branch = Some(next);
                next += 1;
            }
        }
        for dev in &mut self.devices {
            if let DeviceKind::Inductor(l) = dev.kind_mut() {
                l.branch = Some(next);
                next += 1;
            }
        }
        self.num_branches = next;
        for dev in &mut self.devices {
            if let DeviceKind::Capacitor(c) = dev.kind_mut() {
                c.start_branch = Some(next);
                next += 1;
            }
        }
        self.num_start_branches = next - self.num_branches;
    }

    /// Number of persistent branch-current unknowns.
    pub fn num_branches(&self) -> usize {
        self.num_branches
    }

    /// Number of temporary capacitor columns in the initial-conditions
    /// solve.
    pub fn num_start_branches(&self) -> usize {
        self.num_start_branches
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// True when the set holds no devices.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Look up a device by name.
    pub fn get(&self, name: &str) -> Option<&Device> {
        self.names.get(name).map(|&i| &self.devices[i])
    }

    /// Index of a named device.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// Device at a given index.
    pub fn device(&self, index: usize) -> &Device {
        &self.devices[index]
    }

    /// Iterate over devices in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    /// Whether any device requires Newton iteration.
    pub fn has_nonlinear(&self) -> bool {
        self.devices.iter().any(|d| d.kind().is_nonlinear())
    }

    /// Fetch a device for mutation.
    ///
    /// Marks the device dirty; the equation builder re-reads its
    /// parameters and clears the flag at the start of the next solve.
    pub fn get_for_modification(&mut self, name: &str) -> Option<DeviceHandle<'_>> {
        let index = self.index_of(name)?;
        let device = &mut self.devices[index];
        device.mark_dirty();
        log::debug!("device {} marked for modification", device.name());
        Some(DeviceHandle { device })
    }

    /// Acknowledge pending mutations: re-read parameters of every dirty
    /// device and clear the flags. Called once at the start of each
    /// solve or transient step.
    pub fn acknowledge_mutations(&mut self) {
        for dev in &mut self.devices {
            if dev.is_dirty() {
                log::debug!("re-reading parameters of modified device {}", dev.name());
                dev.clear_dirty();
            }
        }
    }

    /// Stamp every device into a real system.
    pub fn stamp(&self, mna: &mut MnaSystem, mode: AnalysisMode, solution: &DVector<f64>) {
        for dev in &self.devices {
            dev.stamp(mna, mode, solution);
        }
    }

    /// Stamp every device into the complex system at `omega`.
    pub fn stamp_ac(&self, mna: &mut ComplexMna, omega: f64, dc_solution: &DVector<f64>) {
        for dev in &self.devices {
            dev.stamp_ac(mna, omega, dc_solution);
        }
    }

    /// Reset reactive companion state to the stored initial conditions.
    pub fn init_transient_state(&mut self) {
        for dev in &mut self.devices {
            match dev.kind_mut() {
                DeviceKind::Capacitor(c) => c.reset_state(),
                DeviceKind::Inductor(l) => l.reset_state(),
                _ => {}
            }
        }
    }

    /// Load reactive state from the solved initial-conditions system.
    ///
    /// Inductor currents come from their persistent branch columns,
    /// capacitor currents from the temporary pinning columns.
    pub fn load_start_solution(&mut self, solution: &DVector<f64>, num_nodes: usize) {
        for dev in &mut self.devices {
            let v = dev.voltage_from(solution);
            match dev.kind_mut() {
                DeviceKind::Capacitor(c) => {
                    let branch = c.start_branch.expect("indices assigned at build");
                    c.i_prev = solution[num_nodes + branch];
                    c.v_prev = v;
                }
                DeviceKind::Inductor(l) => {
                    let branch = l.branch.expect("indices assigned at build");
                    l.i_prev = solution[num_nodes + branch];
                }
                _ => {}
            }
        }
    }

    /// Roll reactive state forward after an accepted transient step.
    pub fn update_after_step(&mut self, solution: &DVector<f64>, num_nodes: usize, h: f64) {
        for dev in &mut self.devices {
            let v = dev.voltage_from(solution);
            match dev.kind_mut() {
                DeviceKind::Capacitor(c) => c.update_after_step(v, h),
                DeviceKind::Inductor(l) => {
                    let branch = l.branch.expect("indices assigned at build");
                    l.update_after_step(solution[num_nodes + branch]);
                }
                _ => {}
            }
        }
    }

    /// Record the DC operating point on reactive devices. Capacitors
    /// carry no DC current by construction.
    pub fn update_after_dc(&mut self, solution: &DVector<f64>, num_nodes: usize) {
        for dev in &mut self.devices {
            let v = dev.voltage_from(solution);
            match dev.kind_mut() {
                DeviceKind::Capacitor(c) => {
                    c.v_prev = v;
                    c.i_prev = 0.0;
                }
                DeviceKind::Inductor(l) => {
                    let branch = l.branch.expect("indices assigned at build");
                    l.i_prev = solution[num_nodes + branch];
                }
                _ => {}
            }
        }
    }
}

fn check_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return Err(invalid("name must not start with a digit"));
    }
    if name.contains('.') {
        return Err(invalid("name must not contain '.'"));
    }
    if name == "gnd" || name == "0" {
        return Err(invalid("name is reserved for the ground node"));
    }
    Ok(())
}

/// Short-lived mutable access to one device.
///
/// Obtained through [`DeviceSet::get_for_modification`]; the device is
/// already marked dirty, so any value written here takes effect at the
/// start of the next solve or transient step.
#[derive(Debug)]
pub struct DeviceHandle<'a> {
    device: &'a mut Device,
}

impl DeviceHandle<'_> {
    /// The device name.
    pub fn name(&self) -> &str {
        self.device.name()
    }

    /// The principal value of the device (resistance, capacitance,
    /// inductance or source voltage). `None` for diodes.
    pub fn value(&self) -> Option<f64> {
        match self.device.kind() {
            DeviceKind::Resistor(r) => Some(r.resistance),
            DeviceKind::Capacitor(c) => Some(c.capacitance),
            DeviceKind::Inductor(l) => Some(l.inductance),
            DeviceKind::VoltageSource(v) => Some(v.value),
            DeviceKind::Diode(_) => None,
        }
    }

    /// Set the principal value of the device.
    pub fn set_value(&mut self, value: f64) -> Result<()> {
        let positive = |what: &str| {
            if value <= 0.0 {
                Err(Error::InvalidParameter(format!(
                    "{what} must be positive, got {value}"
                )))
            } else {
                Ok(())
            }
        };
        match self.device.kind_mut() {
            DeviceKind::Resistor(r) => {
                positive("resistance")?;
                r.resistance = value;
            }
            DeviceKind::Capacitor(c) => {
                positive("capacitance")?;
                c.capacitance = value;
            }
            DeviceKind::Inductor(l) => {
                positive("inductance")?;
                l.inductance = value;
            }
            DeviceKind::VoltageSource(v) => v.value = value,
            DeviceKind::Diode(_) => {
                return Err(Error::InvalidParameter(
                    "a diode has no single value; use set_diode_params".to_string(),
                ))
            }
        }
        Ok(())
    }

    /// Replace the model parameters of a diode.
    pub fn set_diode_params(&mut self, i0: f64, m: f64, v0: f64) -> Result<()> {
        match self.device.kind_mut() {
            DeviceKind::Diode(d) => {
                if m <= 0.0 || i0 <= 0.0 {
                    return Err(Error::InvalidParameter(format!(
                        "diode parameters must satisfy i0 > 0 and m > 0, got i0={i0}, m={m}"
                    )));
                }
                d.i0 = i0;
                d.m = m;
                d.v0 = v0;
                Ok(())
            }
            _ => Err(Error::InvalidParameter(format!(
                "{} is not a diode",
                self.device.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passive::{Capacitor, Inductor, Resistor};
    use crate::sources::VoltageSource;
    use krets_core::NodeId;

    fn resistor(r: f64) -> DeviceKind {
        DeviceKind::Resistor(Resistor::new(NodeId::new(1), NodeId::GROUND, r).unwrap())
    }

    #[test]
    fn auto_naming_counts_per_kind() {
        let mut set = DeviceSet::new();
        set.add(resistor(1.0), None).unwrap();
        set.add(resistor(2.0), None).unwrap();
        set.add(
            DeviceKind::VoltageSource(VoltageSource::new(NodeId::new(1), NodeId::GROUND, 5.0)),
            None,
        )
        .unwrap();

        assert!(set.get("R1").is_some());
        assert!(set.get("R2").is_some());
        assert!(set.get("VG1").is_some());
    }

    #[test]
    fn explicit_names_participate_in_ordinals() {
        let mut set = DeviceSet::new();
        set.add(resistor(1.0), Some("feedback".to_string())).unwrap();
        set.add(resistor(2.0), None).unwrap();
        // The unnamed resistor is the second of its kind.
        assert!(set.get("R2").is_some());
        assert!(set.get("R1").is_none());
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut set = DeviceSet::new();
        set.add(resistor(1.0), Some("load".to_string())).unwrap();
        let err = set.add(resistor(2.0), Some("load".to_string()));
        assert!(matches!(err, Err(Error::DuplicateName(_))));
    }

    #[test]
    fn bad_names_rejected() {
        let mut set = DeviceSet::new();
        assert!(set.add(resistor(1.0), Some("1up".to_string())).is_err());
        assert!(set.add(resistor(1.0), Some("a.b".to_string())).is_err());
        assert!(set.add(resistor(1.0), Some("gnd".to_string())).is_err());
    }

    #[test]
    fn branch_assignment_order() {
        let mut set = DeviceSet::new();
        set.add(
            DeviceKind::Inductor(
                Inductor::new(NodeId::new(1), NodeId::GROUND, 1e-3, 0.0, 0.0).unwrap(),
            ),
            None,
        )
        .unwrap();
        set.add(
            DeviceKind::VoltageSource(VoltageSource::new(NodeId::new(1), NodeId::GROUND, 1.0)),
            None,
        )
        .unwrap();
        set.add(
            DeviceKind::Capacitor(
                Capacitor::new(NodeId::new(1), NodeId::GROUND, 1e-6, 0.0, 0.0).unwrap(),
            ),
            None,
        )
        .unwrap();
        set.assign_indices();

        // Sources before inductors, capacitor columns last.
        match set.get("VG1").unwrap().kind() {
            DeviceKind::VoltageSource(v) => assert_eq!(v.branch_index(), Some(0)),
            _ => unreachable!(),
        }
        match set.get("L1").unwrap().kind() {
            DeviceKind::Inductor(l) => assert_eq!(l.branch_index(), Some(1)),
            _ => unreachable!(),
        }
        assert_eq!(set.num_branches(), 2);
        assert_eq!(set.num_start_branches(), 1);
    }

    #[test]
    fn mutation_handle_sets_dirty_flag() {
        let mut set = DeviceSet::new();
        set.add(resistor(1000.0), None).unwrap();

        {
            let mut handle = set.get_for_modification("R1").unwrap();
            handle.set_value(2000.0).unwrap();
        }
        assert!(set.get("R1").unwrap().is_dirty());

        set.acknowledge_mutations();
        assert!(!set.get("R1").unwrap().is_dirty());
        match set.get("R1").unwrap().kind() {
            DeviceKind::Resistor(r) => assert_eq!(r.resistance, 2000.0),
            _ => unreachable!(),
        }
    }

    #[test]
    fn handle_rejects_invalid_values() {
        let mut set = DeviceSet::new();
        set.add(resistor(1000.0), None).unwrap();
        let mut handle = set.get_for_modification("R1").unwrap();
        assert!(handle.set_value(-5.0).is_err());
        assert!(handle.set_diode_params(1e-5, 3.0, 0.5).is_err());
    }
}
