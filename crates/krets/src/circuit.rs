//! The `Circuit` facade: building from netlist text, probe access,
//! mutation handles and diagnostics.

use krets_core::mna::{ComplexMna, MnaSystem};
use krets_core::{NodeId, NodeTable};
use krets_devices::{
    AnalysisMode, Capacitor, DeviceHandle, DeviceKind, DeviceSet, Diode, Inductor, Resistor,
    VoltageSource,
};
use krets_parser::{ElementKind, Params, Statement};
use krets_solver::ConvergenceCriteria;
use nalgebra::DVector;

use crate::error::{Error, Result};
use crate::probe::{self, ProbeTarget};

/// Where the circuit stands in the analysis lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    /// Built, nothing solved yet.
    Unsolved,
    /// A DC operating point is available.
    DcSolved,
    /// A transient run is in progress and can be continued.
    TransientRunning,
}

/// The most recently stamped linear system, kept for diagnostics.
#[derive(Debug, Clone)]
pub(crate) enum StampedSystem {
    Real {
        mna: MnaSystem,
        names: Vec<String>,
    },
    Complex {
        mna: ComplexMna,
        names: Vec<String>,
    },
}

/// A lumped circuit with its analysis state.
///
/// Built once from netlist text; afterwards the structure is immutable
/// and only parameter values may change, through
/// [`get_component_for_modification`](Circuit::get_component_for_modification).
///
/// ```rust
/// let mut circuit = krets::Circuit::build_from_string(
///     "R R1 vcc v_out 1k\n\
///      R    v_out gnd 1kOhm\n\
///      vcc = 2.5v\n",
/// )
/// .unwrap();
///
/// circuit.dc_analysis().unwrap();
/// assert!((circuit.get_variable("v_out").unwrap() - 1.25).abs() < 1e-9);
/// ```
#[derive(Debug)]
pub struct Circuit {
    pub(crate) nodes: NodeTable,
    pub(crate) devices: DeviceSet,
    pub(crate) state: AnalysisState,
    pub(crate) criteria: ConvergenceCriteria,
    /// Last accepted real solution (node voltages + branch currents).
    pub(crate) solution: Option<DVector<f64>>,
    /// The DC operating point, kept as the AC linearization base.
    pub(crate) dc_solution: Option<DVector<f64>>,
    pub(crate) last_system: Option<StampedSystem>,
    /// Transient clock.
    pub(crate) sim_time: f64,
    /// The step size in effect, as chosen or defaulted.
    pub(crate) time_step: f64,
    pub(crate) probes: Vec<ProbeTarget>,
    pub(crate) time_stamps: Vec<f64>,
    pub(crate) series: Vec<Vec<f64>>,
}

impl Circuit {
    /// Build a circuit from netlist text.
    pub fn build_from_string(text: &str) -> Result<Self> {
        let netlist = krets_parser::parse(text)?;

        let mut nodes = NodeTable::new();
        let mut devices = DeviceSet::new();

        for statement in netlist.statements {
            match statement {
                Statement::Element(decl) => {
                    let pos = nodes.intern(&decl.node_pos);
                    let neg = nodes.intern(&decl.node_neg);
                    let kind = match (decl.kind, decl.params) {
                        (ElementKind::Resistor, Params::Value(value)) => {
                            DeviceKind::Resistor(Resistor::new(pos, neg, value)?)
                        }
                        (ElementKind::VoltageSource, Params::Value(value)) => {
                            DeviceKind::VoltageSource(VoltageSource::new(pos, neg, value))
                        }
                        (ElementKind::Capacitor, Params::Reactive { value, v0, i0 }) => {
                            DeviceKind::Capacitor(Capacitor::new(pos, neg, value, v0, i0)?)
                        }
                        (ElementKind::Inductor, Params::Reactive { value, v0, i0 }) => {
                            DeviceKind::Inductor(Inductor::new(pos, neg, value, v0, i0)?)
                        }
                        (ElementKind::Diode, Params::Diode { i0, m, v0 }) => {
                            DeviceKind::Diode(Diode::new(pos, neg, i0, m, v0)?)
                        }
                        _ => unreachable!("parser pairs each kind with its parameter shape"),
                    };
                    devices.add(kind, decl.name)?;
                }
                Statement::Assignment { node, value, .. } => {
                    if NodeTable::is_ground_name(&node) {
                        // "gnd = 0" restates the reference.
                        continue;
                    }
                    let pos = nodes.intern(&node);
                    devices.add(
                        DeviceKind::VoltageSource(VoltageSource::new(pos, NodeId::GROUND, value)),
                        None,
                    )?;
                }
            }
        }

        devices.assign_indices();
        structural_check(&nodes, &devices)?;

        log::debug!(
            "built circuit: {} nodes, {} devices, {} branch unknowns",
            nodes.len(),
            devices.len(),
            devices.num_branches()
        );

        Ok(Self {
            nodes,
            devices,
            state: AnalysisState::Unsolved,
            criteria: ConvergenceCriteria::default(),
            solution: None,
            dc_solution: None,
            last_system: None,
            sim_time: 0.0,
            time_step: 1e-6,
            probes: Vec::new(),
            time_stamps: Vec::new(),
            series: Vec::new(),
        })
    }

    /// The current analysis state.
    pub fn state(&self) -> AnalysisState {
        self.state
    }

    /// The transient step size in effect (the default until a transient
    /// run chooses one).
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// The transient simulation clock.
    pub fn transient_time(&self) -> f64 {
        self.sim_time
    }

    /// Drop the recorded transient history, keeping simulation state.
    pub fn clear_transient_data(&mut self) {
        self.time_stamps.clear();
        for series in &mut self.series {
            series.clear();
        }
    }

    /// Read a solved variable by name: a node voltage,
    /// `<component>.current`, `<component>.voltage` or
    /// `<diode>.internal_node`.
    pub fn get_variable(&self, name: &str) -> Result<f64> {
        let target = probe::resolve(name, &self.nodes, &self.devices)?;
        let solution = self
            .solution
            .as_ref()
            .ok_or_else(|| Error::InvalidState("no analysis has been run yet".to_string()))?;
        Ok(probe::read(target, solution, &self.devices, self.nodes.len()))
    }

    /// Fetch a component for parameter mutation.
    ///
    /// The component is marked dirty; the new values take effect when the
    /// equation builder re-reads them at the start of the next solve or
    /// transient step.
    pub fn get_component_for_modification(&mut self, name: &str) -> Result<DeviceHandle<'_>> {
        self.devices
            .get_for_modification(name)
            .ok_or_else(|| Error::UnknownVariable(name.to_string()))
    }

    /// Unknown-column names in matrix order for the persistent layout.
    pub(crate) fn unknown_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.names().map(str::to_string).collect();
        for dev in self.devices.iter() {
            if matches!(dev.kind(), DeviceKind::VoltageSource(_)) {
                names.push(format!("{}.current", dev.name()));
            }
        }
        for dev in self.devices.iter() {
            if matches!(dev.kind(), DeviceKind::Inductor(_)) {
                names.push(format!("{}.current", dev.name()));
            }
        }
        names
    }

    /// Unknown-column names for a given mode; the initial-conditions
    /// solve appends the temporary capacitor current columns.
    pub(crate) fn unknown_names_for(&self, mode: AnalysisMode) -> Vec<String> {
        let mut names = self.unknown_names();
        if mode == AnalysisMode::TransientStart {
            for dev in self.devices.iter() {
                if matches!(dev.kind(), DeviceKind::Capacitor(_)) {
                    names.push(format!("{}.current", dev.name()));
                }
            }
        }
        names
    }

    /// Render the most recently stamped system as `(coef)(var) + ... = rhs`
    /// rows. `None` before any analysis.
    pub fn equations_string(&self) -> Option<String> {
        let system = self.last_system.as_ref()?;
        let mut out = String::new();
        match system {
            StampedSystem::Real { mna, names } => {
                for row in 0..mna.size() {
                    let mut first = true;
                    for col in 0..mna.size() {
                        let coef = mna.matrix()[(row, col)];
                        if coef != 0.0 {
                            if !first {
                                out.push_str("+ ");
                            }
                            out.push_str(&format!("({})({}) ", coef, names[col]));
                            first = false;
                        }
                    }
                    out.push_str(&format!("= {}\n", mna.rhs()[row]));
                }
            }
            StampedSystem::Complex { mna, names } => {
                for row in 0..mna.size() {
                    let mut first = true;
                    for col in 0..mna.size() {
                        let coef = mna.matrix()[(row, col)];
                        if coef != num_complex::Complex::ZERO {
                            if !first {
                                out.push_str("+ ");
                            }
                            out.push_str(&format!("({})({}) ", coef, names[col]));
                            first = false;
                        }
                    }
                    out.push_str(&format!("= {}\n", mna.rhs()[row]));
                }
            }
        }
        Some(out)
    }

    /// Render `name = value` lines for the last real solution. `None`
    /// before any analysis.
    pub fn variables_string(&self) -> Option<String> {
        let solution = self.solution.as_ref()?;
        let names = self.unknown_names();
        let mut out = String::new();
        for (name, value) in names.iter().zip(solution.iter()) {
            out.push_str(&format!("{name} = {value}\n"));
        }
        Some(out)
    }

    /// Print the equations of the most recent analysis.
    pub fn print_equations(&self) {
        match self.equations_string() {
            Some(text) => print!("{text}"),
            None => println!("Nothing to print."),
        }
    }

    /// Print every solved variable of the most recent analysis.
    pub fn print_all_variables(&self) {
        match self.variables_string() {
            Some(text) => print!("{text}"),
            None => println!("Nothing to print."),
        }
    }
}

/// Reject topologies the equation builder can diagnose a priori:
/// dangling nodes and subcircuits with no path to ground.
fn structural_check(nodes: &NodeTable, devices: &DeviceSet) -> Result<()> {
    let n = nodes.len();
    if n == 0 {
        return Ok(());
    }

    let mut terminal_counts = vec![0usize; n];
    // Adjacency over ground (0) and node ids (1..=n).
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n + 1];

    for dev in devices.iter() {
        let (a, b) = dev.kind().nodes();
        if let Some(i) = a.matrix_index() {
            terminal_counts[i] += 1;
        }
        if let Some(i) = b.matrix_index() {
            terminal_counts[i] += 1;
        }
        let ai = a.matrix_index().map_or(0, |i| i + 1);
        let bi = b.matrix_index().map_or(0, |i| i + 1);
        adjacency[ai].push(bi);
        adjacency[bi].push(ai);
    }

    let node_name = |index: usize| {
        nodes
            .name_of(NodeId::new(index as u32 + 1))
            .unwrap_or("?")
            .to_string()
    };

    for (index, &count) in terminal_counts.iter().enumerate() {
        if count < 2 {
            return Err(Error::Structural(format!(
                "node \"{}\" is connected to only one component terminal",
                node_name(index)
            )));
        }
    }

    let mut visited = vec![false; n + 1];
    let mut queue = vec![0usize];
    visited[0] = true;
    while let Some(current) = queue.pop() {
        for &next in &adjacency[current] {
            if !visited[next] {
                visited[next] = true;
                queue.push(next);
            }
        }
    }
    for (id, seen) in visited.iter().enumerate().skip(1) {
        if !seen {
            return Err(Error::Structural(format!(
                "node \"{}\" has no path to ground",
                node_name(id - 1)
            )));
        }
    }

    Ok(())
}
