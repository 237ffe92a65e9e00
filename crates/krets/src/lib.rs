//! # krets
//!
//! A lumped analog circuit simulator. Circuits are described in a small
//! netlist language, assembled into modified nodal analysis (MNA)
//! equations and solved in three regimes:
//!
//! - **DC operating point** - [`Circuit::dc_analysis`]
//! - **Transient** - backward-Euler time stepping with component-value
//!   mutation between continuation calls
//!   ([`Circuit::transient_simulation`],
//!   [`Circuit::continue_transient_simulation`])
//! - **AC sweep** - small-signal frequency response about the DC bias
//!   ([`Circuit::ac_sweep`])
//!
//! ## Quick start
//!
//! ```rust
//! use krets::Circuit;
//!
//! let mut circuit = Circuit::build_from_string(
//!     "R R1 vcc v_out 1k\n\
//!      R    v_out gnd 1kOhm\n\
//!      vcc = 2.5v\n",
//! )
//! .unwrap();
//!
//! circuit.dc_analysis().unwrap();
//! assert!((circuit.get_variable("v_out").unwrap() - 1.25).abs() < 1e-9);
//! ```
//!
//! ## Transient with mutation
//!
//! ```rust
//! use krets::Circuit;
//!
//! let mut circuit = Circuit::build_from_string(
//!     "R vcc v_out 1k\n\
//!      R v_out gnd 1k\n\
//!      C v_out gnd 30uF\n\
//!      vcc = 1V\n",
//! )
//! .unwrap();
//!
//! // Prepare only, then run in explicit chunks.
//! circuit.transient_simulation(0.0, 0.0, &["v_out"]).unwrap();
//! circuit.continue_transient_simulation(1e-3, 1e-5).unwrap();
//!
//! // Double R1 for the rest of the run.
//! circuit
//!     .get_component_for_modification("R1")
//!     .unwrap()
//!     .set_value(2e3)
//!     .unwrap();
//! let (times, series) = circuit.continue_transient_simulation(1e-3, 1e-5).unwrap();
//! assert_eq!(times.len(), series[0].len());
//! ```

pub mod analysis;
pub mod circuit;
pub mod error;
mod probe;

// Re-export the member crates under stable paths.
pub use krets_core as core;
pub use krets_devices as devices;
pub use krets_parser as parser;
pub use krets_solver as solver;

pub use circuit::{AnalysisState, Circuit};
pub use error::{Error, Result};

pub use krets_core::{NodeId, NodeTable};
pub use krets_devices::{
    AnalysisMode, Capacitor, Device, DeviceHandle, DeviceKind, DeviceSet, Diode, Inductor,
    Resistor, VoltageSource,
};
pub use krets_solver::{AcSweepParams, AcSweepType, ConvergenceCriteria};

/// Re-export of nalgebra's dynamic vector type.
pub use nalgebra::DVector;

/// Re-export of num_complex's complex scalar.
pub use num_complex::Complex;

/// Commonly used types and traits.
pub mod prelude {
    pub use crate::{
        AcSweepParams, AcSweepType, AnalysisState, Circuit, Complex, ConvergenceCriteria, DVector,
        Error, NodeId, Result,
    };
}
