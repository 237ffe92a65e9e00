//! Device models and MNA stamps for krets.
//!
//! Devices are tagged variants ([`DeviceKind`]) dispatched by match; the
//! analysis selects a stamp through [`AnalysisMode`]. The
//! [`DeviceSet`] owns naming, lookup, branch-column assignment and the
//! dirty-flag mutation protocol.
//!
//! Supported devices:
//!
//! - [`Resistor`] - linear conductance
//! - [`Capacitor`] - open in DC, backward-Euler Norton companion in
//!   transient, `jωC` in AC
//! - [`Inductor`] - short in DC, backward-Euler branch relation in
//!   transient, `jωL` branch impedance in AC
//! - [`VoltageSource`] - ideal source with a branch-current unknown
//! - [`Diode`] - exponential model, Newton-linearized

pub mod device;
pub mod diode;
pub mod error;
pub mod passive;
pub mod set;
pub mod sources;

pub use device::{AnalysisMode, Device, DeviceKind};
pub use diode::Diode;
pub use error::{Error, Result};
pub use passive::{Capacitor, Inductor, Resistor};
pub use set::{DeviceHandle, DeviceSet};
pub use sources::VoltageSource;
