//! Core circuit representation and MNA matrix structures for krets.
//!
//! This crate provides the data structures shared by every analysis:
//!
//! - [`NodeId`] / [`NodeTable`] - named nodes with dense matrix indices;
//!   ground is pinned to 0 V and never becomes an unknown
//! - [`MnaSystem`](mna::MnaSystem) - the real equation system `Ax = b`
//! - [`ComplexMna`](mna::ComplexMna) - its complex counterpart for the
//!   AC sweep
//! - [`units`] - engineering-value parsing (`1k`, `30uF`, `2.5v`)
//!
//! # Modified Nodal Analysis
//!
//! The unknown vector concatenates the node voltages with one branch
//! current per voltage source and per inductor. KCL rows come first, one
//! per non-ground node; each branch unknown owns the constitutive row of
//! its device.
//!
//! ```rust
//! use krets_core::mna::MnaSystem;
//!
//! // Voltage divider: 2.5 V source, two 1 kΩ resistors.
//! let mut mna = MnaSystem::new(2, 1);
//! mna.stamp_voltage_source(Some(0), None, 0, 2.5);
//! mna.stamp_conductance(Some(0), Some(1), 1e-3);
//! mna.stamp_conductance(Some(1), None, 1e-3);
//! assert_eq!(mna.size(), 3);
//! ```

pub mod mna;
pub mod node;
pub mod units;

pub use mna::{ComplexMna, MnaSystem};
pub use node::{NodeId, NodeTable};
