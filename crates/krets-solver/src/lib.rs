//! Linear and nonlinear solvers for krets.
//!
//! - [`linear::solve_dense`] - dense LU with partial pivoting,
//!   parameterized over `f64` and `Complex<f64>`
//! - [`newton`] - Newton-Raphson driver for circuits with nonlinear
//!   devices
//! - [`ac`] - AC sweep parameters and frequency-grid generation
//!
//! ```rust
//! use krets_core::mna::MnaSystem;
//! use krets_solver::linear::solve_dense;
//!
//! // Voltage divider: 10 V source, two 1 kΩ resistors.
//! let mut mna = MnaSystem::new(2, 1);
//! mna.stamp_voltage_source(Some(0), None, 0, 10.0);
//! mna.stamp_conductance(Some(0), Some(1), 1e-3);
//! mna.stamp_conductance(Some(1), None, 1e-3);
//!
//! let x = solve_dense(mna.matrix(), mna.rhs()).unwrap();
//! assert!((x[1] - 5.0).abs() < 1e-9);
//! ```

pub mod ac;
pub mod error;
pub mod linear;
pub mod newton;

pub use ac::{generate_frequencies, AcSweepParams, AcSweepType};
pub use error::{Error, Result};
pub use linear::solve_dense;
pub use newton::{solve_newton_raphson, ConvergenceCriteria, NonlinearStamper, NrResult};
