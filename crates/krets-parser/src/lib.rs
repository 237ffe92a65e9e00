//! Parser for the krets netlist language.
//!
//! The language is line-oriented and whitespace-separated. Each
//! non-blank, non-comment line is either a component declaration or a
//! named-value assignment:
//!
//! ```text
//! # declarations: <KIND> [<name>] <node_a> <node_b> <params...>
//! R R1  vcc   v_out  1k
//! R     v_out gnd    1kOhm
//! C     v_out gnd    30uF  v0=0
//! D d1  v_out gnd    i0=1e-5 m=3 v0=0.5
//!
//! # shorthand voltage source to ground
//! vcc = 2.5v
//! ```
//!
//! Keywords and unit words are case-insensitive; node and component
//! names are case-sensitive. `gnd` and `0` name the ground node.
//!
//! ```rust
//! let netlist = krets_parser::parse("R vcc v_out 1k\nvcc = 2.5v\n").unwrap();
//! assert_eq!(netlist.statements.len(), 2);
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{ElementDecl, ElementKind, Netlist, Params, Statement};
pub use error::{Error, Result};
pub use parser::parse;
