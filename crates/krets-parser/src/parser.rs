//! Statement parser for the netlist language.

use std::collections::HashSet;

use krets_core::units::{parse_value, strip_unit};

use crate::ast::{ElementDecl, ElementKind, Netlist, Params, Statement};
use crate::error::{Error, Result};
use crate::lexer::{tokenize, Line, Token};

/// Parse a netlist description.
pub fn parse(input: &str) -> Result<Netlist> {
    let mut statements = Vec::new();
    let mut seen_names = HashSet::new();

    for line in tokenize(input) {
        let statement = parse_line(&line)?;

        if let Statement::Element(decl) = &statement {
            if let Some(name) = &decl.name {
                if !seen_names.insert(name.clone()) {
                    return Err(Error::new(
                        line.number,
                        line.tokens[1].column,
                        format!("the component name \"{name}\" is used more than once"),
                    ));
                }
            }
        }

        statements.push(statement);
    }

    Ok(Netlist { statements })
}

fn parse_line(line: &Line<'_>) -> Result<Statement> {
    let head = line.tokens[0];
    let kind = match head.text.to_ascii_uppercase().as_str() {
        "R" => Some(ElementKind::Resistor),
        "C" => Some(ElementKind::Capacitor),
        "L" => Some(ElementKind::Inductor),
        "VG" => Some(ElementKind::VoltageSource),
        "D" => Some(ElementKind::Diode),
        _ => None,
    };

    match kind {
        Some(ElementKind::Diode) => parse_diode(line),
        Some(ElementKind::Capacitor) => parse_reactive(line, ElementKind::Capacitor, "f"),
        Some(ElementKind::Inductor) => parse_reactive(line, ElementKind::Inductor, "h"),
        Some(ElementKind::Resistor) => parse_two_node(line, ElementKind::Resistor, "ohm"),
        Some(ElementKind::VoltageSource) => parse_two_node(line, ElementKind::VoltageSource, "v"),
        None => parse_assignment(line),
    }
}

/// `<KIND> [<name>] <node_a> <node_b> <value>` for resistors and voltage
/// sources.
fn parse_two_node(line: &Line<'_>, kind: ElementKind, unit: &str) -> Result<Statement> {
    let tokens = &line.tokens;
    if tokens.len() < 4 || tokens.len() > 5 {
        return Err(wrong_arg_count(line));
    }

    let (name, base) = optional_name(line, tokens.len() == 5)?;
    let value = parse_magnitude(line, tokens[base + 2], unit)?;

    Ok(Statement::Element(ElementDecl {
        kind,
        name,
        node_pos: tokens[base].text.to_string(),
        node_neg: tokens[base + 1].text.to_string(),
        params: Params::Value(value),
        line: line.number,
    }))
}

/// `<KIND> [<name>] <node_a> <node_b> <value> [v0=<num>] [i0=<num>]` for
/// capacitors and inductors. The initial-condition parameters are
/// scanned from the right, in any order.
fn parse_reactive(line: &Line<'_>, kind: ElementKind, unit: &str) -> Result<Statement> {
    let tokens = &line.tokens;

    let mut end = tokens.len();
    let mut v0 = 0.0;
    let mut i0 = 0.0;
    while end > 1 {
        let Some((key, value)) = split_param(tokens[end - 1]) else {
            break;
        };
        let value = value.parse::<f64>().map_err(|_| {
            Error::new(
                line.number,
                tokens[end - 1].column,
                format!("expected a number in \"{}\"", tokens[end - 1].text),
            )
        })?;
        match key {
            "v0" => v0 = value,
            "i0" => i0 = value,
            _ => {
                return Err(Error::new(
                    line.number,
                    tokens[end - 1].column,
                    format!("unknown parameter \"{key}\" (expected v0 or i0)"),
                ))
            }
        }
        end -= 1;
    }

    if !(4..=5).contains(&end) {
        return Err(wrong_arg_count(line));
    }

    let (name, base) = optional_name(line, end == 5)?;
    let value = parse_magnitude(line, tokens[base + 2], unit)?;

    Ok(Statement::Element(ElementDecl {
        kind,
        name,
        node_pos: tokens[base].text.to_string(),
        node_neg: tokens[base + 1].text.to_string(),
        params: Params::Reactive { value, v0, i0 },
        line: line.number,
    }))
}

/// `D [<name>] <node_a> <node_b> i0=<num> m=<num> v0=<num>` in any
/// parameter order.
fn parse_diode(line: &Line<'_>) -> Result<Statement> {
    let tokens = &line.tokens;
    if tokens.len() < 6 || tokens.len() > 7 {
        return Err(wrong_arg_count(line));
    }

    let (name, base) = optional_name(line, tokens.len() == 7)?;

    let mut i0 = None;
    let mut m = None;
    let mut v0 = None;
    for token in &tokens[base + 2..] {
        let Some((key, value)) = split_param(*token) else {
            return Err(Error::new(
                line.number,
                token.column,
                format!("expected a name=value parameter, got \"{}\"", token.text),
            ));
        };
        let value = value.parse::<f64>().map_err(|_| {
            Error::new(
                line.number,
                token.column,
                format!("expected a number in \"{}\"", token.text),
            )
        })?;
        let slot = match key {
            "i0" => &mut i0,
            "m" => &mut m,
            "v0" => &mut v0,
            _ => {
                return Err(Error::new(
                    line.number,
                    token.column,
                    format!("unknown diode parameter \"{key}\" (expected i0, m or v0)"),
                ))
            }
        };
        if slot.replace(value).is_some() {
            return Err(Error::new(
                line.number,
                token.column,
                format!("duplicate diode parameter \"{key}\""),
            ));
        }
    }

    let missing = |slot: Option<f64>, key: &str| {
        slot.ok_or_else(|| {
            Error::new(
                line.number,
                tokens[0].column,
                format!("missing diode parameter \"{key}\""),
            )
        })
    };

    Ok(Statement::Element(ElementDecl {
        kind: ElementKind::Diode,
        name,
        node_pos: tokens[base].text.to_string(),
        node_neg: tokens[base + 1].text.to_string(),
        params: Params::Diode {
            i0: missing(i0, "i0")?,
            m: missing(m, "m")?,
            v0: missing(v0, "v0")?,
        },
        line: line.number,
    }))
}

/// `<node> = <value>v` - implicit voltage source to ground.
fn parse_assignment(line: &Line<'_>) -> Result<Statement> {
    let tokens = &line.tokens;
    if tokens.len() != 3 || tokens[1].text != "=" {
        return Err(Error::new(
            line.number,
            tokens[0].column,
            format!("unknown component kind \"{}\"", tokens[0].text),
        ));
    }

    let node = tokens[0].text.to_string();
    let value = parse_magnitude(line, tokens[2], "v")?;

    if node == "gnd" || node == "0" {
        if value == 0.0 {
            // Redundant restatement of the ground reference.
            return Ok(Statement::Assignment {
                node,
                value,
                line: line.number,
            });
        }
        return Err(Error::new(
            line.number,
            tokens[0].column,
            "ground is fixed at 0 V and cannot be reassigned",
        ));
    }

    Ok(Statement::Assignment {
        node,
        value,
        line: line.number,
    })
}

/// Determine the optional name token. Returns `(name, base)` where
/// `base` indexes the first node token.
fn optional_name(line: &Line<'_>, has_name: bool) -> Result<(Option<String>, usize)> {
    if !has_name {
        return Ok((None, 1));
    }
    let token = line.tokens[1];
    if token.text.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return Err(Error::new(
            line.number,
            token.column,
            format!("component name \"{}\" must not start with a digit", token.text),
        ));
    }
    Ok((Some(token.text.to_string()), 2))
}

fn parse_magnitude(line: &Line<'_>, token: Token<'_>, unit: &str) -> Result<f64> {
    parse_value(strip_unit(token.text, unit)).ok_or_else(|| {
        Error::new(
            line.number,
            token.column,
            format!("malformed value \"{}\"", token.text),
        )
    })
}

/// Build a "wrong number of arguments" error for the given line.
fn wrong_arg_count(line: &Line<'_>) -> Error {
    Error::new(
        line.number,
        line.tokens[0].column,
        format!(
            "wrong number of arguments for \"{}\"",
            line.tokens[0].text
        ),
    )
}

/// Split a `key=value` token; both halves must be non-empty.
fn split_param(token: Token<'_>) -> Option<(&str, &str)> {
    let (key, value) = token.text.split_once('=')?;
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}
