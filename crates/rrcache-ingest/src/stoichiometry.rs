// SPDX-License-Identifier: Apache-2.0

//! Reaction equation grammar.
//!
//! An equation is `<side> = <side>`; a side is terms joined by ` + `; a term
//! is `<coefficient> <compound>[@<compartment>]`.

use regex::Regex;
use rrcache_model::Stoichiometry;
use std::fmt::{Display, Formatter};
use std::sync::OnceLock;

/// Symbolic coefficients found in polymer and generic reactions.
const RESCUE: &[(&str, f64)] = &[
    ("n", 1.0),
    ("2n", 2.0),
    ("3n", 3.0),
    ("4n", 4.0),
    ("(n)", 1.0),
    ("(N)", 1.0),
    ("(2n)", 2.0),
    ("(x)", 1.0),
    ("N", 1.0),
    ("m", 1.0),
    ("q", 1.0),
    ("(n-1)", 0.0),
    ("(n-2)", -1.0),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquationError {
    /// The equation did not have exactly one `=`.
    Sides(usize),
    Term(String),
    Coefficient(String),
}

impl Display for EquationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sides(n) => write!(f, "expected exactly two sides, found {n}"),
            Self::Term(t) => write!(f, "malformed term `{t}`"),
            Self::Coefficient(c) => write!(f, "cannot convert stoichiometric coefficient `{c}`"),
        }
    }
}

impl std::error::Error for EquationError {}

#[must_use]
pub fn rescue_coefficient(token: &str) -> Option<f64> {
    RESCUE.iter().find(|(k, _)| *k == token).map(|(_, v)| *v)
}

/// Rescue table first, then plain numeric parsing.
#[must_use]
pub fn parse_coefficient(token: &str) -> Option<f64> {
    rescue_coefficient(token).or_else(|| token.parse::<f64>().ok().filter(|v| v.is_finite()))
}

/// Splits on the single `=`; `None` unless there is exactly one.
#[must_use]
pub fn split_equation(equation: &str) -> Option<(&str, &str)> {
    let (left, right) = equation.split_once('=')?;
    if right.contains('=') {
        return None;
    }
    Some((left, right))
}

fn term_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(\S+)\s+([^\s@]+)(?:@\S+)?$").ok())
        .as_ref()
}

fn parse_side(side: &str) -> Result<Stoichiometry, EquationError> {
    let mut out = Stoichiometry::new();
    for term in side.split(" + ").map(str::trim).filter(|t| !t.is_empty()) {
        let caps = term_pattern()
            .and_then(|p| p.captures(term))
            .ok_or_else(|| EquationError::Term(term.to_string()))?;
        let token = caps.get(1).map_or("", |m| m.as_str());
        let coefficient = parse_coefficient(token)
            .ok_or_else(|| EquationError::Coefficient(token.to_string()))?;
        let compound = caps
            .get(2)
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| EquationError::Term(term.to_string()))?;
        *out.entry(compound).or_insert(0.0) += coefficient;
    }
    Ok(out)
}

/// Parses both sides of an equation into compound coefficients.
pub fn parse_equation(equation: &str) -> Result<(Stoichiometry, Stoichiometry), EquationError> {
    let (left, right) = split_equation(equation)
        .ok_or_else(|| EquationError::Sides(equation.split('=').count()))?;
    Ok((parse_side(left)?, parse_side(right)?))
}
