//! Chemical formula parsing and molecular mass calculation.
//!
//! Backs the `atomicMass()` builtin and the `%-as-mmol` derived column.
//! Formulas are element symbols with optional counts and parenthesised
//! groups, e.g. `Fe2O3` or `Ca(OH)2`. Quantifications name some columns with
//! an oxide/carbonate suffix (`FeO-T`, total Fe as FeO); the mass of such a
//! column is that of the base formula before the suffix.

use std::collections::HashMap;

use lazy_static::lazy_static;
use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, digit1, satisfy},
    combinator::{map, map_res, opt, recognize},
    multi::many1,
    sequence::{delimited, pair},
    IResult,
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChemError {
    #[error("Invalid chemical formula: \"{0}\"")]
    InvalidFormula(String),

    #[error("Unknown element symbol \"{symbol}\" in formula \"{formula}\"")]
    UnknownElement { symbol: String, formula: String },
}

lazy_static! {
    /// Standard atomic masses, indexed by element symbol.
    static ref ATOMIC_MASSES: HashMap<&'static str, f64> = {
        let mut table = HashMap::new();
        for (symbol, mass) in [
            ("H", 1.00794),
            ("He", 4.002602),
            ("Li", 6.941),
            ("Be", 9.012182),
            ("B", 10.811),
            ("C", 12.011),
            ("N", 14.00674),
            ("O", 15.9994),
            ("F", 18.9984032),
            ("Ne", 20.1797),
            ("Na", 22.989768),
            ("Mg", 24.305),
            ("Al", 26.981539),
            ("Si", 28.0855),
            ("P", 30.973762),
            ("S", 32.066),
            ("Cl", 35.4527),
            ("Ar", 39.948),
            ("K", 39.0983),
            ("Ca", 40.078),
            ("Sc", 44.95591),
            ("Ti", 47.88),
            ("V", 50.9415),
            ("Cr", 51.9961),
            ("Mn", 54.93805),
            ("Fe", 55.847),
            ("Co", 58.9332),
            ("Ni", 58.6934),
            ("Cu", 63.546),
            ("Zn", 65.39),
            ("Ga", 69.723),
            ("Ge", 72.61),
            ("As", 74.92159),
            ("Se", 78.96),
            ("Br", 79.904),
            ("Kr", 83.8),
            ("Rb", 85.4678),
            ("Sr", 87.62),
            ("Y", 88.90585),
            ("Zr", 91.224),
            ("Nb", 92.90638),
            ("Mo", 95.94),
            ("Ru", 101.07),
            ("Rh", 102.9055),
            ("Pd", 106.42),
            ("Ag", 107.8682),
            ("Cd", 112.411),
            ("In", 114.82),
            ("Sn", 118.71),
            ("Sb", 121.757),
            ("Te", 127.6),
            ("I", 126.90447),
            ("Xe", 131.29),
            ("Cs", 132.90543),
            ("Ba", 137.327),
            ("La", 138.9055),
            ("Ce", 140.115),
            ("W", 183.85),
            ("Pt", 195.08),
            ("Au", 196.96654),
            ("Hg", 200.59),
            ("Pb", 207.2),
            ("Bi", 208.98037),
            ("Th", 232.0381),
            ("U", 238.0289),
        ] {
            table.insert(symbol, mass);
        }
        table
    };
}

/// Atomic mass for a single element symbol.
pub fn atomic_mass(symbol: &str) -> Option<f64> {
    ATOMIC_MASSES.get(symbol).copied()
}

/// The formula before any oxide/carbonate suffix: `FeO-T` → `FeO`.
pub fn base_formula(formula: &str) -> &str {
    match formula.find('-') {
        Some(idx) => &formula[..idx],
        None => formula,
    }
}

enum FormulaPart {
    Element { symbol: String, count: u32 },
    Group { parts: Vec<FormulaPart>, count: u32 },
}

type FormulaResult<'a, T> = IResult<&'a str, T>;

fn parse_symbol(input: &str) -> FormulaResult<String> {
    map(
        recognize(pair(
            satisfy(|c| c.is_ascii_uppercase()),
            take_while(|c: char| c.is_ascii_lowercase()),
        )),
        |s: &str| s.to_string(),
    )(input)
}

fn parse_count(input: &str) -> FormulaResult<u32> {
    map(
        opt(map_res(digit1, |s: &str| s.parse::<u32>())),
        |count| count.unwrap_or(1),
    )(input)
}

fn parse_part(input: &str) -> FormulaResult<FormulaPart> {
    alt((
        map(
            pair(parse_symbol, parse_count),
            |(symbol, count)| FormulaPart::Element { symbol, count },
        ),
        map(
            pair(
                delimited(char('('), many1(parse_part), char(')')),
                parse_count,
            ),
            |(parts, count)| FormulaPart::Group { parts, count },
        ),
    ))(input)
}

fn part_mass(part: &FormulaPart, formula: &str) -> Result<f64, ChemError> {
    match part {
        FormulaPart::Element { symbol, count } => {
            let mass = atomic_mass(symbol).ok_or_else(|| ChemError::UnknownElement {
                symbol: symbol.clone(),
                formula: formula.to_string(),
            })?;
            Ok(mass * f64::from(*count))
        }
        FormulaPart::Group { parts, count } => {
            let mut total = 0.0;
            for inner in parts {
                total += part_mass(inner, formula)?;
            }
            Ok(total * f64::from(*count))
        }
    }
}

/// Molecular mass of a formula such as `Fe2O3` or `Ca(OH)2`.
///
/// Suffixed column names must be stripped with [`base_formula`] first.
pub fn molecular_mass(formula: &str) -> Result<f64, ChemError> {
    let (rest, parts) =
        many1(parse_part)(formula).map_err(|_| ChemError::InvalidFormula(formula.to_string()))?;
    if !rest.is_empty() {
        return Err(ChemError::InvalidFormula(formula.to_string()));
    }
    let mut total = 0.0;
    for part in &parts {
        total += part_mass(part, formula)?;
    }
    Ok(total)
}
