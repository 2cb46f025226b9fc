/// Module to resolve a chemical formula into its atomic composition
///
/// Formulas of gas references may carry a disambiguating suffix after an underscore
/// ("H2_ref", "CO2_gas"); the suffix is dropped before parsing. Phase marks like "(g)" and
/// whitespace are ignored, brackets with multipliers are expanded: "Ca(NO3)2" -> {Ca:1, N:2, O:6}
use super::errors::ReferenceError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// element symbol -> number of atoms
pub type Composition = HashMap<String, usize>;

// Element symbols ordered by atomic number, ELEMENTS[z - 1] is the element with atomic number z
const ELEMENTS: &[&str] = &[
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", //
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca", //
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", //
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", //
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", //
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", //
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", //
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", //
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", //
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", //
];

const PHASE_MARKS: [&str; 5] = ["(g)", "(l)", "(s)", "(c)", "(aq)"];

// element with optional count | opening bracket | closing bracket with optional multiplier
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z][a-z]?)(\d*)|(\()|(\))(\d*)").expect("formula token pattern is valid")
});

/// Atomic number of an element symbol, None for anything that is not an element
pub fn atomic_number(symbol: &str) -> Option<usize> {
    ELEMENTS
        .iter()
        .position(|element| *element == symbol)
        .map(|index| index + 1)
}

/// Drops a disambiguating suffix: "H2_ref" -> "H2", "CO2" -> "CO2"
pub fn strip_suffix(formula: &str) -> &str {
    formula.split_once('_').map_or(formula, |(species, _)| species)
}

/// Number of atoms of `symbol` in a composition, 0 if the element is absent
pub fn atom_count(composition: &Composition, symbol: &str) -> usize {
    composition.get(symbol).copied().unwrap_or(0)
}

fn parse_count(formula: &str, digits: &str) -> Result<usize, ReferenceError> {
    if digits.is_empty() {
        return Ok(1);
    }
    let count: usize = digits.parse().map_err(|_| ReferenceError::InvalidFormula {
        formula: formula.to_string(),
        reason: format!("cannot read count '{}'", digits),
    })?;
    if count == 0 {
        return Err(ReferenceError::InvalidFormula {
            formula: formula.to_string(),
            reason: "zero atom count".to_string(),
        });
    }
    Ok(count)
}

fn too_many_atoms(formula: &str) -> ReferenceError {
    ReferenceError::InvalidFormula {
        formula: formula.to_string(),
        reason: "atom count overflows".to_string(),
    }
}

fn add_atoms(
    formula: &str,
    level: &mut Composition,
    symbol: String,
    count: usize,
) -> Result<(), ReferenceError> {
    let total = level.entry(symbol).or_insert(0);
    *total = total
        .checked_add(count)
        .ok_or_else(|| too_many_atoms(formula))?;
    Ok(())
}

/// Parses a chemical formula and returns a HashMap of elements and their counts
pub fn parse_formula(formula: &str) -> Result<Composition, ReferenceError> {
    let mut cleaned: String = strip_suffix(formula)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    for mark in PHASE_MARKS {
        cleaned = cleaned.replace(mark, "");
    }
    if cleaned.is_empty() {
        return Err(ReferenceError::InvalidFormula {
            formula: formula.to_string(),
            reason: "empty formula".to_string(),
        });
    }

    // one composition per open bracket level
    let mut stack: Vec<Composition> = vec![Composition::new()];
    let mut position = 0;
    for captures in TOKEN.captures_iter(&cleaned) {
        let Some(token) = captures.get(0) else {
            continue;
        };
        if token.start() != position {
            return Err(ReferenceError::InvalidFormula {
                formula: formula.to_string(),
                reason: format!("unexpected '{}'", &cleaned[position..token.start()]),
            });
        }
        position = token.end();

        if let Some(symbol) = captures.get(1) {
            let symbol = symbol.as_str();
            if atomic_number(symbol).is_none() {
                return Err(ReferenceError::UnknownElement {
                    formula: formula.to_string(),
                    symbol: symbol.to_string(),
                });
            }
            let count = parse_count(formula, captures.get(2).map_or("", |m| m.as_str()))?;
            if let Some(level) = stack.last_mut() {
                add_atoms(formula, level, symbol.to_string(), count)?;
            }
        } else if captures.get(3).is_some() {
            stack.push(Composition::new());
        } else {
            let multiplier = parse_count(formula, captures.get(5).map_or("", |m| m.as_str()))?;
            let group = match stack.pop() {
                Some(group) if !stack.is_empty() => group,
                _ => {
                    return Err(ReferenceError::InvalidFormula {
                        formula: formula.to_string(),
                        reason: "unbalanced closing bracket".to_string(),
                    });
                }
            };
            if let Some(level) = stack.last_mut() {
                for (symbol, count) in group {
                    let count = count
                        .checked_mul(multiplier)
                        .ok_or_else(|| too_many_atoms(formula))?;
                    add_atoms(formula, level, symbol, count)?;
                }
            }
        }
    }
    if position != cleaned.len() {
        return Err(ReferenceError::InvalidFormula {
            formula: formula.to_string(),
            reason: format!("unexpected '{}'", &cleaned[position..]),
        });
    }
    if stack.len() != 1 {
        return Err(ReferenceError::InvalidFormula {
            formula: formula.to_string(),
            reason: "unbalanced opening bracket".to_string(),
        });
    }
    let composition = stack.pop().unwrap_or_default();
    if composition.is_empty() {
        return Err(ReferenceError::InvalidFormula {
            formula: formula.to_string(),
            reason: "no elements".to_string(),
        });
    }
    Ok(composition)
}

/// Distinct elements of a composition sorted by atomic number
pub fn sorted_symbols(composition: &Composition) -> Vec<String> {
    let mut symbols: Vec<String> = composition.keys().cloned().collect();
    symbols.sort_by_key(|symbol| atomic_number(symbol).unwrap_or(usize::MAX));
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formula() {
        let expected_counts = HashMap::from([
            ("C".to_string(), 6),
            ("H".to_string(), 8),
            ("O".to_string(), 6),
        ]);
        assert_eq!(parse_formula("C6H8O6").unwrap(), expected_counts);

        let expected_counts = HashMap::from([
            ("Na".to_string(), 1),
            ("N".to_string(), 2),
            ("O".to_string(), 6),
        ]);
        assert_eq!(parse_formula("Na(NO3)2").unwrap(), expected_counts);

        // adsorbate notation lists atoms one by one
        let expected_counts = HashMap::from([
            ("S".to_string(), 1),
            ("N".to_string(), 1),
            ("O".to_string(), 2),
            ("C".to_string(), 1),
            ("H".to_string(), 1),
        ]);
        assert_eq!(parse_formula("SNOCHO").unwrap(), expected_counts);

        let expected_counts = HashMap::from([("Cl".to_string(), 1), ("H".to_string(), 1)]);
        assert_eq!(parse_formula("HCl").unwrap(), expected_counts);
    }

    #[test]
    fn test_nested_brackets_and_phase_marks() {
        let expected_counts = HashMap::from([("C".to_string(), 2), ("H".to_string(), 6)]);
        assert_eq!(parse_formula("(CH3)2").unwrap(), expected_counts);

        let expected_counts = HashMap::from([
            ("K".to_string(), 4),
            ("Fe".to_string(), 1),
            ("C".to_string(), 6),
            ("N".to_string(), 6),
        ]);
        assert_eq!(parse_formula("K4Fe((CN)2)3").unwrap(), expected_counts);

        let expected_counts = HashMap::from([("H".to_string(), 2), ("O".to_string(), 1)]);
        assert_eq!(parse_formula("H2O(g)").unwrap(), expected_counts);
        assert_eq!(parse_formula(" H2 O ").unwrap(), expected_counts);
    }

    #[test]
    fn test_suffix_is_stripped() {
        assert_eq!(strip_suffix("H2_ref"), "H2");
        assert_eq!(strip_suffix("CO2_gas_2"), "CO2");
        assert_eq!(strip_suffix("CH4"), "CH4");
        assert_eq!(
            parse_formula("H2_ref").unwrap(),
            HashMap::from([("H".to_string(), 2)])
        );
    }

    #[test]
    fn test_invalid_formulas() {
        assert!(matches!(
            parse_formula(""),
            Err(ReferenceError::InvalidFormula { .. })
        ));
        assert!(matches!(
            parse_formula("_ref"),
            Err(ReferenceError::InvalidFormula { .. })
        ));
        assert!(matches!(
            parse_formula("Xx2"),
            Err(ReferenceError::UnknownElement { symbol, .. }) if symbol == "Xx"
        ));
        assert!(matches!(
            parse_formula("h2o"),
            Err(ReferenceError::InvalidFormula { .. })
        ));
        assert!(matches!(
            parse_formula("(CH3"),
            Err(ReferenceError::InvalidFormula { .. })
        ));
        assert!(matches!(
            parse_formula("CH3)2"),
            Err(ReferenceError::InvalidFormula { .. })
        ));
        assert!(matches!(
            parse_formula("H0"),
            Err(ReferenceError::InvalidFormula { .. })
        ));
    }

    #[test]
    fn test_huge_counts_are_rejected() {
        // each count fits in usize, the product or the sum does not
        assert!(matches!(
            parse_formula("(C9999999999999999999)2"),
            Err(ReferenceError::InvalidFormula { .. })
        ));
        assert!(matches!(
            parse_formula("C18446744073709551615C"),
            Err(ReferenceError::InvalidFormula { .. })
        ));
        assert!(matches!(
            parse_formula("C99999999999999999999"),
            Err(ReferenceError::InvalidFormula { .. })
        ));
        assert_eq!(
            parse_formula("(C1000000)1000").unwrap(),
            HashMap::from([("C".to_string(), 1_000_000_000)])
        );
    }

    #[test]
    fn test_atomic_order() {
        assert_eq!(atomic_number("H"), Some(1));
        assert_eq!(atomic_number("Cl"), Some(17));
        assert_eq!(atomic_number("Pt"), Some(78));
        assert_eq!(atomic_number("Q"), None);
        let composition = parse_formula("SNOCHO").unwrap();
        assert_eq!(sorted_symbols(&composition), vec!["H", "C", "N", "O", "S"]);
    }
}
