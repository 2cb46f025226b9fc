use super::errors::ReferenceError;
use super::formula::{atomic_number, parse_formula};
use log::debug;
use std::collections::HashSet;

/// Takes a list of molecules and returns the distinct atomic symbols sorted by atomic number.
/// With `add_hydrogen` set, hydrogen is put in front of the list if none of the molecules
/// contains it: references are built around H2, so hydrogen has to be resolvable first.
pub fn symbols_from_formulas<S: AsRef<str>>(
    formulas: &[S],
    add_hydrogen: bool,
) -> Result<Vec<String>, ReferenceError> {
    let mut unique: HashSet<String> = HashSet::new();
    for formula in formulas {
        let composition = parse_formula(formula.as_ref())?;
        unique.extend(composition.into_keys());
    }
    let mut symbols: Vec<String> = unique.into_iter().collect();
    symbols.sort_by_key(|symbol| atomic_number(symbol).unwrap_or(usize::MAX));

    if add_hydrogen && !symbols.iter().any(|symbol| symbol == "H") {
        symbols.insert(0, "H".to_string());
    }
    debug!("element universe {:?}", symbols);
    Ok(symbols)
}
