use super::errors::ReferenceError;
use super::formula::{Composition, atom_count, parse_formula, sorted_symbols};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Gas phase molecules used as references when nothing else is requested, in priority order
pub const DEFAULT_CANDIDATES: [&str; 10] = [
    "H2", "H2O", "N2", "NH3", "CH4", "CO2", "CO", "H2S", "O2", "F2",
];

/// element -> references tried first for that element
pub const DEFAULT_PREFERENCES: &[(&str, &[&str])] = &[
    ("O", &["H2O", "O2"]),
    ("C", &["CH4", "CO2", "CO"]),
    ("N", &["N2", "NH3"]),
    ("S", &["H2S"]),
    ("H", &["H2"]),
    ("F", &["F2", "HF"]),
];

/// Upper bound on the number of passes of the greedy construction
pub const MAX_PASSES: usize = 10;

// a debt below this is treated as already paid
const ZERO_PREFACTOR: f64 = 1e-12;

pub fn default_candidates() -> Vec<String> {
    DEFAULT_CANDIDATES.iter().map(|c| c.to_string()).collect()
}

pub fn default_preferences() -> HashMap<String, Vec<String>> {
    DEFAULT_PREFERENCES
        .iter()
        .map(|(element, references)| {
            (
                element.to_string(),
                references.iter().map(|r| r.to_string()).collect(),
            )
        })
        .collect()
}

/// One reference molecule chosen for one element, with its multiplicity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTerm {
    /// the element whose debt this reference pays
    pub element: String,
    pub reference: String,
    pub prefactor: f64,
}

/// Result of the greedy construction: `formula` = sum of prefactor * reference over `terms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSystem {
    pub formula: String,
    pub terms: Vec<ReferenceTerm>,
}

impl ReferenceSystem {
    pub fn references(&self) -> Vec<String> {
        self.terms.iter().map(|t| t.reference.clone()).collect()
    }

    pub fn prefactors(&self) -> Vec<f64> {
        self.terms.iter().map(|t| t.prefactor).collect()
    }

    /// (element, reference) pairs in the order they were resolved
    pub fn assignment(&self) -> ReferenceAssignment {
        self.terms
            .iter()
            .map(|t| (t.element.clone(), t.reference.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Ordered (element, reference molecule) pairs. The order fixes rows and columns of the
/// stoichiometry matrix and must not be shuffled after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceAssignment {
    pairs: Vec<(String, String)>,
}

impl ReferenceAssignment {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    pub fn from_pairs<E: Into<String>, R: Into<String>>(pairs: Vec<(E, R)>) -> Self {
        pairs
            .into_iter()
            .map(|(element, reference)| (element.into(), reference.into()))
            .collect()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn elements(&self) -> Vec<String> {
        self.pairs.iter().map(|(e, _)| e.clone()).collect()
    }

    pub fn references(&self) -> Vec<String> {
        self.pairs.iter().map(|(_, r)| r.clone()).collect()
    }

    /// position of the first entry owned by `element`
    pub fn index_of(&self, element: &str) -> Option<usize> {
        self.pairs.iter().position(|(e, _)| e == element)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.pairs.iter()
    }
}

impl FromIterator<(String, String)> for ReferenceAssignment {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// Greedy constructor of gas phase reference systems over a candidate pool.
///
/// The pool order and the preference table are a fixed policy: different orders give
/// different, equally valid decompositions, so both are kept exactly as supplied.
#[derive(Debug, Clone)]
pub struct ReferenceBuilder {
    candidates: Vec<String>,
    preferences: HashMap<String, Vec<String>>,
    max_passes: usize,
}

impl Default for ReferenceBuilder {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
            preferences: default_preferences(),
            max_passes: MAX_PASSES,
        }
    }
}

impl ReferenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidates<S: AsRef<str>>(mut self, candidates: &[S]) -> Self {
        self.candidates = candidates.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    pub fn with_preferences(mut self, preferences: HashMap<String, Vec<String>>) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    fn pool_compositions(&self) -> Result<Vec<(String, Composition)>, ReferenceError> {
        self.candidates
            .iter()
            .map(|candidate| Ok((candidate.clone(), parse_formula(candidate)?)))
            .collect()
    }

    /// Candidates for `symbol`: preferred references first, then the rest of the pool in
    /// pool order. Only pool members that contain the element and were not chosen before.
    fn reference_list<'p>(
        &self,
        symbol: &str,
        pool: &'p [(String, Composition)],
        chosen: &HashSet<String>,
    ) -> Vec<&'p (String, Composition)> {
        let usable = |entry: &&'p (String, Composition)| {
            atom_count(&entry.1, symbol) > 0 && !chosen.contains(&entry.0)
        };
        let preferred: &[String] = self
            .preferences
            .get(symbol)
            .map(|p| p.as_slice())
            .unwrap_or(&[]);

        let mut ref_list: Vec<&'p (String, Composition)> = preferred
            .iter()
            .filter_map(|name| pool.iter().find(|(candidate, _)| candidate == name))
            .filter(usable)
            .collect();
        for entry in pool.iter().filter(usable) {
            if !ref_list.iter().any(|listed| listed.0 == entry.0) {
                ref_list.push(entry);
            }
        }
        ref_list
    }

    fn no_reference(&self, element: &str, formula: &str) -> ReferenceError {
        ReferenceError::NoReferenceFound {
            element: element.to_string(),
            formula: formula.to_string(),
            candidates: self.candidates.clone(),
        }
    }

    /// Construct gas phase references for `formula` from the candidate pool.
    ///
    /// Elements are resolved one pass at a time, hydrogen last: most references bring
    /// hydrogen along, so by the time hydrogen is resolved its debt already includes
    /// everything the other references contributed. A reference that introduces a new
    /// element schedules that element for the next pass.
    pub fn construct(&self, formula: &str) -> Result<ReferenceSystem, ReferenceError> {
        info!("___________CONSTRUCT REFERENCE SYSTEM FOR {}___________", formula);
        let composition = parse_formula(formula)?;
        let mut symbols = sorted_symbols(&composition);
        if let Some(h) = symbols.iter().position(|s| s == "H") {
            let hydrogen = symbols.remove(h);
            symbols.push(hydrogen);
        }

        // a molecule from the pool is its own reference
        if self.candidates.iter().any(|c| c == formula) {
            debug!("{} is a reference itself", formula);
            return Ok(ReferenceSystem {
                formula: formula.to_string(),
                terms: vec![ReferenceTerm {
                    element: symbols[0].clone(),
                    reference: formula.to_string(),
                    prefactor: 1.0,
                }],
            });
        }

        let pool = self.pool_compositions()?;
        let mut pending: Vec<String> = symbols;
        let mut counts: HashMap<String, f64> = HashMap::new();
        let mut terms: Vec<ReferenceTerm> = Vec::new();
        let mut chosen: HashSet<String> = HashSet::new();
        let mut passes = 0;

        while !pending.is_empty() && passes < self.max_passes {
            let mut resolved: Vec<String> = Vec::new();
            let mut introduced: Vec<String> = Vec::new();
            for symbol in pending.iter() {
                let ref_list = self.reference_list(symbol, &pool, &chosen);
                let Some(&(reference, ref_composition)) = ref_list.first() else {
                    return Err(self.no_reference(symbol, formula));
                };

                let required = atom_count(&composition, symbol) as f64;
                let supplied = counts.get(symbol).copied().unwrap_or(0.0);
                let prefactor = (required - supplied) / atom_count(ref_composition, symbol) as f64;
                if prefactor.abs() < ZERO_PREFACTOR {
                    debug!("{} already balanced by previous references", symbol);
                    resolved.push(symbol.clone());
                    continue;
                }

                for (element, count) in ref_composition {
                    *counts.entry(element.clone()).or_insert(0.0) += prefactor * *count as f64;
                }
                debug!("{}: {} x {}", symbol, prefactor, reference);
                chosen.insert(reference.clone());
                terms.push(ReferenceTerm {
                    element: symbol.clone(),
                    reference: reference.clone(),
                    prefactor,
                });
                resolved.push(symbol.clone());

                for element in sorted_symbols(ref_composition) {
                    if element == *symbol || introduced.contains(&element) {
                        continue;
                    }
                    if !pending.contains(&element) || resolved.contains(&element) {
                        introduced.push(element);
                    }
                }
            }
            pending.retain(|symbol| !resolved.contains(symbol));
            for element in introduced {
                if !pending.contains(&element) {
                    pending.push(element);
                }
            }
            passes += 1;
            debug!("pass {} done, unresolved {:?}", passes, pending);
        }

        if !pending.is_empty() {
            return Err(ReferenceError::UnresolvedResidual {
                formula: formula.to_string(),
                residual: pending,
                passes,
            });
        }
        info!(
            "references for {}: {:?}",
            formula,
            terms
                .iter()
                .map(|t| (t.reference.as_str(), t.prefactor))
                .collect::<Vec<_>>()
        );
        Ok(ReferenceSystem {
            formula: formula.to_string(),
            terms,
        })
    }

    /// Assigns one reference molecule to every element of an element universe.
    ///
    /// A reference qualifies for an element if it contains it and all its other elements
    /// already own a reference, so the composition matrix comes out triangular.
    /// Hydrogen-bearing references win over the preference table, which wins over pool
    /// order. An element with no qualifying reference yet is retried after the others
    /// of the pass; pairs come out in the order they were assigned.
    pub fn assign<S: AsRef<str>>(
        &self,
        symbols: &[S],
    ) -> Result<ReferenceAssignment, ReferenceError> {
        info!("___________ASSIGN REFERENCES TO ELEMENTS___________");
        let pool = self.pool_compositions()?;
        let universe: String = symbols.iter().map(|s| s.as_ref()).collect();
        let mut pending: Vec<String> = Vec::new();
        for symbol in symbols.iter().map(|s| s.as_ref()) {
            if !pending.iter().any(|p| p == symbol) {
                pending.push(symbol.to_string());
            }
        }
        let mut assigned: Vec<String> = Vec::new();
        let mut chosen: HashSet<String> = HashSet::new();
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut passes = 0;

        while !pending.is_empty() {
            let waiting = pending.len();
            let mut deferred: Vec<String> = Vec::new();
            for symbol in pending {
                let ref_list = self.reference_list(&symbol, &pool, &chosen);
                if ref_list.is_empty() {
                    return Err(self.no_reference(&symbol, &universe));
                }
                let mut eligible: Vec<&(String, Composition)> = ref_list
                    .into_iter()
                    .filter(|(_, composition)| {
                        composition
                            .keys()
                            .all(|element| *element == symbol || assigned.contains(element))
                    })
                    .collect();
                // stable: preference and pool order survive inside both groups
                eligible.sort_by_key(|(_, composition)| atom_count(composition, "H") == 0);
                let Some((reference, _)) = eligible.first() else {
                    debug!("{} waits for other elements", symbol);
                    deferred.push(symbol);
                    continue;
                };
                debug!("{} -> {}", symbol, reference);
                chosen.insert(reference.clone());
                pairs.push((symbol.clone(), reference.clone()));
                assigned.push(symbol);
            }
            passes += 1;
            // a pass without a single assignment will not be followed by one
            if deferred.len() == waiting {
                return Err(ReferenceError::UnresolvedResidual {
                    formula: universe,
                    residual: deferred,
                    passes,
                });
            }
            pending = deferred;
        }
        info!("reference assignment {:?}", pairs);
        Ok(ReferenceAssignment::new(pairs))
    }
}

/// Construct appropriate gas phase references for `formula` from `candidates`, with the
/// default preference table and pass cap.
pub fn construct_reference_system<S: AsRef<str>>(
    formula: &str,
    candidates: &[S],
) -> Result<ReferenceSystem, ReferenceError> {
    ReferenceBuilder::new()
        .with_candidates(candidates)
        .construct(formula)
}

/// Reference assignment for a whole element universe, see [`ReferenceBuilder::assign`]
pub fn construct_reference_assignment<S: AsRef<str>, C: AsRef<str>>(
    symbols: &[S],
    candidates: &[C],
) -> Result<ReferenceAssignment, ReferenceError> {
    ReferenceBuilder::new()
        .with_candidates(candidates)
        .assign(symbols)
}
