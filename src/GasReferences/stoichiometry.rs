use super::errors::ReferenceError;
use super::formula::{Composition, parse_formula};
use super::reference_system::ReferenceAssignment;
use log::{debug, info, warn};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// coefficients below this are inversion noise
pub const ZERO_TOLERANCE: f64 = 1e-9;
// determinant magnitude under which the reference set is treated as degenerate
const SINGULAR_DETERMINANT: f64 = 1e-12;

/// Atomic composition matrix of a reference assignment and its inverse.
///
/// Row i is the composition of reference i, column j counts atoms of the element owned by
/// entry j. Row `index_of(element)` of the inverse expresses one atom of that element as a
/// combination of the reference molecules.
#[derive(Debug, Clone)]
pub struct StoichiometryMatrix {
    pub assignment: ReferenceAssignment,
    pub matrix: DMatrix<f64>,
    pub inverse: DMatrix<f64>,
    pub tolerance: f64,
}

impl StoichiometryMatrix {
    pub fn new(assignment: &ReferenceAssignment) -> Result<Self, ReferenceError> {
        info!("___________CREATE STOICHIOMETRY MATRIX___________");
        let n = assignment.len();
        if n == 0 {
            return Err(ReferenceError::InvalidAssignment(
                "no references assigned".to_string(),
            ));
        }
        // a later entry for the same element takes over its column
        let mut key_index: HashMap<&str, usize> = HashMap::new();
        for (i, (element, _)) in assignment.iter().enumerate() {
            key_index.insert(element.as_str(), i);
        }

        let mut matrix: DMatrix<f64> = DMatrix::zeros(n, n);
        for (i, (_, reference)) in assignment.iter().enumerate() {
            // parse_formula drops suffixes like _ref or _gas
            let composition = parse_formula(reference)?;
            for (element, count) in composition.iter() {
                let Some(&j) = key_index.get(element.as_str()) else {
                    return Err(ReferenceError::UnassignedElement {
                        reference: reference.clone(),
                        element: element.clone(),
                    });
                };
                matrix[(i, j)] += *count as f64;
            }
        }
        debug!("stoichiometry matrix {}", matrix);

        let singular = || ReferenceError::SingularMatrix {
            references: assignment.references(),
        };
        if matrix.determinant().abs() < SINGULAR_DETERMINANT {
            warn!("degenerate reference set {:?}", assignment.references());
            return Err(singular());
        }
        let inverse = matrix.clone().try_inverse().ok_or_else(singular)?;
        debug!("inverse stoichiometry matrix {}", inverse);
        info!("___________CREATE STOICHIOMETRY MATRIX ENDED___________");
        Ok(Self {
            assignment: assignment.clone(),
            matrix,
            inverse,
            tolerance: ZERO_TOLERANCE,
        })
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// The inverse as row-major nested vectors
    pub fn inverse_rows(&self) -> Vec<Vec<f64>> {
        self.inverse
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }

    fn accumulate(
        &self,
        adsorbate: &str,
        composition: &Composition,
    ) -> Result<BTreeMap<String, f64>, ReferenceError> {
        let mut factors: BTreeMap<String, f64> = BTreeMap::new();
        for (element, count) in composition {
            let row = self.assignment.index_of(element).ok_or_else(|| {
                ReferenceError::MissingElement {
                    adsorbate: adsorbate.to_string(),
                    element: element.clone(),
                }
            })?;
            for (col, (_, reference)) in self.assignment.iter().enumerate() {
                *factors.entry(reference.clone()).or_insert(0.0) +=
                    *count as f64 * self.inverse[(row, col)];
            }
        }
        factors.retain(|_, factor| factor.abs() >= self.tolerance);
        Ok(factors)
    }

    /// reference molecule -> coefficient for one adsorbate, numerically zero entries dropped
    pub fn factors_for(&self, adsorbate: &str) -> Result<BTreeMap<String, f64>, ReferenceError> {
        let composition = parse_formula(adsorbate)?;
        self.accumulate(adsorbate, &composition)
    }

    /// Factors for a batch of adsorbates. An adsorbate that cannot be expressed in this
    /// reference system is recorded as a failure and does not affect the others.
    pub fn factors<S: AsRef<str>>(&self, adsorbates: &[S]) -> StoichiometryFactors {
        let mut result = StoichiometryFactors::default();
        for adsorbate in adsorbates.iter().map(|a| a.as_ref()) {
            match self.factors_for(adsorbate) {
                Ok(factors) => {
                    debug!("{}: {:?}", adsorbate, factors);
                    result.factors.insert(adsorbate.to_string(), factors);
                }
                Err(e) => {
                    warn!("no stoichiometry factors for {}: {}", adsorbate, e);
                    result.failures.insert(adsorbate.to_string(), e.to_string());
                }
            }
        }
        result
    }
}

/// adsorbate -> {reference molecule -> coefficient}, plus adsorbates that failed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoichiometryFactors {
    pub factors: BTreeMap<String, BTreeMap<String, f64>>,
    /// adsorbate -> reason
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failures: BTreeMap<String, String>,
}

impl StoichiometryFactors {
    pub fn get(&self, adsorbate: &str) -> Option<&BTreeMap<String, f64>> {
        self.factors.get(adsorbate)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Energy of the reference combination equivalent to `adsorbate`:
    /// sum of coefficient * energy over its references
    pub fn reference_energy(
        &self,
        adsorbate: &str,
        energies: &HashMap<String, f64>,
    ) -> Result<f64, ReferenceError> {
        let factors = self.lookup(adsorbate)?;
        factors
            .iter()
            .try_fold(0.0, |total, (reference, factor)| -> Result<f64, ReferenceError> {
                let energy = energies.get(reference).ok_or_else(|| {
                    ReferenceError::MissingReferenceEnergy {
                        reference: reference.clone(),
                    }
                })?;
                Ok(total + factor * energy)
            })
    }

    /// Energy of `adsorbate` relative to its gas phase references
    pub fn relative_energy(
        &self,
        adsorbate: &str,
        energy: f64,
        energies: &HashMap<String, f64>,
    ) -> Result<f64, ReferenceError> {
        Ok(energy - self.reference_energy(adsorbate, energies)?)
    }

    /// Reaction forming `adsorbate` out of its references, e.g. "CH4 + H2O -> CO + 3H2"
    pub fn formation_equation(&self, adsorbate: &str) -> Result<String, ReferenceError> {
        let factors = self.lookup(adsorbate)?;
        let reactants: Vec<(String, f64)> = factors
            .iter()
            .filter(|(_, f)| **f > 0.0)
            .map(|(r, f)| (r.clone(), *f))
            .collect();
        let mut products: Vec<(String, f64)> = vec![(adsorbate.to_string(), 1.0)];
        products.extend(
            factors
                .iter()
                .filter(|(_, f)| **f < 0.0)
                .map(|(r, f)| (r.clone(), -*f)),
        );
        Ok(format!(
            "{} -> {}",
            equation_side(reactants),
            equation_side(products)
        ))
    }

    fn lookup(&self, adsorbate: &str) -> Result<&BTreeMap<String, f64>, ReferenceError> {
        self.factors
            .get(adsorbate)
            .ok_or_else(|| ReferenceError::NoFactors {
                adsorbate: adsorbate.to_string(),
            })
    }
}

// longest species first, "gas" shown as (g) and "star" as *
fn equation_side(mut species: Vec<(String, f64)>) -> String {
    species.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    species
        .into_iter()
        .map(|(name, factor)| {
            let name = name.replace("gas", "(g)").replace("star", "*");
            if (factor - 1.0).abs() < ZERO_TOLERANCE {
                name
            } else {
                format!("{}{}", format_factor(factor), name)
            }
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

fn format_factor(factor: f64) -> String {
    if (factor - factor.round()).abs() < ZERO_TOLERANCE {
        format!("{}", factor.round())
    } else {
        format!("{}", factor)
    }
}

/// Given a list of (element, molecule) references, return the inverted stoichiometry
/// matrix connecting atomic symbols to their molecular references, row-major
pub fn atomic_stoichiometry(
    assignment: &ReferenceAssignment,
) -> Result<Vec<Vec<f64>>, ReferenceError> {
    Ok(StoichiometryMatrix::new(assignment)?.inverse_rows())
}

/// Take a list of adsorbates and a reference assignment and return the stoichiometry
/// factors converting between adsorbates and reference molecules
pub fn stoichiometry_factors<S: AsRef<str>>(
    adsorbates: &[S],
    assignment: &ReferenceAssignment,
) -> Result<StoichiometryFactors, ReferenceError> {
    Ok(StoichiometryMatrix::new(assignment)?.factors(adsorbates))
}
