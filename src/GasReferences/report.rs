use super::errors::ReferenceError;
use super::reference_system::{ReferenceAssignment, ReferenceSystem};
use super::stoichiometry::{StoichiometryFactors, StoichiometryMatrix};
use super::symbols::symbols_from_formulas;
use crate::settings::ReferenceConfig;
use log::info;
use prettytable::{Cell, Row, Table, row};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything computed for a batch of adsorbates: element universe, reference
/// assignment, inverted stoichiometry matrix and the per-adsorbate factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceReport {
    pub adsorbates: Vec<String>,
    pub symbols: Vec<String>,
    pub references: ReferenceAssignment,
    pub stoichiometry: Vec<Vec<f64>>,
    pub stoichiometry_factors: StoichiometryFactors,
}

impl ReferenceReport {
    pub fn compute<S: AsRef<str>>(
        adsorbates: &[S],
        config: &ReferenceConfig,
    ) -> Result<Self, ReferenceError> {
        info!("___________REFERENCE REPORT___________");
        let symbols = symbols_from_formulas(adsorbates, config.add_hydrogen)?;
        let references = config.builder()?.assign(&symbols)?;
        let matrix = StoichiometryMatrix::new(&references)?.with_tolerance(config.zero_tolerance);
        let stoichiometry_factors = matrix.factors(adsorbates);
        Ok(Self {
            adsorbates: adsorbates.iter().map(|a| a.as_ref().to_string()).collect(),
            symbols,
            references,
            stoichiometry: matrix.inverse_rows(),
            stoichiometry_factors,
        })
    }

    pub fn to_json(&self) -> Result<String, ReferenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ReferenceError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn pretty_print(&self) {
        println!("__________symbols: {}__________", self.symbols.join(", "));
        assignment_table(&self.references).printstd();
        stoichiometry_table(&self.references, &self.stoichiometry).printstd();
        factors_table(&self.stoichiometry_factors).printstd();
        for failure in failures_lines(&self.stoichiometry_factors) {
            println!("{}", failure);
        }
    }
}

pub fn assignment_table(assignment: &ReferenceAssignment) -> Table {
    let mut table = Table::new();
    table.add_row(row!["element", "reference"]);
    for (element, reference) in assignment.iter() {
        table.add_row(row![element, reference]);
    }
    table
}

/// inverse stoichiometry matrix, rows labelled by element, columns by reference
pub fn stoichiometry_table(assignment: &ReferenceAssignment, rows: &[Vec<f64>]) -> Table {
    let mut table = Table::new();
    let mut header = vec![Cell::new("")];
    header.extend(assignment.references().iter().map(|r| Cell::new(r)));
    table.add_row(Row::new(header));
    for ((element, _), values) in assignment.iter().zip(rows) {
        let mut cells = vec![Cell::new(element)];
        cells.extend(values.iter().map(|v| Cell::new(&format!("{:.3}", v))));
        table.add_row(Row::new(cells));
    }
    table
}

pub fn factors_table(factors: &StoichiometryFactors) -> Table {
    let mut table = Table::new();
    table.add_row(row!["adsorbate", "reference", "factor", "formation"]);
    for (adsorbate, coefficients) in &factors.factors {
        let equation = factors.formation_equation(adsorbate).unwrap_or_default();
        for (i, (reference, factor)) in coefficients.iter().enumerate() {
            if i == 0 {
                table.add_row(row![adsorbate, reference, factor, equation]);
            } else {
                table.add_row(row!["", reference, factor, ""]);
            }
        }
    }
    table
}

/// greedy construction of one formula: reference, prefactor
pub fn system_table(system: &ReferenceSystem) -> Table {
    let mut table = Table::new();
    table.add_row(row!["element", "reference", "prefactor"]);
    for term in &system.terms {
        table.add_row(row![term.element, term.reference, term.prefactor]);
    }
    table
}

fn failures_lines(factors: &StoichiometryFactors) -> Vec<String> {
    factors
        .failures
        .iter()
        .map(|(adsorbate, reason)| format!("\x1b[31m{}: {}\x1b[0m", adsorbate, reason))
        .collect()
}
