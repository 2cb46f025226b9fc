/// error type shared by the whole reference pipeline
pub mod errors;
/// formula string -> {element: number of atoms}, periodic table ordering
pub mod formula;
/// element universe of a set of molecules
pub mod symbols;
/// greedy selection of gas phase references for an adsorbate formula
/// # Examples
/// ```
/// use ThermoRef::GasReferences::reference_system::{construct_reference_system, DEFAULT_CANDIDATES};
/// // CHO is not a reference itself, so it is decomposed element by element,
/// // hydrogen last: CHO = CH4 + H2O - 2.5 H2
/// let system = construct_reference_system("CHO", &DEFAULT_CANDIDATES).unwrap();
/// assert_eq!(system.references(), vec!["CH4", "H2O", "H2"]);
/// assert_eq!(system.prefactors(), vec![1.0, 1.0, -2.5]);
/// // a molecule of the pool is its own reference
/// let system = construct_reference_system("CO2", &DEFAULT_CANDIDATES).unwrap();
/// assert_eq!(system.references(), vec!["CO2"]);
/// assert_eq!(system.prefactors(), vec![1.0]);
/// ```
pub mod reference_system;
/// inversion of the atomic composition matrix of a reference assignment and the
/// conversion of adsorbates into linear combinations of reference molecules
/// # Examples
/// ```
/// use ThermoRef::GasReferences::reference_system::{construct_reference_assignment, DEFAULT_CANDIDATES};
/// use ThermoRef::GasReferences::stoichiometry::stoichiometry_factors;
/// use ThermoRef::GasReferences::symbols::symbols_from_formulas;
/// use approx::assert_relative_eq;
/// let adsorbates = vec!["CO", "OH"];
/// let symbols = symbols_from_formulas(&adsorbates, true).unwrap();
/// assert_eq!(symbols, vec!["H", "C", "O"]);
/// let references = construct_reference_assignment(&symbols, &DEFAULT_CANDIDATES).unwrap();
/// assert_eq!(references.references(), vec!["H2", "CH4", "H2O"]);
/// let factors = stoichiometry_factors(&adsorbates, &references).unwrap();
/// let co = factors.get("CO").unwrap();
/// assert_relative_eq!(co["CH4"], 1.0, epsilon = 1e-9);
/// assert_relative_eq!(co["H2"], -3.0, epsilon = 1e-9);
/// assert_relative_eq!(co["H2O"], 1.0, epsilon = 1e-9);
/// assert_eq!(factors.formation_equation("CO").unwrap(), "CH4 + H2O -> CO + 3H2");
/// ```
pub mod stoichiometry;
/// tables and JSON output of a complete reference calculation
pub mod report;
mod stoichiometry_tests;
