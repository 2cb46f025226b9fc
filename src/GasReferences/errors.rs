use thiserror::Error;

/// Everything that can go wrong while building a gas-phase reference system,
/// inverting its composition matrix or mapping adsorbates onto it.
///
/// None of these are retried internally: the same formula and the same candidate
/// pool always reproduce the same error, only a different pool changes the outcome.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("invalid formula '{formula}': {reason}")]
    InvalidFormula { formula: String, reason: String },

    #[error("unknown element '{symbol}' in formula '{formula}'")]
    UnknownElement { formula: String, symbol: String },

    /// No candidate of the pool contains the element, or all of them are already
    /// used by other elements. The caller has to supply a richer pool.
    #[error(
        "no gas phase reference found for {element} (formula {formula}); supplied references: {candidates:?}"
    )]
    NoReferenceFound {
        element: String,
        formula: String,
        candidates: Vec<String>,
    },

    /// Candidates existed but the greedy selection did not converge within the pass cap.
    #[error(
        "reference system for {formula} did not converge after {passes} passes, unresolved elements: {residual:?}"
    )]
    UnresolvedResidual {
        formula: String,
        residual: Vec<String>,
        passes: usize,
    },

    #[error("stoichiometry matrix of references {references:?} is singular")]
    SingularMatrix { references: Vec<String> },

    /// A reference molecule contains an element that no entry of the assignment owns,
    /// so its row cannot be placed in the square composition matrix.
    #[error("reference {reference} contains element {element} which has no reference of its own")]
    UnassignedElement { reference: String, element: String },

    #[error("invalid reference assignment: {0}")]
    InvalidAssignment(String),

    #[error("adsorbate {adsorbate} contains element {element} outside the reference assignment")]
    MissingElement { adsorbate: String, element: String },

    #[error("no stoichiometry factors computed for {adsorbate}")]
    NoFactors { adsorbate: String },

    #[error("no energy supplied for reference {reference}")]
    MissingReferenceEnergy { reference: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
