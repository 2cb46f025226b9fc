//! # Settings Module
//!
//! ## Purpose
//! Keeps everything that parameterizes a reference calculation in one serializable
//! structure: the candidate pool, the preference table, the pass cap of the greedy
//! construction and the tolerance below which stoichiometry factors are dropped.
//!
//! ## Configuration Format
//! ```json
//! {
//!   "candidates": ["H2", "H2O", "N2", "NH3", "CH4", "CO2", "CO", "H2S", "O2", "F2"],
//!   "preferences": { "O": ["H2O", "O2"], "C": ["CH4", "CO2", "CO"] },
//!   "max_passes": 10,
//!   "zero_tolerance": 1e-9,
//!   "add_hydrogen": true
//! }
//! ```
//! Missing fields take their default values, so a file with only `"candidates"` is valid.
//!
//! ## Usage
//! ```rust
//! use ThermoRef::settings::ReferenceConfig;
//!
//! let mut config = ReferenceConfig::default();
//! config.candidates.push("HCl".to_string());
//! let builder = config.builder().unwrap();
//! let system = builder.construct("SCl").unwrap();
//! assert_eq!(system.references(), vec!["H2S", "HCl", "H2"]);
//! ```

use crate::GasReferences::errors::ReferenceError;
use crate::GasReferences::formula::parse_formula;
use crate::GasReferences::reference_system::{
    MAX_PASSES, ReferenceBuilder, default_candidates, default_preferences,
};
use crate::GasReferences::stoichiometry::ZERO_TOLERANCE;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Default name of the configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "reference_config.json";

/// Parameters of a reference calculation.
///
/// # Fields
/// * `candidates` - gas phase molecules allowed as references, in priority order
/// * `preferences` - element -> references tried first for that element
/// * `max_passes` - pass cap of the greedy construction
/// * `zero_tolerance` - stoichiometry factors with smaller magnitude are dropped
/// * `add_hydrogen` - always include hydrogen in the element universe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub candidates: Vec<String>,
    pub preferences: HashMap<String, Vec<String>>,
    pub max_passes: usize,
    pub zero_tolerance: f64,
    pub add_hydrogen: bool,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
            preferences: default_preferences(),
            max_passes: MAX_PASSES,
            zero_tolerance: ZERO_TOLERANCE,
            add_hydrogen: true,
        }
    }
}

impl ReferenceConfig {
    /// Reads a configuration from a JSON file.
    ///
    /// # Returns
    /// * `Ok(ReferenceConfig)` - parsed and validated configuration
    /// * `Err(ReferenceError)` - the file is missing, is not valid JSON or fails validation
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: ReferenceConfig = serde_json::from_str(&content)?;
        config.validate()?;
        info!("reference configuration loaded from {}", path.as_ref().display());
        Ok(config)
    }

    /// Like [`ReferenceConfig::load`] but falls back to the defaults when the file does
    /// not exist or cannot be used.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        if !path.as_ref().exists() {
            return Self::default();
        }
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "ignoring configuration {}: {}",
                    path.as_ref().display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Writes the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ReferenceError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ReferenceError> {
        if self.candidates.is_empty() {
            return Err(ReferenceError::Config("candidate pool is empty".to_string()));
        }
        for candidate in &self.candidates {
            parse_formula(candidate)?;
        }
        if self.max_passes == 0 {
            return Err(ReferenceError::Config(
                "max_passes must be at least 1".to_string(),
            ));
        }
        if !self.zero_tolerance.is_finite() || self.zero_tolerance < 0.0 {
            return Err(ReferenceError::Config(format!(
                "zero_tolerance must be a non-negative number, got {}",
                self.zero_tolerance
            )));
        }
        Ok(())
    }

    /// Reference constructor parameterized by this configuration
    pub fn builder(&self) -> Result<ReferenceBuilder, ReferenceError> {
        self.validate()?;
        Ok(ReferenceBuilder::new()
            .with_candidates(&self.candidates)
            .with_preferences(self.preferences.clone())
            .with_max_passes(self.max_passes))
    }
}
