use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "thermoref",
    about = "Gas phase reference systems and stoichiometry factors for adsorbates",
    version
)]
pub struct Cli {
    /// Adsorbate formulas, e.g. CO OCHO SNOCHO (interactive menu if none are given)
    #[arg(value_name = "ADSORBATE")]
    pub adsorbates: Vec<String>,

    /// Reference configuration (JSON); reference_config.json is used if present
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not add hydrogen to the element universe
    #[arg(long)]
    pub no_hydrogen: bool,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    pub json: bool,

    /// Save the report as JSON
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Greedy reference system of a single formula, repeatable
    #[arg(long, value_name = "FORMULA", action = clap::ArgAction::Append)]
    pub construct: Vec<String>,

    /// Write the active configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    pub write_config: Option<PathBuf>,

    /// Debug level logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// nothing to compute from the command line
    pub fn is_interactive(&self) -> bool {
        self.adsorbates.is_empty() && self.construct.is_empty() && self.write_config.is_none()
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
