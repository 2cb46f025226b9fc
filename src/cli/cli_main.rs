use super::args::Cli;
use crate::GasReferences::errors::ReferenceError;
use crate::GasReferences::formula::parse_formula;
use crate::GasReferences::report::{ReferenceReport, system_table};
use crate::settings::{DEFAULT_CONFIG_FILE, ReferenceConfig};
use log::info;
use std::io::{self, Write};

/// Configuration named on the command line, or reference_config.json if it exists
pub fn active_config(cli: &Cli) -> Result<ReferenceConfig, ReferenceError> {
    let mut config = match &cli.config {
        Some(path) => ReferenceConfig::load(path)?,
        None => ReferenceConfig::load_or_default(DEFAULT_CONFIG_FILE),
    };
    if cli.no_hydrogen {
        config.add_hydrogen = false;
    }
    Ok(config)
}

/// One-shot mode: everything requested on the command line, then exit
pub fn run(cli: &Cli, config: &ReferenceConfig) -> Result<(), ReferenceError> {
    if let Some(path) = &cli.write_config {
        config.save(path)?;
        info!("configuration written to {}", path.display());
        return Ok(());
    }
    if !cli.construct.is_empty() {
        let builder = config.builder()?;
        for formula in &cli.construct {
            let system = builder.construct(formula)?;
            println!("__________{}__________", formula);
            system_table(&system).printstd();
        }
    }
    if !cli.adsorbates.is_empty() {
        let report = ReferenceReport::compute(&cli.adsorbates, config)?;
        if cli.json {
            println!("{}", report.to_json()?);
        } else {
            report.pretty_print();
        }
        if let Some(path) = &cli.output {
            report.save(path)?;
            info!("report written to {}", path.display());
        }
    }
    Ok(())
}

pub fn run_interactive_menu(mut config: ReferenceConfig) -> Result<(), ReferenceError> {
    loop {
        show_main_menu()?;
        let Some(choice) = get_user_input()? else {
            break;
        };
        let outcome = match choice.trim() {
            "1" => factors_dialog(&config),
            "2" => construct_dialog(&config),
            "3" => add_candidate_dialog(&mut config),
            "4" => {
                println!("{}", serde_json::to_string_pretty(&config)?);
                Ok(())
            }
            "5" => config.save(DEFAULT_CONFIG_FILE).map(|_| {
                println!("configuration saved to {}", DEFAULT_CONFIG_FILE);
            }),
            "0" => {
                println!("Goodbye!");
                break;
            }
            _ => {
                println!("Invalid choice. Please try again.");
                Ok(())
            }
        };
        // a bad formula should not end the session
        if let Err(e) = outcome {
            if matches!(e, ReferenceError::Io(_)) {
                return Err(e);
            }
            println!("\x1b[31m{}\x1b[0m", e);
        }
    }
    Ok(())
}

/* colors
Blue (\x1b[34m) - header
Yellow (\x1b[33m) - menu options
Cyan (\x1b[36m) - prompts
Red (\x1b[31m) - errors
*/
fn show_main_menu() -> io::Result<()> {
    println!(
        "\x1b[34m\n ThermoRef: gas phase references and stoichiometry factors for adsorbates \n\x1b[0m"
    );
    println!("\x1b[33m1. Stoichiometry factors for adsorbates\x1b[0m");
    println!("\x1b[33m2. Reference system of a formula\x1b[0m");
    println!("\x1b[33m3. Add candidate reference\x1b[0m");
    println!("\x1b[33m4. Show configuration\x1b[0m");
    println!("\x1b[33m5. Save configuration\x1b[0m");
    println!("\x1b[33m0. Exit\x1b[0m");
    prompt("Enter your choice: ")
}

fn prompt(text: &str) -> io::Result<()> {
    print!("\x1b[36m{}\x1b[0m", text);
    io::stdout().flush()
}

/// None at end of input
fn get_user_input() -> io::Result<Option<String>> {
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input))
}

fn read_formulas(text: &str) -> Result<Vec<String>, ReferenceError> {
    prompt(text)?;
    let input = get_user_input()?.unwrap_or_default();
    Ok(input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect())
}

fn factors_dialog(config: &ReferenceConfig) -> Result<(), ReferenceError> {
    let adsorbates = read_formulas("Adsorbates (e.g. CO OCHO NH): ")?;
    if adsorbates.is_empty() {
        return Ok(());
    }
    ReferenceReport::compute(&adsorbates, config)?.pretty_print();
    Ok(())
}

fn construct_dialog(config: &ReferenceConfig) -> Result<(), ReferenceError> {
    let builder = config.builder()?;
    for formula in read_formulas("Formula: ")? {
        let system = builder.construct(&formula)?;
        println!("__________{}__________", formula);
        system_table(&system).printstd();
    }
    Ok(())
}

fn add_candidate_dialog(config: &mut ReferenceConfig) -> Result<(), ReferenceError> {
    for candidate in read_formulas("New reference molecules (e.g. HCl): ")? {
        parse_formula(&candidate)?;
        if config.candidates.contains(&candidate) {
            println!("{} is already a candidate", candidate);
            continue;
        }
        println!("{} added", candidate);
        config.candidates.push(candidate);
    }
    Ok(())
}
