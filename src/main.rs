use ThermoRef::cli::args;
use ThermoRef::cli::cli_main::{active_config, run, run_interactive_menu};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::process::ExitCode;

pub fn main() -> ExitCode {
    let cli = args::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)
    {
        eprintln!("logger not initialized: {}", e);
    }

    let outcome = active_config(&cli).and_then(|config| {
        if cli.is_interactive() {
            run_interactive_menu(config)
        } else {
            run(&cli, &config)
        }
    });
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31merror: {}\x1b[0m", e);
            ExitCode::FAILURE
        }
    }
}
