/// command line arguments (clap)
pub mod args;
/// one-shot runs and the interactive menu
pub mod cli_main;
