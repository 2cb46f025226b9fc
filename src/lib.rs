#[allow(non_snake_case)]
pub mod GasReferences;
pub mod cli;
pub mod settings;
