pub mod cli;
pub mod commands;
pub mod typer;
pub mod utils;
