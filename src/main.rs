use clap::Parser;
use ecotyper::{
    cli::{init_verbose, Cli, FULL_VERSION},
    commands::{check, typing},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let mode = if cli.check { "check" } else { "typing" };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        mode
    );
    if cli.check {
        check::check(&cli)?;
    } else {
        typing::ecotyper(cli)?;
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
