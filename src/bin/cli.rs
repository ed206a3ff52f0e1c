// src/bin/cli.rs
use bistro_menu::cli;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    cli::run()
}
