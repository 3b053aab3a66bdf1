pub mod cli;
pub mod columns;
pub mod dataset;
pub mod matrices;
pub mod network;
pub mod retrieval;
pub mod symbolic;

use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

pub fn main() {
    if let Err(err) = TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("failed to initialize the logger: {err}");
    }
    cli::run_interactive_menu();
}
