use clap::Parser;
use wardboard::cli::{Cli, Commands};
use wardboard::config::Config;
use wardboard::{commands, logging};

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // The TUI owns the terminal, so its logs go to a file.
    let level = cli.log_level();
    let command = cli.command.unwrap_or(Commands::Tui);
    if matches!(command, Commands::Tui) {
        if let Err(e) = logging::init_file(level, &config.log_file) {
            eprintln!("Error: cannot open log file: {}", e);
            std::process::exit(1);
        }
    } else {
        logging::init_stderr(level);
    }

    if let Err(e) = commands::execute(command, &cli.config, config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
