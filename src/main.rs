//! zetopo - Level Zero accelerator discovery tool
//!
//! A command-line tool that runs one discovery pass over the Level Zero
//! runtime and prints the accelerator metadata it finds.

use clap::Parser;
use zetopo::cli::args::{generate_completions, Cli, Commands};
use zetopo::commands::run_discover;
use zetopo::error::AppError;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Set log level based on verbose flag
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    let result = run(&cli);

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    match &cli.command {
        Commands::Discover(args) => run_discover(args, cli.format),

        Commands::Completions { shell } => {
            generate_completions(*shell);
            Ok(())
        }
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    if let AppError::Ze(zetopo::error::ZeError::LibraryNotFound) = err {
        eprintln!();
        eprintln!("Hint: Make sure the Level Zero loader is installed.");
        eprintln!("      On Linux, install the level-zero (libze_loader) package.");
    }
}
