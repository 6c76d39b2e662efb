use clap::Parser;
use deskclean::cli::{Cli, run_cli};
use deskclean::logging::init_logging;
use deskclean::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        OutputFormatter::disable_colors();
    }

    match run_cli(&cli) {
        Ok(summary) => {
            if summary.is_empty() {
                OutputFormatter::warning(
                    "No operation selected. Use --sort, --dedupe or --remove-old <DAYS>.",
                );
            } else if !cli.quiet {
                OutputFormatter::run_summary(&summary);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
