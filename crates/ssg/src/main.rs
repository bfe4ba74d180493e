//! ssg CLI - static site generator.
//!
//! Provides commands for:
//! - `build`: Render the content tree into the output directory

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::BuildArgs;
use error::CliError;
use output::Output;

/// ssg - static site generator.
#[derive(Parser)]
#[command(name = "ssg", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every source file through its layouts into the output directory.
    Build(BuildArgs),
}

/// `--verbose` enables INFO level, otherwise use `RUST_LOG` or default to WARN.
fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Build(args) if args.verbose);
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose))
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => tokio::runtime::Runtime::new()
            .map_err(CliError::from)
            .and_then(|rt| rt.block_on(args.execute(&output))),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_log_filter_levels() {
        // SAFETY: no other test in this crate reads or writes RUST_LOG.
        unsafe { std::env::remove_var("RUST_LOG") };
        assert_eq!(log_filter(false).to_string(), "warn");
        assert_eq!(log_filter(true).to_string(), "info");

        unsafe { std::env::set_var("RUST_LOG", "debug") };
        assert_eq!(log_filter(false).to_string(), "debug");
        assert_eq!(log_filter(true).to_string(), "info");
        unsafe { std::env::remove_var("RUST_LOG") };
    }
}
