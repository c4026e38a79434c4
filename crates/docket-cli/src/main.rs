//! # docket CLI entry point
//!
//! Parses command-line arguments, loads the pipeline configuration and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docket_cli::check::{run_check, CheckArgs};
use docket_cli::forums::{run_forums, ForumsArgs};
use docket_cli::generate::{run_generate, GenerateArgs};
use docket_cli::route::{run_route, RouteArgs};
use docket_pipeline::PipelineConfig;

/// Exit code for operational errors (bad input file, invalid config).
const EXIT_ERROR: u8 = 2;

/// Docket CLI
///
/// Checks whether a dispute's facts are sufficient, routes it to a forum,
/// and generates its documents in-process.
#[derive(Parser, Debug)]
#[command(name = "docket", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the pipeline configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report whether a fact snapshot is sufficient to route.
    Check(CheckArgs),

    /// Classify a fact snapshot and run the gate.
    Route(RouteArgs),

    /// Run the whole pipeline in-process and print the documents.
    Generate(GenerateArgs),

    /// List the built-in forums.
    Forums(ForumsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match PipelineConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let result = match cli.command {
        Commands::Check(args) => run_check(&args, &config),
        Commands::Route(args) => run_route(&args, &config),
        Commands::Generate(args) => run_generate(&args, &config),
        Commands::Forums(args) => run_forums(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_check() {
        let cli = Cli::try_parse_from(["docket", "check", "case.yaml"]).unwrap();
        assert_eq!(cli.verbose, 0);
        if let Commands::Check(args) = cli.command {
            assert_eq!(args.snapshot, PathBuf::from("case.yaml"));
        } else {
            panic!("expected check");
        }
    }

    #[test]
    fn cli_parse_route_with_options() {
        let cli = Cli::try_parse_from([
            "docket",
            "-vv",
            "route",
            "case.json",
            "--forum",
            "employment-tribunal",
            "--today",
            "2026-06-15",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        if let Commands::Route(args) = cli.command {
            assert_eq!(args.forum.as_deref(), Some("employment-tribunal"));
            assert_eq!(args.today, "2026-06-15".parse().ok());
        } else {
            panic!("expected route");
        }
    }

    #[test]
    fn cli_parse_global_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["docket", "generate", "case.yaml", "--config", "docket.yaml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("docket.yaml")));
        assert!(matches!(cli.command, Commands::Generate(_)));
    }

    #[test]
    fn cli_parse_forums_json() {
        let cli = Cli::try_parse_from(["docket", "forums", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Forums(ForumsArgs { json: true })));
    }

    #[test]
    fn cli_rejects_bad_date() {
        assert!(Cli::try_parse_from(["docket", "route", "case.yaml", "--today", "june"]).is_err());
    }

    #[test]
    fn cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["docket"]).is_err());
    }
}
