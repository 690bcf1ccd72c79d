mod assembler;
mod codec;
mod commands;
mod component;
mod config;
mod diagnostics;
mod error;
mod formatter;
mod inline;
mod manifest;
mod merge;
mod page;
mod reference;
mod registry;
mod symbols;
mod toc;
mod watch;
mod xml_comment;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::Overrides;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "REFDOC_LOG";

#[derive(Parser)]
#[command(name = "refdoc", about = "Assemble API reference pages from extraction manifests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Config file to use instead of ./.refdoc.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge fragments, assemble pages, write pages, toc.yml and references.yml
    Build {
        /// Directory of extraction manifests
        #[arg(long)]
        input: Option<PathBuf>,
        /// Directory to write pages to
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run the pipeline without writing and report fragment conflicts
    Check {
        /// Directory of extraction manifests
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Build, then rebuild whenever manifests or config change
    Watch {
        /// Directory of extraction manifests
        #[arg(long)]
        input: Option<PathBuf>,
        /// Directory to write pages to
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Install the stderr fmt subscriber; `REFDOC_LOG` overrides the `info` default.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| return EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Build { input, output } => commands::build(&Overrides {
            config: cli.config,
            input,
            output,
        }),
        Commands::Check { input } => commands::check(&Overrides {
            config: cli.config,
            input,
            output: None,
        }),
        Commands::Watch { input, output } => watch::run(&Overrides {
            config: cli.config,
            input,
            output,
        }),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(2)
        },
    };
}
