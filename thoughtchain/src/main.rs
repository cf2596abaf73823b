//! thoughtchain CLI entry point.
//!
//! With no subcommand (or `serve`) the binary runs the stdio MCP server.
//! `check-config` prints the effective limits and exits.

use clap::{Parser, Subcommand};

use thoughtchain::cli::{CheckConfigArgs, ServeArgs};
use thoughtchain::stdio::run_server;

// ─────────────────────────────────────────────────────────────────────────────
// CLI Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// thoughtchain: sequential reasoning chains as an MCP tool.
#[derive(Parser)]
#[command(name = "thoughtchain", version, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the sequential_thinking tool over stdio (the default).
    Serve(ServeArgs),
    /// Resolve configuration, print the effective limits, and exit.
    CheckConfig(CheckConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry Point
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match cli.command.unwrap_or(Commands::Serve(cli.serve)) {
        Commands::Serve(args) => {
            init_tracing(args.verbose);
            serve(args).await
        }
        Commands::CheckConfig(args) => {
            init_tracing(false);
            check_config(args)
        }
    };

    std::process::exit(code);
}

async fn serve(args: ServeArgs) -> i32 {
    let config = match args.limits.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            eprintln!("thoughtchain: {e}");
            return 2;
        }
    };
    tracing::debug!(
        max_thought_length = config.max_thought_length,
        max_thoughts = config.max_thoughts,
        timeout_ms = config.operation_timeout.map(|d| d.as_millis() as u64),
        "configuration resolved"
    );

    match run_server(config).await {
        Ok(_) => 0,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            eprintln!("thoughtchain: {e}");
            1
        }
    }
}

fn check_config(args: CheckConfigArgs) -> i32 {
    match args.limits.resolve() {
        Ok(config) => {
            let timeout = config
                .operation_timeout
                .map(|d| humantime::format_duration(d).to_string())
                .unwrap_or_else(|| "none".to_string());
            println!("max_thought_length: {}", config.max_thought_length);
            println!("max_thoughts: {}", config.max_thoughts);
            println!("timeout: {timeout}");
            0
        }
        Err(e) => {
            eprintln!("thoughtchain check-config: {e}");
            2
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracing Init
// ─────────────────────────────────────────────────────────────────────────────

/// Initialise tracing subscriber with stderr output.
///
/// When `verbose` is true, sets filter to `debug`. Otherwise, respects
/// `RUST_LOG` (defaulting to no output). Stdout is reserved for frames.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
