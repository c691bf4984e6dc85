//! CLI for loading and calling wasp plugins.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

mod call;
mod inspect;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;
use wasp::{Callbacks, Engine, PluginConfig};

#[derive(Parser)]
#[command(name = "wasp", version, about = "Call WebAssembly plugins from the command line")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Call an exported function.
    Call(call::CallArgs),

    /// Run the demonstration exports of a guest built from `wasp-guest`.
    Demo {
        /// Path to the plugin (.wasm or .wat).
        plugin: String,
    },

    /// Show a plugin's imports and exports.
    Inspect {
        /// Path to the plugin (.wasm or .wat).
        plugin: String,

        /// Output format.
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Generate shell completion scripts.
    #[command(hide = true)]
    Completion {
        /// Target shell.
        shell: Shell,
    },
}

/// Output format for results and reports.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text.
    #[default]
    Table,
    /// Machine-readable JSON.
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = cli.dispatch() {
        eprintln!("wasp: {e:#}");
        std::process::exit(1);
    }
}

/// Logs to stderr; `RUST_LOG` overrides the verbosity flag.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn,wasp::guest=info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl Cli {
    fn dispatch(self) -> Result<()> {
        match self.command {
            Command::Call(args) => call::call(&args),
            Command::Demo { plugin } => call::demo(&plugin),
            Command::Inspect { plugin, format } => inspect::inspect(&plugin, format),
            Command::Completion { shell } => {
                clap_complete::generate(shell, &mut Self::command(), "wasp", &mut std::io::stdout());
                Ok(())
            }
        }
    }
}

/// Host callbacks the CLI offers every plugin.
fn callbacks() -> Callbacks {
    Callbacks::new().string(wasp_abi::ENV, wasp_abi::CALL_ME, |name| format!("Hello {name}"))
}

/// Builds an engine with `path` registered as `name`.
fn load(name: &str, path: &str) -> Result<Engine> {
    let mut engine = Engine::with_callbacks(callbacks());
    engine
        .register_plugin(name, Path::new(path), PluginConfig::new())
        .with_context(|| format!("failed to load plugin {path}"))?;
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn call_accepts_negative_arguments() {
        let cli = Cli::try_parse_from([
            "wasp", "call", "-r", "i32", "demo.wasm", "sum", "-3", "i32:4",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Call(_)));
    }
}
