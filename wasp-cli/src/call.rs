//! `wasp call` and `wasp demo`.

use anyhow::{Context, Result, ensure};
use wasp::{Kind, Param, Value};

use crate::OutputFormat;

/// Arguments for `wasp call`.
///
/// Usage: `wasp call [OPTIONS] PLUGIN FUNCTION [ARG...]`
#[derive(clap::Args)]
pub struct CallArgs {
    /// Path to the plugin (.wasm or .wat).
    plugin: String,

    /// Exported function to call.
    function: String,

    /// Arguments: `i32:N`, `str:TEXT` or `hex:BYTES`. Bare integers are
    /// passed as i32, anything else as a string.
    #[arg(allow_negative_numbers = true)]
    args: Vec<String>,

    /// How to interpret the result.
    #[arg(long, short = 'r', default_value = "i32")]
    returns: ReturnKind,

    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

/// Result kinds selectable on the command line.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ReturnKind {
    Unit,
    I32,
    String,
    Bytes,
}

impl From<ReturnKind> for Kind {
    fn from(kind: ReturnKind) -> Self {
        match kind {
            ReturnKind::Unit => Self::Unit,
            ReturnKind::I32 => Self::I32,
            ReturnKind::String => Self::Str,
            ReturnKind::Bytes => Self::Bytes,
        }
    }
}

pub fn call(args: &CallArgs) -> Result<()> {
    let params = args
        .args
        .iter()
        .map(|a| a.parse::<Param>())
        .collect::<wasp::Result<Vec<_>>>()?;
    tracing::debug!(?params, "parsed arguments");

    let engine = crate::load("cli", &args.plugin)?;
    let mut instance = engine.get_instance("cli")?;
    let value = instance
        .call_value(&args.function, &params, args.returns.into())
        .with_context(|| format!("calling {}", args.function))?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Table => match value {
            Value::Unit => {}
            other => println!("{other}"),
        },
    }
    Ok(())
}

/// Exercises `sum`, `hello`, `reverse` and `callback`.
pub fn demo(plugin: &str) -> Result<()> {
    let engine = crate::load("demo", plugin)?;
    let mut instance = engine.get_instance("demo")?;

    let total: i32 = instance.call("sum", &[3.into(), 2.into()])?;
    println!("sum(3, 2)        = {total}");

    let greeting: String = instance.call("hello", &["Nic".into()])?;
    println!("hello(\"Nic\")     = {greeting}");

    let reversed: Vec<u8> = instance.call("reverse", &[vec![1, 2, 3].into()])?;
    ensure!(reversed == [3, 2, 1], "reverse returned {reversed:?}");
    println!("reverse([1,2,3]) = {reversed:?}");

    let reply: String = instance.call("callback", &[])?;
    println!("callback()       = {reply}");
    Ok(())
}
