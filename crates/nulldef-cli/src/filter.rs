//! # Filter and Check Subcommands
//!
//! Load a policy and a document schema, decode the input, run the filtering
//! pass and report what survived.
//!
//! Policy settings are resolved in order: defaults, then `--config`, then
//! `--marker` and `--retain-empty`.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde_json::Value;

use nulldef_core::{Codec, DocumentSchema, EmptyCollections, FilterPolicy, Format, PolicyConfig};

/// Exit code when `check` finds the root discarded.
pub const EXIT_DISCARDED: u8 = 2;

/// Arguments shared by `nulldef filter` and `nulldef check`.
#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Document schema (YAML or JSON).
    #[arg(long, value_name = "PATH")]
    pub schema: PathBuf,

    /// Schema type of the document root.
    #[arg(long, value_name = "TYPE")]
    pub root: String,

    /// Policy configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Tag that marks mandatory fields and types.
    #[arg(long)]
    pub marker: Option<String>,

    /// Accept empty mandatory collections.
    #[arg(long)]
    pub retain_empty: bool,

    /// Output format for the filtered document.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,

    /// Input document. `-` reads JSON from stdin.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

/// Output format for `nulldef filter`.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

impl From<OutputFormat> for Format {
    fn from(output: OutputFormat) -> Self {
        match output {
            OutputFormat::Json => Format::Json,
            OutputFormat::Yaml => Format::Yaml,
        }
    }
}

/// Build the filter policy from the config file and flag overrides.
pub fn resolve_policy(args: &FilterArgs) -> Result<FilterPolicy> {
    let mut config = match &args.config {
        Some(path) => PolicyConfig::load(path)
            .with_context(|| format!("failed to load policy config {}", path.display()))?,
        None => PolicyConfig::default(),
    };

    if let Some(marker) = &args.marker {
        config.marker = marker.clone();
    }
    if args.retain_empty {
        config.empty_collections = EmptyCollections::Retain;
    }

    tracing::debug!(
        marker = %config.marker,
        empty_collections = ?config.empty_collections,
        "resolved filter policy"
    );
    config.into_policy().context("invalid filter policy")
}

/// Decode the input and filter it. `None` means the root was discarded.
pub fn filter_input(args: &FilterArgs) -> Result<Option<Value>> {
    let policy = resolve_policy(args)?;
    let schema = DocumentSchema::load(&args.schema)
        .with_context(|| format!("failed to load schema {}", args.schema.display()))?;

    let (source, format) = read_input(&args.input)?;
    let document: Option<Value> = format
        .decode(&source)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;

    policy
        .filter_document(&schema, &args.root, document.unwrap_or(Value::Null))
        .with_context(|| format!("cannot filter {} as {}", args.input.display(), args.root))
}

/// Render a filter result. A discarded root renders as `null`.
pub fn render(value: Option<&Value>, output: OutputFormat) -> Result<String> {
    let format = Format::from(output);
    let bytes = match value {
        Some(value) => format.encode(value)?,
        None => format.encode(&Value::Null)?,
    };
    let text = String::from_utf8(bytes).context("encoded output is not UTF-8")?;
    Ok(text.trim_end().to_string())
}

/// Execute `nulldef filter`.
pub fn run_filter(args: &FilterArgs) -> Result<u8> {
    let filtered = filter_input(args)?;
    if filtered.is_none() {
        tracing::info!(root = %args.root, "document root discarded");
    }
    println!("{}", render(filtered.as_ref(), args.output)?);
    Ok(0)
}

/// Execute `nulldef check`.
///
/// Returns exit code: 0 if the root survives, 2 if it was discarded.
pub fn run_check(args: &FilterArgs) -> Result<u8> {
    match filter_input(args)? {
        Some(_) => Ok(0),
        None => {
            tracing::info!(root = %args.root, "document root discarded");
            Ok(EXIT_DISCARDED)
        }
    }
}

fn read_input(path: &Path) -> Result<(Vec<u8>, Format)> {
    if path == Path::new("-") {
        let mut source = Vec::new();
        std::io::stdin()
            .read_to_end(&mut source)
            .context("failed to read stdin")?;
        return Ok((source, Format::Json));
    }
    let source =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok((source, Format::from_path(path)))
}
