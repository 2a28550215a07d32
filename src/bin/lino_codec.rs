//! Links notation objects codec CLI
//!
//! Inspect and normalise encoded value graphs.
//!
//! # Usage
//!
//! ```bash
//! # Decode and summarise
//! echo '(obj_0: array (int 1) obj_0)' | lino_codec check
//!
//! # Re-encode to canonical form (legacy aliases, label numbering)
//! lino_codec fmt --file graph.lino
//!
//! # Print the decoded value
//! lino_codec show --file graph.lino
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use lino_objects_codec::{planner, CodecConfig, Document, ObjectCodec};

#[derive(Parser)]
#[command(name = "lino_codec")]
#[command(version)]
#[command(about = "Decode, check and normalise links notation object graphs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML codec configuration (overrides LINO_CODEC_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode and report the shape of the graph
    Check {
        /// Input file (reads stdin if not provided)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Decode and re-encode in canonical form
    Fmt {
        /// Input file (reads stdin if not provided)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Decode and print the value
    Show {
        /// Input file (reads stdin if not provided)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_ref()).and_then(|config| {
        let codec = ObjectCodec::new(config);
        match cli.command {
            Commands::Check { file } => cmd_check(&codec, file, cli.format),
            Commands::Fmt { file } => cmd_fmt(&codec, file),
            Commands::Show { file } => cmd_show(&codec, file),
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn cmd_check(codec: &ObjectCodec, file: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let doc = decode_input(codec, file)?;
    let plan = planner::plan(&doc.heap, &doc.root)?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "root": doc.root.kind_name(),
                "composites": plan.reachable_count(),
                "labelled": plan.labelled_count(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Pretty => {
            println!(
                "{} {} root, {} composite(s), {} labelled",
                "OK".green().bold(),
                doc.root.kind_name(),
                plan.reachable_count(),
                plan.labelled_count()
            );
        }
    }
    Ok(())
}

fn cmd_fmt(codec: &ObjectCodec, file: Option<PathBuf>) -> Result<()> {
    let source = read_input(file)?;
    println!("{}", codec.reformat(&source)?);
    Ok(())
}

fn cmd_show(codec: &ObjectCodec, file: Option<PathBuf>) -> Result<()> {
    let doc = decode_input(codec, file)?;
    println!("{}", doc.heap.display(&doc.root));
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

fn load_config(path: Option<&PathBuf>) -> Result<CodecConfig> {
    match path {
        Some(path) => CodecConfig::load(path),
        None => CodecConfig::from_env(),
    }
}

fn decode_input(codec: &ObjectCodec, file: Option<PathBuf>) -> Result<Document> {
    let source = read_input(file)?;
    codec.decode(&source).context("Decode failed")
}

fn read_input(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => {
            std::fs::read_to_string(&path).with_context(|| format!("Failed to read '{}'", path.display()))
        }
        None => {
            if io::stdin().is_terminal() {
                bail!("No input provided. Use --file or pipe input via stdin.");
            }
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}
