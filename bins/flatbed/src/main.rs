use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use flatbed_config_hcl::HclParser;
use flatbed_engine::error::EngineError;
use flatbed_engine::{Layout, TomlParser};

#[derive(Parser)]
#[command(name = "flatbed", about = "Fixed-width flat file codec")]
struct Cli {
    /// Path to the layout file (.toml or .hcl).
    #[arg(long, env = "FLATBED_LAYOUT")]
    layout: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a flat file into one JSON object per line.
    Decode {
        /// Input file; stdin when omitted.
        input: Option<PathBuf>,

        /// Log lines no record matches and keep going.
        #[arg(long)]
        skip_unmatched: bool,
    },
    /// Load the layout and print its records.
    Check,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    tracing::info!(layout = %cli.layout.display(), "loading layout");
    let layout = match Layout::load_with(&cli.layout, &[&TomlParser, &HclParser]) {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, "failed to load layout");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Decode {
            input,
            skip_unmatched,
        } => decode(&layout, input, skip_unmatched),
        Command::Check => check(&layout),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "flatbed failed");
        std::process::exit(1);
    }
}

fn decode(layout: &Layout, input: Option<PathBuf>, skip_unmatched: bool) -> Result<(), EngineError> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };
    let mut out = BufWriter::new(io::stdout().lock());

    let mut ctx = layout.new_context();
    let mut decoded = 0u64;
    let mut skipped = 0u64;

    for line in reader.lines() {
        let line = line?;
        match layout.decode_line(&mut ctx, &line) {
            Ok(matched) => {
                serde_json::to_writer(&mut out, &matched).map_err(io::Error::from)?;
                out.write_all(b"\n")?;
                decoded += 1;
            }
            Err(e) if skip_unmatched && e.is_unmatched() => {
                tracing::warn!(error = %e, "skipping line");
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    out.flush()?;

    tracing::info!(decoded, skipped, "decode finished");
    Ok(())
}

fn check(layout: &Layout) -> Result<(), EngineError> {
    let mut out = io::stdout().lock();
    for record in layout.records() {
        writeln!(
            out,
            "{}: width {}, {} identities, {} fields",
            record.name(),
            record.width(),
            record.identities().len(),
            record.fields().len()
        )?;
        for field in record.fields() {
            writeln!(out, "  {:<20} {:>4}  {}", field.name(), field.length(), field.converter())?;
        }
    }
    writeln!(out, "converters: {}", layout.converters().names().join(", "))?;
    Ok(())
}
