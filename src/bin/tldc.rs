//! tldc: compiles a directory of INI-style rule source files into a binary
//! `.tld` rule file, with optional C source and JSON side-output.

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "tldc")]
#[command(author = "Kaitu.io")]
#[command(version)]
#[command(about = "Compile public-suffix rule sources into a binary lookup file", long_about = None)]
struct Cli {
    /// Directory of `*.ini` rule source files.
    #[arg(long)]
    source: PathBuf,

    /// Output path for the compiled binary rule file.
    #[arg(long)]
    output: PathBuf,

    /// Also emit a C `static const unsigned char[]` source file.
    #[arg(long)]
    c_file: Option<PathBuf>,

    /// Also emit a JSON description of every compiled rule.
    #[arg(long)]
    output_json: bool,

    /// Include byte offsets in the JSON side-output.
    #[arg(long)]
    include_offsets: bool,

    /// Reload and validate the file that was just written.
    #[arg(long)]
    verify: bool,

    #[arg(short, long)]
    verbose: bool,
}

/// One enumerated rule, shaped for `--output-json`.
#[derive(Serialize)]
struct RuleJson {
    name: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description_index: Option<u16>,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&cli) {
        eprintln!("tldc: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    log::info!("compiling rule sources from {}", cli.source.display());
    let bytes = tldrs::compile_directory(&cli.source, timestamp)?;
    fs::write(&cli.output, &bytes)?;
    println!("wrote {} ({} bytes)", cli.output.display(), bytes.len());

    if let Some(c_path) = &cli.c_file {
        let symbol = c_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("tld_data")
            .replace(['-', '.'], "_");
        let source = tldrs::compiler::to_c_source(&bytes, &symbol);
        fs::write(c_path, source)?;
        println!("wrote {}", c_path.display());
    }

    if cli.output_json {
        let loaded = tldrs::LoadedRules::from_bytes(&bytes)?;
        let mut entries = Vec::new();
        let mut it = tldrs::Enumerator::new(&loaded);
        loop {
            match it.next() {
                Ok(rule) => entries.push(RuleJson {
                    name: rule.name,
                    status: tldrs::status_to_string(rule.status),
                    description_index: cli.include_offsets.then_some(rule.description_index),
                }),
                Err(_) => break,
            }
        }
        let json_path = cli.output.with_extension("json");
        fs::write(&json_path, serde_json::to_string_pretty(&entries)?)?;
        println!("wrote {}", json_path.display());
    }

    if cli.verify {
        tldrs::LoadedRules::open(&cli.output)?;
        println!("verified {}", cli.output.display());
    }

    Ok(())
}
