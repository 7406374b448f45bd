//! errorchain CLI — inspect and relay encoded error chains from the terminal.
//!
//! Usage:
//! ```bash
//! # Print the verbose report of an encoded chain
//! errorchain render --input error.json --mode verbose
//!
//! # Same, with every untrusted string masked
//! cat error.json | errorchain render --input - --mode redacted
//!
//! # Decode with no type knowledge and re-encode (lossless relay)
//! errorchain relay --input error.json
//! ```

mod config;
mod logging;

use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context};
use errorchain_codec::{ChainDecoder, ChainEncoder};
use errorchain_core::{EncodedNode, TypeRegistry};
use errorchain_render::{render, RenderMode};

use crate::config::CliConfig;
use crate::logging::init_tracing;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let (global, rest) = parse_global_flags(&args)?;

    let Some(command) = rest.first() else {
        print_usage();
        process::exit(1);
    };

    match command.as_str() {
        "render" => {
            let config = global.load_config()?;
            init_tracing(&config.log);
            cmd_render(&rest[1..], &config)
        }
        "relay" => {
            let config = global.load_config()?;
            init_tracing(&config.log);
            cmd_relay(&rest[1..], &config)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("errorchain {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            bail!("Unknown command: {other}")
        }
    }
}

fn print_usage() {
    println!("errorchain {}", env!("CARGO_PKG_VERSION"));
    println!("Render and relay encoded error chains\n");
    println!("USAGE:");
    println!("    errorchain [GLOBAL FLAGS] <COMMAND> [FLAGS]\n");
    println!("COMMANDS:");
    println!("    render    Decode an encoded chain and print it");
    println!("    relay     Decode with no type knowledge and re-encode");
    println!("    version   Print version");
    println!("    help      Print this help\n");
    println!("GLOBAL FLAGS:");
    println!("    --config <FILE>   JSON config file (log + codec sections)");
    println!("    --log-json        Emit logs as JSON on stderr\n");
    println!("RENDER FLAGS:");
    println!("    --input <FILE|->  Encoded chain (JSON); '-' reads stdin  [required]");
    println!("    --mode <MODE>     plain | quoted | verbose | redactable | redacted  [default: plain]\n");
    println!("RELAY FLAGS:");
    println!("    --input <FILE|->  Encoded chain (JSON); '-' reads stdin  [required]");
}

// ─── Global flags ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq, Eq)]
struct GlobalFlags {
    config: Option<PathBuf>,
    log_json: bool,
}

impl GlobalFlags {
    fn load_config(&self) -> anyhow::Result<CliConfig> {
        let mut config = match &self.config {
            Some(path) => CliConfig::load(path)?,
            None => CliConfig::default(),
        };
        if self.log_json {
            config.log.json = true;
        }
        Ok(config)
    }
}

/// Pull global flags out of `args`, wherever they appear, and return the
/// remaining arguments in order.
fn parse_global_flags(args: &[String]) -> anyhow::Result<(GlobalFlags, Vec<String>)> {
    let mut flags = GlobalFlags::default();
    let mut rest = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.get(i).context("--config requires a file path")?;
                flags.config = Some(PathBuf::from(path));
            }
            "--log-json" => flags.log_json = true,
            _ => rest.push(args[i].clone()),
        }
        i += 1;
    }
    Ok((flags, rest))
}

// ─── Commands ─────────────────────────────────────────────────────────────────

fn cmd_render(args: &[String], config: &CliConfig) -> anyhow::Result<()> {
    let mut input: Option<&str> = None;
    let mut mode = RenderMode::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input = args.get(i).map(|s| s.as_str());
            }
            "--mode" => {
                i += 1;
                let name = args.get(i).context("--mode requires a value")?;
                mode = name.parse()?;
            }
            flag => bail!("Unknown flag: {flag}"),
        }
        i += 1;
    }

    let Some(input) = input else {
        bail!("--input is required");
    };
    let text = read_input(input)?;

    let decoder = ChainDecoder::new().with_config(config.codec.clone());
    match decoder.decode_json(&text) {
        Some(node) => println!("{}", render(&*node, mode)),
        None => tracing::info!("input encodes no error"),
    }
    Ok(())
}

fn cmd_relay(args: &[String], config: &CliConfig) -> anyhow::Result<()> {
    let mut input: Option<&str> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input = args.get(i).map(|s| s.as_str());
            }
            flag => bail!("Unknown flag: {flag}"),
        }
        i += 1;
    }

    let Some(input) = input else {
        bail!("--input is required");
    };
    let text = read_input(input)?;
    let encoded = EncodedNode::from_json(&text).context("parsing encoded error")?;

    // No registered kinds: every layer passes through as an opaque stand-in.
    let registry = Arc::new(TypeRegistry::empty());
    let decoder = ChainDecoder::with_registry(Arc::clone(&registry)).with_config(config.codec.clone());
    let encoder = ChainEncoder::with_registry(registry).with_config(config.codec.clone());

    let relayed = match decoder.decode(&encoded) {
        Some(node) => encoder.encode(&*node),
        None => EncodedNode::Absent,
    };
    println!("{}", relayed.to_json_pretty()?);
    Ok(())
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(input).with_context(|| format!("reading {input}"))
}
