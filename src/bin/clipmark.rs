//! Command-line converter: reads HTML from a file or stdin and prints
//! Markdown, or the full conversion result as JSON.
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use clipmark::{convert_bytes, EnginePreference, Options};
use tracing_subscriber::EnvFilter;

/// Convert a captured web page to Markdown
#[derive(Parser, Debug)]
#[command(name = "clipmark")]
#[command(version)]
#[command(about = "Turn captured web pages into clean Markdown")]
struct Args {
    /// HTML file to convert; reads stdin when omitted or `-`
    input: Option<PathBuf>,

    /// URL the page was captured from, for resolving relative links
    #[arg(short, long)]
    base_url: Option<String>,

    /// CSS selector for the main content, tried before the built-in ones
    #[arg(short, long = "selector")]
    selectors: Vec<String>,

    /// Rendering engine
    #[arg(short, long, value_enum, default_value_t = Engine::Auto)]
    engine: Engine,

    /// Omit the YAML frontmatter
    #[arg(long)]
    no_frontmatter: bool,

    /// Print the whole result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Engine {
    Auto,
    Dom,
    Regex,
}

impl From<Engine> for EnginePreference {
    fn from(engine: Engine) -> Self {
        match engine {
            Engine::Auto => Self::Auto,
            Engine::Dom => Self::Dom,
            Engine::Regex => Self::Regex,
        }
    }
}

fn read_input(path: Option<&PathBuf>) -> Result<Vec<u8>> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        _ => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let html = read_input(args.input.as_ref())?;

    let options = Options {
        custom_selectors: args.selectors,
        engine: args.engine.into(),
        generate_frontmatter: !args.no_frontmatter,
        ..Options::default()
    };

    let result = convert_bytes(&html, args.base_url.as_deref(), &options).context("conversion failed")?;

    for warning in &result.warnings {
        tracing::warn!(%warning, "conversion degraded");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if !result.frontmatter.is_empty() {
            println!("{}", result.frontmatter);
        }
        println!("{}", result.markdown);
    }

    Ok(())
}
