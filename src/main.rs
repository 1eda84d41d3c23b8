use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, IsTerminal, Write};

use jsonnav::config::Config;
use jsonnav::file::loader::{load_file, load_stdin};
use jsonnav::{resolve, resolve_or, Resolved, Value};

/// jsonnav - Navigate JSON and YAML documents with dotted path strings
#[derive(Parser)]
#[command(name = "jsonnav")]
#[command(version)]
#[command(about = "Resolve a path such as a.b.2.c in a JSON or YAML document", long_about = None)]
struct Cli {
    /// Path to resolve, e.g. `users.0.name` or `users.:^.name`
    path: String,

    /// Document to read (omit or use `-` to read from stdin)
    file: Option<String>,

    /// Path separator (default from config, otherwise ".")
    #[arg(short, long)]
    separator: Option<String>,

    /// Broadcast marker (default from config, otherwise "^")
    #[arg(short, long)]
    marker: Option<String>,

    /// Field that receives mapping keys when broadcasting (default "__key")
    #[arg(short, long)]
    key_field: Option<String>,

    /// JSON value printed when a key or index is missing, instead of failing
    #[arg(short, long)]
    default: Option<String>,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,

    /// Print the resolved node's path and key to stderr
    #[arg(long)]
    show_path: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::load();

    let mut options = config.options.clone();
    if let Some(separator) = cli.separator {
        options.separator = separator;
    }
    if let Some(marker) = cli.marker {
        options.broadcast_marker = marker;
    }
    if let Some(key_field) = cli.key_field {
        options.key_field = key_field;
    }

    let document = match cli.file.as_deref() {
        Some("-") | None => {
            if io::stdin().is_terminal() {
                anyhow::bail!("No document given: pass a file or pipe one on stdin");
            }
            load_stdin()?
        }
        Some(file_path) => load_file(file_path)?,
    };

    let resolved = match cli.default {
        Some(default) => {
            let default: Value =
                serde_json::from_str(&default).context("--default must be valid JSON")?;
            resolve_or(&document, cli.path.as_str(), default, &options)?
        }
        None => resolve(&document, cli.path.as_str(), &options)?,
    };

    if cli.show_path {
        if let Resolved::Node(node) = &resolved {
            eprintln!("path: {}", node.path());
            eprintln!("key: {}", node.key().unwrap_or(""));
        }
    }

    let pretty = config.pretty && !cli.compact;
    let output = if pretty {
        serde_json::to_string_pretty(resolved.value())?
    } else {
        serde_json::to_string(resolved.value())?
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", output)?;
    stdout.flush()?;

    Ok(())
}
