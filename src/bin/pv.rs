//! Persistent value replay binary.
//!
//! Loads value registries and one accessor configuration, then processes
//! newline-delimited JSON messages from stdin. For every message a JSON line
//! `[primary, on_change]` is written to stdout (`null` for no output).
//! Values live in an in-memory context store for the lifetime of the
//! process.
//!
//! # Arguments / Environment Variables
//!
//! - `pv <registry-file> <accessor-file>` or
//! - `PV_REGISTRY`: registry file (YAML or JSON)
//! - `PV_ACCESSOR`: accessor configuration file (YAML or JSON)
//! - `PV_DEFAULT_STORAGE`: name of the default storage backend (optional)
//! - `RUST_LOG`: Tracing filter (default: "info,persistent_values=debug")
//!
//! # Usage
//!
//! ```bash
//! echo '{"payload": 5, "command": "write"}' | pv registry.yaml accessor.json
//! ```

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use persistent_values::{Accessor, AccessorConfig, LogSink, MemoryContextStore, Message, RegistryStore};

fn path_from(arg: Option<String>, var: &str) -> anyhow::Result<PathBuf> {
    match arg.or_else(|| std::env::var(var).ok()) {
        Some(path) => Ok(PathBuf::from(path)),
        None => bail!("missing argument: pass a path or set {}", var),
    }
}

fn load_accessor_config(path: &Path) -> anyhow::Result<AccessorConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read accessor configuration {}", path.display()))?;
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let config = if is_json {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,persistent_values=debug".into()),
        )
        .with_writer(io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let registry_path = path_from(args.next(), "PV_REGISTRY")?;
    let accessor_path = path_from(args.next(), "PV_ACCESSOR")?;

    let registries = RegistryStore::new();
    let loaded = registries
        .load_file(&registry_path)
        .with_context(|| format!("failed to load registries from {}", registry_path.display()))?;
    tracing::info!("Loaded {} registries from {}", loaded, registry_path.display());

    let config = load_accessor_config(&accessor_path)?;
    let store = match std::env::var("PV_DEFAULT_STORAGE") {
        Ok(name) if !name.is_empty() => MemoryContextStore::with_default_storage(name),
        _ => MemoryContextStore::new(),
    };
    let sink = LogSink::new(config.name.clone().unwrap_or_else(|| config.id.clone()));

    let accessor = Accessor::new(&config, &registries, Arc::new(store), Arc::new(sink))
        .context("accessor configuration rejected")?;
    tracing::info!("Accessor bound to store key '{}'", accessor.store_key());

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for (number, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let msg: Message = match serde_json::from_str(&line) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!("Skipping line {}: not a JSON object ({})", number + 1, e);
                continue;
            }
        };
        let outputs = accessor.on_input(msg).into_array();
        writeln!(stdout, "{}", serde_json::to_string(&outputs)?)?;
    }
    stdout.flush()?;
    Ok(())
}
