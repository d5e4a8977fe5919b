use agentzero_core::{config::Config, io, paths};
use anyhow::Context;
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing Agent Zero in: {}", root.display());

    let dir = paths::agentzero_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let yaml = serde_yaml::to_string(&Config::default())?;
    let written = io::write_if_missing(&paths::config_path(root), yaml.as_bytes())
        .context("failed to write config.yaml")?;
    if written {
        println!("  created: .agentzero/config.yaml");
    } else {
        println!("  exists:  .agentzero/config.yaml");
    }

    println!();
    println!("Set GEMINI_API_KEY (or GEMINI_KEYS) and run `agentzero serve`.");
    Ok(())
}
