use crate::output::print_json;
use agentzero_core::aggregate::{self, Signals};
use agentzero_core::config::{Config, Secrets};
use agentzero_core::{mcs, prompt};
use anyhow::Context;
use clap::Subcommand;
use gemini_client::{GeminiClient, KeyPool};
use serde_json::{json, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

const GEMINI_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum McsSubcommand {
    /// Score CI and review signals from a JSON file (`-` reads stdin)
    Aggregate {
        /// Signals file: {coderabbit, vercel, codecov, shadow_agent}
        file: PathBuf,
    },

    /// Ask Gemini for a merge verdict on a Git/CI context file (`-` reads stdin)
    Analyze {
        /// Context file: any JSON describing the pipeline run
        file: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: McsSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        McsSubcommand::Aggregate { file } => run_aggregate(&file, json),
        McsSubcommand::Analyze { file } => run_analyze(root, &file, json),
    }
}

fn read_input(file: &Path) -> anyhow::Result<String> {
    if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
}

fn run_aggregate(file: &Path, json: bool) -> anyhow::Result<()> {
    let raw = read_input(file)?;
    let signals: Signals = serde_json::from_str(&raw).context("invalid signals JSON")?;
    let score = aggregate::compute(&signals);

    if json {
        return print_json(&score);
    }

    println!("MCS: {} ({})", score.mcs, score.status);
    for line in &score.breakdown {
        println!("  {line}");
    }
    Ok(())
}

fn run_analyze(root: &Path, file: &Path, json: bool) -> anyhow::Result<()> {
    let raw = read_input(file)?;
    // Unparseable input is still sent, so the verdict explains the problem.
    let context: Value = serde_json::from_str(&raw)
        .unwrap_or_else(|e| json!({ "error": format!("Input parsing failed: {e}") }));

    let config = Config::load(root).context("failed to load config")?;
    let secrets = Secrets::from_env();
    if secrets.gemini_keys.is_empty() {
        anyhow::bail!("Missing GEMINI_API_KEY");
    }
    let http = reqwest::Client::builder().timeout(GEMINI_TIMEOUT).build()?;
    let client = GeminiClient::new(http, KeyPool::new(secrets.gemini_keys))
        .with_base_url(config.gemini.base_url)
        .with_model(config.gemini.model);

    let rt = tokio::runtime::Runtime::new()?;
    let verdict = match rt.block_on(client.generate(
        &prompt::failure_analysis_prompt(&context),
        None,
        None,
    )) {
        Ok(text) => mcs::interpret_failure_analysis(&text),
        Err(e) => {
            tracing::warn!("failure analysis request failed: {e}");
            mcs::failure_analysis_fallback(e)
        }
    };

    if json {
        return print_json(&verdict);
    }

    println!("MCS: {} ({})", field(&verdict, "mcs"), field(&verdict, "status"));
    println!("  {}", field(&verdict, "reasoning"));
    println!("  Suggested fix: {}", field(&verdict, "suggested_fix"));
    Ok(())
}

fn field(verdict: &Value, key: &str) -> String {
    match verdict.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}
