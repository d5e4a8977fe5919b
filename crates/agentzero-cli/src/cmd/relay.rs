use agentzero_relay::{Relay, SettingsStore};
use anyhow::Context;
use std::path::Path;

/// Speak the browser's native-messaging protocol on stdin/stdout. Logs go
/// to stderr so they never corrupt a frame.
pub fn run(dir: Option<&Path>, origin: Option<&str>) -> anyhow::Result<()> {
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => SettingsStore::default_dir()?,
    };
    let store = SettingsStore::open(&dir);
    tracing::info!(store = %store.path().display(), origin = origin.unwrap_or("-"), "relay starting");

    let relay = Relay::new(store).context("failed to build relay")?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(relay.serve(tokio::io::stdin(), tokio::io::stdout()))?;
    Ok(())
}
