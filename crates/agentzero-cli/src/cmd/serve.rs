use agentzero_core::config::Config;
use anyhow::Context;
use std::path::Path;

/// Run the dashboard API until interrupted. The port defaults to
/// `server.port` from the config file.
pub fn run(root: &Path, port: Option<u16>) -> anyhow::Result<()> {
    let port = match port {
        Some(p) => p,
        None => {
            Config::load(root)
                .context("failed to load config")?
                .server
                .port
        }
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(agentzero_server::serve(root.to_path_buf(), port))
}
