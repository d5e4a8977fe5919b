use std::path::{Path, PathBuf};

pub const AGENTZERO_DIR: &str = ".agentzero";
pub const CONFIG_FILE: &str = "config.yaml";
pub const DB_FILE: &str = "agentzero.db";

pub fn agentzero_dir(root: &Path) -> PathBuf {
    root.join(AGENTZERO_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    agentzero_dir(root).join(CONFIG_FILE)
}

pub fn db_path(root: &Path) -> PathBuf {
    agentzero_dir(root).join(DB_FILE)
}
