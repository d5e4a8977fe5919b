pub mod aggregate;
pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod io;
pub mod kestra;
pub mod mcs;
pub mod models;
pub mod parse;
pub mod paths;
pub mod prompt;
pub mod types;
pub mod webhook;

pub use error::{AgentZeroError, Result};
