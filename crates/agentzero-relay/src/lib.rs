//! Native-messaging host for the Agent Zero browser extension.
//!
//! The extension's background worker connects over stdio; each message is
//! answered with an object carrying `success`. Settings and the last
//! analysis live in a small JSON store under the relay directory.

pub mod client;
pub mod dispatch;
pub mod error;
pub mod framing;
pub mod message;
pub mod normalize;
pub mod settings;

pub use dispatch::Relay;
pub use error::RelayError;
pub use settings::{Settings, SettingsStore};

pub type Result<T> = std::result::Result<T, RelayError>;
