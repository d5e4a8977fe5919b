//! GitHub webhook signature verification (`X-Hub-Signature-256`).

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AgentZeroError, Result};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const EVENT_HEADER: &str = "x-github-event";
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

const PREFIX: &str = "sha256=";

/// Hex HMAC-SHA256 of `body` under `secret`, in the `sha256=<hex>` header form.
pub fn sign(secret: &[u8], body: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AgentZeroError::Signature(e.to_string()))?;
    mac.update(body);
    Ok(format!("{PREFIX}{}", hex::encode(mac.finalize().into_bytes())))
}

/// Check a `sha256=<hex>` header against the raw request body. The digest
/// comparison is constant time.
pub fn verify(secret: &[u8], body: &[u8], header: &str) -> Result<()> {
    let hex_sig = header
        .strip_prefix(PREFIX)
        .ok_or_else(|| AgentZeroError::Signature("Invalid signature".to_string()))?;
    let expected = hex::decode(hex_sig)
        .map_err(|_| AgentZeroError::Signature("Invalid signature".to_string()))?;
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AgentZeroError::Signature(e.to_string()))?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| AgentZeroError::Signature("Invalid signature".to_string()))
}
