use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{ClientError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Canonical string covered by the request signature:
/// `method|path|body|timestamp|nonce`, with an empty body segment for
/// body-less requests. `path` may include a query string and is signed
/// exactly as transmitted.
pub fn canonical_string(
    method: &str,
    path: &str,
    body: Option<&str>,
    timestamp: u64,
    nonce: &str,
) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        method,
        path,
        body.unwrap_or(""),
        timestamp,
        nonce
    )
}

/// Lowercase-hex HMAC-SHA256 over the canonical string.
///
/// Pure and deterministic: the same inputs always produce the same digest.
pub fn sign_request(
    secret: &[u8],
    method: &str,
    path: &str,
    body: Option<&str>,
    timestamp: u64,
    nonce: &str,
) -> String {
    hmac_hex(secret, &canonical_string(method, path, body, timestamp, nonce))
}

fn hmac_hex(secret: &[u8], message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("hmac accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Milliseconds since the unix epoch, as sent in `x-timestamp`.
pub fn epoch_millis() -> Result<u64> {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => Ok(elapsed.as_millis() as u64),
        Err(_) => Err(ClientError::Other(
            "system clock is before the unix epoch".to_string(),
        )),
    }
}

/// Single-use request token for `x-nonce`.
pub fn new_nonce() -> String {
    Uuid::new_v4().to_string()
}
