use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::{Rng, distr::Alphanumeric};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Tolerated clock skew for state tokens issued "in the future".
const STATE_CLOCK_SKEW_SECS: u64 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("state parameter is missing")]
    Missing,
    #[error("state parameter is malformed")]
    Malformed,
    #[error("state signature does not match")]
    BadSignature,
    #[error("state has expired")]
    Expired,
    #[error("state was issued in the future")]
    FromFuture,
    #[error("state secret cannot be used as an HMAC key")]
    InvalidKey,
}

pub fn now_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

pub fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn mac_for(secret: &[u8]) -> Result<HmacSha256, StateError> {
    HmacSha256::new_from_slice(secret).map_err(|_| StateError::InvalidKey)
}

/// Produces a self-contained OAuth `state` value.
///
/// The token is `base64url(nonce:issued_at) "." base64url(hmac_sha256(payload))`,
/// so the callback can validate it without any server-side bookkeeping.
pub fn sign_state(secret: &[u8], issued_at: u64) -> Result<String, StateError> {
    let payload = format!("{}:{}", generate_nonce(), issued_at);
    let mut mac = mac_for(secret)?;
    mac.update(payload.as_bytes());
    let tag = mac.finalize().into_bytes();

    Ok(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(payload.as_bytes()),
        URL_SAFE_NO_PAD.encode(tag)
    ))
}

/// Checks signature and age of a state token produced by [`sign_state`].
pub fn verify_state(secret: &[u8], token: &str, now: u64, max_age: u64) -> Result<(), StateError> {
    let (payload_b64, tag_b64) = token.split_once('.').ok_or(StateError::Malformed)?;
    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| StateError::Malformed)?;
    let tag = URL_SAFE_NO_PAD
        .decode(tag_b64)
        .map_err(|_| StateError::Malformed)?;

    let mut mac = mac_for(secret)?;
    mac.update(&payload);
    mac.verify_slice(&tag)
        .map_err(|_| StateError::BadSignature)?;

    let payload = String::from_utf8(payload).map_err(|_| StateError::Malformed)?;
    let issued_at: u64 = payload
        .rsplit_once(':')
        .and_then(|(_, ts)| ts.parse().ok())
        .ok_or(StateError::Malformed)?;

    if issued_at > now.saturating_add(STATE_CLOCK_SKEW_SECS) {
        return Err(StateError::FromFuture);
    }
    if now.saturating_sub(issued_at) > max_age {
        return Err(StateError::Expired);
    }

    Ok(())
}

/// Shortens a secret for display: first six characters plus its length.
pub fn mask_token(token: &str) -> String {
    let len = token.chars().count();
    if len <= 6 {
        return format!("***({len})");
    }
    let prefix: String = token.chars().take(6).collect();
    format!("{prefix}…({len})")
}

/// Cuts `s` down to at most `max` characters without splitting a code point.
///
/// Returns the possibly shortened string and whether anything was removed.
pub fn truncate_chars(s: &str, max: usize) -> (String, bool) {
    match s.char_indices().nth(max) {
        Some((idx, _)) => (s[..idx].to_string(), true),
        None => (s.to_string(), false),
    }
}

/// Clamps a client supplied page size to what the Spotify API accepts.
pub fn clamp_limit(limit: Option<u32>, default: u32) -> u32 {
    limit.unwrap_or(default).clamp(1, 50)
}
