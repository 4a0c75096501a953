//! Webhook signature verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::stripe::StripeError;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 and return hex-encoded result.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time string comparison.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Verify a Stripe webhook signature header against the raw payload.
///
/// The header format is `t=<timestamp>,v1=<sig>[,v1=<sig2>,...]`; the signed
/// message is `<timestamp>.<payload>`. Any matching `v1` signature accepts
/// the event.
///
/// # Errors
///
/// Returns `StripeError::InvalidSignature` if the header is malformed or no
/// signature matches.
pub fn verify_stripe_signature(
    secret: &str,
    payload: &str,
    signature_header: &str,
) -> Result<(), StripeError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        let mut kv = part.splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(ts)) => timestamp = Some(ts),
            (Some("v1"), Some(sig)) => signatures.push(sig),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(StripeError::InvalidSignature)?;

    if signatures.is_empty() {
        return Err(StripeError::InvalidSignature);
    }

    let signed_payload = format!("{timestamp}.{payload}");
    let expected = hmac_sha256_hex(secret, &signed_payload);

    let valid = signatures.iter().any(|sig| constant_time_eq(&expected, sig));

    if valid {
        Ok(())
    } else {
        Err(StripeError::InvalidSignature)
    }
}
