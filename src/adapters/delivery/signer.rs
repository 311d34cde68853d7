//! Webhook payload signing and receiver-side verification.
//!
//! Deliveries are signed `t=<unixSeconds>,v1=<hex-hmac-sha256(secret,
//! "<timestamp>.<body>")>`. Receivers recompute the same HMAC with the
//! endpoint's current secret and reject timestamps outside the tolerance
//! window to block replay.
//!
//! # Security
//!
//! - Constant-time comparison on the receiving side
//! - Timestamp validated before any HMAC work

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::adapters::hexutil::{hex_decode, hex_encode};

type HmacSha256 = Hmac<Sha256>;

/// Why verification failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("malformed signature header")]
    Malformed,

    #[error("timestamp outside tolerance: {age_secs}s")]
    StaleTimestamp { age_secs: i64 },

    #[error("signature mismatch")]
    Mismatch,
}

/// Sign a payload body for delivery at the given timestamp.
///
/// Returns the full `X-Webhook-Signature` header value.
pub fn sign_payload(secret: &str, timestamp: i64, body: &str) -> String {
    format!("t={},v1={}", timestamp, compute_hmac(secret, timestamp, body))
}

/// Verify a signature header against a body (receiver side).
///
/// `tolerance_secs` bounds the accepted clock skew in both directions.
pub fn verify_payload(
    secret: &str,
    signature_header: &str,
    body: &str,
    now_unix: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let (timestamp, provided_hex) = parse_header(signature_header)?;

    let age = (now_unix - timestamp).abs();
    if age > tolerance_secs {
        return Err(SignatureError::StaleTimestamp { age_secs: age });
    }

    let provided = hex_decode(provided_hex).ok_or(SignatureError::Malformed)?;
    let expected = hex_decode(&compute_hmac(secret, timestamp, body))
        .unwrap_or_default();

    if expected.as_slice().ct_eq(provided.as_slice()).unwrap_u8() == 1 {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

fn compute_hmac(secret: &str, timestamp: i64, body: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body.as_bytes());
    hex_encode(&mac.finalize().into_bytes())
}

/// Split `t=<ts>,v1=<hex>` into its parts.
fn parse_header(header: &str) -> Result<(i64, &str), SignatureError> {
    let (t_part, v1_part) = header.split_once(',').ok_or(SignatureError::Malformed)?;

    let timestamp = t_part
        .strip_prefix("t=")
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(SignatureError::Malformed)?;

    let signature = v1_part.strip_prefix("v1=").ok_or(SignatureError::Malformed)?;

    Ok((timestamp, signature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET: &str = "whsec_testsecret";
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn sign_then_verify_round_trips() {
        let body = r#"{"event":"message.created"}"#;
        let header = sign_payload(SECRET, NOW, body);
        assert!(verify_payload(SECRET, &header, body, NOW, 300).is_ok());
    }

    #[test]
    fn wrong_secret_fails() {
        let body = "{}";
        let header = sign_payload(SECRET, NOW, body);
        assert_eq!(
            verify_payload("whsec_other", &header, body, NOW, 300),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn tampered_body_fails() {
        let header = sign_payload(SECRET, NOW, "original");
        assert_eq!(
            verify_payload(SECRET, &header, "tampered", NOW, 300),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn stale_timestamp_rejected() {
        let body = "{}";
        let header = sign_payload(SECRET, NOW - 600, body);
        assert_eq!(
            verify_payload(SECRET, &header, body, NOW, 300),
            Err(SignatureError::StaleTimestamp { age_secs: 600 })
        );
    }

    #[test]
    fn future_timestamp_outside_tolerance_rejected() {
        let body = "{}";
        let header = sign_payload(SECRET, NOW + 301, body);
        assert!(matches!(
            verify_payload(SECRET, &header, body, NOW, 300),
            Err(SignatureError::StaleTimestamp { .. })
        ));
    }

    #[test]
    fn malformed_headers_rejected() {
        for header in ["", "t=abc,v1=00", "v1=00", "t=1700000000", "t=1,v2=00"] {
            assert_eq!(
                verify_payload(SECRET, header, "{}", NOW, 300),
                Err(SignatureError::Malformed),
                "header: {}",
                header
            );
        }
    }

    #[test]
    fn header_format_matches_contract() {
        let header = sign_payload(SECRET, 1_700_000_123, "{}");
        assert!(header.starts_with("t=1700000123,v1="));
        let hex_part = header.split("v1=").nth(1).unwrap();
        assert_eq!(hex_part.len(), 64);
    }

    proptest! {
        #[test]
        fn any_payload_round_trips_within_tolerance(
            body in ".*",
            secret in "[a-zA-Z0-9_]{8,64}",
            skew in -300i64..=300,
        ) {
            let header = sign_payload(&secret, NOW + skew, &body);
            prop_assert!(verify_payload(&secret, &header, &body, NOW, 300).is_ok());
        }

        #[test]
        fn wrong_secret_never_verifies(
            body in ".*",
            secret in "[a-z]{8,32}",
            other in "[A-Z]{8,32}",
        ) {
            let header = sign_payload(&secret, NOW, &body);
            prop_assert!(verify_payload(&other, &header, &body, NOW, 300).is_err());
        }
    }
}
