//! Time-based one-time codes (RFC 6238) derived from an `otpauth://` URI.
//!
//! The engine is pure: it has no timers. Callers that show a countdown
//! decrement `remaining_secs` themselves and call [`derive`] again once it
//! reaches zero.

use crate::constants;
use crate::models::entry::OtpState;
use chrono::Utc;
use data_encoding::BASE32_NOPAD;
use totp_rs::{Algorithm, TOTP};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("not an otpauth URI")]
    InvalidUri,
    #[error("secret is not valid base32")]
    InvalidSecret,
    #[error("digits must be 6 or 8")]
    UnsupportedDigits,
    #[error("unsupported algorithm '{0}'")]
    UnsupportedAlgorithm(String),
}

/// Canonical provisioning line written into an entry body.
pub fn provisioning_uri(secret: &str) -> String {
    format!(
        "otpauth://totp/{label}?secret={secret}&issuer={label}",
        label = constants::OTP_LABEL,
        secret = secret
    )
}

/// The `secret` query parameter of a provisioning URI, if any.
pub fn secret_from_uri(uri: &str) -> Option<String> {
    let parsed = Url::parse(uri.trim()).ok()?;
    if parsed.scheme() != "otpauth" {
        return None;
    }
    parsed
        .query_pairs()
        .find(|(key, _)| key == "secret")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Derive the code for the current wall-clock second.
///
/// Returns `Ok(None)` when the URI carries no secret: that is the ordinary
/// "this entry has no OTP" case.
pub fn derive(uri: &str) -> Result<Option<OtpState>, OtpError> {
    let now = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
    derive_at(uri, now)
}

/// Derive the code valid at `unix_secs`.
pub fn derive_at(uri: &str, unix_secs: u64) -> Result<Option<OtpState>, OtpError> {
    let parsed = Url::parse(uri.trim()).map_err(|_| OtpError::InvalidUri)?;
    if parsed.scheme() != "otpauth" {
        return Err(OtpError::InvalidUri);
    }

    let mut secret = None;
    let mut digits = 6usize;
    let mut algorithm = Algorithm::SHA1;
    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "secret" => secret = Some(value.into_owned()),
            "digits" => {
                digits = match value.as_ref() {
                    "6" => 6,
                    "8" => 8,
                    _ => return Err(OtpError::UnsupportedDigits),
                }
            }
            "algorithm" => algorithm = parse_algorithm(&value)?,
            _ => {}
        }
    }

    let secret = match secret {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Ok(None),
    };
    let key = decode_secret(&secret).ok_or(OtpError::InvalidSecret)?;
    let code = TOTP::new_unchecked(algorithm, digits, 0, constants::OTP_STEP_SECS, key)
        .generate(unix_secs);

    Ok(Some(OtpState {
        url: uri.trim().to_string(),
        secret,
        code,
        remaining_secs: remaining_at(unix_secs),
    }))
}

/// Seconds left in the window containing `unix_secs`: `ceil(t/30)*30 - t`.
pub fn remaining_at(unix_secs: u64) -> u64 {
    let step = constants::OTP_STEP_SECS;
    let next = unix_secs.div_ceil(step) * step;
    next - unix_secs
}

fn parse_algorithm(value: &str) -> Result<Algorithm, OtpError> {
    match value.to_ascii_uppercase().as_str() {
        "SHA1" => Ok(Algorithm::SHA1),
        "SHA256" => Ok(Algorithm::SHA256),
        "SHA512" => Ok(Algorithm::SHA512),
        _ => Err(OtpError::UnsupportedAlgorithm(value.to_string())),
    }
}

fn decode_secret(secret: &str) -> Option<Vec<u8>> {
    let normalized: String = secret
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace() && *ch != '=')
        .map(|ch| ch.to_ascii_uppercase())
        .collect();
    if normalized.is_empty() {
        return None;
    }
    BASE32_NOPAD.decode(normalized.as_bytes()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ASCII "12345678901234567890", the RFC 6238 SHA1 seed.
    const RFC_SHA1: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn uri(secret: &str, extra: &str) -> String {
        format!("otpauth://totp/test?secret={}{}", secret, extra)
    }

    #[test]
    fn test_rfc_vectors_sha1() {
        let u = uri(RFC_SHA1, "&digits=8");
        assert_eq!(derive_at(&u, 59).unwrap().unwrap().code, "94287082");
        assert_eq!(derive_at(&u, 1_111_111_109).unwrap().unwrap().code, "07081804");
        assert_eq!(derive_at(&u, 1_234_567_890).unwrap().unwrap().code, "89005924");
    }

    #[test]
    fn test_rfc_vector_sha256() {
        let u = uri(
            "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZA",
            "&digits=8&algorithm=SHA256",
        );
        assert_eq!(derive_at(&u, 59).unwrap().unwrap().code, "46119246");
    }

    #[test]
    fn test_rfc_vector_sha512() {
        let u = uri(
            "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNA",
            "&digits=8&algorithm=SHA512",
        );
        assert_eq!(derive_at(&u, 59).unwrap().unwrap().code, "90693936");
    }

    #[test]
    fn test_default_is_six_digits() {
        let state = derive_at(&uri(RFC_SHA1, ""), 59).unwrap().unwrap();
        assert_eq!(state.code, "287082");
        assert_eq!(state.secret, RFC_SHA1);
    }

    #[test]
    fn test_canonical_uri_derives() {
        let state = derive_at(&provisioning_uri(RFC_SHA1), 59).unwrap().unwrap();
        assert_eq!(state.code, "287082");
        assert_eq!(
            state.url,
            "otpauth://totp/totp-secret?secret=GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ&issuer=totp-secret"
        );
    }

    #[test]
    fn test_secret_from_uri() {
        assert_eq!(secret_from_uri(&provisioning_uri("ABC")), Some("ABC".to_string()));
        assert_eq!(secret_from_uri("otpauth://totp/x?issuer=y"), None);
        assert_eq!(secret_from_uri("otpauth: broken"), None);
    }

    #[test]
    fn test_missing_or_empty_secret_is_none() {
        assert_eq!(derive_at("otpauth://totp/x?issuer=y", 0).unwrap(), None);
        assert_eq!(derive_at("otpauth://totp/x?secret=", 0).unwrap(), None);
    }

    #[test]
    fn test_lowercase_and_padded_secret_accepted() {
        let lower = RFC_SHA1.to_lowercase();
        let state = derive_at(&uri(&lower, "===="), 59);
        assert_eq!(state.unwrap().unwrap().code, "287082");
    }

    #[test]
    fn test_short_secret_still_derives() {
        // "MFRGG" decodes to three bytes, below the RFC's recommended key size.
        let state = derive_at(&uri("MFRGG", ""), 59).unwrap().unwrap();
        assert_eq!(state.code.len(), 6);
        assert!(state.code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(derive_at("https://example.com/?secret=AAAA", 0), Err(OtpError::InvalidUri));
        assert_eq!(derive_at("not a uri", 0), Err(OtpError::InvalidUri));
        assert_eq!(derive_at(&uri("!!!", ""), 0), Err(OtpError::InvalidSecret));
        assert_eq!(
            derive_at(&uri(RFC_SHA1, "&digits=7"), 0),
            Err(OtpError::UnsupportedDigits)
        );
        assert!(matches!(
            derive_at(&uri(RFC_SHA1, "&algorithm=MD5"), 0),
            Err(OtpError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_remaining_window() {
        assert_eq!(remaining_at(60), 0);
        assert_eq!(remaining_at(61), 29);
        assert_eq!(remaining_at(89), 1);
        for t in 1_700_000_000..1_700_000_061 {
            assert!(remaining_at(t) < 30);
        }
    }

    #[test]
    fn test_rederive_after_expiry_opens_fresh_window() {
        let u = uri(RFC_SHA1, "");
        let expiring = derive_at(&u, 90).unwrap().unwrap();
        assert_eq!(expiring.remaining_secs, 0);
        let fresh = derive_at(&u, 91).unwrap().unwrap();
        assert_eq!(fresh.remaining_secs, 29);
        assert_ne!(expiring.code, derive_at(&u, 120).unwrap().unwrap().code);
    }
}
