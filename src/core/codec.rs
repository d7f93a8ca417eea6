//! Plaintext body format of an entry, before encryption.
//!
//! ```text
//! <password>
//! username: <username>
//! url: <url>
//! otpauth://totp/totp-secret?secret=<secret>&issuer=totp-secret
//! notes: <notes>
//! <key>: <value>
//! ```
//!
//! Line one is always the password. Any line that is not a recognized
//! `key: value` pair is kept verbatim in `notes`, so files written by other
//! tools still load.

use crate::core::otp;
use crate::models::entry::CredentialEntry;
use chrono::Utc;
use tracing::warn;

/// Field names that never appear as custom `key: value` lines.
pub const RESERVED_FIELDS: &[&str] = &["name", "username", "url", "otp_secret", "password"];

/// Keys with a meaning when parsing a body line.
const RECOGNIZED_KEYS: &[&str] = &["username", "url", "notes", "otpauth"];

pub fn is_recognized_key(key: &str) -> bool {
    RECOGNIZED_KEYS.contains(&key)
}

pub fn serialize(entry: &CredentialEntry) -> String {
    let mut out = String::new();
    out.push_str(&entry.password);
    out.push('\n');

    if let Some(username) = non_empty(entry.username.as_deref()) {
        push_pair(&mut out, "username", username);
    }
    if let Some(url) = non_empty(entry.url.as_deref()) {
        push_pair(&mut out, "url", url);
    }
    if let Some(secret) = non_empty(entry.otp_secret.as_deref()) {
        out.push_str(&otp::provisioning_uri(secret));
        out.push('\n');
    }
    if let Some(notes) = non_empty(entry.notes.as_deref()) {
        // One prefixed line per notes line, so no line of the notes can pass
        // for another field.
        for line in notes.split('\n') {
            push_pair(&mut out, "notes", line);
        }
    }
    for (key, value) in &entry.extra {
        if RESERVED_FIELDS.contains(&key.as_str()) || value.is_empty() {
            continue;
        }
        push_pair(&mut out, key, value);
    }
    out
}

/// Parse a decrypted body, deriving the OTP state against the current time.
pub fn parse(text: &str) -> CredentialEntry {
    let now = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
    parse_at(text, now)
}

/// Parse a decrypted body, deriving the OTP state as of `unix_secs`.
pub fn parse_at(text: &str, unix_secs: u64) -> CredentialEntry {
    let mut lines = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));
    let mut entry = CredentialEntry {
        password: lines.next().unwrap_or_default().to_string(),
        raw: text.to_string(),
        ..Default::default()
    };

    let mut otp_line: Option<&str> = None;
    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            append_note(&mut entry.notes, line);
            continue;
        };
        if !RECOGNIZED_KEYS.contains(&key) {
            append_note(&mut entry.notes, line);
            continue;
        }
        match key {
            "username" => entry.username = non_empty(Some(value.trim())).map(str::to_string),
            "url" => entry.url = non_empty(Some(value.trim())).map(str::to_string),
            "notes" => push_note_line(&mut entry.notes, value.strip_prefix(' ').unwrap_or(value)),
            _ => otp_line = Some(line),
        }
    }

    if let Some(uri) = otp_line {
        match otp::secret_from_uri(uri) {
            Some(secret) => {
                entry.otp_secret = Some(secret);
                match otp::derive_at(uri, unix_secs) {
                    Ok(state) => entry.otp = state,
                    Err(e) => warn!(error = %e, "entry carries an unusable otpauth line"),
                }
            }
            // Nothing to regenerate from; keep the line rather than drop it.
            None => append_note(&mut entry.notes, uri),
        }
    }
    entry
}

fn push_pair(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}

/// Append a verbatim line; blank ones carry nothing and are dropped.
fn append_note(notes: &mut Option<String>, value: &str) {
    if !value.is_empty() {
        push_note_line(notes, value);
    }
}

fn push_note_line(notes: &mut Option<String>, value: &str) {
    match notes {
        Some(current) => {
            current.push('\n');
            current.push_str(value);
        }
        None => *notes = Some(value.to_string()),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
