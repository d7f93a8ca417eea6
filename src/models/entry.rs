use serde::Serialize;

/// One credential record, stored as one encrypted file.
///
/// `name` is the entry identifier: the file path relative to the store root
/// with the entry suffix stripped (`folder/site.com`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CredentialEntry {
    pub name: String,
    /// Line one of the body. Always present, possibly empty.
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Caller-supplied `key: value` fields, written after the fixed fields.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<(String, String)>,
    /// Decrypted body as read from disk. Empty for entries built in memory.
    #[serde(skip)]
    pub raw: String,
    /// Current one-time code, derived at parse time when the body carries an otpauth line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<OtpState>,
}

impl CredentialEntry {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Look up a field by the names the CLI exposes.
    pub fn field(&self, key: &str) -> Option<&str> {
        match key {
            "name" => Some(self.name.as_str()),
            "password" => Some(self.password.as_str()),
            "username" => self.username.as_deref(),
            "url" => self.url.as_deref(),
            "notes" => self.notes.as_deref(),
            "otp_secret" | "otp-secret" => self.otp_secret.as_deref(),
            "otp" => self.otp.as_ref().map(|o| o.code.as_str()),
            _ => self
                .extra
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
        }
    }

    /// Set or replace a custom field, keeping insertion order.
    pub fn set_extra(&mut self, key: &str, value: &str) {
        if let Some(existing) = self.extra.iter_mut().find(|(k, _)| k == key) {
            existing.1 = value.to_string();
        } else {
            self.extra.push((key.to_string(), value.to_string()));
        }
    }
}

/// Derived, never persisted: the code valid for the current 30 second window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpState {
    /// The provisioning URI the state was derived from.
    pub url: String,
    pub secret: String,
    pub code: String,
    /// Seconds until the window closes, in `[0, 29]`. Zero means "derive again now".
    pub remaining_secs: u64,
}
