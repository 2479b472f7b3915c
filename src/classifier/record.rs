//! JSON records found in decrypted relay replies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ClassifyError;

/// Decrypted reply: an HTTP-like status code and a body.
///
/// The relay usually sends the body as a JSON string holding further JSON;
/// an inline object is accepted as well.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DecryptedResponse {
    /// Application status code.
    pub code: u16,
    /// Response body.
    #[serde(default)]
    pub body: Value,
}

impl DecryptedResponse {
    /// Construct a response whose body is the given text.
    #[must_use]
    pub fn new(code: u16, body: impl Into<String>) -> Self {
        Self {
            code,
            body: Value::String(body.into()),
        }
    }

    /// Parse decrypted reply text.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::Json`] if `text` is not a response record.
    pub fn parse(text: &str) -> Result<Self, ClassifyError> { Ok(serde_json::from_str(text)?) }

    /// Body as text: string bodies verbatim, anything else re-serialized.
    #[must_use]
    pub fn body_text(&self) -> String {
        match &self.body {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Body of an encrypted outer error.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InnerErrorRecord {
    /// User-facing message.
    #[serde(default)]
    pub message: String,
    /// Request number the relay expects next.
    #[serde(default, alias = "expectedRequestId")]
    pub expected_request_number: Option<u32>,
}

/// Body of an inner application error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorDescription {
    /// Human readable description.
    #[serde(default)]
    pub description: Option<String>,
}
