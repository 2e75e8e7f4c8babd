//! Responses as returned by the network and stored in partitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Visibility of a response to the requesting document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin or CORS-readable
    #[default]
    Basic,
    /// Cross-origin no-cors; status and headers are hidden
    Opaque,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Opaque => write!(f, "opaque"),
        }
    }
}

/// An HTTP response
///
/// Cloning copies the body, so a clone can be persisted while the original
/// is handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    #[serde(with = "hex_body")]
    pub body: Vec<u8>,
    #[serde(rename = "type")]
    pub kind: ResponseType,
    /// Final URL the response came from
    pub url: String,
    pub captured_at: DateTime<Utc>,
}

impl Response {
    /// Create a basic response
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body: body.into(),
            kind: ResponseType::Basic,
            url: String::new(),
            captured_at: Utc::now(),
        }
    }

    /// Create an opaque response: status 0, no headers, body kept for replay
    pub fn opaque(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 0,
            status_text: String::new(),
            headers: Vec::new(),
            body: body.into(),
            kind: ResponseType::Opaque,
            url: url.into(),
            captured_at: Utc::now(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    /// Status in the 2xx range
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_opaque(&self) -> bool {
        self.kind == ResponseType::Opaque
    }

    /// Whether a network response may be written to the dynamic partition
    pub fn is_cacheable(&self) -> bool {
        self.ok() || self.is_opaque()
    }

    /// First header value matching `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded as UTF-8, lossily
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Bodies are stored as hex so partition files stay valid JSON for binary assets
mod hex_body {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(encoded).map_err(serde::de::Error::custom)
    }
}
