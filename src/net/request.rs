//! Intercepted request records

use crate::error::{PrecacheError, PrecacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// Canonical upper-case token
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = PrecacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(PrecacheError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Request mode, as set by the issuing document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Cross-origin responses are readable
    #[default]
    Cors,
    /// Cross-origin responses come back opaque
    NoCors,
}

/// A single outbound request seen by the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Create a request for an absolute URL
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            mode: RequestMode::default(),
            headers: Vec::new(),
        }
    }

    /// Parse an absolute URL into a GET request
    pub fn get(url: &str) -> PrecacheResult<Self> {
        let parsed = Url::parse(url).map_err(|e| PrecacheError::invalid_url(url, e))?;
        Ok(Self::new(Method::Get, parsed))
    }

    /// Resolve `target` against `base` (absolute URLs pass through unchanged)
    pub fn resolve(method: Method, base: &Url, target: &str) -> PrecacheResult<Self> {
        let url = base
            .join(target)
            .map_err(|e| PrecacheError::invalid_url(target, e))?;
        Ok(Self::new(method, url))
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether the request leaves the given origin
    pub fn is_cross_origin(&self, scope: &Url) -> bool {
        self.url.origin() != scope.origin()
    }
}
