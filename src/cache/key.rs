//! Cache keys
//!
//! A key is the request identity the partitions are indexed by: method plus
//! absolute URL. Headers never take part, and fragments are dropped.

use crate::net::{Method, Request};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Identity of a cached request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub method: Method,
    pub url: String,
}

impl CacheKey {
    /// Key for a full request (method + URL)
    pub fn for_request(request: &Request) -> Self {
        Self {
            method: request.method,
            url: without_fragment(&request.url),
        }
    }

    /// Key for a bare URL, which always means a GET
    pub fn for_url(url: &Url) -> Self {
        Self {
            method: Method::Get,
            url: without_fragment(url),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

fn without_fragment(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}
