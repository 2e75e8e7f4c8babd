//! Request classification
//!
//! A request is an app shell asset when its full URL, its path, or its path
//! without the leading `/` is string-equal to a manifest entry. Nothing else
//! is normalised: query strings, trailing slashes and `./` prefixes all have
//! to match exactly, so widening this changes which requests go cache-first.

use crate::manifest::AssetManifest;
use std::fmt;
use url::Url;

/// Traffic class of an intercepted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Listed in the manifest; served cache-first
    ShellAsset,
    /// Everything else; served cache-then-network
    Dynamic,
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShellAsset => write!(f, "app-shell"),
            Self::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Classify a request URL against the manifest
pub fn classify(manifest: &AssetManifest, url: &Url) -> RequestClass {
    let href = url.as_str();
    let path = url.path();
    let relative = path.strip_prefix('/');

    let is_shell = manifest
        .iter()
        .any(|asset| asset == href || asset == path || relative == Some(asset));

    if is_shell {
        RequestClass::ShellAsset
    } else {
        RequestClass::Dynamic
    }
}
