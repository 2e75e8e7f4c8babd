//! App shell asset manifest

use crate::error::PrecacheResult;
use crate::net::{Method, Request};
use url::Url;

/// Ordered list of app shell assets, fixed for the life of the process
///
/// Entries are kept verbatim: they are matched as raw strings by the
/// classifier and only resolved against the scope when precaching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetManifest {
    assets: Vec<String>,
}

impl AssetManifest {
    pub fn new<I, S>(assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            assets: assets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.assets.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Exact string membership
    pub fn contains(&self, candidate: &str) -> bool {
        self.assets.iter().any(|a| a == candidate)
    }

    /// GET requests for every asset, resolved against `scope`, in manifest order
    pub fn requests(&self, scope: &Url) -> PrecacheResult<Vec<Request>> {
        self.assets
            .iter()
            .map(|asset| Request::resolve(Method::Get, scope, asset))
            .collect()
    }
}
