//! Network fetch abstraction
//!
//! Provides a trait for network access so the strategies can run against
//! a real HTTP client or an in-process fake.

use crate::error::PrecacheResult;
use crate::net::{Request, Response};
use async_trait::async_trait;

/// Abstract network interface
///
/// Any HTTP status (including 4xx/5xx) is a successful fetch and comes back
/// as `Ok`. Only transport failures (DNS, refused connection, timeout)
/// return `PrecacheError::NetworkUnavailable`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request against the network
    async fn fetch(&self, request: &Request) -> PrecacheResult<Response>;

    /// Human-readable fetcher name for logs
    fn fetcher_name(&self) -> &'static str;
}
