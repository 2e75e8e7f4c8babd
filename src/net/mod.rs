//! Network layer: request and response records plus the fetcher seam

mod fetcher;
mod http;
mod request;
mod response;

pub use fetcher::Fetcher;
pub use http::HttpFetcher;
pub use request::{Method, Request, RequestMode};
pub use response::{Response, ResponseType};
