//! HTTP fetcher backed by ureq
//!
//! ureq is blocking, so each fetch runs on tokio's blocking pool.

use crate::config::schema::NetworkConfig;
use crate::error::{PrecacheError, PrecacheResult};
use crate::net::fetcher::Fetcher;
use crate::net::{Method, Request, RequestMode, Response};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fetcher that talks to real servers
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
    max_body_bytes: u64,
    scope: Url,
}

impl HttpFetcher {
    /// Create a fetcher for the given scope
    ///
    /// `scope` decides which no-cors requests are cross-origin and therefore
    /// produce opaque responses.
    pub fn new(config: &NetworkConfig, scope: Url) -> Self {
        let mut builder = ureq::Agent::config_builder().http_status_as_error(false);
        if config.timeout_secs > 0 {
            builder = builder.timeout_global(Some(Duration::from_secs(config.timeout_secs)));
        }

        Self {
            agent: ureq::Agent::new_with_config(builder.build()),
            user_agent: config.user_agent.clone(),
            max_body_bytes: match config.max_body_bytes {
                0 => u64::MAX,
                limit => limit,
            },
            scope,
        }
    }

    fn fetch_blocking(&self, request: &Request) -> PrecacheResult<Response> {
        let url = request.url.as_str();
        let agent = &self.agent;

        let result = match request.method {
            Method::Get => self.headers(agent.get(url), request).call(),
            Method::Head => self.headers(agent.head(url), request).call(),
            Method::Delete => self.headers(agent.delete(url), request).call(),
            Method::Options => self.headers(agent.options(url), request).call(),
            Method::Post => self.headers(agent.post(url), request).send_empty(),
            Method::Put => self.headers(agent.put(url), request).send_empty(),
            Method::Patch => self.headers(agent.patch(url), request).send_empty(),
        };

        let mut response = result.map_err(|e| PrecacheError::network(url, e.to_string()))?;

        let status = response.status();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_vec()
            .map_err(|e| PrecacheError::network(url, format!("reading body: {}", e)))?;

        if request.mode == RequestMode::NoCors && request.is_cross_origin(&self.scope) {
            debug!("No-cors cross-origin response for {} is opaque", url);
            return Ok(Response::opaque(url, body));
        }

        let mut out = Response::new(status.as_u16(), body)
            .with_url(url)
            .with_status_text(status.canonical_reason().unwrap_or_default());
        out.headers = headers;
        Ok(out)
    }

    fn headers<B>(
        &self,
        mut builder: ureq::RequestBuilder<B>,
        request: &Request,
    ) -> ureq::RequestBuilder<B> {
        builder = builder.header("user-agent", self.user_agent.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> PrecacheResult<Response> {
        let this = self.clone();
        let request = request.clone();

        tokio::task::spawn_blocking(move || this.fetch_blocking(&request))
            .await
            .map_err(|e| PrecacheError::Internal(format!("fetch task failed: {}", e)))?
    }

    fn fetcher_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher_for(server: &MockServer) -> HttpFetcher {
        let scope = Url::parse(&format!("{}/", server.uri())).unwrap();
        HttpFetcher::new(&NetworkConfig::default(), scope)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetches_body_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<h1>shell</h1>"),
            )
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        let request = Request::get(&format!("{}/index.html", server.uri())).unwrap();
        let response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.text(), "<h1>shell</h1>");
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert!(!response.is_opaque());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reads_bodies_past_ureq_default_limit() {
        let server = MockServer::start().await;
        let big = vec![b'x'; 11 * 1024 * 1024];
        Mock::given(method("GET"))
            .and(path("/big.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(big.clone()))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        let request = Request::get(&format!("{}/big.bin", server.uri())).unwrap();
        let response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body.len(), big.len());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn configured_body_limit_is_enforced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/report.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'a'; 4096]))
            .mount(&server)
            .await;

        let config = NetworkConfig {
            max_body_bytes: 1024,
            ..NetworkConfig::default()
        };
        let scope = Url::parse(&format!("{}/", server.uri())).unwrap();
        let fetcher = HttpFetcher::new(&config, scope);
        let request = Request::get(&format!("{}/report.csv", server.uri())).unwrap();

        let err = fetcher.fetch(&request).await.unwrap_err();
        assert!(err.to_string().contains("reading body"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn error_status_is_not_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        let request = Request::get(&format!("{}/missing", server.uri())).unwrap();
        let response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.text(), "nope");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn forwards_request_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/data"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        let request = Request::get(&format!("{}/api/data", server.uri()))
            .unwrap()
            .with_header("accept", "application/json");
        let response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(response.status, 200);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn no_cors_cross_origin_is_opaque() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lib.css"))
            .respond_with(ResponseTemplate::new(200).set_body_string("body{}"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(
            &NetworkConfig::default(),
            Url::parse("http://app.invalid/").unwrap(),
        );
        let request = Request::get(&format!("{}/lib.css", server.uri()))
            .unwrap()
            .with_mode(RequestMode::NoCors);
        let response = fetcher.fetch(&request).await.unwrap();

        assert!(response.is_opaque());
        assert_eq!(response.status, 0);
        assert!(response.headers.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn refused_connection_is_network_unavailable() {
        // Bind then drop to get a port nothing listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let fetcher = HttpFetcher::new(
            &NetworkConfig::default(),
            Url::parse("http://127.0.0.1/").unwrap(),
        );
        let request = Request::get(&format!("http://127.0.0.1:{}/api/data", port)).unwrap();

        let err = fetcher.fetch(&request).await.unwrap_err();
        assert!(matches!(err, PrecacheError::NetworkUnavailable { .. }));
    }
}
