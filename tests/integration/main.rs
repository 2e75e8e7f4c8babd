//! Integration tests for precache

mod support {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Isolated config file and state directory
    pub struct Sandbox {
        dir: TempDir,
    }

    impl Sandbox {
        pub fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        pub fn config_path(&self) -> PathBuf {
            self.dir.path().join("config.toml")
        }

        pub fn state_dir(&self) -> PathBuf {
            self.dir.path().join("state")
        }

        pub fn write_config(&self, scope: &str, version: &str, assets: &[&str]) {
            let assets = assets
                .iter()
                .map(|a| format!("\"{}\"", a))
                .collect::<Vec<_>>()
                .join(", ");
            let content = format!(
                "[scope]\nurl = \"{scope}\"\n\n[caches]\nversion = \"{version}\"\n\n[shell]\nassets = [{assets}]\noffline_fallback = \"/home.html\"\n\n[network]\ntimeout_secs = 5\n"
            );
            std::fs::write(self.config_path(), content).unwrap();
        }

        pub fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("precache");
            cmd.env("PRECACHE_STATE_DIR", self.state_dir())
                .env_remove("PRECACHE_CONFIG")
                .arg("--config")
                .arg(self.config_path());
            cmd
        }
    }
}

mod cli_tests {
    use crate::support::Sandbox;
    use assert_cmd::cargo::cargo_bin_cmd;
    use predicates::prelude::*;

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("precache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("offline-first request interception"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("precache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("precache"));
    }

    #[test]
    fn config_path_honors_flag() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[caches]"))
            .stdout(predicate::str::contains("app-shell"));
    }

    #[test]
    fn config_init_then_refuse_overwrite() {
        let sandbox = Sandbox::new();
        sandbox.cmd().args(["config", "init"]).assert().success();
        assert!(sandbox.config_path().exists());

        sandbox
            .cmd()
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn invalid_config_reports_hint() {
        let sandbox = Sandbox::new();
        std::fs::write(sandbox.config_path(), "[caches\nversion = ").unwrap();

        sandbox
            .cmd()
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("config init --force"));

        sandbox
            .cmd()
            .args(["config", "init", "--force"])
            .assert()
            .success();
    }

    #[test]
    fn activate_before_install_fails() {
        let sandbox = Sandbox::new();
        sandbox.write_config("http://127.0.0.1:9/", "v1", &["/"]);

        sandbox
            .cmd()
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("Run: precache install"));
    }

    #[test]
    fn caches_show_unknown_partition() {
        let sandbox = Sandbox::new();
        sandbox.write_config("http://127.0.0.1:9/", "v1", &["/"]);

        sandbox
            .cmd()
            .args(["caches", "show", "app-shell-v0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("partition not found"));
    }

    #[test]
    fn caches_list_empty() {
        let sandbox = Sandbox::new();
        sandbox.write_config("http://127.0.0.1:9/", "v1", &["/"]);

        sandbox
            .cmd()
            .args(["caches", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache partitions found"));
    }

    #[test]
    fn completions_generate() {
        cargo_bin_cmd!("precache")
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("precache"));
    }
}

mod lifecycle_tests {
    use crate::support::Sandbox;
    use predicates::prelude::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SHELL: [&str; 3] = ["/", "/index.html", "/home.html"];

    fn scope(server: &MockServer) -> String {
        format!("{}/", server.uri())
    }

    async fn mount_shell(server: &MockServer) {
        for (route, body) in [("/", "root"), ("/index.html", "<h1>index</h1>"), ("/home.html", "offline page")] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_body_string(body))
                .expect(1)
                .mount(server)
                .await;
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn install_then_shell_served_from_cache() {
        let server = MockServer::start().await;
        mount_shell(&server).await;
        let sandbox = Sandbox::new();
        sandbox.write_config(&scope(&server), "v1", &SHELL);

        sandbox
            .cmd()
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("app-shell-v1"));

        // The mock expects exactly one call, made by install
        sandbox
            .cmd()
            .args(["fetch", "/index.html"])
            .assert()
            .success()
            .stdout(predicate::str::contains("<h1>index</h1>"))
            .stderr(predicate::str::contains("via cache"));

        sandbox
            .cmd()
            .args(["caches", "show", "app-shell-v1", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("/index.html"))
            .stdout(predicate::str::contains("/home.html"));

        let audit = std::fs::read_to_string(sandbox.state_dir().join("audit.log")).unwrap();
        assert!(audit.contains("worker.installed"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dynamic_response_is_stored_once() {
        let server = MockServer::start().await;
        mount_shell(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/data"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"items\":[1,2]}"))
            .expect(1)
            .mount(&server)
            .await;
        let sandbox = Sandbox::new();
        sandbox.write_config(&scope(&server), "v1", &SHELL);
        sandbox.cmd().arg("install").assert().success();

        sandbox
            .cmd()
            .args(["fetch", "/api/data", "--client", "tab-1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("{\"items\":[1,2]}"))
            .stderr(predicate::str::contains("network (stored)"));

        sandbox
            .cmd()
            .args(["fetch", "/api/data", "--client", "tab-1"])
            .assert()
            .success()
            .stderr(predicate::str::contains("via cache"))
            .stderr(predicate::str::contains("\"cached\":true"));

        sandbox
            .cmd()
            .args(["caches", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("dynamic-resources-v1"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn error_status_is_returned_not_stored() {
        let server = MockServer::start().await;
        mount_shell(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .expect(2)
            .mount(&server)
            .await;
        let sandbox = Sandbox::new();
        sandbox.write_config(&scope(&server), "v1", &SHELL);
        sandbox.cmd().arg("install").assert().success();

        for _ in 0..2 {
            sandbox
                .cmd()
                .args(["fetch", "/api/missing"])
                .assert()
                .success()
                .stdout(predicate::str::contains("nope"))
                .stderr(predicate::str::contains("404"));
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_dynamic_serves_offline_page() {
        let server = MockServer::start().await;
        mount_shell(&server).await;
        let sandbox = Sandbox::new();
        sandbox.write_config(&scope(&server), "v1", &SHELL);
        sandbox.cmd().arg("install").assert().success();

        sandbox
            .cmd()
            .args(["fetch", "http://127.0.0.1:9/api/data"])
            .assert()
            .success()
            .stdout(predicate::str::contains("offline page"))
            .stderr(predicate::str::contains("offline fallback"));

        sandbox
            .cmd()
            .args(["caches", "show", "dynamic-resources-v1"])
            .assert()
            .failure();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_install_aborts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("root"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/index.html"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let sandbox = Sandbox::new();
        sandbox.write_config(&scope(&server), "v1", &SHELL);

        sandbox
            .cmd()
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("precache aborted"))
            .stderr(predicate::str::contains("Hint:"));

        sandbox
            .cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("redundant"));

        sandbox
            .cmd()
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("redundant"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn version_bump_sweeps_previous_generation() {
        let server = MockServer::start().await;
        for route in ["/", "/index.html", "/home.html"] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
                .mount(&server)
                .await;
        }
        let sandbox = Sandbox::new();

        sandbox.write_config(&scope(&server), "v1", &SHELL);
        sandbox.cmd().arg("install").assert().success();
        sandbox.cmd().arg("activate").assert().success();

        sandbox.write_config(&scope(&server), "v2", &SHELL);
        sandbox.cmd().arg("install").assert().success();
        sandbox
            .cmd()
            .arg("activate")
            .assert()
            .success()
            .stdout(predicate::str::contains("app-shell-v1"));

        sandbox
            .cmd()
            .args(["caches", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("app-shell-v2"))
            .stdout(predicate::str::contains("app-shell-v1").not());

        sandbox
            .cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("activated"));
    }
}

mod worker_tests {
    use async_trait::async_trait;
    use precache::cache::{CacheKey, MemoryStore, PartitionStore};
    use precache::config::Config;
    use precache::net::{Fetcher, Request, Response};
    use precache::strategy::ResponseSource;
    use precache::{PrecacheError, PrecacheResult, Worker};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use url::Url;

    /// Serves a fixed set of URLs; everything else is unreachable
    struct StaticSite {
        pages: HashMap<String, (u16, &'static str)>,
        calls: AtomicUsize,
    }

    impl StaticSite {
        fn new(pages: &[(&str, u16, &'static str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, status, body)| (url.to_string(), (*status, *body)))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for StaticSite {
        async fn fetch(&self, request: &Request) -> PrecacheResult<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.pages.get(request.url.as_str()) {
                Some((status, body)) => Ok(Response::new(*status, *body)),
                None => Err(PrecacheError::network(request.url.as_str(), "unreachable")),
            }
        }

        fn fetcher_name(&self) -> &'static str {
            "static"
        }
    }

    fn config(assets: &[&str]) -> Config {
        let mut config = Config::default();
        config.scope.url = "http://app.test/".to_string();
        config.caches.version = "v1".to_string();
        config.shell.assets = assets.iter().map(|a| a.to_string()).collect();
        config
    }

    #[tokio::test]
    async fn two_asset_install_serves_index_without_network() {
        let store = Arc::new(MemoryStore::new());
        let site = Arc::new(StaticSite::new(&[
            ("http://app.test/", 200, "root"),
            ("http://app.test/index.html", 200, "index"),
        ]));
        let worker = Worker::new(&config(&["/", "/index.html"]), store.clone(), site.clone()).unwrap();

        worker.install().await.unwrap();
        assert_eq!(store.entries("app-shell-v1").await.unwrap().unwrap().len(), 2);

        let calls = site.calls();
        let event = worker
            .intercept(&Request::get("http://app.test/index.html").unwrap(), None)
            .await
            .unwrap();
        assert_eq!(event.source(), ResponseSource::Cache);
        assert_eq!(site.calls(), calls);
    }

    #[tokio::test]
    async fn api_response_lands_in_dynamic_partition() {
        let store = Arc::new(MemoryStore::new());
        let site = Arc::new(StaticSite::new(&[
            ("http://app.test/", 200, "root"),
            ("http://app.test/api/data", 200, "{}"),
        ]));
        let worker = Worker::new(&config(&["/"]), store.clone(), site).unwrap();
        worker.install().await.unwrap();
        worker.activate().await.unwrap();

        let event = worker
            .intercept(&Request::get("http://app.test/api/data").unwrap(), Some("tab"))
            .await
            .unwrap();
        event.settled().await;

        let key = CacheKey::for_url(&Url::parse("http://app.test/api/data").unwrap());
        let stored = store.get("dynamic-resources-v1", &key).await.unwrap().unwrap();
        assert_eq!(stored.status, 200);
    }

    #[tokio::test]
    async fn api_outage_returns_fallback_and_stores_nothing() {
        let store = Arc::new(MemoryStore::new());
        let site = Arc::new(StaticSite::new(&[("http://app.test/home.html", 200, "offline")]));
        let worker = Worker::new(&config(&["/home.html"]), store.clone(), site).unwrap();
        worker.install().await.unwrap();

        let event = worker
            .intercept(&Request::get("http://app.test/api/data").unwrap(), None)
            .await
            .unwrap();
        assert_eq!(event.source(), ResponseSource::OfflineFallback);
        assert_eq!(event.response().text(), "offline");

        event.settled().await;
        assert!(store.entries("dynamic-resources-v1").await.unwrap().is_none());
    }
}
