//! Integration tests for swcache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn swcache() -> Command {
        cargo_bin_cmd!("swcache")
    }

    /// Config pointing at an isolated store directory
    fn isolated(temp: &TempDir) -> Command {
        let config = temp.path().join("config.toml");
        let store = temp.path().join("caches");
        std::fs::write(
            &config,
            format!(
                "[site]\norigin = \"https://elitefit.example\"\n\n[cache]\nstore_dir = {:?}\n",
                store
            ),
        )
        .unwrap();

        let mut cmd = swcache();
        cmd.env_remove("RUST_LOG").arg("--config").arg(config);
        cmd
    }

    #[test]
    fn help_displays() {
        swcache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline page cache router"));
    }

    #[test]
    fn version_displays() {
        swcache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("swcache"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("elite-fit-cache"));
    }

    #[test]
    fn config_init_keeps_existing() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn invalid_config_reports_hint() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        std::fs::write(&config, "[cache]\nprefix = \"bad/name\"\n").unwrap();

        swcache()
            .arg("--config")
            .arg(&config)
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn classify_static_asset() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["classify", "https://elitefit.example/img/hero.WEBP?v=3"])
            .assert()
            .success()
            .stdout(predicate::str::contains("static-asset -> cache-first"));
    }

    #[test]
    fn classify_font_origins() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["classify", "https://fonts.googleapis.com/css2?family=Inter"])
            .assert()
            .success()
            .stdout(predicate::str::contains("stale-while-revalidate"));

        isolated(&temp)
            .args(["classify", "https://fonts.gstatic.com/s/inter/v12/abc"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cache-first (immutable)"));
    }

    #[test]
    fn classify_navigation_and_other() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["classify", "--navigate", "https://elitefit.example/classes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("navigation -> network-first"));

        isolated(&temp)
            .args(["classify", "https://elitefit.example/api/slots"])
            .assert()
            .success()
            .stdout(predicate::str::contains("other -> network-only"));
    }

    #[test]
    fn fetch_before_install_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["fetch", "https://elitefit.example/js/main.min.js"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No activated worker"))
            .stderr(predicate::str::contains("swcache install"));
    }

    #[test]
    fn cache_list_empty() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache stores found"));
    }

    #[test]
    fn status_without_registration() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("elite-fit-cache-v2"))
            .stdout(predicate::str::contains("No active version"));
    }
}

mod lifecycle_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SITE_PAGES: &[(&str, &str)] = &[
        ("/", "<h1>Elite Fit</h1>"),
        ("/index.html", "<h1>Elite Fit</h1>"),
        ("/css/style.min.css", "body{}"),
        ("/js/main.min.js", "main()"),
        ("/js/theme-switcher.min.js", "theme()"),
        ("/img/hero.webp", "WEBP"),
    ];

    /// Origin serving fixed bodies; unmatched paths are 404.
    /// Not pooled, so dropping it refuses further connections.
    async fn origin(pages: &[(&str, &str)]) -> MockServer {
        let server = MockServer::builder().start().await;
        for (page, body) in pages {
            Mock::given(method("GET"))
                .and(path(*page))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(*body)
                        .insert_header("content-type", "text/plain"),
                )
                .mount(&server)
                .await;
        }
        server
    }

    fn write_config(temp: &TempDir, origin: &str, version: u32, extra: &str) -> PathBuf {
        let config = temp.path().join("config.toml");
        let store = temp.path().join("caches");
        std::fs::write(
            &config,
            format!(
                "[site]\norigin = {:?}\n\n[cache]\nversion = {}\nstore_dir = {:?}\n{}",
                origin, version, store, extra
            ),
        )
        .unwrap();
        config
    }

    fn swcache(config: &PathBuf) -> Command {
        let mut cmd = cargo_bin_cmd!("swcache");
        for var in ["RUST_LOG", "HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"] {
            cmd.env_remove(var);
        }
        cmd.arg("--config").arg(config);
        cmd
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn install_activates_and_serves_from_cache() {
        let temp = TempDir::new().unwrap();
        let server = origin(SITE_PAGES).await;
        let base = server.uri();
        let config = write_config(&temp, &base, 2, "");

        swcache(&config)
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("Precached 5 entries"));

        swcache(&config)
            .args(["cache", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("elite-fit-cache-v2\n"));

        drop(server);
        swcache(&config)
            .args(["fetch", &format!("{base}/js/main.min.js")])
            .assert()
            .success()
            .stdout(predicate::str::diff("main()"))
            .stderr(predicate::str::contains("[cache]"))
            .stderr(predicate::str::contains("text/plain"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_navigation_serves_precached_index() {
        let temp = TempDir::new().unwrap();
        let server = origin(SITE_PAGES).await;
        let base = server.uri();
        let config = write_config(&temp, &base, 2, "");

        swcache(&config).arg("install").assert().success();
        drop(server);

        swcache(&config)
            .args(["fetch", "--navigate", &format!("{base}/classes/yoga")])
            .assert()
            .success()
            .stdout(predicate::str::diff("<h1>Elite Fit</h1>"))
            .stderr(predicate::str::contains("offline fallback"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn runtime_asset_cached_after_first_fetch() {
        let temp = TempDir::new().unwrap();
        let server = origin(SITE_PAGES).await;
        let base = server.uri();
        let config = write_config(&temp, &base, 2, "");

        swcache(&config).arg("install").assert().success();
        swcache(&config)
            .args(["fetch", &format!("{base}/img/hero.webp")])
            .assert()
            .success()
            .stderr(predicate::str::contains("[network]"));

        drop(server);
        swcache(&config)
            .args(["fetch", &format!("{base}/img/hero.webp")])
            .assert()
            .success()
            .stdout(predicate::str::diff("WEBP"))
            .stderr(predicate::str::contains("[cache]"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn redirected_asset_is_not_cached() {
        let temp = TempDir::new().unwrap();
        let server = origin(SITE_PAGES).await;
        let base = server.uri();
        Mock::given(method("GET"))
            .and(path("/img/banner.webp"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{base}/img/hero.webp").as_str()),
            )
            .mount(&server)
            .await;
        let config = write_config(&temp, &base, 2, "");

        swcache(&config).arg("install").assert().success();
        swcache(&config)
            .args(["fetch", "-I", &format!("{base}/img/banner.webp")])
            .assert()
            .success()
            .stdout(predicate::str::contains("redirected: true"));

        drop(server);
        swcache(&config)
            .args(["fetch", &format!("{base}/img/banner.webp")])
            .assert()
            .failure();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_manifest_entry_fails_install() {
        let temp = TempDir::new().unwrap();
        let server = origin(&SITE_PAGES[..3]).await;
        let config = write_config(&temp, &server.uri(), 2, "");

        swcache(&config)
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Install of elite-fit-cache-v2 failed"));

        swcache(&config)
            .args(["cache", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn previous_version_serves_after_failed_upgrade() {
        let temp = TempDir::new().unwrap();
        let server = origin(SITE_PAGES).await;
        let base = server.uri();

        let v2 = write_config(&temp, &base, 2, "");
        swcache(&v2).arg("install").assert().success();

        let v3 = write_config(
            &temp,
            &base,
            3,
            "\n[precache]\nurls = [\"./\", \"./index.html\", \"./css/style.min.css\", \
             \"./js/main.min.js\", \"./js/theme-switcher.min.js\", \"./js/booking.min.js\"]\n",
        );
        swcache(&v3)
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Install of elite-fit-cache-v3 failed"));

        drop(server);
        swcache(&v3)
            .args(["fetch", &format!("{base}/js/main.min.js")])
            .assert()
            .success()
            .stdout(predicate::str::diff("main()"))
            .stderr(predicate::str::contains("[cache]"));

        swcache(&v3)
            .args(["cache", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("elite-fit-cache-v2\n"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn version_bump_reaps_previous_cache() {
        let temp = TempDir::new().unwrap();
        let server = origin(SITE_PAGES).await;
        let base = server.uri();

        let v1 = write_config(&temp, &base, 1, "");
        swcache(&v1).arg("install").assert().success();

        let v2 = write_config(&temp, &base, 2, "");
        swcache(&v2)
            .args(["install", "--no-activate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("waiting"));

        swcache(&v2)
            .args(["cache", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("elite-fit-cache-v1\nelite-fit-cache-v2\n"));

        swcache(&v2)
            .arg("activate")
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted stale cache elite-fit-cache-v1"));

        swcache(&v2)
            .args(["cache", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("elite-fit-cache-v2\n"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cache_clear_with_yes_removes_everything() {
        let temp = TempDir::new().unwrap();
        let server = origin(SITE_PAGES).await;
        let base = server.uri();
        let config = write_config(&temp, &base, 2, "");

        swcache(&config).arg("install").assert().success();
        swcache(&config)
            .args(["cache", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted elite-fit-cache-v2"));

        swcache(&config)
            .args(["fetch", &format!("{base}/js/main.min.js")])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No activated worker"));
    }
}
