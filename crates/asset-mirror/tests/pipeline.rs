//! End-to-end runs against a mock HTTP server.

use std::path::Path;
use std::time::{Duration, Instant};

use asset_mirror::{
    read_metadata, run, AssetCategory, FetchConfig, HttpClient, MirrorError, MirrorWriter,
    RunConfig, Throttle,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ─────────────────────── helpers ───────────────────────

const LANDING: &str = r#"<!DOCTYPE html>
<html>
<head>
  <link rel="stylesheet" href="/css/a.css">
  <link rel="stylesheet" href="/static/b.css">
  <link rel="icon" href="/favicon.ico">
  <script src="/js/app.js"></script>
  <script>window.dataLayer = [];</script>
</head>
<body>
  <img src="/img/a.png">
  <img alt="placeholder">
  <img src="/img/b.webp">
  <img src="/img/photo">
</body>
</html>"#;

fn client() -> HttpClient {
    HttpClient::new(&FetchConfig::default()).unwrap()
}

async fn serve(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn serve_landing(server: &MockServer) {
    serve(server, "/landing", 200, LANDING).await;
    serve(server, "/css/a.css", 200, "body{}").await;
    serve(server, "/static/b.css", 200, "p{}").await;
    serve(server, "/js/app.js", 200, "console.log(1)").await;
    serve(server, "/img/a.png", 200, "png").await;
    serve(server, "/img/b.webp", 200, "webp").await;
    serve(server, "/img/photo", 200, "jpeg").await;
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ─────────────────────── tests ───────────────────────

#[tokio::test]
async fn site_run_mirrors_every_category() {
    let server = MockServer::start().await;
    serve_landing(&server).await;
    let out = tempfile::tempdir().unwrap();
    let root = out.path().join("mirror");

    let config = RunConfig::site(format!("{}/landing", server.uri()), &root)
        .with_throttle(Throttle::NONE);
    let summary = run(&config, &client()).await.unwrap();

    assert_eq!(files_in(&root.join("css")), vec!["style_1.css", "style_2.css"]);
    assert_eq!(files_in(&root.join("js")), vec!["script_1.js"]);
    assert_eq!(
        files_in(&root.join("images")),
        vec!["image_1.png", "image_2.webp", "image_3.jpg"]
    );
    assert!(files_in(&root.join("fonts")).is_empty());

    assert_eq!(
        std::fs::read_to_string(root.join("index.html")).unwrap(),
        LANDING
    );
    assert_eq!(
        std::fs::read_to_string(root.join("css/style_2.css")).unwrap(),
        "p{}"
    );

    let meta = read_metadata(&root.join("metadata.json")).await.unwrap();
    assert_eq!(meta.source_url, format!("{}/landing", server.uri()));
    assert_eq!(meta.stats(AssetCategory::Stylesheet).unwrap().found, 2);
    assert_eq!(meta.stats(AssetCategory::Script).unwrap().found, 1);
    assert_eq!(meta.stats(AssetCategory::Image).unwrap().found, 3);
    assert_eq!(meta.stats(AssetCategory::Image).unwrap().downloaded, 3);
    assert_eq!(meta.files.html_original, "index.html");

    assert_eq!(summary.total_downloaded(), 6);
    assert_eq!(summary.total_failed(), 0);
    assert!(summary.reference_path.is_none());
}

#[tokio::test]
async fn product_run_writes_script_free_reference() {
    let server = MockServer::start().await;
    serve_landing(&server).await;
    let out = tempfile::tempdir().unwrap();

    let config = RunConfig::product(format!("{}/landing", server.uri()), out.path())
        .with_throttle(Throttle::NONE);
    let summary = run(&config, &client()).await.unwrap();

    let reference = std::fs::read_to_string(summary.reference_path.unwrap()).unwrap();
    assert!(!reference.contains("<script"));
    assert!(reference.contains(&format!(r#"href="{}/css/a.css""#, server.uri())));
    assert!(reference.contains(&format!(r#"src="{}/img/photo""#, server.uri())));

    assert!(out.path().join("lovelydenim-product-detail.html").exists());
    assert!(!out.path().join("fonts").exists());

    let meta = read_metadata(&out.path().join("metadata.json")).await.unwrap();
    assert_eq!(meta.product_name.as_deref(), Some("Camisa Larga Spotlight"));
    assert_eq!(
        meta.description.as_deref(),
        Some("Referencia de página de detalle de producto Lovely Denim")
    );
    assert_eq!(
        meta.files.html_clean.as_deref(),
        Some("product-detail-reference.html")
    );
    assert!(meta.stats(AssetCategory::Font).is_none());
}

#[tokio::test]
async fn asset_failures_do_not_abort_the_run() {
    let server = MockServer::start().await;
    serve(&server, "/landing", 200, LANDING).await;
    serve(&server, "/css/a.css", 404, "").await;
    serve(&server, "/static/b.css", 200, "p{}").await;
    // Everything else is unmatched and answered with 404 by wiremock.
    let out = tempfile::tempdir().unwrap();

    let config = RunConfig::site(format!("{}/landing", server.uri()), out.path())
        .with_throttle(Throttle::NONE);
    let summary = run(&config, &client()).await.unwrap();

    let css = summary.report(AssetCategory::Stylesheet).unwrap();
    assert_eq!(css.success_count(), 1);
    assert_eq!(css.failure_count(), 1);
    assert!(css.failed[0].error.contains("404"));
    assert_eq!(summary.report(AssetCategory::Image).unwrap().success_count(), 0);

    let meta = read_metadata(&summary.metadata_path).await.unwrap();
    assert_eq!(meta.stats(AssetCategory::Stylesheet).unwrap().failed, 1);
    assert_eq!(meta.stats(AssetCategory::Image).unwrap().failed, 3);
}

#[tokio::test]
async fn initial_fetch_failure_is_fatal() {
    let server = MockServer::start().await;
    serve(&server, "/landing", 503, "down").await;
    let out = tempfile::tempdir().unwrap();

    let config = RunConfig::site(format!("{}/landing", server.uri()), out.path())
        .with_throttle(Throttle::NONE);
    let err = run(&config, &client()).await.unwrap_err();

    assert!(matches!(err, MirrorError::Status { status: 503, .. }));
    assert!(!out.path().join("metadata.json").exists());
    assert!(!out.path().join("index.html").exists());
}

#[tokio::test]
async fn image_cap_limits_attempts() {
    let server = MockServer::start().await;
    serve_landing(&server).await;
    let out = tempfile::tempdir().unwrap();

    let config = RunConfig::site(format!("{}/landing", server.uri()), out.path())
        .with_throttle(Throttle::NONE)
        .with_image_limit(Some(2));
    let summary = run(&config, &client()).await.unwrap();

    assert_eq!(summary.report(AssetCategory::Image).unwrap().attempted(), 2);
    let meta = read_metadata(&summary.metadata_path).await.unwrap();
    let images = meta.stats(AssetCategory::Image).unwrap();
    assert_eq!(images.found, 3);
    assert_eq!(images.attempted, 2);
}

#[tokio::test]
async fn rerun_keeps_previous_output() {
    let server = MockServer::start().await;
    serve_landing(&server).await;
    let out = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(out.path().join("images")).unwrap();
    std::fs::write(out.path().join("images/keep.gif"), "old").unwrap();

    let config = RunConfig::site(format!("{}/landing", server.uri()), out.path())
        .with_throttle(Throttle::NONE);
    run(&config, &client()).await.unwrap();

    assert!(out.path().join("images/keep.gif").exists());
    assert_eq!(files_in(&out.path().join("images")).len(), 4);
}

#[tokio::test]
async fn mirror_reports_one_failure_and_one_success() {
    let server = MockServer::start().await;
    serve(&server, "/bad.png", 500, "").await;
    serve(&server, "/good.png", 200, "ok").await;
    let out = tempfile::tempdir().unwrap();
    let dir = out.path().join("images");

    let client = client();
    let urls = vec![
        format!("{}/bad.png", server.uri()),
        format!("{}/good.png", server.uri()),
    ];
    let report = MirrorWriter::new(&client)
        .mirror(&urls, AssetCategory::Image, &dir, Throttle::NONE)
        .await;

    assert_eq!(report.success_count(), 1);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failed[0].url, urls[0]);
    assert_eq!(report.succeeded[0].path, dir.join("image_2.png"));
    assert!(!dir.join("image_1.png").exists());
}

#[tokio::test]
async fn page_copy_keeps_served_bytes() {
    let server = MockServer::start().await;
    let body = b"<html><body><p>Camisa A\xf1o</p><img src=\"/img/a.png\"></body></html>".to_vec();
    Mock::given(method("GET"))
        .and(path("/latin1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.clone(), "text/html; charset=iso-8859-1"),
        )
        .mount(&server)
        .await;
    serve(&server, "/img/a.png", 200, "png").await;
    let out = tempfile::tempdir().unwrap();

    let config = RunConfig::product(format!("{}/latin1", server.uri()), out.path())
        .with_throttle(Throttle::NONE);
    let summary = run(&config, &client()).await.unwrap();

    assert_eq!(std::fs::read(&summary.page_path).unwrap(), body);
    let reference = std::fs::read_to_string(summary.reference_path.as_ref().unwrap()).unwrap();
    assert!(reference.contains("Camisa A\u{f1}o"));
    assert_eq!(summary.report(AssetCategory::Image).unwrap().success_count(), 1);
}

#[tokio::test]
async fn throttle_separates_consecutive_downloads() {
    let server = MockServer::start().await;
    for route in ["/a.png", "/b.png", "/c.png"] {
        serve(&server, route, 200, "img").await;
    }
    let out = tempfile::tempdir().unwrap();
    let client = client();
    let urls: Vec<String> = ["/a.png", "/b.png", "/c.png"]
        .iter()
        .map(|route| format!("{}{route}", server.uri()))
        .collect();

    let started = Instant::now();
    let report = MirrorWriter::new(&client)
        .mirror(&urls, AssetCategory::Image, out.path(), Throttle::from_millis(100))
        .await;

    assert_eq!(report.success_count(), 3);
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn asset_write_failure_is_recorded_and_the_batch_continues() {
    let server = MockServer::start().await;
    serve(&server, "/a.png", 200, "one").await;
    serve(&server, "/b.png", 200, "two").await;
    let out = tempfile::tempdir().unwrap();
    let dir = out.path().join("images");
    // A directory where the first file should go makes its write fail.
    std::fs::create_dir_all(dir.join("image_1.png")).unwrap();

    let client = client();
    let urls = vec![
        format!("{}/a.png", server.uri()),
        format!("{}/b.png", server.uri()),
    ];
    let report = MirrorWriter::new(&client)
        .mirror(&urls, AssetCategory::Image, &dir, Throttle::NONE)
        .await;

    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failed[0].url, urls[0]);
    assert!(report.failed[0].error.starts_with("Filesystem error"));
    assert_eq!(report.success_count(), 1);
    assert_eq!(std::fs::read_to_string(dir.join("image_2.png")).unwrap(), "two");
}

#[tokio::test]
async fn metadata_write_failure_is_fatal() {
    let server = MockServer::start().await;
    serve_landing(&server).await;
    let out = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(out.path().join("metadata.json")).unwrap();

    let config = RunConfig::site(format!("{}/landing", server.uri()), out.path())
        .with_throttle(Throttle::NONE);
    let err = run(&config, &client()).await.unwrap_err();

    match err {
        MirrorError::Filesystem { path, .. } => assert!(path.ends_with("metadata.json")),
        other => panic!("expected filesystem error, got {other:?}"),
    }
}

#[tokio::test]
async fn reference_write_failure_is_fatal() {
    let server = MockServer::start().await;
    serve_landing(&server).await;
    let out = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(out.path().join("product-detail-reference.html")).unwrap();

    let config = RunConfig::product(format!("{}/landing", server.uri()), out.path())
        .with_throttle(Throttle::NONE);
    let err = run(&config, &client()).await.unwrap_err();

    assert!(matches!(err, MirrorError::Filesystem { .. }));
    assert!(out.path().join("lovelydenim-product-detail.html").exists());
    assert!(!out.path().join("metadata.json").is_file());
}

#[tokio::test]
async fn fetch_sends_configured_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("upgrade-insecure-requests", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client()
        .get(&format!("{}/page", server.uri()))
        .await
        .unwrap();
    assert_eq!(result.status, 200);
    assert_eq!(result.text(), "hello");

    let requests = server.received_requests().await.unwrap();
    let headers = &requests[0].headers;
    assert_eq!(
        headers.get("accept-language").unwrap(),
        "es-AR,es;q=0.9,en;q=0.8"
    );
    assert!(headers
        .get("user-agent")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("Chrome/91"));
}

#[tokio::test]
async fn fetch_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = FetchConfig::default().with_timeout(Duration::from_millis(200));
    let client = HttpClient::new(&config).unwrap();
    let err = client
        .get(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();

    match err {
        MirrorError::Fetch { reason, .. } => assert!(reason.contains("timed out")),
        other => panic!("expected fetch error, got {other:?}"),
    }
}
