use crate::support::create_test_config;
use galleria::browser::{build_http_client, HttpBrowser};
use galleria::output::{write_report, BatchReport};
use galleria::retrieve::HttpTransfer;
use galleria::CrawlOrchestrator;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_http_driver_full_cycle() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/product-detail/Steel-Widget_1600123456.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(format!(
                    r#"<html><head><title>Steel Widget</title></head><body>
                    <div class="image-list-item"><img src="{base}/kf/H1.jpg_50x50.jpg"></div>
                    <img src="{base}/kf/H1.jpg_24x24.jpg">
                    <img data-src="/kf/H2.png_120x120.png">
                    </body></html>"#
                )),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/kf/H1.jpg_960x960q80.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 256]))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/kf/H2.png_960x960q80.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.site.cdn_domain = "127.0.0.1".to_string();
    config.crawl.retry_base_delay_ms = 10;

    let client = build_http_client(&config).unwrap();
    let browser = Arc::new(HttpBrowser::new(client.clone(), 5));
    let transfer = Arc::new(HttpTransfer::new(client));
    let orchestrator = CrawlOrchestrator::new(&config, browser, transfer).unwrap();

    let address = format!("{}/product-detail/Steel-Widget_1600123456.html", base);
    let outcomes = orchestrator.run_batch(&[address]).await;

    let result = outcomes[0].result.as_ref().unwrap();
    assert!(result.success);
    assert_eq!(result.display_name, "Steel Widget");
    assert_eq!(
        result.retrieved_paths,
        vec![dir.path().join("1600123456").join("Steel_Widget_1.jpg")]
    );
    assert_eq!(result.failures.len(), 1);
    assert!(result.failures[0].url.ends_with("/kf/H2.png_960x960q80.png"));
    assert!(!dir.path().join("1600123456").join("Steel_Widget_2.png").exists());

    let saved = std::fs::read(&result.retrieved_paths[0]).unwrap();
    assert_eq!(saved.len(), 256);

    let report = BatchReport::new(chrono::Utc::now(), "default", &config.retrieval.download_root, outcomes);
    let (json_path, markdown_path) = write_report(&report, dir.path()).unwrap();
    assert!(json_path.ends_with("report.json"));
    assert!(std::fs::read_to_string(markdown_path).unwrap().contains("Steel Widget"));
}
