use crate::support::{create_test_config, FakeBrowser, FakePage, FakeTransfer, NavStep};
use galleria::browser::{ResponseEvent, WaitCondition};
use galleria::crawler::OutcomeStatus;
use galleria::{CrawlOrchestrator, GalleriaError};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

const WIDGET: &str = "https://www.example.com/product-detail/Steel-Widget_1600123456.html";
const GADGET: &str = "https://www.example.com/product-detail/Gadget_1600999999.html";

fn orchestrator(
    dir: &TempDir,
    browser: Arc<FakeBrowser>,
    transfer: Arc<FakeTransfer>,
) -> CrawlOrchestrator {
    CrawlOrchestrator::new(&create_test_config(dir.path()), browser, transfer).unwrap()
}

fn widget_page() -> FakePage {
    FakePage::with_images(
        "Steel Widget",
        &[
            "https://sc04.alicdn.com/kf/H1.jpg_50x50.jpg",
            "https://sc04.alicdn.com/kf/H1.jpg_960x960q80.jpg",
            "https://sc04.alicdn.com/kf/H2.png",
            "https://img.alicdn.com/tps/i1/TB1icon.png",
        ],
    )
}

#[tokio::test]
async fn test_single_target_end_to_end() {
    let dir = TempDir::new().unwrap();
    let browser = Arc::new(FakeBrowser::new().page(WIDGET, widget_page()));
    let transfer = Arc::new(FakeTransfer::default());
    let orchestrator = orchestrator(&dir, browser.clone(), transfer.clone());

    let result = orchestrator.run_target(WIDGET).await.unwrap();

    assert!(result.success);
    assert_eq!(result.target_id, "1600123456");
    assert_eq!(result.display_name, "Steel Widget");
    assert_eq!(result.attempts, 1);
    assert_eq!(
        *transfer.fetched.lock().unwrap(),
        vec![
            "https://sc04.alicdn.com/kf/H1.jpg_960x960q80.jpg".to_string(),
            "https://sc04.alicdn.com/kf/H2.png_960x960q80.png".to_string(),
        ]
    );
    assert_eq!(
        result.retrieved_paths,
        vec![
            dir.path().join("1600123456").join("Steel_Widget_1.jpg"),
            dir.path().join("1600123456").join("Steel_Widget_2.png"),
        ]
    );
    assert!(browser.hovers.lock().unwrap().contains(&"body".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_retry_backoff_before_later_attempts_only() {
    let dir = TempDir::new().unwrap();
    let browser = Arc::new(
        FakeBrowser::new()
            .page(WIDGET, widget_page())
            .steps(WIDGET, &[NavStep::Crash, NavStep::Crash, NavStep::Load]),
    );
    let orchestrator = orchestrator(&dir, browser.clone(), Arc::new(FakeTransfer::default()));

    let start = Instant::now();
    let result = orchestrator.run_target(WIDGET).await.unwrap();

    assert!(result.success);
    assert_eq!(result.attempts, 3);

    let times: Vec<Instant> = browser
        .navigations
        .lock()
        .unwrap()
        .iter()
        .map(|(_, _, at)| *at)
        .collect();
    assert_eq!(times.len(), 3);

    // No delay before attempt 1, then base * 1 and base * 2
    assert!(times[0] - start < Duration::from_millis(10));
    let first_gap = times[1] - times[0];
    let second_gap = times[2] - times[1];
    assert!(first_gap >= Duration::from_millis(2000) && first_gap < Duration::from_millis(2100));
    assert!(second_gap >= Duration::from_millis(4000) && second_gap < Duration::from_millis(4100));
}

#[tokio::test(start_paused = true)]
async fn test_retry_exhaustion_carries_last_error() {
    let dir = TempDir::new().unwrap();
    let browser = Arc::new(
        FakeBrowser::new().steps(WIDGET, &[NavStep::Crash, NavStep::Crash, NavStep::Crash]),
    );
    let orchestrator = orchestrator(&dir, browser.clone(), Arc::new(FakeTransfer::default()));

    let err = orchestrator.run_target(WIDGET).await.unwrap_err();

    match err {
        GalleriaError::RetryExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, GalleriaError::Browser(_)));
        }
        other => panic!("expected RetryExhausted, got {:?}", other),
    }
    assert_eq!(browser.navigation_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_navigation_is_retried() {
    let dir = TempDir::new().unwrap();
    let browser = Arc::new(
        FakeBrowser::new()
            .page(WIDGET, widget_page())
            .steps(WIDGET, &[NavStep::Reject, NavStep::Load]),
    );
    let orchestrator = orchestrator(&dir, browser.clone(), Arc::new(FakeTransfer::default()));

    let result = orchestrator.run_target(WIDGET).await.unwrap();

    assert!(result.success);
    assert_eq!(result.attempts, 2);
    assert_eq!(browser.navigation_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_every_attempt_exhausts() {
    let dir = TempDir::new().unwrap();
    let browser = Arc::new(
        FakeBrowser::new().steps(WIDGET, &[NavStep::Reject, NavStep::Reject, NavStep::Reject]),
    );
    let orchestrator = orchestrator(&dir, browser.clone(), Arc::new(FakeTransfer::default()));

    let err = orchestrator.run_target(WIDGET).await.unwrap_err();

    match err {
        GalleriaError::RetryExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, GalleriaError::Validation { .. }));
        }
        other => panic!("expected RetryExhausted, got {:?}", other),
    }
    assert_eq!(browser.navigation_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_huge_base_delay_does_not_overflow() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.crawl.retry_base_delay_ms = u64::MAX / 2 + 1;
    let browser = Arc::new(
        FakeBrowser::new()
            .page(WIDGET, widget_page())
            .steps(WIDGET, &[NavStep::Crash, NavStep::Crash, NavStep::Load]),
    );
    let orchestrator =
        CrawlOrchestrator::new(&config, browser.clone(), Arc::new(FakeTransfer::default()))
            .unwrap();

    let result = orchestrator.run_target(WIDGET).await.unwrap();

    assert_eq!(result.attempts, 3);
    assert_eq!(browser.navigation_count(), 3);
}

#[tokio::test]
async fn test_payload_product_id_names_output_when_address_has_none() {
    let address = "https://www.example.com/item/steel-mug";
    let page = FakePage {
        events: vec![ResponseEvent {
            url: "https://www.example.com/api/detail".to_string(),
            content_type: "application/json".to_string(),
            body: serde_json::json!({
                "data": {
                    "productId": "1600777",
                    "images": ["https://sc04.alicdn.com/kf/M1.jpg_960x960q80.jpg"]
                }
            })
            .to_string(),
        }],
        title: Some("Steel Mug".to_string()),
        ..Default::default()
    };
    let dir = TempDir::new().unwrap();
    let browser = Arc::new(FakeBrowser::new().page(address, page));
    let orchestrator = orchestrator(&dir, browser, Arc::new(FakeTransfer::default()));

    let outcomes = orchestrator.run_batch(&[address.to_string()]).await;

    assert_eq!(outcomes[0].status, OutcomeStatus::Retrieved);
    assert_eq!(outcomes[0].target_id, "1600777");
    let result = outcomes[0].result.as_ref().unwrap();
    assert_eq!(
        result.retrieved_paths,
        vec![dir.path().join("1600777").join("Steel_Mug_1.jpg")]
    );
}

#[tokio::test]
async fn test_malformed_address_never_navigates() {
    let dir = TempDir::new().unwrap();
    let browser = Arc::new(FakeBrowser::new());
    let orchestrator = orchestrator(&dir, browser.clone(), Arc::new(FakeTransfer::default()));

    let err = orchestrator.run_target("not a url").await.unwrap_err();

    assert!(matches!(err, GalleriaError::Validation { .. }));
    assert_eq!(browser.navigation_count(), 0);
}

#[tokio::test]
async fn test_network_idle_timeout_falls_back_within_attempt() {
    let dir = TempDir::new().unwrap();
    let browser = Arc::new(
        FakeBrowser::new()
            .page(WIDGET, widget_page())
            .steps(WIDGET, &[NavStep::Timeout, NavStep::Load]),
    );
    let orchestrator = orchestrator(&dir, browser.clone(), Arc::new(FakeTransfer::default()));

    let result = orchestrator.run_target(WIDGET).await.unwrap();

    assert_eq!(result.attempts, 1);
    let waits: Vec<WaitCondition> = browser
        .navigations
        .lock()
        .unwrap()
        .iter()
        .map(|(_, wait, _)| *wait)
        .collect();
    assert_eq!(
        waits,
        vec![WaitCondition::NetworkIdle, WaitCondition::DomContentLoaded]
    );
}

#[tokio::test]
async fn test_empty_page_is_unsuccessful_not_error() {
    let dir = TempDir::new().unwrap();
    let browser = Arc::new(FakeBrowser::new().page(
        WIDGET,
        FakePage {
            title: Some("Blank".to_string()),
            ..Default::default()
        },
    ));
    let transfer = Arc::new(FakeTransfer::default());
    let orchestrator = orchestrator(&dir, browser, transfer.clone());

    let result = orchestrator.run_target(WIDGET).await.unwrap();

    assert!(!result.success);
    assert!(result.retrieved_paths.is_empty());
    assert_eq!(result.total_candidates_found, 0);
    assert!(transfer.fetched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_title_uses_target_id() {
    let dir = TempDir::new().unwrap();
    let mut page = widget_page();
    page.title = None;
    let browser = Arc::new(FakeBrowser::new().page(WIDGET, page));
    let orchestrator = orchestrator(&dir, browser, Arc::new(FakeTransfer::default()));

    let result = orchestrator.run_target(WIDGET).await.unwrap();

    assert_eq!(result.display_name, "1600123456");
}

#[tokio::test]
async fn test_lazy_load_stops_on_equal_heights() {
    let dir = TempDir::new().unwrap();
    let mut page = widget_page();
    page.heights = vec![1000, 2000, 3000, 3000];
    let browser = Arc::new(FakeBrowser::new().page(WIDGET, page));
    let orchestrator = orchestrator(&dir, browser.clone(), Arc::new(FakeTransfer::default()));

    orchestrator.run_target(WIDGET).await.unwrap();

    assert_eq!(browser.scrolls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_lazy_load_round_cap() {
    let dir = TempDir::new().unwrap();
    let mut page = widget_page();
    page.heights = (1..=100).map(|n| n * 1000).collect();
    let browser = Arc::new(FakeBrowser::new().page(WIDGET, page));

    let mut config = create_test_config(dir.path());
    config.crawl.max_scroll_rounds = 4;
    let orchestrator =
        CrawlOrchestrator::new(&config, browser.clone(), Arc::new(FakeTransfer::default())).unwrap();

    orchestrator.run_target(WIDGET).await.unwrap();

    assert_eq!(browser.scrolls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_gallery_selectors_hovered_each_round() {
    let dir = TempDir::new().unwrap();
    let mut page = widget_page();
    page.heights = vec![1000, 2000, 2000];
    let browser = Arc::new(FakeBrowser::new().page(WIDGET, page));
    let orchestrator = orchestrator(&dir, browser.clone(), Arc::new(FakeTransfer::default()));

    orchestrator.run_target(WIDGET).await.unwrap();

    let hovers = browser.hovers.lock().unwrap();
    let thumb_hovers = hovers.iter().filter(|s| s.as_str() == "[data-role='thumb']").count();
    assert_eq!(thumb_hovers, 2);
}

#[tokio::test]
async fn test_dom_pass_captures_image_sources() {
    let dir = TempDir::new().unwrap();
    let browser = Arc::new(FakeBrowser::new().page(
        WIDGET,
        FakePage {
            title: Some("Widget".to_string()),
            image_sources: vec!["//sc01.alicdn.com/kf/Hdom.jpg_100x100.jpg".to_string()],
            ..Default::default()
        },
    ));
    let transfer = Arc::new(FakeTransfer::default());
    let orchestrator = orchestrator(&dir, browser, transfer.clone());

    let result = orchestrator.run_target(WIDGET).await.unwrap();

    assert!(result.success);
    assert_eq!(
        *transfer.fetched.lock().unwrap(),
        vec!["https://sc01.alicdn.com/kf/Hdom.jpg_960x960q80.jpg".to_string()]
    );
}

#[tokio::test]
async fn test_global_urls_ranked_when_target_has_none() {
    let dir = TempDir::new().unwrap();
    let browser = Arc::new(FakeBrowser::new().page(
        WIDGET,
        FakePage {
            title: Some("Widget".to_string()),
            ..Default::default()
        },
    ));
    let transfer = Arc::new(FakeTransfer::default());
    let orchestrator = orchestrator(&dir, browser, transfer.clone());

    // Captured under another key before the run
    orchestrator.engine().extract(
        "https://sc04.alicdn.com/kf/A.jpg_800x800.jpg https://sc04.alicdn.com/kf/B.jpg_1600x1600.jpg",
        None,
    );

    let result = orchestrator.run_target(WIDGET).await.unwrap();

    assert!(result.success);
    assert_eq!(
        *transfer.fetched.lock().unwrap(),
        vec![
            "https://sc04.alicdn.com/kf/B.jpg_1600x1600.jpg".to_string(),
            "https://sc04.alicdn.com/kf/A.jpg_800x800.jpg".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_batch_clears_between_targets() {
    let dir = TempDir::new().unwrap();
    let browser = Arc::new(
        FakeBrowser::new()
            .page(WIDGET, widget_page())
            .page(
                GADGET,
                FakePage {
                    title: Some("Gadget".to_string()),
                    ..Default::default()
                },
            ),
    );
    let transfer = Arc::new(FakeTransfer::default());
    let orchestrator = orchestrator(&dir, browser, transfer.clone());

    let outcomes = orchestrator
        .run_batch(&[WIDGET.to_string(), GADGET.to_string()])
        .await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].status, OutcomeStatus::Retrieved);
    // Nothing from the first target leaks into the second
    assert_eq!(outcomes[1].status, OutcomeStatus::Empty);
    assert_eq!(transfer.fetched.lock().unwrap().len(), 2);
    assert_eq!(orchestrator.engine().total_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_batch_continues_after_exhaustion() {
    let dir = TempDir::new().unwrap();
    let browser = Arc::new(
        FakeBrowser::new()
            .page(GADGET, FakePage::with_images("Gadget", &["https://sc04.alicdn.com/kf/G1.jpg_960x960.jpg"]))
            .steps(WIDGET, &[NavStep::Crash, NavStep::Crash, NavStep::Crash]),
    );
    let orchestrator = orchestrator(&dir, browser, Arc::new(FakeTransfer::default()));

    let outcomes = orchestrator
        .run_batch(&[WIDGET.to_string(), GADGET.to_string()])
        .await;

    assert_eq!(outcomes[0].status, OutcomeStatus::Failed);
    assert!(outcomes[0].error.as_ref().unwrap().contains("3 attempts"));
    assert_eq!(outcomes[1].status, OutcomeStatus::Retrieved);
    assert_eq!(outcomes[1].target_id, "1600999999");
}
