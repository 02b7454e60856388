//! Live browser tests.
//!
//! These need a WebDriver server (geckodriver or chromedriver) listening on
//! `UISCRIPT_WEBDRIVER_URL`, default `http://localhost:4444`. Tests run
//! sequentially via `#[serial]` since they share the one server.

use serial_test::serial;
use std::time::Duration;
use uiscript_common::Locator;
use uiscript_engine::config::DriverConfig;
use uiscript_engine::driver::{Driver, DriverError};
use uiscript_webdriver::WebDriverBackend;

const PAGE: &str = "data:text/html,<html><head><title>Fixture</title></head><body>\
<form id='f'><input id='q' name='q'><select id='cat'><option>Books</option><option>Music</option></select></form>\
<button id='off' disabled>Off</button>\
<iframe name='ads' srcdoc=\"<a id='ad-link' href='#'>Buy</a>\"></iframe>\
</body></html>";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn backend() -> WebDriverBackend {
    let url = std::env::var("UISCRIPT_WEBDRIVER_URL")
        .unwrap_or_else(|_| "http://localhost:4444".to_string());
    WebDriverBackend::new(DriverConfig {
        webdriver_url: url,
        headless: true,
        ..DriverConfig::default()
    })
}

#[tokio::test]
#[serial]
#[ignore] // Requires a running WebDriver server
async fn test_webdriver_lifecycle() {
    init_tracing();
    let mut backend = backend();
    backend.launch().await.expect("Failed to launch backend");
    assert!(backend.is_ready().await);

    backend.navigate(PAGE).await.unwrap();
    assert_eq!(backend.title().await.unwrap(), "Fixture");

    let input = backend.find(&Locator::Id("q".into())).await.unwrap();
    backend.send_keys(input, "rust").await.unwrap();
    backend.release_elements().await;
    // Released handles are stale even though the page did not change.
    assert!(matches!(
        backend.text(input).await,
        Err(DriverError::ElementStale { .. })
    ));

    let select = backend.find(&Locator::Id("cat".into())).await.unwrap();
    backend.select_by_label(select, "Music").await.unwrap();
    assert!(matches!(
        backend.select_by_label(select, "Films").await,
        Err(DriverError::ElementNotFound { .. })
    ));

    let off = backend.find(&Locator::Id("off".into())).await.unwrap();
    assert!(!backend.is_enabled(off).await.unwrap());
    backend
        .highlight(off, Duration::from_millis(10))
        .await
        .unwrap();

    assert!(matches!(
        backend.find(&Locator::Css("#absent".into())).await,
        Err(DriverError::ElementNotFound { .. })
    ));
    assert!(backend
        .find_all(&Locator::Css(".absent".into()))
        .await
        .unwrap()
        .is_empty());

    backend.close().await.unwrap();
}

#[tokio::test]
#[serial]
#[ignore] // Requires a running WebDriver server
async fn test_webdriver_frames() {
    init_tracing();
    let mut backend = backend();
    backend.launch().await.expect("Failed to launch backend");
    backend.navigate(PAGE).await.unwrap();

    let ad = Locator::Id("ad-link".into());
    assert!(backend.find(&ad).await.is_err());

    backend.switch_to_frame(Some("ads")).await.unwrap();
    let link = backend.find(&ad).await.unwrap();
    assert_eq!(backend.text(link).await.unwrap(), "Buy");

    backend.switch_to_frame(None).await.unwrap();
    // Handles do not survive a frame switch.
    assert!(matches!(
        backend.text(link).await,
        Err(DriverError::ElementStale { .. })
    ));
    assert!(backend.find(&Locator::Id("q".into())).await.is_ok());

    assert!(matches!(
        backend.switch_to_frame(Some("missing")).await,
        Err(DriverError::Frame(_))
    ));

    backend.close().await.unwrap();
}
