use crate::webdriver::{WebDriverClient, capabilities};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use uiscript_common::Locator;
use uiscript_engine::config::DriverConfig;
use uiscript_engine::driver::{Driver, DriverError, ElementHandle};

const HIGHLIGHT_SCRIPT: &str = r#"
    const el = arguments[0];
    const previous = el.getAttribute('style');
    el.setAttribute('style', (previous || '') + '; background: yellow; border: 2px solid red;');
    return previous;
"#;

const RESTORE_STYLE_SCRIPT: &str = r#"
    const el = arguments[0];
    if (arguments[1] === null) { el.removeAttribute('style'); }
    else { el.setAttribute('style', arguments[1]); }
"#;

const SUBMIT_SCRIPT: &str = r#"
    const el = arguments[0];
    const form = el.form || el.closest('form');
    if (form) { form.submit(); } else { el.click(); }
"#;

/// [`Driver`] over a W3C WebDriver server.
///
/// Located elements live in a handle table that is emptied on every frame
/// switch and navigation, and whenever the session releases them between
/// lines, so the table stays as small as one line's lookups.
pub struct WebDriverBackend {
    client: Option<WebDriverClient>,
    config: DriverConfig,
    elements: HashMap<u64, (Locator, Element)>,
    next_handle: u64,
}

impl WebDriverBackend {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            client: None,
            config,
            elements: HashMap::new(),
            next_handle: 0,
        }
    }

    pub fn with_url(webdriver_url: impl Into<String>) -> Self {
        Self::new(DriverConfig {
            webdriver_url: webdriver_url.into(),
            ..DriverConfig::default()
        })
    }

    fn client(&self) -> Result<&fantoccini::Client, DriverError> {
        self.client
            .as_ref()
            .map(|c| &c.client)
            .ok_or(DriverError::NotReady)
    }

    fn store(&mut self, locator: &Locator, element: Element) -> ElementHandle {
        let id = self.next_handle;
        self.next_handle += 1;
        self.elements.insert(id, (locator.clone(), element));
        ElementHandle(id)
    }

    fn element(&self, handle: ElementHandle) -> Result<(&Locator, &Element), DriverError> {
        self.elements
            .get(&handle.0)
            .map(|(locator, element)| (locator, element))
            .ok_or_else(|| DriverError::ElementStale {
                locator: format!("handle {}", handle.0),
            })
    }

    fn forget_elements(&mut self) {
        self.elements.clear();
    }
}

fn to_webdriver(locator: &Locator) -> fantoccini::Locator<'_> {
    match locator {
        Locator::XPath(xpath) => fantoccini::Locator::XPath(xpath),
        Locator::Css(css) => fantoccini::Locator::Css(css),
        Locator::Id(id) => fantoccini::Locator::Id(id),
    }
}

/// XPath string literal for `value`, falling back to `concat()` when it
/// holds both quote characters.
pub(crate) fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Locates a frame or iframe by its `name` or `id` attribute.
pub(crate) fn frame_xpath(frame: &str) -> String {
    let name = xpath_literal(frame);
    format!(
        "//iframe[@name={0} or @id={0}] | //frame[@name={0} or @id={0}]",
        name
    )
}

fn map_element_error(locator: &Locator, err: CmdError) -> DriverError {
    if err.is_no_such_element() {
        return DriverError::ElementNotFound {
            locator: locator.to_string(),
        };
    }
    let text = err.to_string();
    let lowered = text.to_lowercase();
    if lowered.contains("stale element") {
        DriverError::ElementStale {
            locator: locator.to_string(),
        }
    } else if lowered.contains("not interactable") || lowered.contains("click intercepted") {
        DriverError::ElementNotInteractable { reason: text }
    } else {
        DriverError::Other(text)
    }
}

fn script_error(err: CmdError) -> DriverError {
    DriverError::Script(err.to_string())
}

fn element_arg(element: &Element) -> Result<serde_json::Value, DriverError> {
    Ok(serde_json::to_value(element)?)
}

#[async_trait]
impl Driver for WebDriverBackend {
    async fn launch(&mut self) -> Result<(), DriverError> {
        info!(
            "Connecting to {} WebDriver at {}...",
            self.config.browser, self.config.webdriver_url
        );
        let caps = capabilities(&self.config.browser, self.config.headless);
        let client = WebDriverClient::connect(&self.config.webdriver_url, caps).await?;

        if self.config.implicit_wait_ms > 0 {
            client
                .client
                .update_timeouts(fantoccini::wd::TimeoutConfiguration::new(
                    None,
                    None,
                    Some(Duration::from_millis(self.config.implicit_wait_ms)),
                ))
                .await
                .map_err(|e| DriverError::Other(format!("Failed to set implicit wait: {}", e)))?;
        }

        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.forget_elements();
        if let Some(client) = self.client.take() {
            client.close().await?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        info!("Navigating to: {}", url);
        self.client()?
            .goto(url)
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        self.forget_elements();
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        self.client()?
            .current_url()
            .await
            .map(|u| u.to_string())
            .map_err(|e| DriverError::Other(format!("current_url failed: {}", e)))
    }

    async fn title(&mut self) -> Result<String, DriverError> {
        self.client()?
            .title()
            .await
            .map_err(|e| DriverError::Other(format!("title failed: {}", e)))
    }

    async fn find(&mut self, locator: &Locator) -> Result<ElementHandle, DriverError> {
        let element = self
            .client()?
            .find(to_webdriver(locator))
            .await
            .map_err(|e| map_element_error(locator, e))?;
        Ok(self.store(locator, element))
    }

    async fn find_all(&mut self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError> {
        let found = match self.client()?.find_all(to_webdriver(locator)).await {
            Ok(found) => found,
            Err(e) if e.is_no_such_element() => Vec::new(),
            Err(e) => return Err(map_element_error(locator, e)),
        };
        Ok(found
            .into_iter()
            .map(|element| self.store(locator, element))
            .collect())
    }

    async fn click(&mut self, element: ElementHandle) -> Result<(), DriverError> {
        let (locator, element) = self.element(element)?;
        element
            .click()
            .await
            .map_err(|e| map_element_error(locator, e))
    }

    async fn send_keys(&mut self, element: ElementHandle, text: &str) -> Result<(), DriverError> {
        let (locator, element) = self.element(element)?;
        element
            .send_keys(text)
            .await
            .map_err(|e| map_element_error(locator, e))
    }

    async fn clear(&mut self, element: ElementHandle) -> Result<(), DriverError> {
        let (locator, element) = self.element(element)?;
        element
            .clear()
            .await
            .map_err(|e| map_element_error(locator, e))
    }

    async fn submit(&mut self, element: ElementHandle) -> Result<(), DriverError> {
        let (_, element) = self.element(element)?;
        let arg = element_arg(element)?;
        self.client()?
            .execute(SUBMIT_SCRIPT, vec![arg])
            .await
            .map_err(script_error)?;
        Ok(())
    }

    async fn text(&mut self, element: ElementHandle) -> Result<String, DriverError> {
        let (locator, element) = self.element(element)?;
        element
            .text()
            .await
            .map_err(|e| map_element_error(locator, e))
    }

    async fn is_displayed(&mut self, element: ElementHandle) -> Result<bool, DriverError> {
        let (locator, element) = self.element(element)?;
        element
            .is_displayed()
            .await
            .map_err(|e| map_element_error(locator, e))
    }

    async fn is_enabled(&mut self, element: ElementHandle) -> Result<bool, DriverError> {
        let (locator, element) = self.element(element)?;
        element
            .is_enabled()
            .await
            .map_err(|e| map_element_error(locator, e))
    }

    async fn switch_to_frame(&mut self, frame: Option<&str>) -> Result<(), DriverError> {
        self.forget_elements();
        let client = self.client()?;
        client
            .enter_frame(None)
            .await
            .map_err(|e| DriverError::Frame(format!("top level: {}", e)))?;

        if let Some(frame) = frame {
            debug!("Entering frame '{}'", frame);
            let xpath = frame_xpath(frame);
            let element = client
                .find(fantoccini::Locator::XPath(&xpath))
                .await
                .map_err(|e| DriverError::Frame(format!("{}: {}", frame, e)))?;
            element
                .enter_frame()
                .await
                .map_err(|e| DriverError::Frame(format!("{}: {}", frame, e)))?;
        }
        Ok(())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        self.client()?
            .screenshot()
            .await
            .map_err(|e| DriverError::Other(format!("Screenshot failed: {}", e)))
    }

    async fn release_elements(&mut self) {
        self.forget_elements();
    }

    async fn back(&mut self) -> Result<(), DriverError> {
        self.client()?
            .back()
            .await
            .map_err(|e| DriverError::Navigation(format!("back failed: {}", e)))?;
        self.forget_elements();
        Ok(())
    }

    async fn refresh(&mut self) -> Result<(), DriverError> {
        self.client()?
            .refresh()
            .await
            .map_err(|e| DriverError::Navigation(format!("refresh failed: {}", e)))?;
        self.forget_elements();
        Ok(())
    }

    async fn select_by_label(
        &mut self,
        element: ElementHandle,
        label: &str,
    ) -> Result<(), DriverError> {
        let (locator, element) = self.element(element)?;
        element.select_by_label(label).await.map_err(|e| {
            if e.is_no_such_element() {
                DriverError::ElementNotFound {
                    locator: format!("{} option '{}'", locator, label),
                }
            } else {
                map_element_error(locator, e)
            }
        })
    }

    async fn highlight(
        &mut self,
        element: ElementHandle,
        duration: Duration,
    ) -> Result<(), DriverError> {
        let (_, element) = self.element(element)?;
        let arg = element_arg(element)?;
        let client = self.client()?;

        let previous = client
            .execute(HIGHLIGHT_SCRIPT, vec![arg.clone()])
            .await
            .map_err(script_error)?;
        tokio::time::sleep(duration).await;

        // The page may have moved on while we slept.
        if let Err(e) = client.execute(RESTORE_STYLE_SCRIPT, vec![arg, previous]).await {
            warn!("Failed to restore element style: {}", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xpath_literal_quoting() {
        assert_eq!(xpath_literal("ads"), "'ads'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert_eq!(
            xpath_literal(r#"a'b"c"#),
            r#"concat('a', "'", 'b"c')"#
        );
    }

    #[test]
    fn test_frame_xpath_matches_name_or_id() {
        assert_eq!(
            frame_xpath("editor"),
            "//iframe[@name='editor' or @id='editor'] | //frame[@name='editor' or @id='editor']"
        );
    }

    #[test]
    fn test_locator_mapping() {
        let xpath = Locator::XPath("//a".into());
        let css = Locator::Css("a.link".into());
        let id = Locator::Id("q".into());
        assert!(matches!(to_webdriver(&xpath), fantoccini::Locator::XPath("//a")));
        assert!(matches!(to_webdriver(&css), fantoccini::Locator::Css("a.link")));
        assert!(matches!(to_webdriver(&id), fantoccini::Locator::Id("q")));
    }

    #[tokio::test]
    async fn test_operations_before_launch_are_not_ready() {
        let mut backend = WebDriverBackend::with_url("http://localhost:4444");
        assert!(!backend.is_ready().await);
        assert!(matches!(
            backend.navigate("https://example.com").await,
            Err(DriverError::NotReady)
        ));
        assert!(matches!(
            backend.click(ElementHandle(0)).await,
            Err(DriverError::ElementStale { .. })
        ));
        backend.release_elements().await;
        assert_eq!(backend.elements.len(), 0);
        assert!(backend.close().await.is_ok());
    }
}
