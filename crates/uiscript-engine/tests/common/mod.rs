#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use uiscript_common::Locator;
use uiscript_engine::driver::{Driver, DriverError, ElementHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Navigate(String),
    Back,
    Refresh,
    Click(String),
    SendKeys(String, String),
    Clear(String),
    Submit(String),
    Select(String, String),
    Highlight(String),
    SwitchFrame(Option<String>),
    Screenshot,
}

#[derive(Debug, Clone)]
pub struct MockElement {
    pub text: String,
    pub displayed: bool,
    pub enabled: bool,
    /// Only found while this frame is active; `None` means top level.
    pub frame: Option<String>,
    /// Labels accepted by `select_by_label`.
    pub options: Vec<String>,
    /// Clicking navigates here.
    pub navigates_to: Option<String>,
    pub panics_on_click: bool,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            text: String::new(),
            displayed: true,
            enabled: true,
            frame: None,
            options: Vec::new(),
            navigates_to: None,
            panics_on_click: false,
        }
    }
}

impl MockElement {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn hidden() -> Self {
        Self {
            displayed: false,
            ..Self::default()
        }
    }

    pub fn in_frame(frame: &str) -> Self {
        Self {
            frame: Some(frame.to_string()),
            ..Self::default()
        }
    }
}

/// Scripted browser: elements are keyed by their locator's string form.
#[derive(Debug, Default)]
pub struct MockDriver {
    pub url: String,
    pub title: String,
    pub elements: HashMap<String, MockElement>,
    /// Locator to the element keys `find_all` returns, in order.
    pub lists: HashMap<String, Vec<String>>,
    pub active_frame: Option<String>,
    pub calls: Vec<Call>,
    handles: Vec<String>,
}

impl MockDriver {
    pub fn at(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn with(mut self, locator: &str, element: MockElement) -> Self {
        self.elements.insert(locator.to_string(), element);
        self
    }

    pub fn with_list(mut self, locator: &str, items: &[(&str, &str)]) -> Self {
        let mut keys = Vec::new();
        for (key, text) in items {
            self.elements.insert(key.to_string(), MockElement::text(text));
            keys.push(key.to_string());
        }
        self.lists.insert(locator.to_string(), keys);
        self
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn frame_switches(&self) -> Vec<Option<String>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::SwitchFrame(f) => Some(f.clone()),
                _ => None,
            })
            .collect()
    }

    /// Handles handed out since the last release.
    pub fn live_handles(&self) -> usize {
        self.handles.len()
    }

    fn handle_for(&mut self, key: &str) -> ElementHandle {
        self.handles.push(key.to_string());
        ElementHandle(self.handles.len() as u64 - 1)
    }

    fn key(&self, handle: ElementHandle) -> Result<String, DriverError> {
        self.handles
            .get(handle.0 as usize)
            .cloned()
            .ok_or_else(|| DriverError::ElementStale {
                locator: format!("handle {}", handle.0),
            })
    }

    fn element(&self, handle: ElementHandle) -> Result<(String, MockElement), DriverError> {
        let key = self.key(handle)?;
        let element = self
            .elements
            .get(&key)
            .cloned()
            .ok_or_else(|| DriverError::ElementStale {
                locator: key.clone(),
            })?;
        Ok((key, element))
    }

    fn reachable(&self, element: &MockElement) -> bool {
        element.frame == self.active_frame
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn launch(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        true
    }

    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.calls.push(Call::Navigate(url.to_string()));
        self.url = url.to_string();
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.url.clone())
    }

    async fn title(&mut self) -> Result<String, DriverError> {
        Ok(self.title.clone())
    }

    async fn find(&mut self, locator: &Locator) -> Result<ElementHandle, DriverError> {
        let key = locator.to_string();
        match self.elements.get(&key) {
            Some(element) if self.reachable(element) => Ok(self.handle_for(&key)),
            _ => Err(DriverError::ElementNotFound { locator: key }),
        }
    }

    async fn find_all(&mut self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError> {
        let keys = self
            .lists
            .get(&locator.to_string())
            .cloned()
            .unwrap_or_default();
        Ok(keys.iter().map(|k| self.handle_for(k)).collect())
    }

    async fn click(&mut self, element: ElementHandle) -> Result<(), DriverError> {
        let (key, element) = self.element(element)?;
        self.calls.push(Call::Click(key));
        if element.panics_on_click {
            panic!("element exploded");
        }
        if let Some(url) = element.navigates_to {
            self.url = url;
        }
        Ok(())
    }

    async fn send_keys(&mut self, element: ElementHandle, text: &str) -> Result<(), DriverError> {
        let key = self.key(element)?;
        self.calls.push(Call::SendKeys(key, text.to_string()));
        Ok(())
    }

    async fn clear(&mut self, element: ElementHandle) -> Result<(), DriverError> {
        let key = self.key(element)?;
        self.calls.push(Call::Clear(key));
        Ok(())
    }

    async fn submit(&mut self, element: ElementHandle) -> Result<(), DriverError> {
        let key = self.key(element)?;
        self.calls.push(Call::Submit(key));
        Ok(())
    }

    async fn text(&mut self, element: ElementHandle) -> Result<String, DriverError> {
        Ok(self.element(element)?.1.text)
    }

    async fn is_displayed(&mut self, element: ElementHandle) -> Result<bool, DriverError> {
        Ok(self.element(element)?.1.displayed)
    }

    async fn is_enabled(&mut self, element: ElementHandle) -> Result<bool, DriverError> {
        Ok(self.element(element)?.1.enabled)
    }

    async fn switch_to_frame(&mut self, frame: Option<&str>) -> Result<(), DriverError> {
        self.calls.push(Call::SwitchFrame(frame.map(str::to_string)));
        self.active_frame = frame.map(str::to_string);
        Ok(())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        self.calls.push(Call::Screenshot);
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn release_elements(&mut self) {
        self.handles.clear();
    }

    async fn back(&mut self) -> Result<(), DriverError> {
        self.calls.push(Call::Back);
        Ok(())
    }

    async fn refresh(&mut self) -> Result<(), DriverError> {
        self.calls.push(Call::Refresh);
        Ok(())
    }

    async fn select_by_label(
        &mut self,
        element: ElementHandle,
        label: &str,
    ) -> Result<(), DriverError> {
        let (key, element) = self.element(element)?;
        if !element.options.iter().any(|o| o == label) {
            return Err(DriverError::ElementNotFound {
                locator: format!("{} option '{}'", key, label),
            });
        }
        self.calls.push(Call::Select(key, label.to_string()));
        Ok(())
    }

    async fn highlight(
        &mut self,
        element: ElementHandle,
        _duration: Duration,
    ) -> Result<(), DriverError> {
        let key = self.key(element)?;
        self.calls.push(Call::Highlight(key));
        Ok(())
    }
}
