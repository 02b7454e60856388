use async_trait::async_trait;
use std::time::Duration;
pub use uiscript_common::error::DriverError;
use uiscript_common::Locator;

/// WebDriver key code for Enter.
pub const ENTER_KEY: &str = "\u{E007}";

/// Opaque reference to an element located by a driver. Only valid for the
/// driver that produced it, until the next frame switch or navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

/// Remote control for one browser session.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Start the browser or connect to it.
    async fn launch(&mut self) -> Result<(), DriverError>;

    /// End the browser session.
    async fn close(&mut self) -> Result<(), DriverError>;

    async fn is_ready(&self) -> bool;

    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    async fn current_url(&mut self) -> Result<String, DriverError>;

    async fn title(&mut self) -> Result<String, DriverError>;

    /// Locate one element. Fails with [`DriverError::ElementNotFound`].
    async fn find(&mut self, locator: &Locator) -> Result<ElementHandle, DriverError>;

    /// Locate every matching element; an empty result is not an error.
    async fn find_all(&mut self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError>;

    async fn click(&mut self, element: ElementHandle) -> Result<(), DriverError>;

    async fn send_keys(&mut self, element: ElementHandle, text: &str) -> Result<(), DriverError>;

    async fn clear(&mut self, element: ElementHandle) -> Result<(), DriverError>;

    async fn submit(&mut self, element: ElementHandle) -> Result<(), DriverError>;

    async fn text(&mut self, element: ElementHandle) -> Result<String, DriverError>;

    async fn is_displayed(&mut self, element: ElementHandle) -> Result<bool, DriverError>;

    async fn is_enabled(&mut self, element: ElementHandle) -> Result<bool, DriverError>;

    /// Make `frame` the active document, or the top-level document for
    /// `None`.
    async fn switch_to_frame(&mut self, frame: Option<&str>) -> Result<(), DriverError>;

    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError>;

    /// Drop every handle handed out so far. Called on each page refresh and
    /// before each assertion poll, when no command holds a handle.
    async fn release_elements(&mut self) {}

    async fn back(&mut self) -> Result<(), DriverError> {
        Err(DriverError::NotSupported("back".into()))
    }

    async fn refresh(&mut self) -> Result<(), DriverError> {
        Err(DriverError::NotSupported("refresh".into()))
    }

    /// Choose an option of a native `<select>` by its visible label.
    async fn select_by_label(
        &mut self,
        _element: ElementHandle,
        _label: &str,
    ) -> Result<(), DriverError> {
        Err(DriverError::NotSupported("select_by_label".into()))
    }

    /// Visually mark an element for `duration`.
    async fn highlight(
        &mut self,
        _element: ElementHandle,
        _duration: Duration,
    ) -> Result<(), DriverError> {
        Err(DriverError::NotSupported("highlight".into()))
    }
}
