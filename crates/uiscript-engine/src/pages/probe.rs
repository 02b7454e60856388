use crate::driver::Driver;
use tracing::{debug, warn};
use uiscript_common::{DynamicRegistry, PageDescriptor, WaitMethod};

/// Build the element registry for `page` as it currently looks.
///
/// Declared elements and windows are always present. Each probe whose
/// marker is found adds its elements as windowed elements, plus the set
/// keyed by the marker's text if one matches. A missing marker adds
/// nothing; other driver failures are logged and the probe is skipped.
pub async fn build_registry(driver: &mut dyn Driver, page: &PageDescriptor) -> DynamicRegistry {
    let mut registry = DynamicRegistry::for_page(page);

    for probe in &page.probes {
        let marker = match driver.find(&probe.marker).await {
            Ok(handle) => handle,
            Err(e) if e.is_not_found() => {
                debug!("Probe marker {} not present", probe.marker);
                continue;
            }
            Err(e) => {
                warn!("Probe marker {} failed: {}", probe.marker, e);
                continue;
            }
        };

        for (name, spec) in &probe.elements {
            registry.add_windowed(name, spec);
        }

        if probe.by_text.is_empty() {
            continue;
        }
        match driver.text(marker).await {
            Ok(text) => match probe.by_text.get(text.trim()) {
                Some(set) => {
                    debug!("Probe {} matched text '{}'", probe.marker, text.trim());
                    for (name, spec) in set {
                        registry.add_windowed(name, spec);
                    }
                }
                None => debug!("Probe {} has no set for text '{}'", probe.marker, text.trim()),
            },
            Err(e) => warn!("Reading probe marker {} failed: {}", probe.marker, e),
        }
    }

    registry
}

/// Check once whether the page's wait element is ready.
pub async fn page_ready(driver: &mut dyn Driver, page: &PageDescriptor) -> bool {
    let Some(wait) = &page.wait else {
        return true;
    };
    let Ok(handle) = driver.find(&wait.element).await else {
        return false;
    };
    let displayed = driver.is_displayed(handle).await.unwrap_or(false);
    match wait.method {
        WaitMethod::Visible => displayed,
        WaitMethod::Clickable => displayed && driver.is_enabled(handle).await.unwrap_or(false),
    }
}
