//! Browser actions: navigation and element interaction.

use super::{
    element_arg, locate, text_arg, CommandError, CommandResult, CommandTable, PortalContext,
};
use crate::driver::{Driver, DriverError, ElementHandle, ENTER_KEY};
use futures::future::BoxFuture;
use tracing::{debug, info};
use uiscript_common::error::RegistryError;
use uiscript_common::{CommandCategory, CommandDescriptor, ElementEntry, ElementKind, ParamKind};

/// Characters of the generated suffix used by `fill_unique`.
const UNIQUE_SUFFIX_LEN: usize = 6;

pub(crate) fn register(table: &mut CommandTable) -> Result<(), RegistryError> {
    let cmd = |name: &str| CommandDescriptor::new(name, CommandCategory::Portal);
    let element = |name: &str| cmd(name).required("element", ParamKind::Element);

    table.portal(cmd("back").summary("Go back one page in history"), back)?;
    table.portal(cmd("refresh").summary("Reload the current page"), refresh)?;
    table.portal(
        cmd("goto")
            .required("url", ParamKind::Text)
            .summary("Navigate to a URL"),
        goto,
    )?;
    table.portal(element("click").summary("Click an element"), click)?;
    table.portal(element("clear").summary("Clear a text field"), clear)?;
    table.portal(
        element("fill")
            .required("text", ParamKind::Text)
            .summary("Type text into a field"),
        fill,
    )?;
    table.portal(
        element("fill_unique")
            .optional("prefix", ParamKind::Text, "")
            .optional("variable", ParamKind::Text, "")
            .summary("Type a prefix plus a unique suffix, optionally storing it as a variable"),
        fill_unique,
    )?;
    table.portal(element("enter").summary("Press Enter in a field"), enter)?;
    table.portal(element("id").summary("Highlight an element"), highlight)?;
    table.portal(
        element("select_item")
            .required("item", ParamKind::Text)
            .summary("Select an item of a drop-down, list or menu by its text"),
        select_item,
    )?;
    table.portal(element("submit").summary("Submit the form enclosing an element"), submit)?;
    table.portal(
        cmd("screenshot")
            .optional("path", ParamKind::Text, "screenshot.png")
            .summary("Save a screenshot of the browser window"),
        screenshot,
    )?;
    Ok(())
}

/// Locate `element` and make sure it can be interacted with.
async fn enabled(
    driver: &mut dyn Driver,
    element: &ElementEntry,
) -> Result<ElementHandle, CommandError> {
    let handle = locate(driver, element).await?;
    if !driver.is_enabled(handle).await? {
        return Err(CommandError::ElementUnavailable(element.name.clone()));
    }
    Ok(handle)
}

fn back(ctx: PortalContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        ctx.driver.back().await?;
        Ok(None)
    })
}

fn refresh(ctx: PortalContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        ctx.driver.refresh().await?;
        Ok(None)
    })
}

fn goto(ctx: PortalContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let url = text_arg(ctx.invocation, 0)?;
        info!("Navigating to {}", url);
        ctx.driver.navigate(&url).await?;
        Ok(None)
    })
}

fn click(ctx: PortalContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let PortalContext {
            driver,
            timing,
            invocation,
            ..
        } = ctx;
        let element = element_arg(invocation, 0)?;
        let handle = enabled(driver, &element).await?;
        driver.click(handle).await.map_err(|e| match e {
            DriverError::ElementNotInteractable { .. } => {
                CommandError::ElementUnavailable(element.name.clone())
            }
            other => CommandError::Driver(other),
        })?;
        tokio::time::sleep(timing.click_settle()).await;
        Ok(None)
    })
}

fn clear(ctx: PortalContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let element = element_arg(ctx.invocation, 0)?;
        let handle = enabled(ctx.driver, &element).await?;
        ctx.driver.clear(handle).await?;
        Ok(None)
    })
}

fn fill(ctx: PortalContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let element = element_arg(ctx.invocation, 0)?;
        let text = text_arg(ctx.invocation, 1)?;
        let handle = enabled(ctx.driver, &element).await?;
        ctx.driver.send_keys(handle, &text).await?;
        Ok(None)
    })
}

/// `prefix` followed by the first hex digits of a random v4 UUID, uppercased.
pub fn unique_value(prefix: &str) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, hex[..UNIQUE_SUFFIX_LEN].to_uppercase())
}

fn fill_unique(ctx: PortalContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let PortalContext {
            driver,
            temp_vars,
            invocation,
            ..
        } = ctx;
        let element = element_arg(invocation, 0)?;
        let prefix = text_arg(invocation, 1)?;
        let variable = text_arg(invocation, 2)?;

        let handle = enabled(driver, &element).await?;
        let value = unique_value(&prefix);
        driver.send_keys(handle, &value).await?;

        if variable.is_empty() {
            return Ok(None);
        }
        // The first value bound to a name wins for the rest of the session.
        let stored = temp_vars.entry(variable.clone()).or_insert(value.clone());
        Ok(Some(format!(
            "Temporary variable \"{}\" created for the value \"{}\"",
            variable, stored
        )))
    })
}

fn enter(ctx: PortalContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let element = element_arg(ctx.invocation, 0)?;
        let handle = enabled(ctx.driver, &element).await?;
        ctx.driver.send_keys(handle, ENTER_KEY).await?;
        Ok(None)
    })
}

fn highlight(ctx: PortalContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let element = element_arg(ctx.invocation, 0)?;
        let handle = enabled(ctx.driver, &element).await?;
        ctx.driver.highlight(handle, ctx.timing.highlight()).await?;
        Ok(None)
    })
}

fn submit(ctx: PortalContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let element = element_arg(ctx.invocation, 0)?;
        let handle = enabled(ctx.driver, &element).await?;
        ctx.driver.submit(handle).await?;
        tokio::time::sleep(ctx.timing.submit_settle()).await;
        Ok(None)
    })
}

fn screenshot(ctx: PortalContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let path = text_arg(ctx.invocation, 0)?;
        let png = ctx.driver.screenshot().await?;
        tokio::fs::write(&path, &png).await?;
        Ok(Some(format!("Screenshot saved to {}", path)))
    })
}

fn same_item(text: &str, item: &str) -> bool {
    text.trim().eq_ignore_ascii_case(item.trim())
}

/// Select `item` of `element` according to its declared kind:
///
/// - plain or dropdown without an items locator: native `<select>` option
/// - dropdown or menu with items: click to open, then click the matching item
/// - list with items: click the matching item
fn select_item(ctx: PortalContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let PortalContext {
            driver, invocation, ..
        } = ctx;
        let element = element_arg(invocation, 0)?;
        let item = text_arg(invocation, 1)?;
        let handle = enabled(driver, &element).await?;

        let not_found = || CommandError::ItemNotFound {
            element: element.name.clone(),
            item: item.clone(),
        };

        let kind = element.spec.kind();
        let Some(items) = element.spec.items() else {
            return match kind {
                ElementKind::Plain | ElementKind::Dropdown => {
                    match driver.select_by_label(handle, &item).await {
                        Ok(()) => Ok(None),
                        Err(e) if e.is_not_found() => Err(not_found()),
                        Err(e) => Err(e.into()),
                    }
                }
                ElementKind::List | ElementKind::Menu => Err(CommandError::InvalidArgument {
                    command: invocation.name().to_string(),
                    reason: format!("element '{}' declares no items locator", element.name),
                }),
            };
        };

        if matches!(kind, ElementKind::Dropdown | ElementKind::Menu) {
            driver.click(handle).await?;
        }

        let items = element.spec.locator().descend(items);
        let candidates = driver.find_all(&items).await?;
        debug!("{} candidate items under {}", candidates.len(), element.name);
        for candidate in candidates {
            if same_item(&driver.text(candidate).await?, &item) {
                driver.click(candidate).await?;
                return Ok(None);
            }
        }
        Err(not_found())
    })
}
