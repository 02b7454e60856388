//! Polling assertions about elements, the title and the URL.

use super::{
    element_arg, int_arg, text_arg, AssertionContext, CommandError, CommandResult, CommandTable,
};
use crate::driver::{Driver, DriverError};
use crate::wait::Poller;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::debug;
use uiscript_common::error::RegistryError;
use uiscript_common::{CommandCategory, CommandDescriptor, ElementEntry, ParamKind};

/// Seconds an assertion keeps polling when none are given.
pub const DEFAULT_SECONDS: i64 = 5;

#[derive(Debug, Clone, PartialEq)]
enum Expectation {
    Visible,
    NotVisible,
    Clickable,
    Enabled,
    Disabled,
    Text(String),
    Contains(String),
    NotContains(String),
    Title(String),
    Url(String),
}

impl Expectation {
    fn describe(&self) -> String {
        match self {
            Expectation::Visible => "visible".into(),
            Expectation::NotVisible => "not visible".into(),
            Expectation::Clickable => "clickable".into(),
            Expectation::Enabled => "enabled".into(),
            Expectation::Disabled => "disabled".into(),
            Expectation::Text(t) => format!("text \"{}\"", t),
            Expectation::Contains(t) => format!("text containing \"{}\"", t),
            Expectation::NotContains(t) => format!("text not containing \"{}\"", t),
            Expectation::Title(t) => format!("title \"{}\"", t),
            Expectation::Url(t) => format!("URL containing \"{}\"", t),
        }
    }
}

enum Observation {
    Met,
    Unmet(String),
}

fn check(met: bool, actual: impl FnOnce() -> String) -> Observation {
    if met {
        Observation::Met
    } else {
        Observation::Unmet(actual())
    }
}

pub(crate) fn register(table: &mut CommandTable) -> Result<(), RegistryError> {
    let cmd = |name: &str| CommandDescriptor::new(name, CommandCategory::Assertion);
    let state = |name: &str, summary: &str| {
        cmd(name)
            .required("element", ParamKind::Element)
            .optional("seconds", ParamKind::Integer, DEFAULT_SECONDS)
            .summary(summary)
    };
    let text = |name: &str, summary: &str| {
        cmd(name)
            .required("element", ParamKind::Element)
            .required("text", ParamKind::Text)
            .optional("seconds", ParamKind::Integer, DEFAULT_SECONDS)
            .summary(summary)
    };
    let page = |name: &str, summary: &str| {
        cmd(name)
            .required("text", ParamKind::Text)
            .optional("seconds", ParamKind::Integer, DEFAULT_SECONDS)
            .summary(summary)
    };

    table.assertion(state("assert_visible", "Element becomes visible"), assert_visible)?;
    table.assertion(
        state("assert_not_visible", "Element is absent or hidden"),
        assert_not_visible,
    )?;
    table.assertion(
        state("assert_clickable", "Element is visible and enabled"),
        assert_clickable,
    )?;
    table.assertion(state("assert_enabled", "Element is enabled"), assert_enabled)?;
    table.assertion(state("assert_disabled", "Element is disabled"), assert_disabled)?;
    table.assertion(text("assert_text", "Element text equals text"), assert_text)?;
    table.assertion(
        text("assert_contains", "Element text contains text"),
        assert_contains,
    )?;
    table.assertion(
        text("assert_not_contains", "Element text does not contain text"),
        assert_not_contains,
    )?;
    table.assertion(page("assert_title", "Page title equals text"), assert_title)?;
    table.assertion(page("assert_url", "Current URL contains text"), assert_url)?;
    Ok(())
}

async fn observe(
    driver: &mut dyn Driver,
    element: Option<&ElementEntry>,
    expectation: &Expectation,
) -> Result<Observation, DriverError> {
    match expectation {
        Expectation::Title(expected) => {
            let title = driver.title().await?;
            return Ok(check(&title == expected, || format!("title \"{}\"", title)));
        }
        Expectation::Url(expected) => {
            let url = driver.current_url().await?;
            return Ok(check(url.contains(expected.as_str()), || {
                format!("URL \"{}\"", url)
            }));
        }
        _ => {}
    }

    let Some(element) = element else {
        return Ok(Observation::Unmet("no element".into()));
    };
    let handle = match driver.find(element.spec.locator()).await {
        Ok(handle) => handle,
        Err(e) if e.is_not_found() => {
            return Ok(check(*expectation == Expectation::NotVisible, || {
                "element not present".into()
            }));
        }
        Err(e) => return Err(e),
    };

    let observation = match expectation {
        Expectation::Visible => {
            check(driver.is_displayed(handle).await?, || "hidden".into())
        }
        Expectation::NotVisible => {
            check(!driver.is_displayed(handle).await?, || "visible".into())
        }
        Expectation::Clickable => {
            let displayed = driver.is_displayed(handle).await?;
            let enabled = driver.is_enabled(handle).await?;
            check(displayed && enabled, || {
                format!("displayed={}, enabled={}", displayed, enabled)
            })
        }
        Expectation::Enabled => check(driver.is_enabled(handle).await?, || "disabled".into()),
        Expectation::Disabled => check(!driver.is_enabled(handle).await?, || "enabled".into()),
        Expectation::Text(expected) => {
            let text = driver.text(handle).await?;
            check(text.trim() == expected.trim(), || format!("text \"{}\"", text))
        }
        Expectation::Contains(expected) => {
            let text = driver.text(handle).await?;
            check(text.contains(expected.as_str()), || format!("text \"{}\"", text))
        }
        Expectation::NotContains(expected) => {
            let text = driver.text(handle).await?;
            check(!text.contains(expected.as_str()), || format!("text \"{}\"", text))
        }
        Expectation::Title(_) | Expectation::Url(_) => Observation::Met,
    };
    Ok(observation)
}

/// Poll once per interval until `expectation` holds or `seconds` elapse.
async fn poll(
    ctx: AssertionContext<'_>,
    element: Option<Arc<ElementEntry>>,
    expectation: Expectation,
    seconds: i64,
) -> CommandResult {
    let mut poller = Poller::seconds(seconds, ctx.timing.poll_interval());
    let mut last = String::from("nothing observed");
    loop {
        ctx.driver.release_elements().await;
        match observe(ctx.driver, element.as_deref(), &expectation).await {
            Ok(Observation::Met) => return Ok(None),
            Ok(Observation::Unmet(actual)) => last = actual,
            Err(e @ DriverError::ElementStale { .. }) => last = e.to_string(),
            Err(e) => return Err(e.into()),
        }
        if !poller.next().await {
            break;
        }
    }

    let subject = element
        .as_ref()
        .map(|e| format!("'{}' ", e.name))
        .unwrap_or_default();
    debug!("{} gave up after {}s: {}", ctx.invocation.name(), seconds, last);
    Err(CommandError::AssertionFailed {
        command: ctx.invocation.name().to_string(),
        expected: format!("{}{}", subject, expectation.describe()),
        actual: last,
    })
}

/// Element plus optional seconds.
fn element_state(ctx: AssertionContext<'_>, expectation: Expectation) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let element = element_arg(ctx.invocation, 0)?;
        let seconds = int_arg(ctx.invocation, 1)?;
        poll(ctx, Some(element), expectation, seconds).await
    })
}

/// Element, text and optional seconds.
fn element_text(
    ctx: AssertionContext<'_>,
    expectation: fn(String) -> Expectation,
) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let element = element_arg(ctx.invocation, 0)?;
        let text = text_arg(ctx.invocation, 1)?;
        let seconds = int_arg(ctx.invocation, 2)?;
        poll(ctx, Some(element), expectation(text), seconds).await
    })
}

/// Text and optional seconds, checked against the page itself.
fn page_text(
    ctx: AssertionContext<'_>,
    expectation: fn(String) -> Expectation,
) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let text = text_arg(ctx.invocation, 0)?;
        let seconds = int_arg(ctx.invocation, 1)?;
        poll(ctx, None, expectation(text), seconds).await
    })
}

fn assert_visible(ctx: AssertionContext<'_>) -> BoxFuture<'_, CommandResult> {
    element_state(ctx, Expectation::Visible)
}

fn assert_not_visible(ctx: AssertionContext<'_>) -> BoxFuture<'_, CommandResult> {
    element_state(ctx, Expectation::NotVisible)
}

fn assert_clickable(ctx: AssertionContext<'_>) -> BoxFuture<'_, CommandResult> {
    element_state(ctx, Expectation::Clickable)
}

fn assert_enabled(ctx: AssertionContext<'_>) -> BoxFuture<'_, CommandResult> {
    element_state(ctx, Expectation::Enabled)
}

fn assert_disabled(ctx: AssertionContext<'_>) -> BoxFuture<'_, CommandResult> {
    element_state(ctx, Expectation::Disabled)
}

fn assert_text(ctx: AssertionContext<'_>) -> BoxFuture<'_, CommandResult> {
    element_text(ctx, Expectation::Text)
}

fn assert_contains(ctx: AssertionContext<'_>) -> BoxFuture<'_, CommandResult> {
    element_text(ctx, Expectation::Contains)
}

fn assert_not_contains(ctx: AssertionContext<'_>) -> BoxFuture<'_, CommandResult> {
    element_text(ctx, Expectation::NotContains)
}

fn assert_title(ctx: AssertionContext<'_>) -> BoxFuture<'_, CommandResult> {
    page_text(ctx, Expectation::Title)
}

fn assert_url(ctx: AssertionContext<'_>) -> BoxFuture<'_, CommandResult> {
    page_text(ctx, Expectation::Url)
}
