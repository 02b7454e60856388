//! Runs validated invocations through the typed dispatch table, scoping
//! each one to the frame its target element lives in.

use crate::commands::{
    AssertionContext, CommandError, CommandResult, CommandTable, GeneralContext, Handler,
    PortalContext,
};
use crate::driver::Driver;
use crate::session::SessionState;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};
use uiscript_common::{DynamicRegistry, PageDescriptor};
use uiscript_parser::Invocation;

/// Frame an invocation has to run in, if its first element argument is
/// declared inside one on the active page.
pub fn frame_for<'p>(page: &'p PageDescriptor, invocation: &Invocation) -> Option<&'p str> {
    let element = invocation.first_element()?;
    let name = element
        .element
        .as_ref()
        .map(|e| e.name.as_str())
        .unwrap_or(element.lexeme.as_str());
    page.frame_of(name)
}

/// Collaborators one dispatch borrows from the session.
pub struct DispatchContext<'a> {
    pub driver: &'a mut dyn Driver,
    pub table: &'a CommandTable,
    pub page: &'a PageDescriptor,
    pub elements: &'a DynamicRegistry,
    pub state: &'a mut SessionState,
}

impl DispatchContext<'_> {
    /// Invoke `invocation`, switching into its frame first when it has one.
    ///
    /// Once the frame has been entered the driver is always switched back
    /// to the top-level document, whether the command returns, fails or
    /// panics.
    pub async fn dispatch(&mut self, invocation: &Invocation) -> CommandResult {
        let Some(frame) = frame_for(self.page, invocation) else {
            return self.invoke(invocation).await;
        };

        debug!("Entering frame '{}' for {}", frame, invocation.name());
        if let Err(e) = self.driver.switch_to_frame(Some(frame)).await {
            if let Err(restore) = self.driver.switch_to_frame(None).await {
                warn!("Failed to return to the top-level document: {}", restore);
            }
            return Err(e.into());
        }

        let outcome = AssertUnwindSafe(self.invoke(invocation))
            .catch_unwind()
            .await;
        let restored = self.driver.switch_to_frame(None).await;
        debug!("Left frame '{}'", frame);

        match outcome {
            Err(panic) => std::panic::resume_unwind(panic),
            Ok(Err(e)) => {
                if let Err(restore) = restored {
                    warn!("Failed to return to the top-level document: {}", restore);
                }
                Err(e)
            }
            Ok(Ok(output)) => {
                restored?;
                Ok(output)
            }
        }
    }

    async fn invoke(&mut self, invocation: &Invocation) -> CommandResult {
        debug!(command = invocation.name(), category = %invocation.category(), "dispatching");
        match self.table.handler(invocation.name()) {
            Some(Handler::Portal(handler)) => {
                handler(PortalContext {
                    driver: &mut *self.driver,
                    page: self.page,
                    temp_vars: &mut self.state.temp_vars,
                    timing: &self.state.timing,
                    invocation,
                })
                .await
            }
            Some(Handler::Assertion(handler)) => {
                handler(AssertionContext {
                    driver: &mut *self.driver,
                    page: self.page,
                    timing: &self.state.timing,
                    invocation,
                })
                .await
            }
            Some(Handler::General(handler)) => {
                handler(GeneralContext {
                    state: &mut *self.state,
                    commands: self.table.registry(),
                    elements: self.elements,
                    page: self.page,
                    invocation,
                })
                .await
            }
            // Macros are expanded by the session before reaching here.
            Some(Handler::Macro(_)) | None => {
                Err(CommandError::UnknownHandler(invocation.name().to_string()))
            }
        }
    }
}
