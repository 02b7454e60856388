//! Built-in command families and the typed dispatch table.
//!
//! Every family declares its [`CommandDescriptor`]s statically and
//! registers one handler per descriptor. Each category receives its own
//! collaborator bundle:
//!
//! - portal: driver, active page, temporary variables, timing
//! - assertion: driver, active page, timing
//! - general: the whole session state plus read access to both registries
//! - macro: expanded by the session itself

pub mod assertion;
pub mod general;
pub mod macros;
pub mod portal;

use crate::config::{MacroConfig, TimingConfig};
use crate::driver::{Driver, DriverError, ElementHandle};
use crate::session::SessionState;
use futures::future::BoxFuture;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use uiscript_common::error::{PipelineError, RegistryError};
use uiscript_common::{
    CommandCategory, CommandDescriptor, DynamicRegistry, ElementEntry, PageDescriptor,
    StaticRegistry,
};
use uiscript_parser::{Bindings, Invocation};

pub use macros::MacroDefinition;

/// Output of one command, if it has anything to show.
pub type CommandResult = Result<Option<String>, CommandError>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Assertion '{command}' failed: expected {expected}, found {actual}")]
    AssertionFailed {
        command: String,
        expected: String,
        actual: String,
    },

    #[error("Element '{element}' not found ({locator})")]
    ElementNotFound { element: String, locator: String },

    #[error("Element '{0}' is unavailable")]
    ElementUnavailable(String),

    #[error("Item '{item}' not found in '{element}'")]
    ItemNotFound { element: String, item: String },

    #[error("Invalid argument for '{command}': {reason}")]
    InvalidArgument { command: String, reason: String },

    #[error("No handler registered for '{0}'")]
    UnknownHandler(String),

    #[error("Macro '{name}' line '{line}': {source}")]
    MacroLine {
        name: String,
        line: String,
        source: PipelineError,
    },

    #[error("Macro '{0}' exceeded the maximum expansion depth")]
    MacroDepth(String),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct PortalContext<'a> {
    pub driver: &'a mut dyn Driver,
    pub page: &'a PageDescriptor,
    pub temp_vars: &'a mut Bindings,
    pub timing: &'a TimingConfig,
    pub invocation: &'a Invocation,
}

pub struct AssertionContext<'a> {
    pub driver: &'a mut dyn Driver,
    pub page: &'a PageDescriptor,
    pub timing: &'a TimingConfig,
    pub invocation: &'a Invocation,
}

pub struct GeneralContext<'a> {
    pub state: &'a mut SessionState,
    pub commands: &'a StaticRegistry,
    pub elements: &'a DynamicRegistry,
    pub page: &'a PageDescriptor,
    pub invocation: &'a Invocation,
}

pub type PortalHandler = for<'a> fn(PortalContext<'a>) -> BoxFuture<'a, CommandResult>;
pub type AssertionHandler = for<'a> fn(AssertionContext<'a>) -> BoxFuture<'a, CommandResult>;
pub type GeneralHandler = for<'a> fn(GeneralContext<'a>) -> BoxFuture<'a, CommandResult>;

#[derive(Clone)]
pub enum Handler {
    Assertion(AssertionHandler),
    General(GeneralHandler),
    Portal(PortalHandler),
    Macro(Arc<MacroDefinition>),
}

/// Static registry plus the handler behind every descriptor in it.
#[derive(Default)]
pub struct CommandTable {
    registry: StaticRegistry,
    handlers: HashMap<String, Handler>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in assertion, general and portal commands.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut table = Self::new();
        assertion::register(&mut table)?;
        general::register(&mut table)?;
        portal::register(&mut table)?;
        Ok(table)
    }

    pub fn with_macros(
        mut self,
        macros: &BTreeMap<String, MacroConfig>,
    ) -> Result<Self, RegistryError> {
        for (name, config) in macros {
            self.add_macro(MacroDefinition::from_config(name, config))?;
        }
        Ok(self)
    }

    pub fn assertion(
        &mut self,
        descriptor: CommandDescriptor,
        handler: AssertionHandler,
    ) -> Result<(), RegistryError> {
        self.insert(descriptor, CommandCategory::Assertion, Handler::Assertion(handler))
    }

    pub fn general(
        &mut self,
        descriptor: CommandDescriptor,
        handler: GeneralHandler,
    ) -> Result<(), RegistryError> {
        self.insert(descriptor, CommandCategory::General, Handler::General(handler))
    }

    pub fn portal(
        &mut self,
        descriptor: CommandDescriptor,
        handler: PortalHandler,
    ) -> Result<(), RegistryError> {
        self.insert(descriptor, CommandCategory::Portal, Handler::Portal(handler))
    }

    pub fn add_macro(&mut self, definition: MacroDefinition) -> Result<(), RegistryError> {
        let descriptor = definition.descriptor();
        self.insert(
            descriptor,
            CommandCategory::Macro,
            Handler::Macro(Arc::new(definition)),
        )
    }

    fn insert(
        &mut self,
        mut descriptor: CommandDescriptor,
        category: CommandCategory,
        handler: Handler,
    ) -> Result<(), RegistryError> {
        descriptor.category = category;
        let descriptor = self.registry.register(descriptor)?;
        self.handlers.insert(descriptor.name.clone(), handler);
        Ok(())
    }

    pub fn registry(&self) -> &StaticRegistry {
        &self.registry
    }

    pub fn handler(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(&name.to_lowercase())
    }
}

fn invalid(invocation: &Invocation, reason: impl Into<String>) -> CommandError {
    CommandError::InvalidArgument {
        command: invocation.name().to_string(),
        reason: reason.into(),
    }
}

pub(crate) fn element_arg(
    invocation: &Invocation,
    index: usize,
) -> Result<Arc<ElementEntry>, CommandError> {
    let token = invocation
        .arg(index)
        .ok_or_else(|| invalid(invocation, format!("missing argument {}", index + 1)))?;
    token
        .element
        .clone()
        .ok_or_else(|| invalid(invocation, format!("'{}' is not a known element", token.text_value())))
}

pub(crate) fn text_arg(invocation: &Invocation, index: usize) -> Result<String, CommandError> {
    invocation
        .arg(index)
        .map(|t| t.text_value())
        .ok_or_else(|| invalid(invocation, format!("missing argument {}", index + 1)))
}

pub(crate) fn int_arg(invocation: &Invocation, index: usize) -> Result<i64, CommandError> {
    invocation
        .arg(index)
        .and_then(|t| t.value.as_integer())
        .ok_or_else(|| invalid(invocation, format!("argument {} must be an integer", index + 1)))
}

/// Locate `element`, reporting a miss under the element's name.
pub(crate) async fn locate(
    driver: &mut dyn Driver,
    element: &ElementEntry,
) -> Result<ElementHandle, CommandError> {
    let locator = element.spec.locator();
    driver.find(locator).await.map_err(|e| match e {
        DriverError::ElementNotFound { .. } => CommandError::ElementNotFound {
            element: element.name.clone(),
            locator: locator.to_string(),
        },
        other => CommandError::Driver(other),
    })
}
