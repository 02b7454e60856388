pub mod descriptor;
pub mod error;
pub mod locator;
pub mod page;
pub mod registry;
pub mod token;

pub use descriptor::{CommandCategory, CommandDescriptor, OptionalParam, ParamKind, ParamSpec};
pub use locator::Locator;
pub use page::{ElementKind, ElementSpec, PageDescriptor, ProbeDescriptor, WaitMethod};
pub use registry::{DynamicRegistry, ElementEntry, Resolved, StaticRegistry};
pub use token::{Token, TokenKind, TokenValue};
