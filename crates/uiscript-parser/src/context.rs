use std::collections::HashMap;
use uiscript_common::{DynamicRegistry, StaticRegistry};

/// Name to value bindings usable as bare words in a line.
pub type Bindings = HashMap<String, String>;

/// Read-only view of everything the pipeline stages resolve against.
#[derive(Clone, Copy)]
pub struct PipelineContext<'a> {
    pub static_registry: &'a StaticRegistry,
    pub dynamic_registry: &'a DynamicRegistry,
    pub session_args: &'a Bindings,
    pub temp_vars: &'a Bindings,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        static_registry: &'a StaticRegistry,
        dynamic_registry: &'a DynamicRegistry,
        session_args: &'a Bindings,
        temp_vars: &'a Bindings,
    ) -> Self {
        Self {
            static_registry,
            dynamic_registry,
            session_args,
            temp_vars,
        }
    }
}
