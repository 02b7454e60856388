pub mod driver_error;
pub mod pipeline_error;

pub use driver_error::DriverError;
pub use pipeline_error::{
    ArgumentMismatch, ClassifyError, LexError, PipelineError, RegistryError, Unrecognized,
    ValidationError,
};
