//! Structured error handling for API responses

pub mod app_error;
pub mod catalog;
pub mod codes;
pub mod kind;
pub mod layer;
pub mod response;
pub mod translator;

pub use app_error::{
    join_task, join_task_within, AppError, BusinessError, ConstraintViolation, ExecutionError,
    FieldError,
};
pub use catalog::{DefaultCatalog, ErrorCatalog};
pub use codes::MessageKey;
pub use kind::ErrorKind;
pub use layer::{panic_handler, translate_errors, RaisedError};
pub use response::{ErrorEntry, ErrorResponse, ResponseEnvelope};
pub use translator::ErrorTranslator;
