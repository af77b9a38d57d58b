use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

use super::kind::ErrorKind;
use super::response::ErrorEntry;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors raised by request handling, one variant per [`ErrorKind`]
#[derive(Debug, Error)]
pub enum AppError {
    /// Expected domain rejection; entries are built by the caller
    #[error(transparent)]
    Business(BusinessError),

    /// Request body fields failed validation
    #[error("validation failed for {} field(s)", .0.len())]
    FieldValidation(Vec<FieldError>),

    /// Parameter or bean constraints were violated
    #[error("{} constraint violation(s)", .0.len())]
    ConstraintViolation(Vec<ConstraintViolation>),

    /// A request parameter could not be converted to its declared type
    #[error("{0}")]
    TypeMismatch(String),

    /// Downstream service answered with a 4xx
    #[error("{message}")]
    UpstreamClient { status: u16, message: String },

    /// Downstream service answered with a 5xx
    #[error("{message}")]
    UpstreamServer { status: u16, message: String },

    /// Downstream service could not be reached at all
    #[error("{0}")]
    ResourceUnreachable(String),

    #[error("{0}")]
    Timeout(String),

    /// Failure reported by an asynchronous execution, wrapping the real cause
    #[error(transparent)]
    Execution(ExecutionError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Business(_) => ErrorKind::BusinessRule,
            Self::FieldValidation(_) => ErrorKind::ValidationField,
            Self::ConstraintViolation(_) => ErrorKind::ValidationConstraint,
            Self::TypeMismatch(_) => ErrorKind::TypeMismatch,
            Self::UpstreamClient { .. } => ErrorKind::UpstreamClientError,
            Self::UpstreamServer { .. } => ErrorKind::UpstreamServerError,
            Self::ResourceUnreachable(_) => ErrorKind::ResourceUnreachable,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Execution(_) => ErrorKind::WrappedExecution,
            Self::Internal(_) => ErrorKind::Unclassified,
        }
    }

    /// Wrap a failure the way an execution result reports it
    pub fn execution(cause: impl Into<BoxError>) -> Self {
        Self::Execution(ExecutionError::from_cause(cause))
    }

}

impl From<BusinessError> for AppError {
    fn from(err: BusinessError) -> Self {
        Self::Business(err)
    }
}

impl From<ExecutionError> for AppError {
    fn from(err: ExecutionError) -> Self {
        Self::Execution(err)
    }
}

/// Domain-level rejection carrying ready-made entries
#[derive(Debug, Clone, Default, Error)]
#[error("{message}")]
pub struct BusinessError {
    message: String,
    errors: Option<Vec<ErrorEntry>>,
}

impl BusinessError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }

    /// Rejection with a single entry; the detail doubles as the message
    pub fn single(status: u16, key: impl Into<String>, detail: impl Into<String>) -> Self {
        let entry = ErrorEntry::new(status, key, detail);
        Self {
            message: entry.detail.clone(),
            errors: Some(vec![entry]),
        }
    }

    pub fn with_errors(mut self, errors: Vec<ErrorEntry>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn errors(&self) -> Option<&[ErrorEntry]> {
        self.errors.as_deref()
    }
}

/// A rejected field of a request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub object_name: String,
    pub field: String,
    pub rejected_value: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(
        object_name: impl Into<String>,
        field: impl Into<String>,
        rejected_value: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            object_name: object_name.into(),
            field: field.into(),
            rejected_value,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Field error in object '{}' on field '{}': rejected value [{}]; {}",
            self.object_name,
            self.field,
            self.rejected_value.as_deref().unwrap_or("null"),
            self.message
        )
    }
}

/// A violated constraint on a parameter or property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub property_path: String,
    pub invalid_value: Option<String>,
    pub message: String,
}

impl ConstraintViolation {
    pub fn new(
        property_path: impl Into<String>,
        invalid_value: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            property_path: property_path.into(),
            invalid_value,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property_path, self.message)?;
        if let Some(value) = &self.invalid_value {
            write!(f, " (invalid value: {})", value)?;
        }
        Ok(())
    }
}

/// Wrapper produced when a spawned computation fails
#[derive(Debug)]
pub struct ExecutionError {
    message: String,
    cause: Option<BoxError>,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Wrap `cause`, reusing its text as the wrapper message
    pub fn from_cause(cause: impl Into<BoxError>) -> Self {
        let cause = cause.into();
        Self {
            message: cause.to_string(),
            cause: Some(cause),
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for ExecutionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Await a spawned task, reporting its failure wrapped as an execution error
pub async fn join_task<T>(handle: JoinHandle<Result<T, AppError>>) -> Result<T, AppError> {
    match handle.await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(AppError::execution(err)),
        Err(join_err) => Err(join_err.into()),
    }
}

/// Like [`join_task`], but gives up after `deadline` and aborts the task
pub async fn join_task_within<T>(
    deadline: Duration,
    handle: JoinHandle<Result<T, AppError>>,
) -> Result<T, AppError> {
    let abort = handle.abort_handle();
    match tokio::time::timeout(deadline, join_task(handle)).await {
        Ok(result) => result,
        Err(elapsed) => {
            abort.abort();
            Err(elapsed.into())
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();

        if err.is_timeout() {
            return Self::Timeout(message);
        }

        if let Some(status) = err.status() {
            if status.is_client_error() {
                return Self::UpstreamClient {
                    status: status.as_u16(),
                    message,
                };
            }
            if status.is_server_error() {
                return Self::UpstreamServer {
                    status: status.as_u16(),
                    message,
                };
            }
        }

        if err.is_connect() || err.is_request() {
            Self::ResourceUnreachable(message)
        } else {
            Self::Internal(anyhow::Error::new(err))
        }
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::Timeout(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Execution(ExecutionError::with_cause(
            format!("task failed: {}", err),
            err,
        ))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::TypeMismatch(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::TypeMismatch(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::TypeMismatch(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_per_variant() {
        assert_eq!(
            AppError::from(BusinessError::new("no")).kind(),
            ErrorKind::BusinessRule
        );
        assert_eq!(
            AppError::FieldValidation(vec![]).kind(),
            ErrorKind::ValidationField
        );
        assert_eq!(
            AppError::Timeout("slow".into()).kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            AppError::execution(AppError::Timeout("slow".into())).kind(),
            ErrorKind::WrappedExecution
        );
        assert_eq!(
            AppError::from(anyhow::anyhow!("boom")).kind(),
            ErrorKind::Unclassified
        );
    }

    #[test]
    fn test_field_error_display() {
        let err = FieldError::new("templateRequest", "name", Some(String::new()), "must not be blank");
        assert_eq!(
            err.to_string(),
            "Field error in object 'templateRequest' on field 'name': rejected value []; must not be blank"
        );

        let err = FieldError::new("templateRequest", "owner", None, "must not be null");
        assert!(err.to_string().contains("rejected value [null]"));
    }

    #[test]
    fn test_constraint_violation_display() {
        let v = ConstraintViolation::new("list.page", Some("0".into()), "must be greater than or equal to 1");
        assert_eq!(
            v.to_string(),
            "list.page: must be greater than or equal to 1 (invalid value: 0)"
        );
        let v = ConstraintViolation::new("list.page", None, "is required");
        assert_eq!(v.to_string(), "list.page: is required");
    }

    #[test]
    fn test_execution_error_exposes_cause() {
        let err = ExecutionError::from_cause(AppError::Timeout("call exceeded 5000ms".into()));
        assert_eq!(err.message(), "call exceeded 5000ms");
        let cause = err.cause().and_then(|c| c.downcast_ref::<AppError>());
        assert!(matches!(cause, Some(AppError::Timeout(_))));
        assert!(err.source().is_some());

        assert!(ExecutionError::new("lost").cause().is_none());
    }

    #[test]
    fn test_business_error_entries() {
        let err = BusinessError::single(404, "TEMPLATE_NOT_FOUND", "Template 9 does not exist");
        assert_eq!(err.to_string(), "Template 9 does not exist");
        assert_eq!(err.errors().map(<[ErrorEntry]>::len), Some(1));

        let err = BusinessError::new("locked").with_errors(vec![
            ErrorEntry::new(409, "TEMPLATE_LOCKED", "locked"),
            ErrorEntry::new(409, "TEMPLATE_BUSY", "busy"),
        ]);
        assert_eq!(err.errors().map(<[ErrorEntry]>::len), Some(2));
        assert!(BusinessError::new("bare").errors().is_none());
    }

    #[tokio::test]
    async fn test_elapsed_becomes_timeout() {
        let elapsed = tokio::time::timeout(
            Duration::from_millis(1),
            std::future::pending::<()>(),
        )
        .await
        .unwrap_err();
        assert_eq!(AppError::from(elapsed).kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_join_task_wraps_failure() {
        let ok = join_task(tokio::spawn(async { Ok::<_, AppError>(7) })).await;
        assert_eq!(ok.unwrap(), 7);

        let err = join_task(tokio::spawn(async {
            Err::<(), _>(AppError::Timeout("call exceeded 5000ms".into()))
        }))
        .await
        .unwrap_err();
        match err {
            AppError::Execution(wrapper) => {
                assert_eq!(wrapper.message(), "call exceeded 5000ms");
                assert!(wrapper.cause().is_some());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_join_task_within_deadline() {
        let ok = join_task_within(
            Duration::from_millis(500),
            tokio::spawn(async { Ok::<_, AppError>("done") }),
        )
        .await;
        assert_eq!(ok.unwrap(), "done");

        let stalled = tokio::spawn(async {
            std::future::pending::<()>().await;
            Ok::<(), AppError>(())
        });
        let err = join_task_within(Duration::from_millis(10), stalled)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_join_error_becomes_execution() {
        let handle = tokio::spawn(async { panic!("worker died") });
        let err = AppError::from(handle.await.unwrap_err());
        assert_eq!(err.kind(), ErrorKind::WrappedExecution);
        assert!(err.to_string().starts_with("task failed"));
    }
}
