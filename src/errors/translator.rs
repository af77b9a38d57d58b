use std::error::Error as StdError;
use std::sync::Arc;
use tracing::error;

use super::app_error::{AppError, ExecutionError};
use super::catalog::{DefaultCatalog, ErrorCatalog};
use super::codes::MessageKey;
use super::kind::ErrorKind;
use super::response::{ErrorEntry, ErrorResponse};
use crate::metrics::TRANSLATED_ERRORS_TOTAL;

/// How many execution wrappers are peeled off before giving up on the cause
pub const MAX_UNWRAP_DEPTH: usize = 1;

/// Turns raised errors into error envelopes.
///
/// Holds nothing but a shared read-only catalog, so one instance can be
/// cloned into every request.
#[derive(Clone)]
pub struct ErrorTranslator {
    catalog: Arc<dyn ErrorCatalog>,
}

impl Default for ErrorTranslator {
    fn default() -> Self {
        Self::new(Arc::new(DefaultCatalog))
    }
}

impl ErrorTranslator {
    pub fn new(catalog: Arc<dyn ErrorCatalog>) -> Self {
        Self { catalog }
    }

    /// Classify `err` and package the resulting entries.
    ///
    /// Never fails: anything that cannot be classified ends up as a single
    /// generic server error.
    pub fn translate(&self, err: &AppError) -> ErrorResponse {
        let response = ErrorResponse::from_entries(self.classify(err, 0));
        record(err.kind(), response.status());
        response
    }

    /// Build the response for a handler that panicked
    pub fn translate_panic(&self, message: &str) -> ErrorResponse {
        error!(
            kind = %ErrorKind::Unclassified,
            panic = %message,
            "Request handler panicked"
        );

        let response = ErrorResponse::from_entries(Some(
            self.catalog
                .build_500_error_list(MessageKey::GenericServerError, message),
        ));
        record(ErrorKind::Unclassified, response.status());
        response
    }

    fn classify(&self, err: &AppError, depth: usize) -> Option<Vec<ErrorEntry>> {
        let kind = err.kind();
        error!(
            kind = %kind,
            depth,
            error = %err,
            chain = %error_chain(err),
            "{} error reached the translator",
            kind
        );

        match err {
            AppError::Business(business) => business.errors().map(<[ErrorEntry]>::to_vec),
            AppError::FieldValidation(fields) => Some(
                fields
                    .iter()
                    .map(|field| self.validation_entry(&field.to_string()))
                    .collect(),
            ),
            AppError::ConstraintViolation(violations) => Some(
                violations
                    .iter()
                    .map(|violation| self.validation_entry(&violation.to_string()))
                    .collect(),
            ),
            AppError::TypeMismatch(message) => Some(
                self.catalog
                    .build_400_error_list(MessageKey::GenericClientError, message),
            ),
            AppError::UpstreamClient { message, .. } => Some(
                self.catalog
                    .build_400_error_list(MessageKey::UpstreamError, message),
            ),
            AppError::UpstreamServer { message, .. } | AppError::ResourceUnreachable(message) => {
                Some(
                    self.catalog
                        .build_500_error_list(MessageKey::UpstreamError, message),
                )
            }
            AppError::Timeout(message) => Some(
                self.catalog
                    .build_408_error_list(MessageKey::Timeout, message),
            ),
            AppError::Execution(wrapper) => self.unwrap_execution(err, wrapper, depth),
            AppError::Internal(_) => Some(self.unclassified(err)),
        }
    }

    fn unwrap_execution(
        &self,
        outer: &AppError,
        wrapper: &ExecutionError,
        depth: usize,
    ) -> Option<Vec<ErrorEntry>> {
        let cause = wrapper
            .cause()
            .and_then(|cause| cause.downcast_ref::<AppError>());

        match cause {
            Some(AppError::Execution(_)) if depth + 1 >= MAX_UNWRAP_DEPTH => {
                Some(self.unclassified(outer))
            }
            Some(cause) => self.classify(cause, depth + 1),
            None => Some(self.unclassified(outer)),
        }
    }

    fn unclassified(&self, err: &AppError) -> Vec<ErrorEntry> {
        self.catalog
            .build_500_error_list(MessageKey::GenericServerError, &err.to_string())
    }

    fn validation_entry(&self, detail: &str) -> ErrorEntry {
        self.catalog
            .build_error(400, MessageKey::ValidationFailure, detail)
    }
}

fn record(kind: ErrorKind, status: u16) {
    TRANSLATED_ERRORS_TOTAL
        .with_label_values(&[kind.label(), &status.to_string()])
        .inc();
}

/// Render an error and its sources as `outer: inner: root`
fn error_chain(err: &dyn StdError) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::app_error::{BusinessError, ConstraintViolation, FieldError};

    fn translator() -> ErrorTranslator {
        ErrorTranslator::default()
    }

    fn single(response: &ErrorResponse) -> &ErrorEntry {
        assert_eq!(response.envelope().errors.len(), 1);
        &response.envelope().errors[0]
    }

    #[test]
    fn test_business_entries_pass_through_in_order() {
        let entries = vec![
            ErrorEntry::new(409, "TEMPLATE_LOCKED", "locked by another editor"),
            ErrorEntry::new(404, "TEMPLATE_NOT_FOUND", "missing parent"),
            ErrorEntry::new(400, "TEMPLATE_INVALID", "bad placeholder"),
        ];
        let err = AppError::from(BusinessError::new("rejected").with_errors(entries.clone()));

        let response = translator().translate(&err);
        assert_eq!(response.envelope().errors, entries);
        assert_eq!(response.status(), 409);
    }

    #[test]
    fn test_business_without_entries_is_bad_request() {
        let response = translator().translate(&AppError::from(BusinessError::new("rejected")));
        assert!(response.envelope().errors.is_empty());
        assert_eq!(response.status(), 400);

        let err = AppError::from(BusinessError::new("rejected").with_errors(Vec::new()));
        assert_eq!(translator().translate(&err).status(), 400);
    }

    #[test]
    fn test_constraint_violations_one_entry_each() {
        let violations = vec![
            ConstraintViolation::new("list.page", Some("0".into()), "must be at least 1"),
            ConstraintViolation::new("list.page_size", Some("500".into()), "must be at most 100"),
            ConstraintViolation::new("list.sort", None, "is not supported"),
        ];
        let response = translator().translate(&AppError::ConstraintViolation(violations.clone()));

        assert_eq!(response.envelope().errors.len(), 3);
        for (entry, violation) in response.envelope().errors.iter().zip(&violations) {
            assert_eq!(entry.status, 400);
            assert_eq!(entry.key, MessageKey::ValidationFailure.code());
            assert_eq!(entry.detail, violation.to_string());
        }
        assert_eq!(response.status(), 400);
    }

    #[test]
    fn test_field_errors_one_entry_each() {
        let fields = vec![
            FieldError::new("templateRequest", "name", Some(String::new()), "must not be blank"),
            FieldError::new("templateRequest", "content", None, "must not be null"),
        ];
        let response = translator().translate(&AppError::FieldValidation(fields));

        assert_eq!(response.envelope().errors.len(), 2);
        assert!(response.envelope().errors[0].detail.contains("field 'name'"));
        assert!(response.envelope().errors[1].detail.contains("field 'content'"));
        assert!(response.envelope().errors.iter().all(|e| e.status == 400));
    }

    #[test]
    fn test_type_mismatch() {
        let response = translator().translate(&AppError::TypeMismatch(
            "cannot convert 'abc' to int".into(),
        ));
        assert_eq!(
            single(&response),
            &ErrorEntry::new(400, MessageKey::GenericClientError, "cannot convert 'abc' to int")
        );
        assert_eq!(response.status(), 400);
    }

    #[test]
    fn test_upstream_client_error() {
        let response = translator().translate(&AppError::UpstreamClient {
            status: 404,
            message: "404 Not Found from renderer".into(),
        });
        let entry = single(&response);
        assert_eq!(entry.status, 400);
        assert_eq!(entry.key, MessageKey::UpstreamError.code());
        assert_eq!(entry.detail, "404 Not Found from renderer");
    }

    #[test]
    fn test_upstream_server_and_unreachable() {
        for err in [
            AppError::UpstreamServer {
                status: 503,
                message: "503 from downstream".into(),
            },
            AppError::ResourceUnreachable("connection refused".into()),
        ] {
            let response = translator().translate(&err);
            let entry = single(&response);
            assert_eq!(entry.status, 500);
            assert_eq!(entry.key, MessageKey::UpstreamError.code());
            assert_eq!(entry.detail, err.to_string());
            assert_eq!(response.status(), 500);
        }
    }

    #[test]
    fn test_timeout() {
        let response = translator().translate(&AppError::Timeout("call exceeded 5000ms".into()));
        assert_eq!(
            single(&response),
            &ErrorEntry::new(408, MessageKey::Timeout, "call exceeded 5000ms")
        );
        assert_eq!(response.status(), 408);
    }

    #[test]
    fn test_execution_unwraps_to_cause() {
        let direct = AppError::UpstreamServer {
            status: 503,
            message: "503 from downstream".into(),
        };
        let wrapped = AppError::execution(AppError::UpstreamServer {
            status: 503,
            message: "503 from downstream".into(),
        });

        let translator = translator();
        assert_eq!(translator.translate(&wrapped), translator.translate(&direct));
        assert_eq!(translator.translate(&wrapped).status(), 500);
    }

    #[test]
    fn test_execution_unwraps_business_cause() {
        let wrapped = AppError::execution(AppError::from(BusinessError::single(
            422,
            "TEMPLATE_INVALID",
            "unknown placeholder",
        )));
        let response = translator().translate(&wrapped);
        assert_eq!(single(&response).key, "TEMPLATE_INVALID");
        assert_eq!(response.status(), 422);
    }

    #[test]
    fn test_execution_with_foreign_cause_uses_outer_message() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let wrapped = AppError::Execution(ExecutionError::with_cause("render job failed", io));

        let response = translator().translate(&wrapped);
        assert_eq!(
            single(&response),
            &ErrorEntry::new(500, MessageKey::GenericServerError, "render job failed")
        );
    }

    #[test]
    fn test_execution_without_cause_is_unclassified() {
        let response =
            translator().translate(&AppError::Execution(ExecutionError::new("lost result")));
        assert_eq!(single(&response).key, MessageKey::GenericServerError.code());
        assert_eq!(single(&response).detail, "lost result");
    }

    #[test]
    fn test_nested_execution_stops_after_one_level() {
        let inner = AppError::execution(AppError::Timeout("call exceeded 5000ms".into()));
        let outer = AppError::Execution(ExecutionError::with_cause("outer wrapper", inner));

        let response = translator().translate(&outer);
        assert_eq!(
            single(&response),
            &ErrorEntry::new(500, MessageKey::GenericServerError, "outer wrapper")
        );
    }

    #[test]
    fn test_unrecognized_error() {
        let response = translator().translate(&AppError::from(anyhow::anyhow!(
            "called `Option::unwrap()` on a `None` value"
        )));
        let entry = single(&response);
        assert_eq!(entry.status, 500);
        assert_eq!(entry.key, MessageKey::GenericServerError.code());
        assert_eq!(response.status(), 500);
    }

    #[test]
    fn test_translate_is_idempotent() {
        let err = AppError::Timeout("slow".into());
        let translator = translator();
        assert_eq!(translator.translate(&err), translator.translate(&err));
    }

    #[test]
    fn test_translate_panic() {
        let response = translator().translate_panic("index out of bounds");
        assert_eq!(
            single(&response),
            &ErrorEntry::new(500, MessageKey::GenericServerError, "index out of bounds")
        );
    }

    #[test]
    fn test_injected_catalog_is_used() {
        struct Localized;
        impl ErrorCatalog for Localized {
            fn build_error(&self, status: u16, key: MessageKey, detail: &str) -> ErrorEntry {
                ErrorEntry::new(status, key, format!("[{}] {}", key, detail))
            }
        }

        let translator = ErrorTranslator::new(Arc::new(Localized));
        let response = translator.translate(&AppError::Timeout("5s".into()));
        assert_eq!(single(&response).detail, "[E01_01_0002] 5s");
    }

    #[test]
    fn test_error_chain() {
        let err = AppError::Execution(ExecutionError::with_cause(
            "outer",
            AppError::Timeout("inner".into()),
        ));
        assert_eq!(error_chain(&err), "outer: inner");
    }
}
