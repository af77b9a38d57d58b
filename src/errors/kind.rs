use std::fmt;

/// Classification bucket a raised error falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BusinessRule,
    ValidationField,
    ValidationConstraint,
    TypeMismatch,
    UpstreamClientError,
    UpstreamServerError,
    ResourceUnreachable,
    Timeout,
    WrappedExecution,
    Unclassified,
}

impl ErrorKind {
    /// Stable label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::BusinessRule => "business_rule",
            Self::ValidationField => "validation_field",
            Self::ValidationConstraint => "validation_constraint",
            Self::TypeMismatch => "type_mismatch",
            Self::UpstreamClientError => "upstream_client_error",
            Self::UpstreamServerError => "upstream_server_error",
            Self::ResourceUnreachable => "resource_unreachable",
            Self::Timeout => "timeout",
            Self::WrappedExecution => "wrapped_execution",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
