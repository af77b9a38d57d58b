use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// Message keys understood by the external message catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub enum MessageKey {
    /// Downstream service call failed
    #[serde(rename = "E01_01_0001")]
    UpstreamError,

    /// Operation exceeded its deadline
    #[serde(rename = "E01_01_0002")]
    Timeout,

    /// Request input failed validation
    #[serde(rename = "E01_01_0003")]
    ValidationFailure,

    /// Malformed request (bad parameter type, unreadable body)
    #[serde(rename = "E01_01_0004")]
    GenericClientError,

    /// Anything the translator does not recognize
    #[serde(rename = "E01_01_0005")]
    GenericServerError,
}

impl MessageKey {
    /// Catalog code as written on the wire
    pub fn code(&self) -> &'static str {
        match self {
            Self::UpstreamError => "E01_01_0001",
            Self::Timeout => "E01_01_0002",
            Self::ValidationFailure => "E01_01_0003",
            Self::GenericClientError => "E01_01_0004",
            Self::GenericServerError => "E01_01_0005",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<MessageKey> for String {
    fn from(key: MessageKey) -> Self {
        key.code().to_string()
    }
}
