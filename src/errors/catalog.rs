use super::codes::MessageKey;
use super::response::ErrorEntry;

/// Formatting helpers backed by the message catalog.
///
/// The translator only needs entries built consistently; resolving keys into
/// localized text happens wherever the catalog lives. Implementations are
/// shared read-only across requests.
pub trait ErrorCatalog: Send + Sync {
    /// Build a single entry
    fn build_error(&self, status: u16, key: MessageKey, detail: &str) -> ErrorEntry;

    fn build_400_error_list(&self, key: MessageKey, detail: &str) -> Vec<ErrorEntry> {
        vec![self.build_error(400, key, detail)]
    }

    fn build_500_error_list(&self, key: MessageKey, detail: &str) -> Vec<ErrorEntry> {
        vec![self.build_error(500, key, detail)]
    }

    fn build_408_error_list(&self, key: MessageKey, detail: &str) -> Vec<ErrorEntry> {
        vec![self.build_error(408, key, detail)]
    }
}

/// Catalog that writes the registry code straight into the entry
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCatalog;

impl ErrorCatalog for DefaultCatalog {
    fn build_error(&self, status: u16, key: MessageKey, detail: &str) -> ErrorEntry {
        ErrorEntry::new(status, key, detail)
    }
}
