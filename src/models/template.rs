use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::FieldError;

const MAX_NAME_LENGTH: usize = 64;
const MAX_CONTENT_LENGTH: usize = 10_000;

/// A stored document template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Template {
    pub id: u32,
    pub name: String,
    pub content: String,
}

/// Payload for creating a template
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewTemplate {
    /// Unique template name (1-64 characters)
    pub name: String,
    /// Template body with `{{placeholder}}` markers
    pub content: String,
}

impl NewTemplate {
    /// Check every field, returning one error per rejected field
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(self.field_error("name", &self.name, "must not be blank"));
        } else if self.name.chars().count() > MAX_NAME_LENGTH {
            errors.push(self.field_error(
                "name",
                &self.name,
                &format!("size must be between 1 and {}", MAX_NAME_LENGTH),
            ));
        }

        if self.content.trim().is_empty() {
            errors.push(self.field_error("content", &self.content, "must not be blank"));
        } else if self.content.len() > MAX_CONTENT_LENGTH {
            // The body itself is not echoed back
            errors.push(FieldError::new(
                "newTemplate",
                "content",
                Some(format!("<{} bytes>", self.content.len())),
                format!("size must be at most {} bytes", MAX_CONTENT_LENGTH),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn field_error(&self, field: &str, value: &str, message: &str) -> FieldError {
        FieldError::new("newTemplate", field, Some(value.to_string()), message)
    }
}
