use tokio::sync::RwLock;
use tracing::info;

use crate::errors::{AppError, BusinessError};
use crate::models::template::{NewTemplate, Template};

/// In-memory template registry
pub struct TemplateStore {
    templates: RwLock<Vec<Template>>,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new(vec![
            Template {
                id: 1,
                name: "welcome".to_string(),
                content: "Hello {{name}}, welcome aboard.".to_string(),
            },
            Template {
                id: 2,
                name: "invoice".to_string(),
                content: "Invoice {{number}} is due on {{due_date}}.".to_string(),
            },
        ])
    }
}

impl TemplateStore {
    pub fn new(templates: Vec<Template>) -> Self {
        Self {
            templates: RwLock::new(templates),
        }
    }

    /// One page of templates ordered by id, plus the total count
    pub async fn page(&self, page: u32, page_size: u32) -> (Vec<Template>, usize) {
        let templates = self.templates.read().await;
        let skip = (page.saturating_sub(1) as usize).saturating_mul(page_size as usize);
        let items = templates
            .iter()
            .skip(skip)
            .take(page_size as usize)
            .cloned()
            .collect();
        (items, templates.len())
    }

    pub async fn get(&self, id: u32) -> Result<Template, AppError> {
        self.templates
            .read()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| {
                BusinessError::single(
                    404,
                    "TEMPLATE_NOT_FOUND",
                    format!("Template {} does not exist", id),
                )
                .into()
            })
    }

    pub async fn create(&self, new: NewTemplate) -> Result<Template, AppError> {
        let mut templates = self.templates.write().await;

        if templates.iter().any(|t| t.name == new.name) {
            return Err(BusinessError::single(
                409,
                "TEMPLATE_EXISTS",
                format!("Template named '{}' already exists", new.name),
            )
            .into());
        }

        let id = templates.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let template = Template {
            id,
            name: new.name,
            content: new.content,
        };
        templates.push(template.clone());
        info!(id, name = %template.name, "Created template");

        Ok(template)
    }
}
