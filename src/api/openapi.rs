use utoipa::OpenApi;

use crate::api::handlers::{ListParams, TemplatePage};
use crate::errors::{ErrorEntry, ResponseEnvelope};
use crate::models::template::{NewTemplate, Template};
use crate::renderer::RenderedTemplate;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Template Provider",
        version = "0.1.0",
        description = "Template registry whose failures are all reported through one error envelope: `{\"errors\": [{\"status\", \"key\", \"detail\"}]}`, with the response status taken from the first entry.",
    ),
    paths(
        crate::api::handlers::health,
        crate::api::handlers::list_templates,
        crate::api::handlers::get_template,
        crate::api::handlers::create_template,
        crate::api::handlers::render_template,
    ),
    components(
        schemas(
            Template,
            NewTemplate,
            TemplatePage,
            ListParams,
            RenderedTemplate,
            ResponseEnvelope,
            ErrorEntry,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "templates", description = "Template retrieval, creation and rendering"),
    )
)]
pub struct ApiDoc;
