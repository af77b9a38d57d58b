use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use utoipa::ToSchema;

use crate::config::TemplatesConfig;
use crate::errors::{join_task_within, AppError, ConstraintViolation, ErrorTranslator, ResponseEnvelope};
use crate::models::template::{NewTemplate, Template};
use crate::renderer::{RenderedTemplate, RendererClient};
use crate::store::TemplateStore;

const DEFAULT_PAGE_SIZE: u32 = 20;

lazy_static::lazy_static! {
    static ref START_TIME: Instant = Instant::now();
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub templates: TemplateStore,
    pub renderer: RendererClient,
    pub translator: ErrorTranslator,
    pub limits: TemplatesConfig,
    pub instance_id: String,
}

/// Template listing parameters
#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct ListParams {
    /// Page number (starts at 1)
    pub page: Option<u32>,
    /// Number of templates per page (default: 20)
    pub page_size: Option<u32>,
}

/// One page of templates
#[derive(Debug, Serialize, ToSchema)]
pub struct TemplatePage {
    pub data: Vec<Template>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = serde_json::Value)
    )
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "template-provider",
        "version": env!("CARGO_PKG_VERSION"),
        "instance_id": state.instance_id,
        "uptime_seconds": START_TIME.elapsed().as_secs(),
    }))
}

/// List templates
#[utoipa::path(
    get,
    path = "/templates",
    tag = "templates",
    params(ListParams),
    responses(
        (status = 200, description = "One page of templates", body = TemplatePage),
        (status = 400, description = "Malformed or out-of-range paging parameters", body = ResponseEnvelope)
    )
)]
pub async fn list_templates(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<TemplatePage>, AppError> {
    let Query(params) = params?;
    let (page, page_size) = check_paging(&params, state.limits.max_page_size)?;

    let (data, total) = state.templates.page(page, page_size).await;
    let has_more = (page as usize) * (page_size as usize) < total;
    info!(page, page_size, total, "Listed templates");

    Ok(Json(TemplatePage {
        data,
        total,
        page,
        page_size,
        has_more,
    }))
}

fn check_paging(params: &ListParams, max_page_size: u32) -> Result<(u32, u32), AppError> {
    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE.min(max_page_size));
    let mut violations = Vec::new();

    if page < 1 {
        violations.push(ConstraintViolation::new(
            "listTemplates.page",
            Some(page.to_string()),
            "must be greater than or equal to 1",
        ));
    }
    if page_size < 1 || page_size > max_page_size {
        violations.push(ConstraintViolation::new(
            "listTemplates.page_size",
            Some(page_size.to_string()),
            format!("must be between 1 and {}", max_page_size),
        ));
    }

    if violations.is_empty() {
        Ok((page, page_size))
    } else {
        Err(AppError::ConstraintViolation(violations))
    }
}

/// Get a template by ID
#[utoipa::path(
    get,
    path = "/templates/{id}",
    tag = "templates",
    params(
        ("id" = u32, Path, description = "Template ID")
    ),
    responses(
        (status = 200, description = "Template found", body = Template),
        (status = 400, description = "ID is not a number", body = ResponseEnvelope),
        (status = 404, description = "Template not found", body = ResponseEnvelope)
    )
)]
pub async fn get_template(
    State(state): State<AppState>,
    id: Result<Path<u32>, PathRejection>,
) -> Result<Json<Template>, AppError> {
    let Path(id) = id?;
    info!("Get template request: id={}", id);

    Ok(Json(state.templates.get(id).await?))
}

/// Create a template
#[utoipa::path(
    post,
    path = "/templates",
    tag = "templates",
    request_body = NewTemplate,
    responses(
        (status = 201, description = "Template created", body = Template),
        (status = 400, description = "Unreadable body or invalid fields", body = ResponseEnvelope),
        (status = 409, description = "Name already taken", body = ResponseEnvelope)
    )
)]
pub async fn create_template(
    State(state): State<AppState>,
    body: Result<Json<NewTemplate>, JsonRejection>,
) -> Result<(StatusCode, Json<Template>), AppError> {
    let Json(new) = body?;
    new.validate().map_err(AppError::FieldValidation)?;

    let template = state.templates.create(new).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// Render a template through the downstream renderer
#[utoipa::path(
    get,
    path = "/templates/{id}/render",
    tag = "templates",
    params(
        ("id" = u32, Path, description = "Template ID")
    ),
    responses(
        (status = 200, description = "Rendered output", body = RenderedTemplate),
        (status = 400, description = "Renderer rejected the request", body = ResponseEnvelope),
        (status = 404, description = "Template not found", body = ResponseEnvelope),
        (status = 408, description = "Renderer did not answer in time", body = ResponseEnvelope),
        (status = 500, description = "Renderer failed or is unreachable", body = ResponseEnvelope)
    )
)]
pub async fn render_template(
    State(state): State<AppState>,
    id: Result<Path<u32>, PathRejection>,
) -> Result<Json<RenderedTemplate>, AppError> {
    let Path(id) = id?;
    let template = state.templates.get(id).await?;
    info!("Render template request: id={}", id);

    let renderer = state.renderer.clone();
    let deadline = renderer.timeout();
    let task = tokio::spawn(async move { renderer.render(&template).await });
    let rendered = join_task_within(deadline, task).await?;

    Ok(Json(rendered))
}
