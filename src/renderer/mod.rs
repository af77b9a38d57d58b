use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::config::RendererConfig;
use crate::errors::AppError;
use crate::metrics::UPSTREAM_CALLS_TOTAL;
use crate::models::template::Template;

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    template_id: u32,
    content: &'a str,
}

/// Output of the downstream renderer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenderedTemplate {
    pub template_id: u32,
    pub rendered: String,
}

/// Client for the downstream template renderer
#[derive(Clone)]
pub struct RendererClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl RendererClient {
    pub fn new(config: &RendererConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("template-provider/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        info!(
            base_url = %config.base_url,
            timeout_ms = config.timeout_ms,
            "Initialized renderer client"
        );

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Render `template` downstream.
    ///
    /// Transport and status failures come back as the matching upstream,
    /// timeout or unreachable error. Only an unreadable 2xx body is internal.
    pub async fn render(&self, template: &Template) -> Result<RenderedTemplate, AppError> {
        let url = format!("{}/render", self.base_url);
        debug!(template_id = template.id, url = %url, "Rendering template downstream");

        let result = self
            .http_client
            .post(&url)
            .json(&RenderRequest {
                template_id: template.id,
                content: &template.content,
            })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        let response = match result {
            Ok(response) => {
                UPSTREAM_CALLS_TOTAL.with_label_values(&["ok"]).inc();
                response
            }
            Err(e) => {
                UPSTREAM_CALLS_TOTAL.with_label_values(&["error"]).inc();
                warn!(template_id = template.id, "Renderer call failed: {}", e);
                return Err(e.into());
            }
        };

        // The client deadline also covers the body read
        response.json::<RenderedTemplate>().await.map_err(|e| {
            if e.is_decode() {
                let err = anyhow::Error::new(e).context("Failed to parse renderer response");
                AppError::Internal(err)
            } else {
                warn!(template_id = template.id, "Renderer body read failed: {}", e);
                e.into()
            }
        })
    }
}
