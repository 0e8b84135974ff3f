//! Response post-processing that points asset URLs at the CDN.
//!
//! Every `url` string and every `formats` map in an outgoing JSON body is
//! rewritten, at any depth. Stored rows are never touched.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use common::settings::Settings;
use imagekit::{MediaCdn, Transformation, UrlOptions};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::AppError;
use crate::services::{ServiceError, SettingsService};
use crate::state::AppState;

/// Rewriting runs only when switched on and an endpoint is configured.
pub fn is_active(settings: &Settings) -> bool {
    settings.enabled && !settings.url_endpoint.is_empty()
}

pub struct UrlRewriter {
    settings: Settings,
    client: Arc<dyn MediaCdn>,
}

impl UrlRewriter {
    pub fn new(settings: Settings, client: Arc<dyn MediaCdn>) -> Self {
        Self { settings, client }
    }

    /// A rewriter for the current settings, or `None` when rewriting is off.
    /// The CDN client is only looked up when rewriting is on.
    pub async fn for_current(settings: &SettingsService) -> Result<Option<Self>, ServiceError> {
        let current = settings.get_settings().await?;
        if !is_active(&current) {
            return Ok(None);
        }
        let client = settings.accessor().get_client(&current).await?;
        Ok(Some(Self::new(current, client)))
    }

    pub fn rewrite(&self, value: &mut Value) {
        match value {
            Value::Object(map) => {
                let owner_url = map.get("url").and_then(Value::as_str).map(str::to_owned);
                for (key, child) in map.iter_mut() {
                    match (key.as_str(), child) {
                        (_, Value::Null) => {}
                        ("url", Value::String(url)) => {
                            if let Some(rewritten) = self.rewrite_url(url) {
                                *url = rewritten;
                            }
                        }
                        ("formats", Value::Object(formats)) => {
                            self.rewrite_formats(formats, owner_url.as_deref())
                        }
                        (_, child) => self.rewrite(child),
                    }
                }
            }
            Value::Array(items) => items.iter_mut().for_each(|item| self.rewrite(item)),
            _ => {}
        }
    }

    fn rewrite_url(&self, url: &str) -> Option<String> {
        let options = self.source(url)?.signed(self.settings.use_signed_urls);
        self.build(&options)
    }

    /// Each `{url, width, height}` variant is resized on the fly from the
    /// owner's URL when transform URLs are on, else its own URL is rewritten.
    fn rewrite_formats(&self, formats: &mut Map<String, Value>, owner_url: Option<&str>) {
        for variant in formats.values_mut() {
            let Value::Object(variant) = variant else {
                continue;
            };
            let (Some(url), Some(width), Some(height)) = (
                variant.get("url").and_then(Value::as_str),
                variant.get("width").and_then(dimension),
                variant.get("height").and_then(dimension),
            ) else {
                continue;
            };

            let options = if self.settings.use_transform_urls {
                self.source(owner_url.unwrap_or(url))
                    .map(|o| o.with_transformation(Transformation::new().width(width).height(height)))
            } else {
                self.source(url)
            };
            let Some(options) = options else {
                continue;
            };
            let options = options
                .signed(self.settings.use_signed_urls)
                .expire_seconds(self.settings.expire_seconds());

            if let Some(rewritten) = self.build(&options) {
                variant.insert("url".into(), Value::String(rewritten));
            }
        }
    }

    fn source(&self, url: &str) -> Option<UrlOptions> {
        if url.starts_with(&self.settings.url_endpoint) {
            Some(UrlOptions::src(url))
        } else if url.starts_with('/') {
            Some(UrlOptions::path(url))
        } else {
            None
        }
    }

    fn build(&self, options: &UrlOptions) -> Option<String> {
        self.client
            .url(options)
            .inspect_err(|e| warn!(error = %e, "Could not build CDN URL, leaving it as is"))
            .ok()
    }
}

fn dimension(value: &Value) -> Option<u32> {
    value
        .as_f64()
        .filter(|n| *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n.round() as u32)
}

/// Middleware rewriting successful JSON responses.
pub async fn rewrite_response(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let response = next.run(request).await;

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    if !is_json || !response.status().is_success() {
        return Ok(response);
    }

    let Some(rewriter) = UrlRewriter::for_current(&state.settings).await? else {
        return Ok(response);
    };

    let (mut parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to buffer response: {e}")))?;
    let Ok(mut value) = serde_json::from_slice::<Value>(&bytes) else {
        return Ok(Response::from_parts(parts, Body::from(bytes)));
    };

    rewriter.rewrite(&mut value);
    let body = serde_json::to_vec(&value)
        .map_err(|e| AppError::Internal(format!("Failed to encode response: {e}")))?;
    parts.headers.remove(header::CONTENT_LENGTH);
    Ok(Response::from_parts(parts, Body::from(body)))
}
