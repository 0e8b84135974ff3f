use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::models::webhook::WebhookResponse;
use crate::services::webhook::WebhookPayload;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/webhook",
    tag = "Webhook",
    operation_id = "handleWebhook",
    summary = "Import files uploaded directly to ImageKit",
    description = "Receives an ImageKit upload notification. `INSERT` events create one media file per \
        item; items named `{format}_{original}` are attached to their original as a size variant. \
        Other event types are accepted and ignored. No authentication.",
    request_body(content = Object, description = "`{ eventType, data: [file, ...] }`"),
    responses(
        (status = 200, description = "Processed (status `success` or `warning`)", body = WebhookResponse),
        (status = 400, description = "Malformed or empty payload (status `error`)", body = WebhookResponse),
    ),
)]
#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<WebhookResponse>) {
    let Some(payload) = parse_payload(&body) else {
        warn!("Rejected malformed webhook payload");
        return (
            StatusCode::BAD_REQUEST,
            Json(WebhookResponse::rejected(
                "Invalid webhook payload",
                "The webhook payload must contain eventType and an array of data items",
            )),
        );
    };

    if payload.data.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(WebhookResponse::rejected(
                "No files to import",
                "The webhook payload contains an empty data array",
            )),
        );
    }

    let total = payload.data.len();
    let imported = state.webhook.process_webhook(&payload).await;
    info!(total, imported = imported.len(), "Webhook processed");

    (StatusCode::OK, Json(WebhookResponse::processed(total, imported)))
}

/// `None` unless the body is a JSON object with a non-empty string
/// `eventType` and an array `data`.
fn parse_payload(body: &[u8]) -> Option<WebhookPayload> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let event_type = value
        .get("eventType")?
        .as_str()
        .filter(|t| !t.is_empty())?
        .to_string();
    let data = value.get("data")?.as_array()?.clone();
    Some(WebhookPayload { event_type, data })
}
