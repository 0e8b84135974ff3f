use axum::Json;
use axum::extract::State;
use common::permissions::{self, render};
use common::settings::Settings;
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/settings",
    tag = "Settings",
    operation_id = "getSettings",
    summary = "Get the effective ImageKit settings",
    description = "Returns the persisted settings, falling back to the static configuration and then \
        to the defaults. Requires `plugin::imagekit.settings.read`.",
    responses(
        (status = 200, description = "Effective settings", body = Settings),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn get_settings(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Settings>, AppError> {
    auth_user.require_permission(&render(permissions::settings::READ))?;

    Ok(Json(state.settings.get_settings().await?))
}

#[utoipa::path(
    put,
    path = "/settings",
    tag = "Settings",
    operation_id = "updateSettings",
    summary = "Replace the ImageKit settings",
    description = "Validates the full settings object and persists it with the keys and endpoint \
        trimmed. The cached ImageKit client is dropped so the next call uses the new credentials. \
        Requires `plugin::imagekit.settings.change`.",
    request_body = Settings,
    responses(
        (status = 200, description = "Settings after the update", body = Settings),
        (status = 400, description = "Validation error with per-field details (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn update_settings(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<Value>,
) -> Result<Json<Settings>, AppError> {
    auth_user.require_permission(&render(permissions::settings::CHANGE))?;

    let updated = state.settings.apply_settings(&payload).await?;

    info!(
        enabled = updated.enabled,
        upload_enabled = updated.upload_enabled,
        "ImageKit settings updated"
    );
    Ok(Json(updated))
}

#[utoipa::path(
    put,
    path = "/settings/restore",
    tag = "Settings",
    operation_id = "restoreSettings",
    summary = "Reset the settings to the static configuration",
    description = "Overwrites the persisted settings with the `[imagekit]` configuration section. \
        Requires `plugin::imagekit.settings.change`.",
    responses(
        (status = 200, description = "Restored settings", body = Settings),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn restore_settings(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Settings>, AppError> {
    auth_user.require_permission(&render(permissions::settings::CHANGE))?;

    let restored = state.settings.restore_config().await?;
    info!("ImageKit settings restored from static config");
    Ok(Json(restored))
}
