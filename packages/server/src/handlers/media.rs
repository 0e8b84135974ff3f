use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::extract::multipart::Field;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::event::MediaCreated;
use common::media::{MediaFile, NewMediaFile, empty_formats};
use common::permissions;
use common::storage::{FileData, UploadFile};
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::media::MediaListResponse;
use crate::state::AppState;
use crate::utils::filename::{document_id, split_ext, upload_hash, validate_flat_filename};

pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max(usize::try_from(max_upload_size).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/files",
    tag = "Media",
    operation_id = "uploadFile",
    summary = "Upload a file to the media library",
    description = "Stores the `file` multipart field through the active upload provider (ImageKit when \
        upload forwarding is on, local storage otherwise) and creates a media row. Optional text \
        fields: `folderPath`, `alternativeText`, `caption`. Requires `plugin::upload.assets.create`.",
    request_body(content_type = "multipart/form-data", description = "File upload"),
    responses(
        (status = 201, description = "File created", body = MediaFile),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 500, description = "ImageKit client not configured (CONFIGURATION_ERROR)", body = ErrorBody),
        (status = 502, description = "ImageKit rejected the upload (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user = %auth_user.username))]
pub async fn upload_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(permissions::upload::CREATE)?;

    let mut upload: Option<(Option<String>, Option<String>, Vec<u8>)> = None;
    let mut folder_path = None;
    let mut alternative_text = None;
    let mut caption = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
                upload = Some((file_name, content_type, bytes.to_vec()));
            }
            Some("folderPath") => folder_path = Some(text(field).await?),
            Some("alternativeText") => alternative_text = Some(text(field).await?),
            Some("caption") => caption = Some(text(field).await?),
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        upload.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let file_name =
        file_name.ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
    let name = validate_flat_filename(&file_name)
        .map_err(|e| AppError::Validation(e.message().into()))?
        .to_string();

    let (_, ext) = split_ext(&name);
    let mime = content_type
        .filter(|ct| ct != "application/octet-stream")
        .unwrap_or_else(|| mime_guess::from_path(&name).first_or_octet_stream().to_string());
    let folder_path = folder_path.filter(|p| !p.trim().is_empty());

    let mut file = UploadFile {
        hash: upload_hash(&name),
        ext: ext.to_string(),
        mime,
        size: bytes.len() as f64 / 1024.0,
        folder_path: folder_path.clone(),
        data: Some(FileData::Buffer(bytes)),
        name,
        ..Default::default()
    };
    state.uploads.upload(&mut file).await?;

    let url = file
        .url
        .take()
        .ok_or_else(|| AppError::Internal("Upload provider returned no URL".into()))?;
    let provider = file.provider.take().unwrap_or_default();

    let media = state
        .media
        .create(NewMediaFile {
            document_id: Some(document_id()),
            name: file.name,
            alternative_text,
            caption,
            width: None,
            height: None,
            formats: empty_formats(),
            hash: file.hash,
            ext: Some(file.ext).filter(|e| !e.is_empty()),
            mime: file.mime,
            size: file.size,
            url,
            preview_url: None,
            provider,
            provider_metadata: file.provider_metadata,
            folder_path: folder_path.unwrap_or_else(|| "/".to_string()),
            is_url_signed: false,
        })
        .await?;

    info!(id = media.id, provider = %media.provider, "File uploaded");
    state
        .hooks
        .emit(&MediaCreated {
            media: media.clone(),
        })
        .await;

    Ok((StatusCode::CREATED, Json(media)))
}

#[utoipa::path(
    get,
    path = "/files",
    tag = "Media",
    operation_id = "listFiles",
    summary = "List media files",
    description = "Returns every media row. Asset URLs are rewritten to the ImageKit endpoint when \
        rewriting is enabled. Requires `plugin::upload.read`.",
    responses(
        (status = 200, description = "Media files", body = MediaListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MediaListResponse>, AppError> {
    auth_user.require_permission(permissions::upload::READ)?;

    let data = state.media.list().await?;
    Ok(Json(MediaListResponse {
        total: data.len() as u64,
        data,
    }))
}

#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "Media",
    operation_id = "getFile",
    summary = "Get a media file by ID",
    description = "Asset URLs are rewritten to the ImageKit endpoint when rewriting is enabled. \
        Requires `plugin::upload.read`.",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "Media file", body = MediaFile),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MediaFile>, AppError> {
    auth_user.require_permission(permissions::upload::READ)?;

    Ok(Json(find_file(&state, id).await?))
}

#[utoipa::path(
    delete,
    path = "/files/{id}",
    tag = "Media",
    operation_id = "deleteFile",
    summary = "Delete a media file",
    description = "Removes the file and each of its format variants through the active upload \
        provider, then deletes the row. Files already gone from ImageKit are not an error. \
        Requires `plugin::upload.assets.delete`.",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "ImageKit rejected the delete (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_permission(permissions::upload::DELETE)?;

    let media = find_file(&state, id).await?;

    if let Value::Object(formats) = &media.formats {
        for variant in formats.values().map(format_upload_file) {
            if variant.hash.is_empty() {
                continue;
            }
            state.uploads.delete(&variant).await?;
        }
    }
    state.uploads.delete(&stored_upload_file(&media)).await?;
    state.media.delete(id).await?;

    info!(id, name = %media.name, "File deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_file(state: &AppState, id: i32) -> Result<MediaFile, AppError> {
    state
        .media
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File {id} not found")))
}

async fn text(field: Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}

/// The provider-facing view of a stored row.
fn stored_upload_file(media: &MediaFile) -> UploadFile {
    UploadFile {
        name: media.name.clone(),
        hash: media.hash.clone(),
        ext: media.ext.clone().unwrap_or_default(),
        mime: media.mime.clone(),
        size: media.size,
        folder_path: Some(media.folder_path.clone()),
        url: Some(media.url.clone()),
        provider: Some(media.provider.clone()),
        provider_metadata: media.provider_metadata.clone(),
        ..Default::default()
    }
}

/// The provider-facing view of one `formats` entry.
fn format_upload_file(entry: &Value) -> UploadFile {
    let text = |key: &str| entry.get(key).and_then(Value::as_str).map(str::to_string);
    UploadFile {
        name: text("name").unwrap_or_default(),
        hash: text("hash").unwrap_or_default(),
        ext: text("ext").unwrap_or_default(),
        mime: text("mime").unwrap_or_default(),
        size: entry.get("size").and_then(Value::as_f64).unwrap_or_default(),
        url: text("url"),
        provider_metadata: entry.get("provider_metadata").cloned(),
        ..Default::default()
    }
}
