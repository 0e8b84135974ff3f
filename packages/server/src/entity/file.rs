use common::media::MediaFile;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Media-library file row.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub document_id: Option<String>,
    pub name: String,
    pub alternative_text: Option<String>,
    pub caption: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,

    /// Variant name -> variant entry.
    #[sea_orm(column_type = "JsonBinary")]
    pub formats: Json,

    pub hash: String,
    pub ext: Option<String>,
    pub mime: String,
    /// Size in kilobytes.
    #[sea_orm(column_type = "Double")]
    pub size: f64,
    pub url: String,
    pub preview_url: Option<String>,
    pub provider: String,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub provider_metadata: Option<Json>,
    pub folder_path: String,
    pub is_url_signed: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub published_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for MediaFile {
    fn from(m: Model) -> Self {
        MediaFile {
            id: m.id,
            document_id: m.document_id,
            name: m.name,
            alternative_text: m.alternative_text,
            caption: m.caption,
            width: m.width,
            height: m.height,
            formats: m.formats,
            hash: m.hash,
            ext: m.ext,
            mime: m.mime,
            size: m.size,
            url: m.url,
            preview_url: m.preview_url,
            provider: m.provider,
            provider_metadata: m.provider_metadata,
            folder_path: m.folder_path,
            is_url_signed: m.is_url_signed,
            created_at: m.created_at,
            updated_at: m.updated_at,
            published_at: m.published_at,
        }
    }
}
