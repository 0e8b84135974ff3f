use async_trait::async_trait;
use chrono::Utc;
use common::media::{MediaFile, MediaRepository, NewMediaFile, RepositoryError};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryOrder, Set};
use serde_json::Value;

use crate::entity::file;

/// [`MediaRepository`] over the `files` table.
pub struct DbMediaRepository {
    db: DatabaseConnection,
}

impl DbMediaRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn backend(e: DbErr) -> RepositoryError {
    RepositoryError::Backend(e.to_string())
}

#[async_trait]
impl MediaRepository for DbMediaRepository {
    async fn create(&self, new: NewMediaFile) -> Result<MediaFile, RepositoryError> {
        let now = Utc::now();
        let model = file::ActiveModel {
            id: NotSet,
            document_id: Set(new.document_id),
            name: Set(new.name),
            alternative_text: Set(new.alternative_text),
            caption: Set(new.caption),
            width: Set(new.width),
            height: Set(new.height),
            formats: Set(new.formats),
            hash: Set(new.hash),
            ext: Set(new.ext),
            mime: Set(new.mime),
            size: Set(new.size),
            url: Set(new.url),
            preview_url: Set(new.preview_url),
            provider: Set(new.provider),
            provider_metadata: Set(new.provider_metadata),
            folder_path: Set(new.folder_path),
            is_url_signed: Set(new.is_url_signed),
            created_at: Set(now),
            updated_at: Set(now),
            published_at: Set(Some(now)),
        };

        let created = model.insert(&self.db).await.map_err(backend)?;
        Ok(created.into())
    }

    async fn find(&self, id: i32) -> Result<Option<MediaFile>, RepositoryError> {
        let row = file::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(row.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<MediaFile>, RepositoryError> {
        let rows = file::Entity::find()
            .order_by_asc(file::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_formats(&self, id: i32, formats: Value) -> Result<MediaFile, RepositoryError> {
        let row = file::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(backend)?
            .ok_or(RepositoryError::NotFound(id))?;

        let mut active: file::ActiveModel = row.into();
        active.formats = Set(formats);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.db).await.map_err(backend)?;
        Ok(updated.into())
    }

    async fn delete(&self, id: i32) -> Result<bool, RepositoryError> {
        let result = file::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected > 0)
    }
}
