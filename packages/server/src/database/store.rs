use async_trait::async_trait;
use common::store::{KeyValueStore, StoreError};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use serde_json::Value;
use tracing::error;

use crate::entity::plugin_storage;

const COLLECTION: &str = "store";

/// [`KeyValueStore`] over the `plugin_storage` table, scoped to one plugin.
pub struct DbPluginStore {
    db: DatabaseConnection,
    plugin_id: String,
}

impl DbPluginStore {
    pub fn new(db: DatabaseConnection, plugin_id: impl Into<String>) -> Self {
        Self {
            db,
            plugin_id: plugin_id.into(),
        }
    }
}

fn backend(op: &'static str) -> impl FnOnce(DbErr) -> StoreError {
    move |e| {
        error!("DB {} error: {}", op, e);
        StoreError::Backend(e.to_string())
    }
}

#[async_trait]
impl KeyValueStore for DbPluginStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let row = plugin_storage::Entity::find()
            .filter(plugin_storage::Column::PluginId.eq(self.plugin_id.as_str()))
            .filter(plugin_storage::Column::Collection.eq(COLLECTION))
            .filter(plugin_storage::Column::Key.eq(key))
            .one(&self.db)
            .await
            .map_err(backend("store get"))?;

        Ok(row.map(|r| r.data))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let model = plugin_storage::ActiveModel {
            plugin_id: Set(self.plugin_id.clone()),
            collection: Set(COLLECTION.to_string()),
            key: Set(key.to_string()),
            data: Set(value),
            updated_at: Set(chrono::Utc::now()),
        };

        plugin_storage::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    plugin_storage::Column::PluginId,
                    plugin_storage::Column::Collection,
                    plugin_storage::Column::Key,
                ])
                .update_columns([
                    plugin_storage::Column::Data,
                    plugin_storage::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(backend("store set"))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        plugin_storage::Entity::delete_many()
            .filter(plugin_storage::Column::PluginId.eq(self.plugin_id.as_str()))
            .filter(plugin_storage::Column::Collection.eq(COLLECTION))
            .filter(plugin_storage::Column::Key.eq(key))
            .exec(&self.db)
            .await
            .map_err(backend("store delete"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn row(data: Value) -> plugin_storage::Model {
        plugin_storage::Model {
            plugin_id: "imagekit".into(),
            collection: COLLECTION.into(),
            key: "config".into(),
            data,
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn get_returns_stored_document() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(json!({ "enabled": true }))]])
            .into_connection();
        let store = DbPluginStore::new(db, "imagekit");

        let value = store.get("config").await.unwrap();
        assert_eq!(value, Some(json!({ "enabled": true })));
    }

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<plugin_storage::Model>::new()])
            .into_connection();
        let store = DbPluginStore::new(db, "imagekit");

        assert_eq!(store.get("config").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_missing_key_succeeds() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let store = DbPluginStore::new(db, "imagekit");

        store.delete("config").await.unwrap();
    }
}
