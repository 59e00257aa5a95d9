//! Item repository: create, update and read items of one collection.

use crate::blueprint::{KEY_COLLECTION, KEY_ID, KEY_UPDATED_AT, KEY_UUID};
use crate::collection::Collection;
use crate::error::AppError;
use crate::item::Item;
use crate::sql::{insert, select_by_id, select_list, update};
use crate::store::Database;

pub struct CrudService;

impl CrudService {
    /// Insert `item` as a new row. Stamps `updated_at`, forces `collection`,
    /// fills in a `uuid` when absent, and writes the assigned `id` back.
    pub async fn create(db: &Database, collection: &Collection, item: &mut Item) -> Result<i64, AppError> {
        item.insert(KEY_UPDATED_AT, now());
        item.insert(KEY_COLLECTION, collection.name());
        if item.get(KEY_UUID).map_or(true, |v| v.is_null()) {
            item.insert(KEY_UUID, uuid::Uuid::new_v4().to_string());
        }
        let q = insert(db.dialect(), collection.blueprint(), item)?;
        let id = db.fetch_i64(&q).await?;
        item.insert(KEY_ID, id);
        tracing::debug!(collection = %collection.name(), id, "item created");
        Ok(id)
    }

    /// Update the row named by the item's `id`. Nothing is written without one.
    pub async fn update(db: &Database, collection: &Collection, item: &mut Item) -> Result<(), AppError> {
        let id = item.id().ok_or(AppError::MissingId)?;
        item.insert(KEY_UPDATED_AT, now());
        let q = update(db.dialect(), collection.blueprint(), id, item)?;
        if db.execute(&q).await? == 0 {
            return Err(AppError::NotFound(format!("{} {}", collection.name(), id)));
        }
        Ok(())
    }

    pub async fn get_by_id(db: &Database, collection: &Collection, id: i64) -> Result<Item, AppError> {
        let q = select_by_id(db.dialect(), collection.blueprint(), id)?;
        let mut item = db
            .fetch_optional(&q)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", collection.name(), id)))?;
        item.normalize(collection.blueprint());
        Ok(item)
    }

    /// One page of items, most recently updated first.
    pub async fn list(db: &Database, collection: &Collection, limit: u32, offset: u64) -> Result<Vec<Item>, AppError> {
        let q = select_list(collection.blueprint(), limit, offset)?;
        let mut items = db.fetch_all(&q).await?;
        for item in &mut items {
            item.normalize(collection.blueprint());
        }
        Ok(items)
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
