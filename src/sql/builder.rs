//! Builds parameterized INSERT, UPDATE and SELECT statements from a blueprint.

use crate::blueprint::{Blueprint, Field, FieldType, KEY_COLLECTION, KEY_ID, KEY_UPDATED_AT, KEY_UUID};
use crate::dialect::Dialect;
use crate::error::AppError;
use crate::item::{FieldValue, Item};
use crate::sql::quote;

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<FieldValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: FieldValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Blueprint columns present in `item`, in blueprint order, minus `skip`.
fn writable_fields<'a>(blueprint: &'a Blueprint, item: &'a Item, skip: &'a [&'a str]) -> impl Iterator<Item = &'a Field> {
    blueprint
        .column_fields()
        .filter(move |f| !skip.contains(&f.name.as_str()))
        .filter(move |f| item.contains_key(&f.name))
}

/// INSERT over the blueprint fields present in `item`. `id` is always left to the database.
pub fn insert(dialect: Dialect, blueprint: &Blueprint, item: &Item) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for field in writable_fields(blueprint, item, &[KEY_ID]) {
        let value = item.get(&field.name).cloned().unwrap_or(FieldValue::Null);
        let n = q.push_param(value);
        cols.push(quote(&field.name)?);
        placeholders.push(dialect.placeholder(n, field.type_));
    }
    if cols.is_empty() {
        return Err(AppError::EmptyFieldSet(blueprint.collection_name.clone()));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quote(&blueprint.collection_name)?,
        cols.join(", "),
        placeholders.join(", "),
        quote(KEY_ID)?
    );
    Ok(q)
}

/// UPDATE by id over the blueprint fields present in `item`. `id`, `uuid` and
/// `collection` are never rewritten.
pub fn update(dialect: Dialect, blueprint: &Blueprint, id: i64, item: &Item) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for field in writable_fields(blueprint, item, &[KEY_ID, KEY_UUID, KEY_COLLECTION]) {
        let value = item.get(&field.name).cloned().unwrap_or(FieldValue::Null);
        let n = q.push_param(value);
        sets.push(format!("{} = {}", quote(&field.name)?, dialect.placeholder(n, field.type_)));
    }
    if sets.is_empty() {
        return Err(AppError::EmptyFieldSet(blueprint.collection_name.clone()));
    }
    let n = q.push_param(FieldValue::Int(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        quote(&blueprint.collection_name)?,
        sets.join(", "),
        quote(KEY_ID)?,
        dialect.placeholder(n, FieldType::Id)
    );
    Ok(q)
}

/// SELECT one row by primary key.
pub fn select_by_id(dialect: Dialect, blueprint: &Blueprint, id: i64) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let n = q.push_param(FieldValue::Int(id));
    q.sql = format!(
        "SELECT * FROM {} WHERE {} = {}",
        quote(&blueprint.collection_name)?,
        quote(KEY_ID)?,
        dialect.placeholder(n, FieldType::Id)
    );
    Ok(q)
}

/// SELECT a page, most recently modified first. Ties fall back to newest id.
/// `limit` is used as given; callers bound it.
pub fn select_list(blueprint: &Blueprint, limit: u32, offset: u64) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT * FROM {} ORDER BY {} DESC, {} DESC LIMIT {} OFFSET {}",
        quote(&blueprint.collection_name)?,
        quote(KEY_UPDATED_AT)?,
        quote(KEY_ID)?,
        limit,
        offset
    );
    Ok(q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::loader::parse;

    fn blueprint() -> Blueprint {
        parse(
            "pages",
            r#"{"collection_name":"pages","fields":[
                {"name":"body","type":"string"},
                {"name":"views","type":"int"},
                {"name":"related","type":"reference","reference":{"collection":"articles"}}
            ]}"#,
        )
        .unwrap()
    }

    fn item(pairs: &[(&str, FieldValue)]) -> Item {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn insert_follows_blueprint_order_and_skips_id() {
        let it = item(&[
            ("views", FieldValue::Int(3)),
            ("id", FieldValue::Int(99)),
            ("title", "Hello".into()),
            ("unknown", "ignored".into()),
            ("related", FieldValue::Int(1)),
        ]);
        let q = insert(Dialect::Sqlite3, &blueprint(), &it).unwrap();
        assert_eq!(
            q.sql,
            r#"INSERT INTO "pages" ("title", "views") VALUES (?1, ?2) RETURNING "id""#
        );
        assert_eq!(q.params, vec![FieldValue::Text("Hello".into()), FieldValue::Int(3)]);
    }

    #[test]
    fn insert_casts_postgres_placeholders() {
        let it = item(&[("uuid", "u".into()), ("views", FieldValue::Int(3))]);
        let q = insert(Dialect::Postgresql, &blueprint(), &it).unwrap();
        assert_eq!(
            q.sql,
            r#"INSERT INTO "pages" ("uuid", "views") VALUES ($1::CHARACTER(36), $2::BIGINT) RETURNING "id""#
        );
    }

    #[test]
    fn insert_without_known_fields_fails() {
        let it = item(&[("id", FieldValue::Int(1)), ("nope", "x".into())]);
        assert!(matches!(
            insert(Dialect::Sqlite3, &blueprint(), &it),
            Err(AppError::EmptyFieldSet(name)) if name == "pages"
        ));
    }

    #[test]
    fn update_skips_immutable_fields() {
        let it = item(&[
            ("id", FieldValue::Int(7)),
            ("uuid", "new".into()),
            ("collection", "other".into()),
            ("updated_at", FieldValue::Int(100)),
            ("body", "text".into()),
        ]);
        let q = update(Dialect::Sqlite3, &blueprint(), 7, &it).unwrap();
        assert_eq!(
            q.sql,
            r#"UPDATE "pages" SET "updated_at" = ?1, "body" = ?2 WHERE "id" = ?3"#
        );
        assert_eq!(q.params.last(), Some(&FieldValue::Int(7)));
    }

    #[test]
    fn update_with_only_immutable_fields_fails() {
        let it = item(&[("id", FieldValue::Int(7)), ("uuid", "new".into())]);
        assert!(matches!(
            update(Dialect::Postgresql, &blueprint(), 7, &it),
            Err(AppError::EmptyFieldSet(_))
        ));
    }

    #[test]
    fn list_orders_by_updated_at() {
        let q = select_list(&blueprint(), 5000, 20).unwrap();
        assert_eq!(
            q.sql,
            r#"SELECT * FROM "pages" ORDER BY "updated_at" DESC, "id" DESC LIMIT 5000 OFFSET 20"#
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn select_by_id_binds_id() {
        let q = select_by_id(Dialect::Postgresql, &blueprint(), 4).unwrap();
        assert_eq!(q.sql, r#"SELECT * FROM "pages" WHERE "id" = $1::BIGINT"#);
        assert_eq!(q.params, vec![FieldValue::Int(4)]);
    }
}
