use chrono::NaiveDate;
use freshtrack_core::{AlertId, ExpiryAlert, Item, ItemId, NewItem, StoredAlert};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use thiserror::Error;

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("Corrupt {column} in item {id}: '{value}'")]
    Corrupt { id: i64, column: &'static str, value: String },
}

/// Dates are stored as ISO `YYYY-MM-DD` text.
const DATE_FMT: &str = "%Y-%m-%d";

type ItemRow = (i64, String, String, Option<String>, Option<String>, String);
type AlertRow = (i64, i64, String, String, bool);

pub async fn create_db(path: &Path) -> Result<DbPool, StorageError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    ensure_schema(&pool).await?;
    tracing::debug!("Opened item database at {}", path.display());

    Ok(pool)
}

async fn ensure_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            expiry_date TEXT NOT NULL,
            purchase_date TEXT,
            image_path TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alerts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            message TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            resolved INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_alerts_item ON alerts(item_id)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn insert_item(pool: &DbPool, item: &NewItem) -> Result<ItemId, StorageError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO items (name, expiry_date, purchase_date, image_path) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&item.name)
    .bind(item.expiry_date.format(DATE_FMT).to_string())
    .bind(item.purchase_date.map(|d| d.format(DATE_FMT).to_string()))
    .bind(&item.image_path)
    .fetch_one(pool)
    .await?;

    Ok(ItemId(id))
}

/// All items, soonest expiry first.
pub async fn get_all_items(pool: &DbPool) -> Result<Vec<Item>, StorageError> {
    let rows = sqlx::query_as::<_, ItemRow>(
        "SELECT id, name, expiry_date, purchase_date, image_path, created_at FROM items ORDER BY expiry_date, id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_item).collect()
}

pub async fn get_item_by_id(pool: &DbPool, id: ItemId) -> Result<Option<Item>, StorageError> {
    let row = sqlx::query_as::<_, ItemRow>(
        "SELECT id, name, expiry_date, purchase_date, image_path, created_at FROM items WHERE id = ?",
    )
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_item).transpose()
}

/// Returns `false` when no item had that id.
pub async fn delete_item(pool: &DbPool, id: ItemId) -> Result<bool, StorageError> {
    let result = sqlx::query("DELETE FROM items WHERE id = ?")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Record an alert raised by the expiry check. Alerts go with their item on delete.
pub async fn insert_alert(pool: &DbPool, alert: &ExpiryAlert) -> Result<AlertId, StorageError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO alerts (item_id, message) VALUES (?, ?) RETURNING id",
    )
    .bind(alert.item_id.0)
    .bind(&alert.message)
    .fetch_one(pool)
    .await?;

    Ok(AlertId(id))
}

/// Alerts in the order they were raised; resolved ones only when asked for.
pub async fn get_alerts(pool: &DbPool, include_resolved: bool) -> Result<Vec<StoredAlert>, StorageError> {
    let rows = sqlx::query_as::<_, AlertRow>(
        "SELECT id, item_id, message, created_at, resolved FROM alerts WHERE resolved = 0 OR ? ORDER BY id",
    )
    .bind(include_resolved)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_alert).collect())
}

pub async fn get_alerts_for_item(pool: &DbPool, item_id: ItemId) -> Result<Vec<StoredAlert>, StorageError> {
    let rows = sqlx::query_as::<_, AlertRow>(
        "SELECT id, item_id, message, created_at, resolved FROM alerts WHERE item_id = ? ORDER BY id",
    )
    .bind(item_id.0)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_alert).collect())
}

/// Returns `false` when no unresolved alert had that id.
pub async fn resolve_alert(pool: &DbPool, id: AlertId) -> Result<bool, StorageError> {
    let result = sqlx::query("UPDATE alerts SET resolved = 1 WHERE id = ? AND resolved = 0")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn row_to_alert(r: AlertRow) -> StoredAlert {
    let (id, item_id, message, created_at, resolved) = r;
    StoredAlert {
        id: AlertId(id),
        item_id: ItemId(item_id),
        message,
        created_at,
        resolved,
    }
}

fn row_to_item(r: ItemRow) -> Result<Item, StorageError> {
    let (id, name, expiry, purchase, image_path, created_at) = r;
    let expiry_date = parse_date(id, "expiry_date", &expiry)?;
    let purchase_date = purchase
        .as_deref()
        .map(|p| parse_date(id, "purchase_date", p))
        .transpose()?;

    Ok(Item {
        id: ItemId(id),
        name,
        expiry_date,
        purchase_date,
        image_path,
        created_at: Some(created_at),
    })
}

fn parse_date(id: i64, column: &'static str, value: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(value, DATE_FMT).map_err(|_| StorageError::Corrupt {
        id,
        column,
        value: value.to_string(),
    })
}
