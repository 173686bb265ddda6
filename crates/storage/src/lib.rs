pub mod db;

pub use db::{
    create_db, delete_item, get_alerts, get_alerts_for_item, get_all_items, get_item_by_id,
    insert_alert, insert_item, resolve_alert, DbPool, StorageError,
};
