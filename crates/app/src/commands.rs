use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use freshtrack_core::{AlertId, ItemId, ItemStatus, NewItem, StoredAlert};
use freshtrack_ocr::{ExpiryPipeline, OcrBackend};
use serde::Serialize;

use crate::AppState;

pub const DEFAULT_SCAN_NAME: &str = "Unknown Product";

#[derive(Debug, Serialize)]
pub struct ItemView {
    pub id: i64,
    pub name: String,
    pub expiry_date: String,
    pub days_left: i64,
    pub status: ItemStatus,
    pub image_path: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    Added { id: ItemId, expiry_date: NaiveDate },
    /// Nothing stored; the recognized text is returned so the user can enter the date by hand.
    NoDate { raw_text: String },
}

pub async fn add_item(
    state: &AppState,
    name: &str,
    expiry: NaiveDate,
    purchased: Option<NaiveDate>,
) -> anyhow::Result<ItemId> {
    let mut item = NewItem::new(name, expiry);
    item.purchase_date = purchased;
    let id = freshtrack_storage::insert_item(&state.db, &item).await?;
    tracing::info!("Added item #{id}: {name}");
    Ok(id)
}

pub async fn scan_item<R: OcrBackend>(
    state: &AppState,
    pipeline: &ExpiryPipeline<R>,
    image: &Path,
    name: &str,
) -> anyhow::Result<ScanOutcome> {
    let result = pipeline
        .extract_expiry_date(image)
        .await
        .with_context(|| format!("failed to scan {}", image.display()))?;

    let Some(expiry_date) = result.date else {
        tracing::warn!("Could not detect expiry date in {}", image.display());
        return Ok(ScanOutcome::NoDate { raw_text: result.raw_text });
    };

    let mut item = NewItem::new(name, expiry_date);
    item.image_path = Some(image.display().to_string());
    let id = freshtrack_storage::insert_item(&state.db, &item).await?;
    tracing::info!("Added item #{id} via OCR: {name}, expires {expiry_date}");

    Ok(ScanOutcome::Added { id, expiry_date })
}

/// Items with their status as of `today`, optionally only those in `only`.
pub async fn list_items(
    state: &AppState,
    today: NaiveDate,
    only: Option<ItemStatus>,
) -> anyhow::Result<Vec<ItemView>> {
    let soon_days = state.config.alerts.soon_days;
    let items = freshtrack_storage::get_all_items(&state.db).await?;

    Ok(items
        .into_iter()
        .map(|item| ItemView {
            id: item.id.0,
            days_left: item.days_left(today),
            status: item.status(today, soon_days),
            expiry_date: item.expiry_date.format("%Y-%m-%d").to_string(),
            name: item.name,
            image_path: item.image_path,
        })
        .filter(|view| only.map_or(true, |status| view.status == status))
        .collect())
}

/// Delete by id, returning the removed item's name.
pub async fn delete_item(state: &AppState, id: ItemId) -> anyhow::Result<String> {
    let item = freshtrack_storage::get_item_by_id(&state.db, id)
        .await?
        .with_context(|| format!("no item with id {id}"))?;
    if !freshtrack_storage::delete_item(&state.db, id).await? {
        anyhow::bail!("no item with id {id}");
    }
    tracing::info!("Deleted item #{id}: {}", item.name);
    Ok(item.name)
}

pub async fn list_alerts(state: &AppState, include_resolved: bool) -> anyhow::Result<Vec<StoredAlert>> {
    Ok(freshtrack_storage::get_alerts(&state.db, include_resolved).await?)
}

pub async fn resolve_alert(state: &AppState, id: AlertId) -> anyhow::Result<()> {
    if !freshtrack_storage::resolve_alert(&state.db, id).await? {
        anyhow::bail!("no open alert with id {id}");
    }
    tracing::info!("Resolved alert #{id}");
    Ok(())
}
