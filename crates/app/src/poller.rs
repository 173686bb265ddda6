use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use freshtrack_core::{check_expiries, AlertConfig, ExpiryAlert};
use freshtrack_storage::DbPool;

/// Load every item, record an alert for each one inside the alert window
/// and return them.
pub async fn poll_once(
    db: &DbPool,
    today: NaiveDate,
    alert_days: i64,
) -> anyhow::Result<Vec<ExpiryAlert>> {
    let items = freshtrack_storage::get_all_items(db).await?;
    let alerts = check_expiries(&items, today, alert_days);
    for alert in &alerts {
        let id = freshtrack_storage::insert_alert(db, alert).await?;
        tracing::warn!(alert_id = %id, item_id = %alert.item_id, days_left = alert.days_left, "{}", alert.message);
    }
    Ok(alerts)
}

/// Run `poll_once` every `poll_interval_secs` until `shutdown` resolves.
/// The first check happens immediately. Returns the number of checks run.
pub async fn run(
    db: &DbPool,
    config: &AlertConfig,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<usize> {
    let mut interval = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));
    // A slow check should not cause a burst of catch-up ticks.
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    tracing::info!("Checking expiries every {}s", config.poll_interval_secs);
    let mut checks = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = interval.tick() => {
                let today = chrono::Local::now().date_naive();
                // A failed check is logged and retried on the next tick.
                if let Err(e) = poll_once(db, today, config.alert_days).await {
                    tracing::error!("Expiry check failed: {e:#}");
                }
                checks += 1;
            }
        }
    }
    tracing::info!("Expiry polling stopped after {checks} check(s)");
    Ok(checks)
}
