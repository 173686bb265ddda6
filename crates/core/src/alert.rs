use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::item::{Item, ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub i64);

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An alert as recorded by the expiry check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAlert {
    pub id: AlertId,
    pub item_id: ItemId,
    pub message: String,
    pub created_at: String,
    pub resolved: bool,
}

/// A notice that an item is within the alert window (or already past it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryAlert {
    pub item_id: ItemId,
    pub item_name: String,
    pub expiry_date: NaiveDate,
    pub days_left: i64,
    pub message: String,
}

impl ExpiryAlert {
    pub fn for_item(item: &Item, days_left: i64) -> Self {
        ExpiryAlert {
            item_id: item.id,
            item_name: item.name.clone(),
            expiry_date: item.expiry_date,
            days_left,
            message: format!(
                "{} expires in {} day(s) on {}",
                item.name,
                days_left,
                item.expiry_date.format("%Y-%m-%d")
            ),
        }
    }
}

/// One alert per item whose remaining days are at or below `alert_days`.
/// Expired items keep alerting with a negative day count.
pub fn check_expiries(items: &[Item], today: NaiveDate, alert_days: i64) -> Vec<ExpiryAlert> {
    items
        .iter()
        .filter_map(|item| {
            let days_left = item.days_left(today);
            (days_left <= alert_days).then(|| ExpiryAlert::for_item(item, days_left))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(id: i64, name: &str, expiry: NaiveDate) -> Item {
        Item {
            id: ItemId(id),
            name: name.to_string(),
            expiry_date: expiry,
            purchase_date: None,
            image_path: None,
            created_at: None,
        }
    }

    #[test]
    fn alert_id_display() {
        assert_eq!(AlertId(3).to_string(), "3");
    }

    #[test]
    fn alert_message_format() {
        let a = ExpiryAlert::for_item(&item(7, "Yogurt", date(2025, 9, 12)), 2);
        assert_eq!(a.message, "Yogurt expires in 2 day(s) on 2025-09-12");
        assert_eq!(a.item_id, ItemId(7));
    }

    #[test]
    fn check_expiries_selects_items_inside_window() {
        let today = date(2025, 9, 10);
        let items = vec![
            item(1, "Milk", date(2025, 9, 11)),
            item(2, "Rice", date(2026, 1, 1)),
            item(3, "Bread", date(2025, 9, 13)),
            item(4, "Ham", date(2025, 9, 14)),
        ];
        let alerts = check_expiries(&items, today, 3);
        let ids: Vec<i64> = alerts.iter().map(|a| a.item_id.0).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn check_expiries_includes_expired_items() {
        let today = date(2025, 9, 10);
        let alerts = check_expiries(&[item(1, "Cheese", date(2025, 9, 5))], today, 3);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].days_left, -5);
    }

    #[test]
    fn check_expiries_empty() {
        assert!(check_expiries(&[], date(2025, 9, 10), 3).is_empty());
    }
}
