use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Expired,
    Soon,
    Safe,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Expired => write!(f, "expired"),
            ItemStatus::Soon => write!(f, "soon"),
            ItemStatus::Safe => write!(f, "safe"),
        }
    }
}

impl FromStr for ItemStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expired" => Ok(ItemStatus::Expired),
            "soon" => Ok(ItemStatus::Soon),
            "safe" => Ok(ItemStatus::Safe),
            other => Err(format!("Unknown item status: '{other}'")),
        }
    }
}

/// An item as entered by the user or detected from a label, not yet stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub expiry_date: NaiveDate,
    pub purchase_date: Option<NaiveDate>,
    /// Label photo the expiry date was read from, if any.
    pub image_path: Option<String>,
}

impl NewItem {
    pub fn new(name: &str, expiry_date: NaiveDate) -> Self {
        NewItem {
            name: name.to_string(),
            expiry_date,
            purchase_date: None,
            image_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub expiry_date: NaiveDate,
    pub purchase_date: Option<NaiveDate>,
    pub image_path: Option<String>,
    pub created_at: Option<String>,
}

impl Item {
    /// Whole days until expiry; negative once the item has expired.
    pub fn days_left(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days()
    }

    pub fn status(&self, today: NaiveDate, soon_days: i64) -> ItemStatus {
        let days_left = self.days_left(today);
        if days_left < 0 {
            ItemStatus::Expired
        } else if days_left <= soon_days {
            ItemStatus::Soon
        } else {
            ItemStatus::Safe
        }
    }
}
