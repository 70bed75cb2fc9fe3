use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::dates::iso_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Bought,
}

impl ItemStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "pending" => Some(Self::Pending),
            "bought" => Some(Self::Bought),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Bought => "bought",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ShoppingList {
    pub id: Uuid,
    pub family_id: Option<Uuid>,
    pub created_by: Uuid,
    pub name: String,
    #[serde(with = "iso_date::option")]
    pub date: Option<Date>,
    pub week: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub shared_with: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewShoppingList {
    pub family_id: Option<Uuid>,
    pub created_by: Uuid,
    pub name: String,
    pub date: Option<Date>,
    pub week: Option<String>,
    pub shared_with: Vec<Uuid>,
}

/// Outer `None` leaves a column alone; `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default)]
pub struct ShoppingListChanges {
    pub family_id: Option<Option<Uuid>>,
    pub name: Option<String>,
    pub date: Option<Option<Date>>,
    pub week: Option<Option<String>>,
    /// Replaces the whole share set when present.
    pub shared_with: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ShoppingListItem {
    pub id: Uuid,
    pub shopping_list_id: Uuid,
    pub item: String,
    pub quantity: Decimal,
    pub category: Option<String>,
    pub status: ItemStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub shopping_list_id: Uuid,
    pub item: String,
    pub quantity: Decimal,
    pub category: Option<String>,
    pub status: ItemStatus,
}

#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub shopping_list_id: Option<Uuid>,
    pub item: Option<String>,
    pub quantity: Option<Decimal>,
    pub category: Option<Option<String>>,
    pub status: Option<ItemStatus>,
}
