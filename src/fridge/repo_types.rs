use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::Date;
use uuid::Uuid;

use crate::dates::iso_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "compartment", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Compartment {
    Cooler,
    Freezer,
}

impl Compartment {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cooler" => Some(Self::Cooler),
            "freezer" => Some(Self::Freezer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// Food row joined with its category name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Food {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub category_id: Uuid,
    pub category: String,
    pub compartment: Compartment,
    pub location: String,
    pub quantity: i32,
    #[serde(with = "iso_date")]
    pub registered_date: Date,
    #[serde(with = "iso_date")]
    pub expiry_date: Date,
    pub note: String,
}

#[derive(Debug, Clone)]
pub struct NewFood {
    pub name: String,
    pub category_id: Uuid,
    pub compartment: Compartment,
    pub location: String,
    pub quantity: i32,
    pub registered_date: Date,
    pub expiry_date: Date,
    pub note: String,
}

#[derive(Debug, Clone, Default)]
pub struct FoodChanges {
    pub name: Option<String>,
    pub category_id: Option<Uuid>,
    pub compartment: Option<Compartment>,
    pub location: Option<String>,
    pub quantity: Option<i32>,
    pub expiry_date: Option<Date>,
    pub note: Option<String>,
}
