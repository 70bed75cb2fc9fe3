use serde::Deserialize;
use time::Date;

use super::repo_types::{Compartment, Food};
use crate::{
    dates::parse_iso_date,
    error::{AppError, AppResult, FieldErrors},
    validation::icontains,
};

/// Raw query string of the compartment listing. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct FoodQuery {
    pub search: Option<String>,
    pub quantity: Option<String>,
    pub registered_date: Option<String>,
    pub expiry_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodFilter {
    pub compartment: Compartment,
    pub search: Option<String>,
    pub quantity: Option<i32>,
    pub registered_date: Option<Date>,
    pub expiry_date: Option<Date>,
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl FoodFilter {
    pub fn parse(compartment: &str, query: FoodQuery) -> AppResult<Self> {
        let compartment = Compartment::parse(compartment).ok_or_else(|| {
            AppError::field(
                "compartment",
                format!("\"{compartment}\" is not a valid choice."),
            )
        })?;

        let mut errors = FieldErrors::default();
        let quantity = non_empty(query.quantity).and_then(|q| match q.parse::<i32>() {
            Ok(n) => Some(n),
            Err(_) => {
                errors.add("quantity", "Invalid quantity format.");
                None
            }
        });
        let mut date = |field: &str, raw: Option<String>| {
            non_empty(raw).and_then(|d| {
                let parsed = parse_iso_date(&d);
                if parsed.is_none() {
                    errors.add(field, "Date has wrong format. Use YYYY-MM-DD.");
                }
                parsed
            })
        };
        let registered_date = date("registered_date", query.registered_date);
        let expiry_date = date("expiry_date", query.expiry_date);
        errors.into_result()?;

        Ok(Self {
            compartment,
            search: query.search.filter(|s| !s.is_empty()),
            quantity,
            registered_date,
            expiry_date,
        })
    }

    /// In-process equivalent of the SQL built by the Postgres repository.
    pub fn matches(&self, food: &Food) -> bool {
        if food.compartment != self.compartment {
            return false;
        }
        if self.quantity.is_some_and(|q| q != food.quantity) {
            return false;
        }
        if self.registered_date.is_some_and(|d| d != food.registered_date) {
            return false;
        }
        if self.expiry_date.is_some_and(|d| d != food.expiry_date) {
            return false;
        }
        match &self.search {
            Some(term) => search_hits(food, term),
            None => true,
        }
    }
}

fn date_parts(d: Date) -> [String; 3] {
    [
        d.day().to_string(),
        u8::from(d.month()).to_string(),
        d.year().to_string(),
    ]
}

fn search_hits(food: &Food, term: &str) -> bool {
    let text = [&food.name, &food.category, &food.location, &food.note]
        .into_iter()
        .any(|field| icontains(field, term));
    text || food.quantity.to_string().contains(term)
        || date_parts(food.registered_date)
            .iter()
            .chain(date_parts(food.expiry_date).iter())
            .any(|part| part.contains(term))
}
