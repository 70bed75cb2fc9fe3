//! In-process `search` and `ordering` for the shopping listings.

use std::cmp::Ordering;

use time::{Date, OffsetDateTime};

use super::dto::SearchQuery;
use super::repo_types::{ShoppingList, ShoppingListItem};
use crate::validation::{icontains, search_terms};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Text(String),
    Date(Date),
    Time(OffsetDateTime),
}

pub trait Listable {
    /// Fields accepted by `ordering`; anything else is ignored.
    const ORDERING_FIELDS: &'static [&'static str];

    fn search_text(&self) -> Vec<String>;
    fn sort_value(&self, field: &str) -> Option<SortValue>;
}

impl Listable for ShoppingList {
    const ORDERING_FIELDS: &'static [&'static str] = &["date", "week", "created_at"];

    fn search_text(&self) -> Vec<String> {
        let mut out = vec![self.name.clone()];
        out.extend(self.week.clone());
        out.extend(self.date.map(|d| d.to_string()));
        out
    }

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "date" => self.date.map(SortValue::Date),
            "week" => self.week.clone().map(SortValue::Text),
            "created_at" => Some(SortValue::Time(self.created_at)),
            _ => None,
        }
    }
}

impl Listable for ShoppingListItem {
    const ORDERING_FIELDS: &'static [&'static str] = &["category", "status", "created_at"];

    fn search_text(&self) -> Vec<String> {
        let mut out = vec![self.item.clone(), self.status.as_str().to_string()];
        out.extend(self.category.clone());
        out
    }

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "category" => self.category.clone().map(SortValue::Text),
            "status" => Some(SortValue::Text(self.status.as_str().to_string())),
            "created_at" => Some(SortValue::Time(self.created_at)),
            _ => None,
        }
    }
}

/// `(field, descending)` pairs from a comma-separated `ordering` value.
fn ordering_keys<T: Listable>(raw: Option<&str>) -> Vec<(String, bool)> {
    let keys: Vec<(String, bool)> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter_map(|part| {
            let (field, desc) = match part.strip_prefix('-') {
                Some(f) => (f, true),
                None => (part, false),
            };
            T::ORDERING_FIELDS
                .contains(&field)
                .then(|| (field.to_string(), desc))
        })
        .collect();
    if keys.is_empty() {
        vec![("created_at".to_string(), false)]
    } else {
        keys
    }
}

/// Ascending order with missing values last; descending reverses it.
fn compare<T: Listable>(a: &T, b: &T, keys: &[(String, bool)]) -> Ordering {
    for (field, desc) in keys {
        let ord = match (a.sort_value(field), b.sort_value(field)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        let ord = if *desc { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Keeps rows where every search term hits some field, then sorts them.
pub fn apply<T: Listable>(rows: Vec<T>, query: &SearchQuery) -> Vec<T> {
    let terms = query.search.as_deref().map(search_terms).unwrap_or_default();
    let mut rows: Vec<T> = rows
        .into_iter()
        .filter(|row| {
            let text = row.search_text();
            terms
                .iter()
                .all(|term| text.iter().any(|field| icontains(field, term)))
        })
        .collect();
    let keys = ordering_keys::<T>(query.ordering.as_deref());
    rows.sort_by(|a, b| compare(a, b, &keys));
    rows
}
