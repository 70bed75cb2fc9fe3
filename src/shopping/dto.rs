use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::validation::nullable;

/// List write body. `date` stays textual so a bad value becomes a field error.
#[derive(Debug, Default, Deserialize)]
pub struct ShoppingListRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub family_id: Option<Option<Uuid>>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub week: Option<Option<String>>,
    pub shared_with_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemRequest {
    pub shopping_list_id: Option<Uuid>,
    pub item: Option<String>,
    pub quantity: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn quantity_accepts_numbers_and_strings() {
        let a: ItemRequest = serde_json::from_str(r#"{"quantity": 1.5}"#).unwrap();
        let b: ItemRequest = serde_json::from_str(r#"{"quantity": "2.25"}"#).unwrap();
        assert_eq!(a.quantity, Some(Decimal::from_str("1.5").unwrap()));
        assert_eq!(b.quantity, Some(Decimal::from_str("2.25").unwrap()));
    }

    #[test]
    fn null_family_clears_it() {
        let req: ShoppingListRequest = serde_json::from_str(r#"{"family_id": null}"#).unwrap();
        assert_eq!(req.family_id, Some(None));
        assert!(req.shared_with_ids.is_none());
    }
}
