use serde::{Deserialize, Serialize};

use super::expiry::StatusColor;
use super::repo_types::Food;

/// Food write body. Dates and the compartment stay textual so bad values
/// surface as field errors rather than a body rejection.
#[derive(Debug, Default, Deserialize)]
pub struct FoodRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub compartment: Option<String>,
    pub location: Option<String>,
    pub quantity: Option<i64>,
    pub expiry_date: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FoodView {
    #[serde(flatten)]
    pub food: Food,
    pub expiry_status: String,
    pub status_color: StatusColor,
}

#[derive(Debug, Serialize)]
pub struct FoodListResponse {
    pub foods: Vec<FoodView>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> SuccessResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data: Some(data),
        }
    }
}
