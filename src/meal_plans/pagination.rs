use serde::{Deserialize, Serialize};

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
};

/// `?page=&page_size=`; kept textual so junk values fall back like unset ones.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageRequest {
    /// A non-numeric or zero page is an invalid page; a bad size uses the default.
    pub fn resolve(params: &PageParams, cfg: &PaginationConfig) -> AppResult<Self> {
        let page = match params.page.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            None => 1,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(invalid_page)?,
        };
        let size = params
            .page_size
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|s| *s > 0)
            .map(|s| s.min(cfg.max_page_size))
            .unwrap_or(cfg.default_page_size);
        Ok(Self { page, size })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.size
    }

    /// Rejects pages past the last one; an empty first page is allowed.
    pub fn check_in_range(&self, count: i64) -> AppResult<()> {
        let last = ((count + self.size - 1) / self.size).max(1);
        if self.page > last {
            return Err(invalid_page());
        }
        Ok(())
    }
}

fn invalid_page() -> AppError {
    AppError::not_found("Invalid page.")
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(req: PageRequest, count: i64, results: Vec<T>) -> Self {
        let has_next = req.page * req.size < count;
        Self {
            count,
            next: has_next.then_some(req.page + 1),
            previous: (req.page > 1).then_some(req.page - 1),
            results,
        }
    }
}
