use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::middleware::parse_id;

/// `?limit=&offset=` accepted by every list endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    /// Resolve to `(limit, offset)`, capping the limit by configuration.
    pub fn window(&self, api: &ApiConfig) -> Result<(i64, i64), ApiError> {
        let limit = clamp_limit(self.limit, api)?;
        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(ApiError::bad_request("offset must not be negative"));
        }
        Ok((limit, offset))
    }
}

fn clamp_limit(limit: Option<i64>, api: &ApiConfig) -> Result<i64, ApiError> {
    match limit {
        None => Ok(api.default_page_size as i64),
        Some(l) if l < 1 => Err(ApiError::bad_request("limit must be at least 1")),
        Some(l) => Ok(l.min(api.max_page_size as i64)),
    }
}

/// Page-number pagination used by the transaction list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// Resolve `?page=&limit=` to `(page, limit, offset)`.
pub fn page_window(page: Option<i64>, limit: Option<i64>, api: &ApiConfig) -> Result<(i64, i64, i64), ApiError> {
    let page = page.unwrap_or(1);
    if page < 1 {
        return Err(ApiError::bad_request("page must be at least 1"));
    }
    let limit = clamp_limit(limit, api)?;
    let offset = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| ApiError::bad_request("page is out of range"))?;
    Ok((page, limit, offset))
}

/// `?id=` used by the action-style endpoints
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

impl IdQuery {
    pub fn require(&self) -> Result<Uuid, ApiError> {
        match self.id.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_id(raw),
            _ => Err(ApiError::bad_request("id query parameter is required")),
        }
    }
}
