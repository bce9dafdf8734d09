use axum::{extract::State, Extension};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::database::models::transaction::{CategoryTotal, FinancialTransaction, TransactionSummary, TransactionType};
use crate::database::query_builder::fetch_rows;
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData, SqlResult};
use crate::middleware::{ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::resource::Resource;
use crate::state::AppState;
use crate::validation::Validator;

use super::utils::{page_window, Pagination};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct TransactionPage {
    pub data: Vec<FinancialTransaction>,
    pub pagination: Pagination,
}

fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<FilterData, ApiError> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(ApiError::bad_request("startDate must not be after endDate"));
        }
    }
    Ok(FilterData::new().gte_some("date", start).lte_some("date", end))
}

impl TransactionQuery {
    fn conditions(&self) -> Result<FilterData, ApiError> {
        let mut v = Validator::new();
        let kind = self
            .kind
            .as_deref()
            .and_then(|k| v.parse_enum::<TransactionType>("type", k));
        v.finish()?;

        let category = self.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
        Ok(date_range(self.start_date, self.end_date)?
            .eq_some("type", kind)
            .eq_some("category", category))
    }
}

/// GET /transactions?page&limit&type&category&startDate&endDate
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<TransactionQuery>,
) -> ApiResult<TransactionPage> {
    auth.require(FinancialTransaction::READ)?;
    let (page, limit, offset) = page_window(query.page, query.limit, &state.config.api)?;
    let conditions = query.conditions()?;

    let repo = Repository::<FinancialTransaction>::new(FinancialTransaction::TABLE, state.pool.clone());
    let total = repo.count(conditions.unpaged()).await?;
    let data = repo
        .select_any(conditions.order(FinancialTransaction::ORDER).page(limit, offset))
        .await?;

    Ok(ApiResponse::success(TransactionPage {
        data,
        pagination: Pagination::new(page, limit, total),
    }))
}

/// GET /transactions/summary?startDate&endDate
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> ApiResult<TransactionSummary> {
    auth.require(FinancialTransaction::READ)?;
    let conditions = date_range(query.start_date, query.end_date)?;

    let sql = summary_sql(conditions)?;
    let by_category = fetch_rows::<CategoryTotal, _>(sql, &state.pool).await?;
    Ok(ApiResponse::success(TransactionSummary::from_categories(by_category)))
}

fn summary_sql(conditions: FilterData) -> Result<SqlResult, ApiError> {
    let mut filter = Filter::new(FinancialTransaction::TABLE)?;
    filter.assign(conditions)?;
    let where_sql = filter.to_where_sql()?;

    let where_clause = if where_sql.query.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_sql.query)
    };
    Ok(SqlResult {
        query: format!(
            "SELECT category, type, SUM(amount) AS total FROM \"{}\"{} GROUP BY category, type ORDER BY type, category",
            FinancialTransaction::TABLE,
            where_clause
        ),
        params: where_sql.params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_range_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1);
        let end = NaiveDate::from_ymd_opt(2024, 4, 1);
        let err = date_range(start, end).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert!(date_range(end, start).is_ok());
        assert!(date_range(start, start).is_ok());
    }

    #[test]
    fn unknown_type_filter_is_rejected() {
        let query = TransactionQuery {
            kind: Some("GIFT".to_string()),
            ..Default::default()
        };
        assert!(query.conditions().is_err());
    }

    #[test]
    fn summary_groups_by_category_and_type() {
        let sql = summary_sql(date_range(NaiveDate::from_ymd_opt(2024, 1, 1), None).unwrap()).unwrap();
        assert_eq!(
            sql.query,
            "SELECT category, type, SUM(amount) AS total FROM \"financial_transactions\" WHERE \"date\" >= $1 GROUP BY category, type ORDER BY type, category"
        );
        assert_eq!(sql.params.len(), 1);
    }

    #[test]
    fn summary_without_range_has_no_where() {
        let sql = summary_sql(FilterData::new()).unwrap();
        assert!(!sql.query.contains("WHERE"));
    }
}
