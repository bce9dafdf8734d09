use crate::database::value::SqlValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    ILike,
    In,
    IsNull,
    NotNull,
}

/// Query description handed to the repository layer.
#[derive(Debug, Clone, Default)]
pub struct FilterData {
    pub conditions: Vec<FilterWhereInfo>,
    pub order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl FilterData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, column: &str, operator: FilterOp, data: impl Into<SqlValue>) -> Self {
        self.conditions.push(FilterWhereInfo {
            column: column.to_string(),
            operator,
            data: data.into(),
        });
        self
    }

    pub fn eq(self, column: &str, data: impl Into<SqlValue>) -> Self {
        self.condition(column, FilterOp::Eq, data)
    }

    pub fn gte(self, column: &str, data: impl Into<SqlValue>) -> Self {
        self.condition(column, FilterOp::Gte, data)
    }

    pub fn lte(self, column: &str, data: impl Into<SqlValue>) -> Self {
        self.condition(column, FilterOp::Lte, data)
    }

    pub fn is_null(self, column: &str) -> Self {
        self.condition(column, FilterOp::IsNull, SqlValue::Text(None))
    }

    /// Adds the condition only when a value is present.
    pub fn eq_some<T: Into<SqlValue>>(self, column: &str, data: Option<T>) -> Self {
        match data {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    pub fn gte_some<T: Into<SqlValue>>(self, column: &str, data: Option<T>) -> Self {
        match data {
            Some(v) => self.gte(column, v),
            None => self,
        }
    }

    pub fn lte_some<T: Into<SqlValue>>(self, column: &str, data: Option<T>) -> Self {
        match data {
            Some(v) => self.lte(column, v),
            None => self,
        }
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// The same conditions without ordering or paging, for counts and aggregates.
    pub fn unpaged(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: SqlValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlValue>,
}
