use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::{FromRow, Postgres};
use uuid::Uuid;

/// A typed bind parameter. Nulls keep their column type so Postgres never
/// has to coerce an untyped text parameter into uuid/date/numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Uuid(Option<Uuid>),
    UuidArray(Vec<Uuid>),
    Timestamp(Option<DateTime<Utc>>),
    Date(Option<NaiveDate>),
    Decimal(Option<Decimal>),
    Int(Option<i64>),
    Bool(Option<bool>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        match self {
            SqlValue::Text(v) => v.is_none(),
            SqlValue::Uuid(v) => v.is_none(),
            SqlValue::UuidArray(_) => false,
            SqlValue::Timestamp(v) => v.is_none(),
            SqlValue::Date(v) => v.is_none(),
            SqlValue::Decimal(v) => v.is_none(),
            SqlValue::Int(v) => v.is_none(),
            SqlValue::Bool(v) => v.is_none(),
        }
    }
}

macro_rules! sql_value_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for SqlValue {
            fn from(v: $ty) -> Self {
                SqlValue::$variant(Some(v))
            }
        }

        impl From<Option<$ty>> for SqlValue {
            fn from(v: Option<$ty>) -> Self {
                SqlValue::$variant(v)
            }
        }
    };
}

sql_value_from!(Text, String);
sql_value_from!(Uuid, Uuid);
sql_value_from!(Timestamp, DateTime<Utc>);
sql_value_from!(Date, NaiveDate);
sql_value_from!(Decimal, Decimal);
sql_value_from!(Int, i64);
sql_value_from!(Bool, bool);

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(Some(v.to_string()))
    }
}

impl From<Vec<Uuid>> for SqlValue {
    fn from(v: Vec<Uuid>) -> Self {
        SqlValue::UuidArray(v)
    }
}

pub fn bind_query<'q>(
    q: Query<'q, Postgres, PgArguments>,
    v: &SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match v.clone() {
        SqlValue::Text(v) => q.bind(v),
        SqlValue::Uuid(v) => q.bind(v),
        SqlValue::UuidArray(v) => q.bind(v),
        SqlValue::Timestamp(v) => q.bind(v),
        SqlValue::Date(v) => q.bind(v),
        SqlValue::Decimal(v) => q.bind(v),
        SqlValue::Int(v) => q.bind(v),
        SqlValue::Bool(v) => q.bind(v),
    }
}

pub fn bind_query_as<'q, O>(
    q: QueryAs<'q, Postgres, O, PgArguments>,
    v: &SqlValue,
) -> QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v.clone() {
        SqlValue::Text(v) => q.bind(v),
        SqlValue::Uuid(v) => q.bind(v),
        SqlValue::UuidArray(v) => q.bind(v),
        SqlValue::Timestamp(v) => q.bind(v),
        SqlValue::Date(v) => q.bind(v),
        SqlValue::Decimal(v) => q.bind(v),
        SqlValue::Int(v) => q.bind(v),
        SqlValue::Bool(v) => q.bind(v),
    }
}

pub fn bind_query_scalar<'q, O>(
    q: QueryScalar<'q, Postgres, O, PgArguments>,
    v: &SqlValue,
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    match v.clone() {
        SqlValue::Text(v) => q.bind(v),
        SqlValue::Uuid(v) => q.bind(v),
        SqlValue::UuidArray(v) => q.bind(v),
        SqlValue::Timestamp(v) => q.bind(v),
        SqlValue::Date(v) => q.bind(v),
        SqlValue::Decimal(v) => q.bind(v),
        SqlValue::Int(v) => q.bind(v),
        SqlValue::Bool(v) => q.bind(v),
    }
}
