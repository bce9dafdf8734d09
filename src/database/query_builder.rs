use sqlx::{self, postgres::PgRow, Executor, FromRow, Postgres};

use crate::database::manager::DatabaseError;
use crate::database::value::{bind_query, bind_query_as, bind_query_scalar};
use crate::filter::types::SqlResult;
use crate::filter::{Filter, FilterData};

/// Typed SELECT/COUNT/DELETE over one table, driven by [`FilterData`].
pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: &str) -> Result<Self, DatabaseError> {
        let filter = Filter::new(table_name).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        Ok(Self {
            filter,
            _phantom: std::marker::PhantomData,
        })
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        self.filter
            .assign(filter_data)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        Ok(self)
    }

    pub async fn select_all<'c, E>(self, executor: E) -> Result<Vec<T>, DatabaseError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let sql = self.select_sql()?;
        let mut q = sqlx::query_as::<_, T>(&sql.query);
        for p in sql.params.iter() {
            q = bind_query_as(q, p);
        }
        Ok(q.fetch_all(executor).await?)
    }

    pub async fn select_optional<'c, E>(self, executor: E) -> Result<Option<T>, DatabaseError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let sql = self.select_sql()?;
        let mut q = sqlx::query_as::<_, T>(&sql.query);
        for p in sql.params.iter() {
            q = bind_query_as(q, p);
        }
        Ok(q.fetch_optional(executor).await?)
    }

    pub async fn count<'c, E>(self, executor: E) -> Result<i64, DatabaseError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let sql = self
            .filter
            .to_count_sql()
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        let mut q = sqlx::query_scalar::<_, i64>(&sql.query);
        for p in sql.params.iter() {
            q = bind_query_scalar(q, p);
        }
        Ok(q.fetch_one(executor).await?)
    }

    /// Delete matching rows, returning how many were removed.
    pub async fn delete<'c, E>(self, executor: E) -> Result<u64, DatabaseError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let sql = self
            .filter
            .to_delete_sql()
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_query(q, p);
        }
        Ok(q.execute(executor).await?.rows_affected())
    }

    fn select_sql(&self) -> Result<SqlResult, DatabaseError> {
        self.filter
            .to_sql()
            .map_err(|e| DatabaseError::QueryError(e.to_string()))
    }
}

/// Run a prepared statement that returns full rows.
pub async fn fetch_rows<'c, T, E>(sql: SqlResult, executor: E) -> Result<Vec<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    E: Executor<'c, Database = Postgres>,
{
    let mut q = sqlx::query_as::<_, T>(&sql.query);
    for p in sql.params.iter() {
        q = bind_query_as(q, p);
    }
    Ok(q.fetch_all(executor).await?)
}
