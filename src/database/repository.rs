use sqlx::{self, postgres::PgRow, FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::database::changes::ChangeSet;
use crate::database::manager::DatabaseError;
use crate::database::query_builder::{fetch_rows, QueryBuilder};
use crate::filter::FilterData;

/// Row-typed access to a single table.
pub struct Repository<T> {
    table_name: &'static str,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: &'static str, pool: PgPool) -> Self {
        Self {
            table_name,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(self.table_name)?
            .filter(filter_data)?
            .select_all(&self.pool)
            .await
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        QueryBuilder::<T>::new(self.table_name)?
            .filter(filter_data)?
            .select_optional(&self.pool)
            .await
    }

    pub async fn select_id(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        self.select_one(FilterData::new().eq("id", id)).await
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        QueryBuilder::<T>::new(self.table_name)?
            .filter(filter_data)?
            .count(&self.pool)
            .await
    }

    pub async fn insert(&self, changes: ChangeSet) -> Result<T, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        self.insert_in(&mut conn, changes).await
    }

    pub async fn insert_in(&self, conn: &mut PgConnection, changes: ChangeSet) -> Result<T, DatabaseError> {
        let rows = fetch_rows::<T, _>(changes.insert_sql(self.table_name), conn).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DatabaseError::QueryError(format!("INSERT into {} returned no row", self.table_name)))
    }

    /// Returns `None` when the conflict resolved to DO NOTHING.
    pub async fn upsert_in(
        &self,
        conn: &mut PgConnection,
        changes: ChangeSet,
        conflict: &[&str],
    ) -> Result<Option<T>, DatabaseError> {
        let rows = fetch_rows::<T, _>(changes.upsert_sql(self.table_name, conflict), conn).await?;
        Ok(rows.into_iter().next())
    }

    /// Returns `None` when no row has the given id.
    pub async fn update_id(&self, id: Uuid, changes: ChangeSet) -> Result<Option<T>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        self.update_id_in(&mut conn, id, changes).await
    }

    pub async fn update_id_in(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        changes: ChangeSet,
    ) -> Result<Option<T>, DatabaseError> {
        if changes.is_empty() {
            return QueryBuilder::<T>::new(self.table_name)?
                .filter(FilterData::new().eq("id", id))?
                .select_optional(conn)
                .await;
        }
        let rows = fetch_rows::<T, _>(changes.update_sql(self.table_name, id), conn).await?;
        Ok(rows.into_iter().next())
    }

    /// Returns whether a row was removed.
    pub async fn delete_id(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let removed = self.delete_where(FilterData::new().eq("id", id)).await?;
        Ok(removed > 0)
    }

    pub async fn delete_where(&self, filter_data: FilterData) -> Result<u64, DatabaseError> {
        QueryBuilder::<T>::new(self.table_name)?
            .filter(filter_data)?
            .delete(&self.pool)
            .await
    }
}
