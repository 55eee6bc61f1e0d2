//! `PostgreSQL` document store.
//!
//! All collections share one table:
//!
//! ```sql
//! documents (collection TEXT, id TEXT, data JSONB, created_at, updated_at,
//!            PRIMARY KEY (collection, id))
//! ```
//!
//! Predicates compile to JSONB comparisons so that the database agrees with
//! [`Query::matches`]: equality is JSONB equality (numbers compare
//! numerically), and range predicates only match values of the literal's
//! JSON type.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use okinawa_rentals_core::{Collection, Predicate, Query};

use super::{Document, DocumentStore, RepositoryError};

/// Document store over a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Append `WHERE collection = $n AND <predicates>`.
fn push_where(qb: &mut QueryBuilder<'_, Postgres>, query: &Query) {
    qb.push(" WHERE collection = ");
    qb.push_bind(query.collection.as_str());
    for predicate in &query.predicates {
        qb.push(" AND ");
        push_predicate(qb, predicate);
    }
}

fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Eq { field, value } => push_field_eq(qb, field, &value.to_json()),
        Predicate::Gte { field, value } => push_range(qb, field, ">=", value.to_json()),
        Predicate::Lte { field, value } => push_range(qb, field, "<=", value.to_json()),
        Predicate::AnyOf { fields, value } => {
            if fields.is_empty() {
                qb.push("FALSE");
                return;
            }
            let literal = value.to_json();
            qb.push("(");
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                push_field_eq(qb, field, &literal);
            }
            qb.push(")");
        }
    }
}

fn push_field_eq(qb: &mut QueryBuilder<'_, Postgres>, field: &str, literal: &Value) {
    qb.push("(data -> ");
    qb.push_bind(field.to_string());
    qb.push(") = ");
    qb.push_bind(Json(literal.clone()));
}

fn push_range(qb: &mut QueryBuilder<'_, Postgres>, field: &str, op: &str, literal: Value) {
    qb.push("(jsonb_typeof(data -> ");
    qb.push_bind(field.to_string());
    qb.push(") = jsonb_typeof(");
    qb.push_bind(Json(literal.clone()));
    qb.push(") AND (data -> ");
    qb.push_bind(field.to_string());
    qb.push(") ");
    qb.push(op);
    qb.push(" ");
    qb.push_bind(Json(literal));
    qb.push(")");
}

fn map_insert_error(err: sqlx::Error, collection: Collection, id: &str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(format!("{collection}/{id} exists"))
        }
        _ => RepositoryError::Database(err),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    #[instrument(skip(self), fields(collection = %query.collection))]
    async fn query(&self, query: &Query) -> Result<Vec<Document>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id, data FROM documents");
        push_where(&mut qb, query);
        if let Some(order) = &query.order_by {
            // JSON null sorts with missing fields, as in `Query::compare`
            qb.push(" ORDER BY NULLIF(data -> ");
            qb.push_bind(order.field.clone());
            qb.push(", 'null'::jsonb) ");
            qb.push(order.direction.as_sql());
            qb.push(" NULLS LAST, id ASC");
        } else {
            qb.push(" ORDER BY id ASC");
        }
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows: Vec<(String, Json<Value>)> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(id, Json(data))| Document { id, data })
            .collect())
    }

    #[instrument(skip(self), fields(collection = %query.collection))]
    async fn count(&self, query: &Query) -> Result<u64, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents");
        push_where(&mut qb, query);
        let (count,): (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    #[instrument(skip(self))]
    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, RepositoryError> {
        let row: Option<(Json<Value>,)> =
            sqlx::query_as("SELECT data FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(Json(data),)| Document {
            id: id.to_string(),
            data,
        }))
    }

    #[instrument(skip(self, data))]
    async fn insert(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection.as_str())
            .bind(id)
            .bind(Json(data))
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, collection, id))?;
        Ok(())
    }

    #[instrument(skip(self, data))]
    async fn set(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = now()
            ",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(data))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self, fields))]
    async fn merge(
        &self,
        collection: Collection,
        id: &str,
        fields: Value,
    ) -> Result<(), RepositoryError> {
        if !fields.is_object() {
            return Err(RepositoryError::DataCorruption(
                "merge fields must be a JSON object".to_string(),
            ));
        }
        let result = sqlx::query(
            r"
            UPDATE documents
            SET data = data || $3, updated_at = now()
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(fields))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
