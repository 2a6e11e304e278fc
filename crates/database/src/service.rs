use crate::Database;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{marker::PhantomData, sync::Arc};

use app_error::{AppError, AppErrorExt, AppResult};

lazy_static! {
    // SurrealDB identifier rules for table and field names
    static ref IDENTIFIER_REGEX: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
}

impl Database {
    pub async fn create<T>(&self, table: &str, data: T) -> AppResult<Option<T>>
    where
        T: Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static,
    {
        self.client()
            .create(table)
            .content(data)
            .await
            .context("Failed to create record")
            .storage_err()
    }

    pub async fn delete<T>(&self, location: (&str, &str)) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.client()
            .delete((location.0, location.1))
            .await
            .context("Failed to delete record")
            .storage_err()
    }

    pub async fn select<T>(&self, location: (&str, &str)) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.client()
            .select((location.0, location.1))
            .await
            .context("Failed to select record")
            .storage_err()
    }

    pub fn query(&self, sql: impl Into<String>) -> QueryBuilder<'_> {
        QueryBuilder {
            db: self,
            sql: sql.into(),
            bindings: Vec::new(),
        }
    }
}

pub struct QueryBuilder<'a> {
    db: &'a Database,
    sql: String,
    bindings: Vec<(String, serde_json::Value)>,
}

impl QueryBuilder<'_> {
    pub fn bind(mut self, binding: (impl Into<String>, impl Into<serde_json::Value>)) -> Self {
        self.bindings.push((binding.0.into(), binding.1.into()));
        self
    }

    pub async fn execute(self) -> AppResult<QueryResponse> {
        let mut query = self.db.client().query(self.sql);

        for (name, value) in self.bindings {
            query = query.bind((name, value));
        }

        let response = query
            .await
            .context("Failed to execute query")
            .storage_err()?;
        Ok(QueryResponse(response))
    }
}

pub struct QueryResponse(surrealdb::Response);

impl QueryResponse {
    pub fn take<T>(mut self, index: usize) -> AppResult<Vec<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.0
            .take(index)
            .context("Failed to extract query results")
            .storage_err()
    }

    /// Fails if any statement in the response returned an error.
    pub fn check(self) -> AppResult<()> {
        self.0
            .check()
            .map(|_| ())
            .context("Query statement failed")
            .storage_err()
    }
}

/// Typed access to a single table.
pub struct DbService<T> {
    db: Arc<Database>,
    table_name: String,
    _phantom: PhantomData<T>,
}

impl<T> DbService<T>
where
    T: Clone + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static,
{
    pub fn new(db: Arc<Database>, table_name: impl Into<String>) -> Self {
        Self {
            db,
            table_name: table_name.into(),
            _phantom: PhantomData,
        }
    }

    // Generic DB operation wrapper with consistent error handling
    async fn execute_db_operation<F, R>(&self, operation: &str, execute: F) -> AppResult<R>
    where
        F: Future<Output = AppResult<R>>,
    {
        execute.await.map_err(|e| {
            if let AppError::StorageError(err) = e {
                AppError::StorageError(err.context(format!(
                    "Failed to {} {} record",
                    operation, self.table_name
                )))
            } else {
                e
            }
        })
    }

    pub async fn create_record(&self, item: T) -> AppResult<Option<T>> {
        self.execute_db_operation("create", async {
            self.db.create(&self.table_name, item).await
        })
        .await
    }

    pub async fn delete_record(&self, record_id: &str) -> AppResult<Option<T>> {
        self.execute_db_operation("delete", async {
            self.db.delete((self.table_name.as_str(), record_id)).await
        })
        .await
    }

    pub async fn get_record_by_id(&self, record_id: &str) -> AppResult<Option<T>> {
        self.execute_db_operation("fetch", async {
            self.db.select((self.table_name.as_str(), record_id)).await
        })
        .await
    }

    fn validate_identifier(identifier: &str) -> AppResult<()> {
        if !IDENTIFIER_REGEX.is_match(identifier) {
            return Err(AppError::ValidationError(format!(
                "Invalid identifier '{}': must start with a letter or underscore and contain only alphanumeric characters and underscores",
                identifier
            )));
        }

        Ok(())
    }

    pub async fn get_records_by_field<V>(&self, field: &str, value: V) -> AppResult<Vec<T>>
    where
        V: Serialize,
    {
        Self::validate_identifier(field)?;
        Self::validate_identifier(&self.table_name)?;

        let sql = format!("SELECT * FROM {} WHERE {} = $value", self.table_name, field);

        let value_json = serde_json::to_value(value).map_err(|e| {
            AppError::ValidationError(format!(
                "Failed to serialize value for field '{}': {}",
                field, e
            ))
        })?;

        self.execute_db_operation("query", async {
            self.db
                .query(&sql)
                .bind(("value", value_json))
                .execute()
                .await?
                .take(0)
        })
        .await
    }

    pub async fn list_records(&self, order_by: &str) -> AppResult<Vec<T>> {
        Self::validate_identifier(order_by)?;
        Self::validate_identifier(&self.table_name)?;

        let sql = format!("SELECT * FROM {} ORDER BY {} ASC", self.table_name, order_by);

        self.execute_db_operation("list", async {
            self.db.query(&sql).execute().await?.take(0)
        })
        .await
    }

    /// Declare a UNIQUE index so the datastore itself rejects duplicates.
    pub async fn define_unique_index(&self, field: &str) -> AppResult<()> {
        Self::validate_identifier(field)?;
        Self::validate_identifier(&self.table_name)?;

        let sql = format!(
            "DEFINE INDEX IF NOT EXISTS {table}_{field}_unique ON TABLE {table} FIELDS {field} UNIQUE",
            table = self.table_name,
            field = field
        );

        self.execute_db_operation("define index on", async {
            self.db.query(&sql).execute().await?.check()
        })
        .await
    }
}
