// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore backend for the Store Gateway.
//!
//! Tables map to collections and rows to documents keyed by their `id`
//! field (which is also stored in the document so it can be queried).
//! Filters naming ids read those documents by key; otherwise equality
//! clauses are pushed down to Firestore. Every clause is re-checked in
//! process on the returned rows. Updates re-read and re-check each row
//! inside a transaction, so guarded updates are conditional writes.

use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::select_filter_builder::FirestoreQueryFilterBuilder;
use firestore::{FirestoreDb, FirestoreQueryFilter};
use futures_util::{stream, StreamExt};
use serde_json::Value;

use super::query::{Clause, ID_FIELD};
use super::{new_row_id, row_id, Filter, Patch, Row, StoreGateway};
use crate::error::AppError;
use crate::models::display_string;

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore store client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a disconnected client. Every call returns a database error.
    pub fn new_offline() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Fetch documents by key, concurrently. Missing keys are skipped.
    async fn fetch_by_ids(&self, table: &str, ids: &[String]) -> Result<Vec<Row>, AppError> {
        let client = self.get_client()?;

        let fetched = stream::iter(ids.to_vec())
            .map(|id| async move {
                client
                    .fluent()
                    .select()
                    .by_id_in(table)
                    .obj::<Row>()
                    .one(id)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<Row>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<Row>>, AppError>>()?;

        Ok(fetched.into_iter().flatten().collect())
    }

    async fn query(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, AppError> {
        if let Some(ids) = keyed_ids(filter) {
            let rows = self.fetch_by_ids(table, &ids).await?;
            return Ok(rows.into_iter().filter(|r| filter.matches(r)).collect());
        }

        let pushed: Vec<(String, Value)> = filter
            .clauses()
            .iter()
            .filter_map(|clause| match clause {
                Clause::Eq(field, value) if is_pushable(value) => {
                    Some((field.clone(), value.clone()))
                }
                _ => None,
            })
            .collect();

        let mut query = self.get_client()?.fluent().select().from(table);
        if !pushed.is_empty() {
            query = query.filter(move |q| {
                let clauses: Vec<Option<FirestoreQueryFilter>> = pushed
                    .iter()
                    .map(|(field, value)| eq_clause(&q, field, value))
                    .collect();
                q.for_all(clauses)
            });
        }

        let rows: Vec<Row> = query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().filter(|r| filter.matches(r)).collect())
    }
}

/// Document keys named by the filter's `id` clause, if it has one.
fn keyed_ids(filter: &Filter) -> Option<Vec<String>> {
    filter.clauses().iter().find_map(|clause| match clause {
        Clause::Eq(field, value) if field == ID_FIELD => Some(vec![display_string(value)]),
        Clause::In(field, values) if field == ID_FIELD => {
            Some(values.iter().map(display_string).collect())
        }
        _ => None,
    })
}

/// Re-read each document inside one transaction, re-check the filter and
/// write the patched row.
///
/// The reads register the documents with the transaction, so a concurrent
/// commit touching any of them aborts this one and `run_transaction` runs
/// the closure again on fresh data. Guard and write therefore act as one step.
async fn update_in_transaction(
    client: &FirestoreDb,
    table: &str,
    ids: &[String],
    filter: &Filter,
    patch: &Patch,
) -> Result<Vec<Row>, AppError> {
    client
        .run_transaction(|db, transaction| {
            let table = table.to_string();
            let ids = ids.to_vec();
            let filter = filter.clone();
            let patch = patch.clone();

            Box::pin(async move {
                let mut written = Vec::with_capacity(ids.len());
                for id in &ids {
                    let current: Option<Row> =
                        db.fluent().select().by_id_in(&table).obj().one(id).await?;
                    let Some(mut row) = current else {
                        continue;
                    };
                    if !filter.matches(&row) {
                        continue;
                    }

                    patch.apply(&mut row);
                    db.fluent()
                        .update()
                        .in_col(&table)
                        .document_id(id)
                        .object(&row)
                        .add_to_transaction(transaction)?;
                    written.push(row);
                }
                Ok(written)
            })
        })
        .await
        .map_err(|e| AppError::Database(format!("Update transaction on {} failed: {}", table, e)))
}

fn is_pushable(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Bool(_) | Value::Number(_))
}

fn eq_clause(
    q: &FirestoreQueryFilterBuilder,
    field: &str,
    value: &Value,
) -> Option<FirestoreQueryFilter> {
    match value {
        Value::String(s) => q.field(field).eq(s.clone()),
        Value::Bool(b) => q.field(field).eq(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => q.field(field).eq(i),
            None => q.field(field).eq(n.as_f64()?),
        },
        _ => None,
    }
}

#[async_trait]
impl StoreGateway for FirestoreStore {
    async fn get(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, AppError> {
        self.query(table, filter).await
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, AppError> {
        let id = row_id(&row).unwrap_or_else(new_row_id);
        row.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        // Fails if a document with this id already exists.
        let _: Row = self
            .get_client()?
            .fluent()
            .insert()
            .into(table)
            .document_id(&id)
            .object(&row)
            .execute()
            .await
            .map_err(|e| match e {
                FirestoreError::DataConflictError(_) => {
                    AppError::Conflict(format!("Duplicate key {} in table {}", id, table))
                }
                other => AppError::Database(other.to_string()),
            })?;

        tracing::debug!(table, id = %id, "Document inserted");
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<Vec<Row>, AppError> {
        let client = self.get_client()?;
        let ids: Vec<String> = match keyed_ids(filter) {
            Some(ids) => ids,
            None => self
                .query(table, filter)
                .await?
                .iter()
                .filter_map(row_id)
                .collect(),
        };

        let mut updated = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(BATCH_SIZE) {
            updated.extend(update_in_transaction(client, table, chunk, filter, patch).await?);
        }

        tracing::debug!(table, count = updated.len(), "Documents updated");
        Ok(updated)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, AppError> {
        let client = self.get_client()?;
        let matching = self.query(table, filter).await?;

        for chunk in matching.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for id in chunk.iter().filter_map(row_id) {
                client
                    .fluent()
                    .delete()
                    .from(table)
                    .document_id(&id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            table, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        tracing::debug!(table, count = matching.len(), "Documents deleted");
        Ok(matching)
    }
}
