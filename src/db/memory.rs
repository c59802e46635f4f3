// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backend.
//!
//! Used for local development and tests. Each table lives behind one
//! `DashMap` entry; an `update` holds that entry for the whole
//! filter-then-patch step, which makes guarded updates atomic per table.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

use super::query::ID_FIELD;
use super::{new_row_id, row_id, Filter, Patch, Row, StoreGateway};
use crate::error::AppError;

/// Shared in-memory tables. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<DashMap<String, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently in `table`.
    pub fn len(&self, table: &str) -> usize {
        self.tables.get(table).map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }
}

#[async_trait]
impl StoreGateway for MemoryStore {
    async fn get(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, AppError> {
        let rows = match self.tables.get(table) {
            Some(rows) => rows.iter().filter(|r| filter.matches(r)).cloned().collect(),
            None => Vec::new(),
        };
        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, AppError> {
        let id = row_id(&row).unwrap_or_else(new_row_id);
        row.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        let mut rows = self.tables.entry(table.to_string()).or_default();
        if rows.iter().any(|r| row_id(r).as_deref() == Some(id.as_str())) {
            return Err(AppError::Conflict(format!(
                "Duplicate key {} in table {}",
                id, table
            )));
        }
        rows.push(row.clone());

        tracing::debug!(table, id = %id, "Row inserted");
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<Vec<Row>, AppError> {
        let Some(mut rows) = self.tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|r| filter.matches(r)) {
            patch.apply(row);
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, AppError> {
        let Some(mut rows) = self.tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let (deleted, kept): (Vec<Row>, Vec<Row>) =
            rows.drain(..).partition(|r| filter.matches(r));
        *rows = kept;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_when_missing() {
        let store = MemoryStore::new();
        let stored = store
            .insert("events", row(json!({"name": "Pizza"})))
            .await
            .unwrap();

        assert!(row_id(&stored).is_some());
        assert_eq!(store.len("events"), 1);
    }

    #[tokio::test]
    async fn test_insert_stores_id_as_string() {
        let store = MemoryStore::new();
        let stored = store.insert("events", row(json!({"id": 7}))).await.unwrap();
        assert_eq!(stored["id"], json!("7"));

        let err = store
            .insert("events", row(json!({"id": "7"})))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = MemoryStore::new();
        store.insert("users", row(json!({"id": "u1"}))).await.unwrap();

        let err = store
            .insert("users", row(json!({"id": "u1"})))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_guarded_update_only_touches_matching_rows() {
        let store = MemoryStore::new();
        store
            .insert("events", row(json!({"id": "e1", "quantity_left": 1})))
            .await
            .unwrap();

        let filter = Filter::eq("id", "e1").and_gt("quantity_left", 0.0);
        let patch = Patch::new().increment("quantity_left", -1);

        let first = store.update("events", &filter, &patch).await.unwrap();
        let second = store.update("events", &filter, &patch).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first[0]["quantity_left"], json!(0));
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_delete_returns_removed_rows() {
        let store = MemoryStore::new();
        store.insert("events", row(json!({"id": "e1"}))).await.unwrap();
        store.insert("events", row(json!({"id": "e2"}))).await.unwrap();

        let deleted = store
            .delete("events", &Filter::eq("id", "e1"))
            .await
            .unwrap();

        assert_eq!(deleted.len(), 1);
        assert_eq!(store.len("events"), 1);
        assert!(store
            .get("events", &Filter::eq("id", "e1"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_table_is_empty() {
        let store = MemoryStore::new();
        assert!(store.get("nope", &Filter::all()).await.unwrap().is_empty());
        assert!(store
            .update("nope", &Filter::all(), &Patch::new().set("a", 1))
            .await
            .unwrap()
            .is_empty());
    }
}
