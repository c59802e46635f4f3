// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event Catalog: event rows in the `events` table.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::{tables, Filter, Patch, Row, StoreGateway};
use crate::error::{AppError, Result};
use crate::models::{Event, NewEvent};
use crate::time_utils::now_rfc3339;

/// Access to event records.
#[derive(Clone)]
pub struct EventCatalog {
    store: Arc<dyn StoreGateway>,
}

impl EventCatalog {
    pub fn new(store: Arc<dyn StoreGateway>) -> Self {
        Self { store }
    }

    /// All events.
    pub async fn list(&self) -> Result<Vec<Event>> {
        self.fetch(&Filter::all()).await
    }

    pub async fn get(&self, event_id: &str) -> Result<Option<Event>> {
        Ok(self
            .fetch(&Filter::eq("id", event_id))
            .await?
            .into_iter()
            .next())
    }

    /// Get an event by id, or `NotFound`.
    pub async fn require(&self, event_id: &str) -> Result<Event> {
        self.get(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))
    }

    /// Events created by a user.
    pub async fn created_by(&self, user_id: &str) -> Result<Vec<Event>> {
        self.fetch(&Filter::eq("creator_id", user_id)).await
    }

    /// Events with the given ids, in the order given. Unknown ids are skipped.
    pub async fn by_ids(&self, event_ids: &[String]) -> Result<Vec<Event>> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = event_ids.iter().cloned().map(Value::String).collect();
        let mut found: HashMap<String, Event> = self
            .fetch(&Filter::is_in("id", ids))
            .await?
            .into_iter()
            .map(|event| (event.id.clone(), event))
            .collect();

        Ok(event_ids.iter().filter_map(|id| found.remove(id)).collect())
    }

    /// Insert a new event with all seats available.
    pub async fn insert(&self, new_event: &NewEvent, creator_name: &str) -> Result<Event> {
        let row = json!({
            "name": new_event.name,
            "description": new_event.description,
            "location_name": new_event.location_name,
            "start_time": new_event.start_time,
            "end_time": new_event.end_time,
            "created_at": now_rfc3339(),
            "quantity_left": new_event.capacity,
            "creator_id": new_event.creator_id,
            "creator_name": creator_name,
        });
        let Value::Object(row) = row else {
            return Err(AppError::Internal(anyhow::anyhow!("event row is not an object")));
        };

        parse_event(self.store.insert(tables::EVENTS, row).await?)
    }

    /// Overwrite the given columns. `None` if the event no longer exists.
    pub async fn apply_patch(&self, event_id: &str, fields: Row) -> Result<Option<Event>> {
        self.update_one(&Filter::eq("id", event_id), &Patch::set_all(fields))
            .await
    }

    /// Take one seat if any is left. `None` if no seat was available or
    /// the event no longer exists.
    pub async fn take_seat(&self, event_id: &str) -> Result<Option<Event>> {
        let filter = Filter::eq("id", event_id).and_gt("quantity_left", 0.0);
        self.update_one(&filter, &Patch::new().increment("quantity_left", -1))
            .await
    }

    /// Give one seat back. `None` if the event no longer exists.
    pub async fn release_seat(&self, event_id: &str) -> Result<Option<Event>> {
        self.update_one(
            &Filter::eq("id", event_id),
            &Patch::new().increment("quantity_left", 1),
        )
        .await
    }

    /// Delete an event row. Returns `false` if it was already gone.
    pub async fn delete(&self, event_id: &str) -> Result<bool> {
        let deleted = self
            .store
            .delete(tables::EVENTS, &Filter::eq("id", event_id))
            .await?;
        Ok(!deleted.is_empty())
    }

    async fn fetch(&self, filter: &Filter) -> Result<Vec<Event>> {
        self.store
            .get(tables::EVENTS, filter)
            .await?
            .into_iter()
            .map(parse_event)
            .collect()
    }

    async fn update_one(&self, filter: &Filter, patch: &Patch) -> Result<Option<Event>> {
        self.store
            .update(tables::EVENTS, filter, patch)
            .await?
            .into_iter()
            .next()
            .map(parse_event)
            .transpose()
    }
}

fn parse_event(row: Row) -> Result<Event> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Malformed event row: {}", e)))
}
