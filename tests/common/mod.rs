// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use serde_json::{json, Value};
use spark_events::config::Config;
use spark_events::db::{tables, Filter, FirestoreStore, MemoryStore, Patch, Row, StoreGateway};
use spark_events::error::AppError;
use spark_events::models::{NewEvent, Role};
use spark_events::routes::create_router;
use spark_events::AppState;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a store connected to the Firestore emulator.
#[allow(dead_code)]
pub async fn test_firestore() -> FirestoreStore {
    FirestoreStore::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// State over a fresh in-memory store. Returns the store for direct inspection.
#[allow(dead_code)]
pub fn test_state() -> (Arc<AppState>, MemoryStore) {
    let store = MemoryStore::new();
    let state = Arc::new(AppState::new(Config::test_default(), Arc::new(store.clone())));
    (state, store)
}

/// State over an arbitrary gateway.
#[allow(dead_code)]
pub fn test_state_with(store: Arc<dyn StoreGateway>) -> Arc<AppState> {
    Arc::new(AppState::new(Config::test_default(), store))
}

/// Create a test app over a fresh in-memory store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryStore) {
    let (state, store) = test_state();
    (create_router(state.clone()), state, store)
}

/// Write a user row directly, bypassing signup.
#[allow(dead_code)]
pub async fn seed_user(store: &dyn StoreGateway, id: &str, role: Role) {
    let role = match role {
        Role::Student => "student",
        Role::Admin => "admin",
    };
    let row = json!({
        "id": id,
        "email": format!("{}@bu.edu", id),
        "full_name": format!("User {}", id),
        "role": role,
        "registered_events": [],
        "created_events": 0,
    });
    store
        .insert(tables::USERS, as_row(row))
        .await
        .expect("Failed to seed user");
}

/// Change a stored user's role.
#[allow(dead_code)]
pub async fn set_role(store: &dyn StoreGateway, id: &str, role: &str) {
    store
        .update(tables::USERS, &Filter::eq("id", id), &Patch::new().set("role", role))
        .await
        .expect("Failed to update role");
}

#[allow(dead_code)]
pub fn new_event(creator_id: &str, capacity: u32) -> NewEvent {
    NewEvent {
        name: "Free Pizza".to_string(),
        description: "Leftover pizza from the CS seminar".to_string(),
        location_name: "CDS 1646".to_string(),
        start_time: "2025-01-01 10:00:00".to_string(),
        end_time: "2025-01-01 12:00:00".to_string(),
        capacity,
        creator_id: creator_id.to_string(),
        creator_name: None,
    }
}

/// Raw stored row, bypassing model parsing.
#[allow(dead_code)]
pub async fn stored_row(store: &dyn StoreGateway, table: &str, id: &str) -> Option<Row> {
    store
        .get(table, &Filter::eq("id", id))
        .await
        .expect("Failed to read row")
        .into_iter()
        .next()
}

#[allow(dead_code)]
pub fn as_row(value: Value) -> Row {
    value.as_object().cloned().expect("row must be an object")
}

/// Gateway wrapper that injects failures and interleavings.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing_updates: Arc<Mutex<HashSet<String>>>,
    failing_deletes: Arc<Mutex<HashSet<String>>>,
    /// Event whose seats are drained right before the next user-row update.
    drain_seats_of: Arc<Mutex<Option<String>>>,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_updates_on(&self, table: &str) {
        self.failing_updates.lock().unwrap().insert(table.to_string());
    }

    pub fn fail_deletes_on(&self, table: &str) {
        self.failing_deletes.lock().unwrap().insert(table.to_string());
    }

    /// Simulate a concurrent registration taking the last seat of
    /// `event_id` between a caller's read and its decrement.
    pub fn drain_seats_before_user_write(&self, event_id: &str) {
        *self.drain_seats_of.lock().unwrap() = Some(event_id.to_string());
    }
}

#[async_trait]
impl StoreGateway for FlakyStore {
    async fn get(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, AppError> {
        self.inner.get(table, filter).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, AppError> {
        self.inner.insert(table, row).await
    }

    async fn update(
        &self,
        table: &str,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<Vec<Row>, AppError> {
        if self.failing_updates.lock().unwrap().contains(table) {
            return Err(AppError::Database(format!("injected update failure on {}", table)));
        }

        let drain = if table == tables::USERS {
            self.drain_seats_of.lock().unwrap().take()
        } else {
            None
        };
        if let Some(event_id) = drain {
            self.inner
                .update(
                    tables::EVENTS,
                    &Filter::eq("id", event_id.as_str()),
                    &Patch::new().set("quantity_left", 0),
                )
                .await?;
        }

        self.inner.update(table, filter, patch).await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, AppError> {
        if self.failing_deletes.lock().unwrap().contains(table) {
            return Err(AppError::Database(format!("injected delete failure on {}", table)));
        }
        self.inner.delete(table, filter).await
    }
}
