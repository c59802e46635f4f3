// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Event model for storage and API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use super::coerce::{lenient_seats, lenient_string};

/// Stored event record in the `events` table.
///
/// Text and temporal columns may come back from the store as any scalar;
/// they are held here already rendered as strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Assigned by the store on insert
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub end_time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: String,
    /// Seats still available
    #[serde(default, deserialize_with = "lenient_seats")]
    pub quantity_left: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub creator_id: String,
    /// Creator's display name at creation time
    #[serde(default, deserialize_with = "lenient_string")]
    pub creator_name: String,
}

/// Event as returned to callers: every field rendered as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EventView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location_name: String,
    pub start_time: String,
    pub end_time: String,
    pub created_at: String,
    pub quantity_left: String,
    pub creator_id: String,
    pub creator_name: String,
}

impl From<Event> for EventView {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            description: event.description,
            location_name: event.location_name,
            start_time: event.start_time,
            end_time: event.end_time,
            created_at: event.created_at,
            quantity_left: event.quantity_left.to_string(),
            creator_id: event.creator_id,
            creator_name: event.creator_name,
        }
    }
}

/// Payload for `POST /events`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewEvent {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location_name: String,
    pub start_time: String,
    pub end_time: String,
    /// Initial number of seats
    pub capacity: u32,
    #[validate(length(min = 1))]
    pub creator_id: String,
    /// Falls back to the creator's stored name when absent
    #[serde(default)]
    pub creator_name: Option<String>,
}

/// Partial update for `PUT /events/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EventPatch {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub location_name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl EventPatch {
    /// Fields explicitly present in the patch, as `(column, value)` pairs.
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        let columns = [
            ("name", &self.name),
            ("description", &self.description),
            ("location_name", &self.location_name),
            ("start_time", &self.start_time),
            ("end_time", &self.end_time),
        ];
        for (column, value) in columns {
            if let Some(value) = value {
                fields.insert(column.to_string(), Value::String(value.clone()));
            }
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}
