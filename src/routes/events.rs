// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event routes: catalog, creation, edits and registrations.

use crate::error::Result;
use crate::models::{EventPatch, EventView, NewEvent};
use crate::routes::extract::{AppJson, AppQuery};
use crate::routes::MessageResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{event_id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/events/{event_id}/register", post(register))
        .route("/events/{event_id}/unregister", post(unregister))
        // Older clients put the user in the path.
        .route(
            "/events/{event_id}/registrations/{user_id}",
            post(register_by_path),
        )
}

/// Acting user for edit/delete, passed as `?user_id=`.
#[derive(Deserialize)]
struct ActorQuery {
    user_id: String,
}

/// Body of register/unregister requests.
#[derive(Deserialize)]
struct RegistrationRequest {
    user_id: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EventResponse {
    pub message: String,
    pub event: EventView,
}

async fn list_events(State(state): State<Arc<AppState>>) -> Result<Json<Vec<EventView>>> {
    let events = state.events.list().await?;
    tracing::debug!(count = events.len(), "Listing events");
    Ok(Json(events.into_iter().map(EventView::from).collect()))
}

/// Single event as a one-element list, or `[]` when it does not exist.
async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<EventView>>> {
    let event = state.events.get(&event_id).await?;
    Ok(Json(event.into_iter().map(EventView::from).collect()))
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<NewEvent>,
) -> Result<Json<EventResponse>> {
    let event = state.registrations.create_event(payload).await?;

    Ok(Json(EventResponse {
        message: "Event created successfully".to_string(),
        event: event.into(),
    }))
}

async fn update_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    AppQuery(actor): AppQuery<ActorQuery>,
    AppJson(patch): AppJson<EventPatch>,
) -> Result<Json<EventResponse>> {
    let event = state
        .registrations
        .update_event(&event_id, &actor.user_id, patch)
        .await?;

    Ok(Json(EventResponse {
        message: "Event updated successfully".to_string(),
        event: event.into(),
    }))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    AppQuery(actor): AppQuery<ActorQuery>,
) -> Result<Json<MessageResponse>> {
    state
        .registrations
        .delete_event(&event_id, &actor.user_id)
        .await?;
    Ok(MessageResponse::new("Event deleted successfully"))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    AppJson(request): AppJson<RegistrationRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .registrations
        .register(&event_id, &request.user_id)
        .await?;
    Ok(MessageResponse::new("Successfully registered for event"))
}

async fn register_by_path(
    State(state): State<Arc<AppState>>,
    Path((event_id, user_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>> {
    state.registrations.register(&event_id, &user_id).await?;
    Ok(MessageResponse::new("Successfully registered for event"))
}

async fn unregister(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    AppJson(request): AppJson<RegistrationRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .registrations
        .unregister(&event_id, &request.user_id)
        .await?;
    Ok(MessageResponse::new("Successfully unregistered from event"))
}
