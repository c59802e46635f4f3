// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User routes: signup, profile and per-user event listings.

use crate::error::Result;
use crate::models::{EventView, NewUser, UserProfile};
use crate::routes::extract::AppJson;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/{user_id}", get(get_user))
        .route("/users/{user_id}/created-events", get(get_created_events))
        .route(
            "/users/{user_id}/interested-events",
            get(get_interested_events),
        )
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateUserResponse {
    pub message: String,
    pub user: UserProfile,
}

/// Sign up a new user.
async fn create_user(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<NewUser>,
) -> Result<Json<CreateUserResponse>> {
    tracing::debug!(email = %payload.email, "Signup request");

    let user = state.users.create(payload).await?;

    Ok(Json(CreateUserResponse {
        message: "User created successfully".to_string(),
        user: user.into(),
    }))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>> {
    let user = state.users.require(&user_id).await?;
    Ok(Json(user.into()))
}

/// Events created by the user. Unknown users simply have none.
async fn get_created_events(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<EventView>>> {
    let events = state.registrations.created_events(&user_id).await?;
    Ok(Json(events.into_iter().map(EventView::from).collect()))
}

/// Events the user is registered for.
async fn get_interested_events(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<EventView>>> {
    let events = state.registrations.interested_events(&user_id).await?;
    Ok(Json(events.into_iter().map(EventView::from).collect()))
}
