// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration Coordinator.
//!
//! Keeps each event's `quantity_left` consistent with the users whose
//! `registered_events` hold its id. The store has no cross-row
//! transactions, so every flow is a fixed sequence of single-row writes:
//!
//! 1. Reads and precondition checks (no writes yet)
//! 2. User-side write, guarded on the registration set
//! 3. Event-side write, guarded on seats where it consumes one
//! 4. Compensating write if step 3 is rejected by its guard
//!
//! The user row is always written before the event row. No write is ever
//! retried; a failed seat decrement is not idempotent.

use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{Event, EventPatch, NewEvent};
use crate::services::policy::{can_delete_event, can_edit_event};
use crate::services::{EventCatalog, UserDirectory};

const ALREADY_REGISTERED: &str = "User already registered for this event";
const NOT_REGISTERED: &str = "User is not registered for this event";

/// Orchestrates flows that touch both users and events.
#[derive(Clone)]
pub struct RegistrationCoordinator {
    users: UserDirectory,
    events: EventCatalog,
}

impl RegistrationCoordinator {
    pub fn new(users: UserDirectory, events: EventCatalog) -> Self {
        Self { users, events }
    }

    /// Register a user for an event, consuming one seat.
    ///
    /// Returns the event as written after the seat was taken.
    pub async fn register(&self, event_id: &str, user_id: &str) -> Result<Event> {
        let event = self.events.require(event_id).await?;
        if event.quantity_left <= 0 {
            return Err(AppError::CapacityExhausted);
        }

        let user = self.users.require(user_id).await?;
        if user.is_registered_for(event_id) {
            return Err(AppError::Conflict(ALREADY_REGISTERED.to_string()));
        }

        // Guarded on the id not being in the set, so a concurrent
        // registration of the same pair lands exactly once.
        if !self.users.add_registration(user_id, event_id).await? {
            return Err(AppError::Conflict(ALREADY_REGISTERED.to_string()));
        }

        match self.events.take_seat(event_id).await {
            Ok(Some(updated)) => {
                tracing::info!(
                    event_id,
                    user_id,
                    quantity_left = updated.quantity_left,
                    "User registered for event"
                );
                Ok(updated)
            }
            Ok(None) => {
                // Seats ran out (or the event vanished) after our read.
                tracing::warn!(
                    event_id,
                    user_id,
                    "No seat left at decrement time, removing user-side registration"
                );
                if let Err(err) = self.users.remove_registration(user_id, event_id).await {
                    tracing::error!(
                        event_id,
                        user_id,
                        error = %err,
                        "Compensating registration removal failed"
                    );
                    return Err(err);
                }
                Err(AppError::CapacityExhausted)
            }
            Err(err) => {
                tracing::error!(
                    event_id,
                    user_id,
                    error = %err,
                    "Seat decrement failed after user-side registration was written"
                );
                Err(err)
            }
        }
    }

    /// Unregister a user from an event, returning one seat.
    ///
    /// A registration pointing at a deleted event is removed without error.
    pub async fn unregister(&self, event_id: &str, user_id: &str) -> Result<()> {
        let user = self.users.require(user_id).await?;
        if !user.is_registered_for(event_id) {
            return Err(AppError::Conflict(NOT_REGISTERED.to_string()));
        }

        // Guarded on the id still being in the set: a concurrent unregister
        // of the same pair returns only one seat.
        if !self.users.remove_registration(user_id, event_id).await? {
            return Err(AppError::Conflict(NOT_REGISTERED.to_string()));
        }

        match self.events.release_seat(event_id).await? {
            Some(updated) => tracing::info!(
                event_id,
                user_id,
                quantity_left = updated.quantity_left,
                "User unregistered from event"
            ),
            None => tracing::debug!(
                event_id,
                user_id,
                "Event no longer exists, skipped seat release"
            ),
        }
        Ok(())
    }

    /// Create an event and bump the creator's counter.
    ///
    /// If the counter update fails, the inserted event is deleted again.
    /// Should that delete fail too, the event stays orphaned and the counter
    /// error is returned.
    pub async fn create_event(&self, new_event: NewEvent) -> Result<Event> {
        new_event.validate()?;
        let creator = self.users.require(&new_event.creator_id).await?;

        let creator_name = new_event
            .creator_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(creator.full_name.as_str())
            .to_string();

        let event = self.events.insert(&new_event, &creator_name).await?;

        match self.users.bump_created_events(&creator.id).await {
            Ok(created_events) => {
                tracing::info!(
                    event_id = %event.id,
                    creator_id = %creator.id,
                    created_events,
                    "Event created"
                );
                Ok(event)
            }
            Err(err) => {
                tracing::warn!(
                    event_id = %event.id,
                    creator_id = %creator.id,
                    error = %err,
                    "Creator counter update failed, deleting inserted event"
                );
                if let Err(rollback_err) = self.events.delete(&event.id).await {
                    tracing::error!(
                        event_id = %event.id,
                        error = %rollback_err,
                        "Compensating delete failed, event left orphaned"
                    );
                }
                Err(err)
            }
        }
    }

    /// Apply a partial update. Creator only.
    pub async fn update_event(
        &self,
        event_id: &str,
        actor_id: &str,
        patch: EventPatch,
    ) -> Result<Event> {
        let event = self.events.require(event_id).await?;

        if !can_edit_event(actor_id, &event) {
            return Err(AppError::Forbidden(
                "Only the event creator can edit this event".to_string(),
            ));
        }

        if patch.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }
        patch.validate()?;

        let updated = self
            .events
            .apply_patch(event_id, patch.fields())
            .await?
            .ok_or_else(|| {
                AppError::UpstreamFailure(format!("Update of event {} returned no row", event_id))
            })?;

        tracing::info!(event_id, actor_id, "Event updated");
        Ok(updated)
    }

    /// Delete an event. Creator or admin.
    ///
    /// Registrations pointing at the event are left in place, and the
    /// creator's counter is not decremented.
    pub async fn delete_event(&self, event_id: &str, actor_id: &str) -> Result<()> {
        let event = self.events.require(event_id).await?;
        let actor = self.users.require(actor_id).await?;

        if !can_delete_event(&actor, &event) {
            return Err(AppError::Forbidden(
                "Only the event creator or an admin can delete this event".to_string(),
            ));
        }

        if !self.events.delete(event_id).await? {
            return Err(AppError::NotFound(format!("Event {} not found", event_id)));
        }

        tracing::info!(event_id, actor_id, admin = actor.is_admin(), "Event deleted");
        Ok(())
    }

    /// Events the user is registered for. Ids of deleted events are skipped.
    pub async fn interested_events(&self, user_id: &str) -> Result<Vec<Event>> {
        let user = self.users.require(user_id).await?;
        self.events.by_ids(&user.registered_events).await
    }

    /// Events created by the user.
    pub async fn created_events(&self, user_id: &str) -> Result<Vec<Event>> {
        self.events.created_by(user_id).await
    }
}
