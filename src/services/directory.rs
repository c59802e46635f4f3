// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User Directory: user rows in the `users` table.

use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

use crate::db::{tables, Filter, Patch, Row, StoreGateway};
use crate::error::{AppError, Result};
use crate::models::user::user_id_from_email;
use crate::models::{NewUser, User};

/// Access to user records.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn StoreGateway>,
    institution_domain: Option<String>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn StoreGateway>, institution_domain: Option<String>) -> Self {
        Self {
            store,
            institution_domain,
        }
    }

    /// Get a user by id.
    pub async fn get(&self, user_id: &str) -> Result<Option<User>> {
        self.store
            .get(tables::USERS, &Filter::eq("id", user_id))
            .await?
            .into_iter()
            .next()
            .map(parse_user)
            .transpose()
    }

    /// Get a user by id, or `NotFound`.
    pub async fn require(&self, user_id: &str) -> Result<User> {
        self.get(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    /// Sign up a new user.
    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        new_user.validate()?;
        let email = new_user.email.trim().to_string();

        if let Some(domain) = &self.institution_domain {
            let suffix = format!("@{}", domain);
            if !email.to_ascii_lowercase().ends_with(&suffix) {
                return Err(AppError::BadRequest(format!(
                    "Email must be a {} address",
                    suffix
                )));
            }
        }

        let user_id = new_user
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.derive_user_id(&email));

        if self.get(&user_id).await?.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let row = json!({
            "id": user_id,
            "email": email,
            "full_name": new_user.name.trim(),
            "role": "student",
            "registered_events": [],
            "created_events": 0,
        });
        let Value::Object(row) = row else {
            return Err(AppError::Internal(anyhow::anyhow!("user row is not an object")));
        };

        // A concurrent signup for the same id can slip past the check above;
        // the store's key constraint catches it.
        let stored = match self.store.insert(tables::USERS, row).await {
            Ok(stored) => stored,
            Err(AppError::Conflict(_)) => {
                return Err(AppError::Conflict("User already exists".to_string()))
            }
            Err(err) => return Err(err),
        };
        let user = parse_user(stored)?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Add `event_id` to the user's registrations unless already present.
    ///
    /// Returns `false` when no row was written: the user is gone or the id
    /// was already in the set.
    pub async fn add_registration(&self, user_id: &str, event_id: &str) -> Result<bool> {
        let filter = Filter::eq("id", user_id).and_not_contains("registered_events", event_id);
        let patch = Patch::new().add_to_set("registered_events", event_id);
        let rows = self.store.update(tables::USERS, &filter, &patch).await?;
        Ok(!rows.is_empty())
    }

    /// Remove `event_id` from the user's registrations.
    ///
    /// Returns `false` when no row was written: the user is gone or the id
    /// was not in the set.
    pub async fn remove_registration(&self, user_id: &str, event_id: &str) -> Result<bool> {
        let filter = Filter::eq("id", user_id).and_contains("registered_events", event_id);
        let patch = Patch::new().remove_from_set("registered_events", event_id);
        let rows = self.store.update(tables::USERS, &filter, &patch).await?;
        Ok(!rows.is_empty())
    }

    /// Increment the user's created-events counter, returning the new value.
    pub async fn bump_created_events(&self, user_id: &str) -> Result<u64> {
        let patch = Patch::new().increment("created_events", 1);
        let row = self
            .store
            .update(tables::USERS, &Filter::eq("id", user_id), &patch)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::UpstreamFailure(format!("Counter update for user {} returned no row", user_id))
            })?;

        Ok(parse_user(row)?.created_events)
    }

    fn derive_user_id(&self, email: &str) -> String {
        match &self.institution_domain {
            Some(domain) => user_id_from_email(email, domain),
            None => email.split('@').next().unwrap_or(email).to_string(),
        }
    }
}

fn parse_user(row: Row) -> Result<User> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Malformed user row: {}", e)))
}
