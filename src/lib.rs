// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Spark Events: campus event management
//!
//! Students sign up, browse events, create events with limited seats and
//! register or unregister. All state lives in an external table store
//! reached through [`db::StoreGateway`].

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::StoreGateway;
use services::{EventCatalog, RegistrationCoordinator, UserDirectory};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub users: UserDirectory,
    pub events: EventCatalog,
    pub registrations: RegistrationCoordinator,
}

impl AppState {
    /// Wire the services over one store.
    pub fn new(config: Config, store: Arc<dyn StoreGateway>) -> Self {
        let users = UserDirectory::new(store.clone(), config.institution_email_domain.clone());
        let events = EventCatalog::new(store);
        let registrations = RegistrationCoordinator::new(users.clone(), events.clone());

        Self {
            config,
            users,
            events,
            registrations,
        }
    }
}
