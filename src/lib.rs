// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Portal Gateway: browser-facing API for the collaborator portal.
//!
//! This crate proxies requests from the portal frontend to the external
//! backend and intranet APIs, attaching authorization from HTTP-only
//! cookies and renewing expired access tokens transparently.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::{BackendService, IntranetClient};
use std::time::Instant;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub backend: BackendService,
    pub intranet: IntranetClient,
    /// Process start time, reported by the health endpoint.
    pub started_at: Instant,
}

impl AppState {
    /// Build state from configuration.
    pub fn new(config: Config) -> Self {
        let backend = BackendService::new(&config.backend_api_url);
        let intranet = IntranetClient::new(&config.intranet_api_url);
        Self {
            config,
            backend,
            intranet,
            started_at: Instant::now(),
        }
    }
}
