// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - upstream clients and the authorized-call engine.

pub mod backend;
pub mod intranet;

pub use backend::{BackendClient, BackendService, ProxyOutcome};
pub use intranet::IntranetClient;
