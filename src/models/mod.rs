// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod envelope;
pub mod user;

pub use envelope::ApiResponse;
pub use user::{LoginUpstream, UserInfo, UserProfile};
