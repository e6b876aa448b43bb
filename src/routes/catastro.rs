// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cadastral lookup routes.
//!
//! Thin proxies over the backend's cadastre endpoints: street search,
//! property search by address or cadastral reference, and building data.
//! Results are display data; the gateway validates query parameters and
//! nothing else.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::session::{apply_renewed, Session};
use crate::models::ApiResponse;
use crate::AppState;

/// Minimum length for street-search terms.
const MIN_SEARCH_LEN: usize = 3;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/catastro/calles", get(search_calles))
        .route("/api/catastro/inmuebles", get(search_inmuebles))
        .route("/api/catastro/inmuebles/refcat", get(inmuebles_by_refcat))
        .route("/api/catastro/edificio-general", get(edificio_general))
        .route("/api/catastro/edificio-detalle", get(edificio_detalle))
}

#[derive(Deserialize)]
struct CallesQuery {
    q: Option<String>,
}

/// Street name search. An upstream 404 means "no matches", not an error.
async fn search_calles(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallesQuery>,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.len() < MIN_SEARCH_LEN {
        return Err(AppError::BadRequest(format!(
            "Search term must be at least {} characters",
            MIN_SEARCH_LEN
        )));
    }
    let query = query.to_string();
    let session = Session::from_jar(&jar);

    let outcome = state
        .backend
        .with_refresh(&session, |token| {
            let client = state.backend.client();
            let q = query.clone();
            async move {
                match client
                    .get_value("/catastro/calles/", &[("q".to_string(), q)], &token)
                    .await
                {
                    // No matches: surface an empty result set, not an error
                    Err(AppError::UpstreamStatus { status: 404, .. }) => Ok(Value::Array(vec![])),
                    other => other,
                }
            }
        })
        .await?;

    let jar = apply_renewed(jar, outcome.renewed_access, state.config.cookie_secure());
    Ok((jar, Json(ApiResponse::ok(outcome.value))))
}

#[derive(Deserialize)]
struct InmueblesQuery {
    tipo_via: Option<String>,
    nombre_via: Option<String>,
    nombre_municipio: Option<String>,
    nombre_provincia: Option<String>,
    numero: Option<String>,
}

/// Property search by address parts.
async fn search_inmuebles(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<InmueblesQuery>,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    let required = [
        ("tipo_via", &params.tipo_via),
        ("nombre_via", &params.nombre_via),
        ("nombre_municipio", &params.nombre_municipio),
        ("nombre_provincia", &params.nombre_provincia),
    ];

    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.as_deref().map(str::trim).unwrap_or_default().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Missing required parameters: {}",
            missing.join(", ")
        )));
    }

    let mut query: Vec<(String, String)> = required
        .iter()
        .map(|(name, value)| (name.to_string(), value.as_deref().unwrap().trim().to_string()))
        .collect();

    if let Some(numero) = params.numero.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        query.push(("numero".to_string(), numero.to_string()));
    }

    tracing::debug!(params = ?query, "Property search");
    let session = Session::from_jar(&jar);

    let outcome = state
        .backend
        .with_refresh(&session, |token| {
            let client = state.backend.client();
            let query = query.clone();
            async move { client.get_value("/catastro/inmuebles/", &query, &token).await }
        })
        .await?;

    let jar = apply_renewed(jar, outcome.renewed_access, state.config.cookie_secure());
    Ok((jar, Json(ApiResponse::ok(outcome.value))))
}

#[derive(Deserialize)]
struct RefcatQuery {
    refcat: Option<String>,
}

fn require_refcat(params: &RefcatQuery) -> Result<String> {
    params
        .refcat
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .ok_or_else(|| AppError::BadRequest("Cadastral reference (refcat) is required".to_string()))
}

/// Shared shape of the three refcat-keyed lookups.
async fn refcat_lookup(
    state: &Arc<AppState>,
    jar: CookieJar,
    params: RefcatQuery,
    path: &'static str,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    let refcat = require_refcat(&params)?;
    let session = Session::from_jar(&jar);

    let outcome = state
        .backend
        .with_refresh(&session, |token| {
            let client = state.backend.client();
            let refcat = refcat.clone();
            async move {
                client
                    .get_value(path, &[("refcat".to_string(), refcat)], &token)
                    .await
            }
        })
        .await?;

    let jar = apply_renewed(jar, outcome.renewed_access, state.config.cookie_secure());
    Ok((jar, Json(ApiResponse::ok(outcome.value))))
}

/// Property listing for a cadastral reference.
async fn inmuebles_by_refcat(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<RefcatQuery>,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    refcat_lookup(&state, jar, params, "/catastro/inmuebles/refcat/").await
}

/// Building overview (without the per-property breakdown).
async fn edificio_general(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<RefcatQuery>,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    refcat_lookup(&state, jar, params, "/catastro/edificio-general/").await
}

/// Full building detail.
async fn edificio_detalle(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<RefcatQuery>,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    refcat_lookup(&state, jar, params, "/catastro/edificio-detalle/").await
}
