// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Intranet proxy routes: community-project listings and related lookups.
//!
//! Authorization is two-hop: the caller's backend profile is resolved first
//! (under the refresh-and-retry contract), then its `token_intranet`
//! credential authorizes the intranet call. A caller whose profile lacks the
//! credential gets 403, not 401 — their portal session is fine, they just
//! have no intranet access.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::session::{apply_renewed, Session};
use crate::models::ApiResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/intranet/proyectos-comunidad",
            get(list_proyectos).post(create_proyecto),
        )
        .route(
            "/api/intranet/proyectos-comunidad/search",
            get(search_proyectos),
        )
        .route(
            "/api/intranet/proyectos-comunidad/{id}",
            get(get_proyecto),
        )
        .route(
            "/api/intranet/columnas-comparativo",
            get(columnas_comparativo),
        )
        .route("/api/intranet/ficheros-proyecto", get(ficheros_proyecto))
}

/// Resolve the caller's intranet credential from their backend profile.
async fn intranet_credential(state: &AppState, access_token: &str) -> Result<String> {
    let info = state.backend.client().user_info(access_token).await?;

    info.token_intranet()
        .map(String::from)
        .ok_or_else(|| AppError::Forbidden("User profile has no intranet credential".to_string()))
}

/// Proxy a GET to the intranet, passing the inbound query string through.
async fn proxy_intranet_get(
    state: Arc<AppState>,
    jar: CookieJar,
    path: String,
    query: Vec<(String, String)>,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    let session = Session::from_jar(&jar);

    let outcome = state
        .backend
        .with_refresh(&session, |token| {
            let state = state.clone();
            let path = path.clone();
            let query = query.clone();
            async move {
                let credential = intranet_credential(&state, &token).await?;
                state.intranet.get(&path, &query, &credential).await
            }
        })
        .await?;

    let jar = apply_renewed(jar, outcome.renewed_access, state.config.cookie_secure());
    Ok((jar, Json(ApiResponse::ok(outcome.value))))
}

/// List community projects.
async fn list_proyectos(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<HashMap<String, String>>,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    let query: Vec<(String, String)> = params.into_iter().collect();
    proxy_intranet_get(state, jar, "/api/proyectos-comunidad/".to_string(), query).await
}

/// Fetch one community project by id.
async fn get_proyecto(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<u64>,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    proxy_intranet_get(
        state,
        jar,
        format!("/api/proyectos-comunidad/{}/", id),
        Vec::new(),
    )
    .await
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

/// Search community projects.
async fn search_proyectos(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<SearchQuery>,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    let term = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Search term (q) is required".to_string()))?
        .to_string();

    proxy_intranet_get(
        state,
        jar,
        "/api/proyectos-comunidad/search/".to_string(),
        vec![("q".to_string(), term)],
    )
    .await
}

/// Comparison-column configuration for the insurance comparison screens.
async fn columnas_comparativo(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    proxy_intranet_get(
        state,
        jar,
        "/api/columnas-comparativo/".to_string(),
        Vec::new(),
    )
    .await
}

#[derive(Deserialize)]
struct FicherosQuery {
    proyecto_id: Option<String>,
}

/// File listing for a community project.
async fn ficheros_proyecto(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<FicherosQuery>,
) -> Result<(CookieJar, Json<ApiResponse<Value>>)> {
    let proyecto_id = params
        .proyecto_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("proyecto_id is required".to_string()))?
        .to_string();

    proxy_intranet_get(
        state,
        jar,
        "/api/ficheros-proyecto/".to_string(),
        vec![("proyecto_id".to_string(), proyecto_id)],
    )
    .await
}

/// Create a community project (intranet v1 endpoint).
async fn create_proyecto(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<Value>,
) -> Result<(StatusCode, CookieJar, Json<ApiResponse<Value>>)> {
    let session = Session::from_jar(&jar);

    let outcome = state
        .backend
        .with_refresh(&session, |token| {
            let state = state.clone();
            let body = body.clone();
            async move {
                let credential = intranet_credential(&state, &token).await?;
                state
                    .intranet
                    .post("/api/v1/proyectos-comunidad/", &body, &credential)
                    .await
            }
        })
        .await?;

    tracing::info!("Community project created");

    let jar = apply_renewed(jar, outcome.renewed_access, state.config.cookie_secure());
    Ok((
        StatusCode::CREATED,
        jar,
        Json(ApiResponse::with_message(outcome.value, "Project created")),
    ))
}
