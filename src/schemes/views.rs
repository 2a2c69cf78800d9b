use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::models::Scheme;
use super::store::{remove_scheme, upsert_scheme};
use crate::common::errors::ProcessingError;
use crate::common::state::AppState;

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_schemes, replace_schemes))
        .routes(routes!(save_scheme, delete_scheme))
        .with_state(state.clone())
}

/// List saved schemes
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "All saved schemes, empty when none are stored", body = Vec<Scheme>)
    ),
    tag = "schemes"
)]
pub async fn list_schemes(State(state): State<AppState>) -> Json<Vec<Scheme>> {
    let store = state.scheme_store.lock().await;
    Json(store.load_all())
}

/// Overwrite the whole scheme collection
#[utoipa::path(
    put,
    path = "/",
    request_body = Vec<Scheme>,
    responses(
        (status = 204, description = "Collection saved"),
        (status = 400, description = "A scheme maps a field more than once"),
        (status = 500, description = "Store could not be written")
    ),
    tag = "schemes"
)]
pub async fn replace_schemes(
    State(state): State<AppState>,
    Json(schemes): Json<Vec<Scheme>>,
) -> Result<StatusCode, ProcessingError> {
    for scheme in &schemes {
        scheme.mappings.validate_unique()?;
    }

    let store = state.scheme_store.lock().await;
    store.save_all(&schemes)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Save one scheme, replacing any scheme with the same name
#[utoipa::path(
    put,
    path = "/{name}",
    params(
        ("name" = String, Path, description = "Scheme name")
    ),
    request_body = Scheme,
    responses(
        (status = 200, description = "Scheme saved, full collection returned", body = Vec<Scheme>),
        (status = 400, description = "Scheme name is empty or a field is mapped twice"),
        (status = 500, description = "Store could not be written")
    ),
    tag = "schemes"
)]
pub async fn save_scheme(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(mut scheme): Json<Scheme>,
) -> Result<Json<Vec<Scheme>>, ProcessingError> {
    scheme.name = name;

    let store = state.scheme_store.lock().await;
    let mut schemes = store.load_all();
    upsert_scheme(&mut schemes, scheme)?;
    store.save_all(&schemes)?;
    Ok(Json(schemes))
}

/// Delete a scheme by name
#[utoipa::path(
    delete,
    path = "/{name}",
    params(
        ("name" = String, Path, description = "Scheme name")
    ),
    responses(
        (status = 200, description = "Remaining schemes", body = Vec<Scheme>),
        (status = 500, description = "Store could not be written")
    ),
    tag = "schemes"
)]
pub async fn delete_scheme(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Scheme>>, ProcessingError> {
    let store = state.scheme_store.lock().await;
    let mut schemes = store.load_all();
    if remove_scheme(&mut schemes, &name) {
        store.save_all(&schemes)?;
    } else {
        tracing::debug!("No scheme named '{name}' to delete");
    }
    Ok(Json(schemes))
}
