use crate::common::state::AppState;
use crate::config::Config;
use crate::{schemes, workbooks};
use axum::{Router, extract::DefaultBodyLimit};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

pub fn build_router(config: &Config) -> Router {
    #[derive(OpenApi)]
    #[openapi(info(
        title = "sheet-mapper",
        description = "Map source spreadsheet columns onto a template and convert rows"
    ))]
    struct ApiDoc;

    let app_state: AppState = AppState::new(config.clone());

    // Build the router with OpenAPI documentation
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(crate::common::views::router(&app_state)) // Root routes
        .nest("/api/workbooks", workbooks::views::router(&app_state))
        .nest("/api/schemes", schemes::views::router(&app_state))
        .split_for_parts();

    router
        .merge(Scalar::with_url("/api/docs", api))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes()))
}
