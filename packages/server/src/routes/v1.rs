use axum::middleware;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::rewrite::rewrite_response;
use crate::state::AppState;

pub fn routes(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/imagekit", imagekit_routes())
        .nest("/upload", upload_routes(state))
}

fn imagekit_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::settings::get_settings,
            handlers::settings::update_settings
        ))
        .routes(routes!(handlers::settings::restore_settings))
        .routes(routes!(handlers::webhook::handle_webhook))
}

/// Host media routes; responses pass through the CDN URL rewriter.
fn upload_routes(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::media::list_files,
            handlers::media::upload_file
        ))
        .routes(routes!(
            handlers::media::get_file,
            handlers::media::delete_file
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rewrite_response,
        ))
        .layer(handlers::media::upload_body_limit(
            state.config.storage.max_upload_size,
        ))
}
