use crate::{auth, config::Config, handlers, state::AppState};
use axum::{
    Router,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{delete, get, get_service, post},
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::info;

/// Builds the application router.
///
/// Event routes are always public. `/handleLogin` and `/verify` are mounted
/// only when `config.auth_routes` is set and a secret is available; `/verify`
/// sits behind [`auth::verify_token`]. Unmatched GET requests are served from
/// the static directory, falling back to its `index.html`; any other method
/// on an unmatched path is a 404.
pub fn create_router(app_state: AppState, config: &Config) -> Router {
    let mut router = Router::new()
        .route("/getAllPosts", get(handlers::get_all_posts))
        .route("/addPost", post(handlers::add_post))
        .route("/deletePost/{post_id}", delete(handlers::delete_post))
        .route("/updatePost/{post_id}", post(handlers::update_post))
        .route(
            "/getPostFromDate/{date_value}",
            get(handlers::get_post_from_date),
        )
        .route("/editColor/{date_value}", post(handlers::edit_color))
        .route("/seeder", get(handlers::run_seeder));

    if config.auth_routes
        && let Some(keys) = app_state.tokens.clone()
    {
        info!("login routes enabled");
        let verify = post(handlers::verify)
            .route_layer(from_fn_with_state(keys, auth::verify_token));
        router = router
            .route("/handleLogin", post(handlers::handle_login))
            .route("/verify", verify);
    }

    let spa = ServeDir::new(&config.static_dir)
        .fallback(ServeFile::new(config.static_dir.join("index.html")));

    router
        .fallback_service(get_service(spa).fallback(|| async { StatusCode::NOT_FOUND }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
