// src/routes.rs

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, patch, post, put},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, games, news, notifications, reports, users},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public catalog routes (games, news) and auth.
/// * User routes behind `auth_middleware`.
/// * Admin routes behind `auth_middleware` then `admin_middleware`.
/// * Global Trace and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let require_user = || middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/me", get(users::get_profile))
                .layer(require_user()),
        );

    let game_routes = Router::new()
        .route("/", get(games::list_games))
        .route("/trending", get(games::trending_games))
        .route("/upcoming", get(games::upcoming_games))
        .route("/{id}", get(games::get_game))
        .route("/{id}/reviews", get(games::list_reviews))
        .route("/{id}/community", get(games::list_community_posts))
        // Protected game routes
        .merge(
            Router::new()
                .route("/{id}/reviews", post(games::submit_review))
                .route("/{id}/community", post(games::create_community_post))
                .layer(require_user()),
        );

    let news_routes = Router::new()
        .route("/", get(news::list_news))
        .route("/{slug}", get(news::get_news));

    let user_routes = Router::new()
        .route("/profile", get(users::get_profile).put(users::update_profile))
        .route("/password", put(users::change_password))
        .route("/bookmarks", get(users::list_bookmarks))
        .route("/bookmarks/{game_id}", post(users::toggle_bookmark))
        .route("/notifications", get(users::list_notifications))
        .route("/notifications/read-all", patch(users::mark_all_notifications_read))
        .route("/notifications/{id}/read", patch(users::mark_notification_read))
        .route("/preferences", patch(users::update_preferences))
        .layer(require_user());

    let report_routes = Router::new()
        .route("/", post(reports::submit_report))
        .layer(require_user());

    let notification_routes = Router::new()
        .route("/broadcast", post(notifications::broadcast))
        .layer(middleware::from_fn(admin_middleware))
        .layer(require_user());

    let admin_routes = Router::new()
        .route("/games", get(admin::list_games).post(admin::create_game))
        .route(
            "/games/{id}",
            put(admin::update_game).delete(admin::delete_game),
        )
        .route(
            "/games/{id}/rating/recompute",
            post(admin::recompute_game_rating),
        )
        .route("/news", get(admin::list_news).post(admin::create_news))
        .route(
            "/news/{id}",
            put(admin::update_news).delete(admin::delete_news),
        )
        .route("/stats", get(admin::stats))
        .route("/reports", get(admin::list_reports))
        .route("/reports/{id}", patch(admin::update_report_status))
        // Auth first, then the admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(require_user());

    Router::new()
        .route("/api/health", get(health))
        .nest("/api/auth", auth_routes)
        .nest("/api/games", game_routes)
        .nest("/api/news", news_routes)
        .nest("/api/users", user_routes)
        .nest("/api/reports", report_routes)
        .nest("/api/notifications", notification_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
