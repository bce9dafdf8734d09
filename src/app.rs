use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::database::models::devotional::DevotionalPost;
use crate::database::models::event::Event;
use crate::database::models::group::Group;
use crate::database::models::observation::Observation;
use crate::database::models::rehearsal::Rehearsal;
use crate::database::models::transaction::FinancialTransaction;
use crate::database::DatabaseManager;
use crate::handlers::protected::{
    attendance, groups, notifications, resource, scales, transactions, users,
};
use crate::handlers::public;
use crate::middleware::jwt_auth_middleware;
use crate::resource::Resource;
use crate::state::AppState;

/// Build the full router for the given state.
pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/register", post(public::register_post))
        .route("/login", post(public::login_post))
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(users::me_get))
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:id",
            get(users::get).put(users::update).delete(users::delete),
        )
        .merge(resource_routes::<Event>("/events"))
        .merge(resource_routes::<Rehearsal>("/rehearsals"))
        .merge(resource_routes::<DevotionalPost>("/devotionals"))
        .merge(resource_routes::<Observation>("/observations"))
        .merge(resource_routes::<Group>("/groups"))
        .route(
            "/transactions",
            get(transactions::list).post(resource::create::<FinancialTransaction>),
        )
        .route("/transactions/summary", get(transactions::summary))
        .route(
            "/transactions/:id",
            get(resource::get::<FinancialTransaction>)
                .put(resource::update::<FinancialTransaction>)
                .delete(resource::delete::<FinancialTransaction>),
        )
        .route("/setAttendance", post(attendance::set_attendance))
        .route("/rehearsals/:id/attendance", get(attendance::list))
        .route("/scales", get(scales::list))
        .route("/scales/:id", get(scales::get).delete(scales::delete))
        .route("/scales/:id/viewed", post(scales::mark_viewed))
        .route("/createScale", post(scales::create))
        .route("/updateScale", put(scales::update))
        .route(
            "/groups/:id/members",
            get(groups::list_members).post(groups::add_members),
        )
        .route("/groups/:id/members/:user_id", axum::routing::delete(groups::remove_member))
        .route("/groups/:id/items", get(groups::list_items).post(groups::add_item))
        .route("/groups/:id/items/:item_id", axum::routing::delete(groups::delete_item))
        .route("/getNotifications", get(notifications::get_notifications))
        .route("/markNotificationRead", post(notifications::mark_read))
        .route("/markAllNotificationsRead", post(notifications::mark_all_read))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

/// `GET/POST /{path}` and `GET/PUT/DELETE /{path}/:id` for a resource.
fn resource_routes<R: Resource>(path: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route(path, get(resource::list::<R>).post(resource::create::<R>))
        .route(
            &format!("{}/:id", path),
            get(resource::get::<R>)
                .put(resource::update::<R>)
                .delete(resource::delete::<R>),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "Ministry API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "public": ["/health", "/register", "/login"],
            "protected": [
                "/me", "/users", "/events", "/rehearsals", "/devotionals", "/observations",
                "/transactions", "/setAttendance", "/scales", "/groups", "/getNotifications"
            ]
        }
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now, "database": "ok" })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "timestamp": now, "database": "unavailable" })),
            )
        }
    }
}
