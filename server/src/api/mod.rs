use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::set_header::response::SetResponseHeaderLayer;

use crate::auth::Auth;

pub mod auth_handlers;
pub mod cliente_handlers;
pub mod dto;
pub mod import_handlers;
pub mod jwt;
pub mod obra_handlers;
pub mod producto_handlers;
pub mod registro_handlers;
pub mod reporte_handlers;

// ---------- shared state ----------

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Auth>,
    pub db: DatabaseConnection,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

// ---------- error type ----------

/// A JSON error response: `{"error": "..."}` with an HTTP status.
pub struct ApiErr(StatusCode, String);

impl ApiErr {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self(status, msg.into())
    }

    pub fn internal(e: impl std::fmt::Display) -> Self {
        tracing::error!(error = %e, "request failed");
        Self(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(StatusCode::NOT_FOUND, msg.into())
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.1 });
        (self.0, Json(body)).into_response()
    }
}

/// Map an insert failure: a broken user FK means the token's account no
/// longer exists, which callers see as 404 rather than a server error.
pub(crate) fn map_insert_err(e: sea_orm::DbErr) -> ApiErr {
    let msg = e.to_string();
    if msg.contains("FOREIGN KEY") || msg.contains("foreign key") {
        ApiErr::not_found("User not found")
    } else {
        ApiErr::internal(e)
    }
}

// ---------- router ----------

pub fn app_router(state: AppState) -> Router {
    let allowed_origins: Vec<HeaderValue> = std::env::var("OBRAS_CORS_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let cors = if allowed_origins.is_empty() {
        CorsLayer::new() // no origins allowed = same-origin only
    } else {
        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_v1())
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(NormalizePathLayer::trim_trailing_slash())
        .with_state(state)
}

fn api_v1() -> Router<AppState> {
    Router::new()
        // auth + profile
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/me", get(auth_handlers::me))
        .route("/auth/email", put(auth_handlers::update_email))
        .route("/auth/username", put(auth_handlers::update_username))
        .route("/auth/password", put(auth_handlers::update_password))
        .route(
            "/auth/account",
            axum::routing::delete(auth_handlers::delete_account),
        )
        // obras
        .route(
            "/obras",
            get(obra_handlers::list_obras).post(obra_handlers::create_obra),
        )
        .route(
            "/obras/{id}",
            get(obra_handlers::get_obra)
                .put(obra_handlers::update_obra)
                .delete(obra_handlers::delete_obra),
        )
        // clientes
        .route(
            "/clientes",
            get(cliente_handlers::list_clientes).post(cliente_handlers::create_cliente),
        )
        .route(
            "/clientes/{id}",
            get(cliente_handlers::get_cliente)
                .put(cliente_handlers::update_cliente)
                .delete(cliente_handlers::delete_cliente),
        )
        // productos
        .route(
            "/productos",
            get(producto_handlers::list_productos).post(producto_handlers::create_producto),
        )
        .route(
            "/productos/{id}",
            get(producto_handlers::get_producto)
                .put(producto_handlers::update_producto)
                .delete(producto_handlers::delete_producto),
        )
        // registros
        .route(
            "/registros",
            get(registro_handlers::list_registros).post(registro_handlers::create_registro),
        )
        .route(
            "/registros/{id}",
            get(registro_handlers::get_registro)
                .put(registro_handlers::update_registro)
                .delete(registro_handlers::delete_registro),
        )
        // reportes
        .route("/reportes", get(reporte_handlers::get_reportes))
        .route(
            "/reportes/export",
            post(reporte_handlers::export_reportes),
        )
        // bulk import
        .route("/import-backup", post(import_handlers::import_backup))
}

// ---------- health ----------

async fn health(State(state): State<AppState>) -> Response {
    match state.db.ping().await {
        Ok(()) => Json(serde_json::json!({
            "status": "healthy",
            "database": "connected",
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "database": "unreachable",
                })),
            )
                .into_response()
        }
    }
}
