use axum::{
    routing::{get, post},
    Router,
    extract::{Json, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::services::ServeDir;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::api::models::{ClosedAlert, SelectLocationRequest};
use crate::api::response;
use crate::commands;
use crate::config::SettingsUpdate;
use crate::AppState;

/// Upper bound for handlers that may wait on the schedule API.
const HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

pub fn create_router(app_state: AppState) -> Router {
    let media = ServeDir::new(&app_state.config.media_dir);

    Router::new()
        .route("/api/schedule", get(schedule_handler))
        .route("/api/status", get(status_handler))
        .route("/api/alert", get(alert_handler))
        .route("/api/alert/close", post(close_alert_handler))
        .route("/api/notices", get(notices_handler))
        .route("/api/locations", get(regions_handler))
        .route("/api/locations/:region", get(cities_handler))
        .route("/api/location", post(select_location_handler))
        .route("/api/settings", get(settings_handler).put(update_settings_handler))
        .nest_service("/media", media)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn schedule_handler(State(state): State<AppState>) -> impl IntoResponse {
    let start_time = Instant::now();
    let result = tokio::time::timeout(HANDLER_TIMEOUT, commands::show_today_schedule(&state)).await;
    debug!(elapsed = ?start_time.elapsed(), "schedule request processed");

    match result {
        Ok(result) => response::from_result(result),
        Err(_) => response::error(
            StatusCode::REQUEST_TIMEOUT,
            "Schedule lookup timed out".to_string(),
        ),
    }
}

async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    response::success(state.presenter.status())
}

async fn alert_handler(State(state): State<AppState>) -> Response {
    match state.presenter.current_alert() {
        Some(alert) => Html(alert.html).into_response(),
        None => response::error::<()>(StatusCode::NOT_FOUND, "No alert is open".to_string())
            .into_response(),
    }
}

async fn close_alert_handler(State(state): State<AppState>) -> impl IntoResponse {
    let closed = state.presenter.close_alert();
    response::success(ClosedAlert { closed })
}

async fn notices_handler(State(state): State<AppState>) -> impl IntoResponse {
    response::success(state.presenter.notices())
}

async fn regions_handler(State(state): State<AppState>) -> impl IntoResponse {
    match tokio::time::timeout(HANDLER_TIMEOUT, commands::list_regions(&state)).await {
        Ok(result) => response::from_result(result),
        Err(_) => response::error(StatusCode::REQUEST_TIMEOUT, "Location lookup timed out".to_string()),
    }
}

async fn cities_handler(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> impl IntoResponse {
    match tokio::time::timeout(HANDLER_TIMEOUT, commands::list_cities(&state, &region)).await {
        Ok(result) => response::from_result(result),
        Err(_) => response::error(StatusCode::REQUEST_TIMEOUT, "Location lookup timed out".to_string()),
    }
}

async fn select_location_handler(
    State(state): State<AppState>,
    Json(req): Json<SelectLocationRequest>,
) -> impl IntoResponse {
    info!(region = %req.region, city_id = %req.city_id, "location picked");
    match tokio::time::timeout(
        HANDLER_TIMEOUT,
        commands::select_location(&state, &req.region, &req.city_id),
    )
    .await
    {
        Ok(result) => response::from_result(result),
        Err(_) => response::error(StatusCode::REQUEST_TIMEOUT, "Location lookup timed out".to_string()),
    }
}

async fn settings_handler(State(state): State<AppState>) -> impl IntoResponse {
    response::success(state.current_settings())
}

async fn update_settings_handler(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> impl IntoResponse {
    response::from_result(commands::update_settings(&state, &update))
}
