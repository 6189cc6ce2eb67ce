use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::badges::{AwardedBadge, BadgeKey};
use super::compatibility::{CompatibilityOptions, CompatibilityProfileUpdate, MatchProfile};
use super::domain::{EngagementAction, UserId};
use super::repository::{
    ActivityRepository, BadgeRepository, NotificationBroadcaster, RepositoryError,
};
use super::service::{EngagementService, EngagementServiceError};

/// Router builder exposing compatibility, badge and leaderboard endpoints.
pub fn engagement_router<A, B, N>(service: Arc<EngagementService<A, B, N>>) -> Router
where
    A: ActivityRepository + 'static,
    B: BadgeRepository + 'static,
    N: NotificationBroadcaster + 'static,
{
    Router::new()
        .route("/api/v1/compatibility", post(score_handler::<A, B, N>))
        .route(
            "/api/v1/users/:user_id/compatibility/:other_id",
            get(pair_handler::<A, B, N>),
        )
        .route(
            "/api/v1/users/:user_id/compatibility-profile",
            put(profile_handler::<A, B, N>),
        )
        .route("/api/v1/leaderboard", get(leaderboard_handler::<A, B, N>))
        .route("/api/v1/badges", get(catalog_handler::<A, B, N>))
        .route(
            "/api/v1/users/:user_id/badges",
            get(user_badges_handler::<A, B, N>),
        )
        .route(
            "/api/v1/users/:user_id/badges/check",
            post(check_handler::<A, B, N>),
        )
        .route(
            "/api/v1/users/:user_id/badges/:badge_key",
            patch(display_handler::<A, B, N>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CompatibilityRequest {
    #[serde(default)]
    pub profile_a: MatchProfile,
    #[serde(default)]
    pub profile_b: MatchProfile,
    #[serde(default)]
    pub options: CompatibilityOptions,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BadgeCheckRequest {
    #[serde(default)]
    pub action: EngagementAction,
    #[serde(default)]
    pub target_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BadgeCheckResponse {
    pub user_id: UserId,
    pub awarded: Vec<AwardedBadge>,
    pub points_awarded: u64,
}

#[derive(Debug, Deserialize)]
pub struct BadgeDisplayRequest {
    pub is_displayed: bool,
}

pub(crate) async fn score_handler<A, B, N>(
    State(service): State<Arc<EngagementService<A, B, N>>>,
    axum::Json(request): axum::Json<CompatibilityRequest>,
) -> Response
where
    A: ActivityRepository + 'static,
    B: BadgeRepository + 'static,
    N: NotificationBroadcaster + 'static,
{
    let result = service.compatibility(&request.profile_a, &request.profile_b, request.options);
    (StatusCode::OK, axum::Json(result)).into_response()
}

pub(crate) async fn pair_handler<A, B, N>(
    State(service): State<Arc<EngagementService<A, B, N>>>,
    Path((user_id, other_id)): Path<(String, String)>,
) -> Response
where
    A: ActivityRepository + 'static,
    B: BadgeRepository + 'static,
    N: NotificationBroadcaster + 'static,
{
    match service
        .compatibility_between(&UserId(user_id), &UserId(other_id))
        .await
    {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn profile_handler<A, B, N>(
    State(service): State<Arc<EngagementService<A, B, N>>>,
    Path(user_id): Path<String>,
    axum::Json(update): axum::Json<CompatibilityProfileUpdate>,
) -> Response
where
    A: ActivityRepository + 'static,
    B: BadgeRepository + 'static,
    N: NotificationBroadcaster + 'static,
{
    let user_id = UserId(user_id);
    match service.update_compatibility_profile(&user_id, update).await {
        Ok(profile) => {
            service.record_action(&user_id, EngagementAction::ProfileUpdated, None);
            (StatusCode::OK, axum::Json(profile)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn leaderboard_handler<A, B, N>(
    State(service): State<Arc<EngagementService<A, B, N>>>,
    Query(query): Query<LeaderboardQuery>,
) -> Response
where
    A: ActivityRepository + 'static,
    B: BadgeRepository + 'static,
    N: NotificationBroadcaster + 'static,
{
    match service.leaderboard(query.limit).await {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn catalog_handler<A, B, N>(
    State(service): State<Arc<EngagementService<A, B, N>>>,
) -> Response
where
    A: ActivityRepository + 'static,
    B: BadgeRepository + 'static,
    N: NotificationBroadcaster + 'static,
{
    match service.badge_catalog().await {
        Ok(badges) => (StatusCode::OK, axum::Json(badges)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn user_badges_handler<A, B, N>(
    State(service): State<Arc<EngagementService<A, B, N>>>,
    Path(user_id): Path<String>,
) -> Response
where
    A: ActivityRepository + 'static,
    B: BadgeRepository + 'static,
    N: NotificationBroadcaster + 'static,
{
    match service.user_badges(&UserId(user_id)).await {
        Ok(badges) => (StatusCode::OK, axum::Json(badges)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn check_handler<A, B, N>(
    State(service): State<Arc<EngagementService<A, B, N>>>,
    Path(user_id): Path<String>,
    axum::Json(request): axum::Json<BadgeCheckRequest>,
) -> Response
where
    A: ActivityRepository + 'static,
    B: BadgeRepository + 'static,
    N: NotificationBroadcaster + 'static,
{
    let user_id = UserId(user_id);
    let awarded = service
        .check_badges(&user_id, request.action, request.target_id.as_deref())
        .await;
    let points_awarded = awarded.iter().map(|badge| u64::from(badge.points)).sum();

    let body = BadgeCheckResponse {
        user_id,
        awarded,
        points_awarded,
    };
    (StatusCode::OK, axum::Json(body)).into_response()
}

pub(crate) async fn display_handler<A, B, N>(
    State(service): State<Arc<EngagementService<A, B, N>>>,
    Path((user_id, badge_key)): Path<(String, String)>,
    axum::Json(request): axum::Json<BadgeDisplayRequest>,
) -> Response
where
    A: ActivityRepository + 'static,
    B: BadgeRepository + 'static,
    N: NotificationBroadcaster + 'static,
{
    match service
        .set_badge_display(&UserId(user_id), &BadgeKey(badge_key), request.is_displayed)
        .await
    {
        Ok(badge) => (StatusCode::OK, axum::Json(badge)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: EngagementServiceError) -> Response {
    let status = match &error {
        EngagementServiceError::UnknownUser(_)
        | EngagementServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        EngagementServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        EngagementServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
