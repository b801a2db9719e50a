//! User profile, dashboards, and the admin users view.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::db::{
    LotWithAvailability, ParkingLot, ReservationRecord, UpdateProfileRequest, User, UserResponse,
    UserWithReservations,
};
use crate::AppState;

use super::auth::AuthContext;
use super::error::ApiError;
use super::validation::validate_name;

/// User dashboard: the user, all lots with availability, own history
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: UserResponse,
    pub lots: Vec<LotWithAvailability>,
    pub reservations: Vec<ReservationRecord>,
}

pub async fn user_dashboard(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<Json<DashboardResponse>, ApiError> {
    ctx.require_user()?;

    let user = User::find(&state.db, &ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Login required"))?;
    let lots = ParkingLot::list_with_availability(&state.db).await?;
    let reservations = ReservationRecord::list_for_user(&state.db, &ctx.user_id).await?;

    Ok(Json(DashboardResponse {
        user: UserResponse::from(user),
        lots,
        reservations,
    }))
}

/// Own reservation history, newest entry first
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub user: UserResponse,
    pub reservations: Vec<ReservationRecord>,
}

pub async fn user_summary(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<Json<SummaryResponse>, ApiError> {
    ctx.require_user()?;

    let user = User::find(&state.db, &ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Login required"))?;
    let reservations = ReservationRecord::list_for_user(&state.db, &ctx.user_id).await?;

    Ok(Json(SummaryResponse {
        user: UserResponse::from(user),
        reservations,
    }))
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<Json<UserResponse>, ApiError> {
    ctx.require_user()?;

    let user = User::find(&state.db, &ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Login required"))?;
    Ok(Json(UserResponse::from(user)))
}

/// Profile edit mutates only the display name
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    ctx.require_user()?;

    if let Err(e) = validate_name(&req.name) {
        return Err(ApiError::validation_field("name", e));
    }

    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query("UPDATE users SET name = ?, updated_at = ? WHERE id = ?")
        .bind(&req.name)
        .bind(&now)
        .bind(&ctx.user_id)
        .execute(&state.db)
        .await?;

    let user = User::find(&state.db, &ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Login required"))?;

    Ok(Json(UserResponse::from(user)))
}

/// Admin view: every user with their reservation history
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<Json<Vec<UserWithReservations>>, ApiError> {
    ctx.require_admin()?;

    let users = User::list_all(&state.db).await?;

    let mut results = Vec::new();
    for user in users {
        let reservations = ReservationRecord::list_for_user(&state.db, &user.id).await?;
        results.push(UserWithReservations {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            address: user.address,
            pincode: user.pincode,
            reservations,
        });
    }

    Ok(Json(results))
}
