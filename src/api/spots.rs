//! Admin spot detail endpoint.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::billing;
use crate::db::{ParkingSpot, ReservationRecord, SpotDetailResponse};
use crate::AppState;

use super::auth::AuthContext;
use super::error::ApiError;

/// Spot detail. For an occupied spot this includes the open reservation and
/// a live cost estimate as if it were released right now.
pub async fn get_spot(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<SpotDetailResponse>, ApiError> {
    ctx.require_admin()?;

    let spot = ParkingSpot::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Parking spot not found"))?;

    let open: Option<ReservationRecord> = sqlx::query_as(
        r#"
        SELECT r.id, r.user_id, u.name AS user_name, r.spot_id, s.spot_number,
               l.id AS lot_id, l.name AS lot_name, l.price_per_hour,
               r.vehicle_no, r.entry_at, r.exit_at, r.cost
        FROM reservations r
        JOIN parking_spots s ON s.id = r.spot_id
        JOIN parking_lots l ON l.id = s.lot_id
        JOIN users u ON u.id = r.user_id
        WHERE r.spot_id = ? AND r.exit_at IS NULL
        "#,
    )
    .bind(&id)
    .fetch_optional(&state.db)
    .await?;

    let estimated_cost = match &open {
        Some(reservation) => {
            let entry = billing::parse_timestamp(&reservation.entry_at)
                .map_err(|e| ApiError::internal(e.to_string()))?;
            Some(billing::parking_cost(
                entry,
                chrono::Utc::now(),
                reservation.price_per_hour,
            ))
        }
        None => None,
    };

    Ok(Json(SpotDetailResponse {
        spot,
        reservation: open,
        estimated_cost,
    }))
}
