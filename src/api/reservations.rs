//! Booking lifecycle endpoints.
//!
//! A reservation is created open at booking and closed exactly once at
//! release. Booking flips its spot to occupied and release flips it back;
//! each pair of writes is a single transaction.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::billing;
use crate::db::{
    BookRequest, ParkingLot, ParkingSpot, ReleaseResponse, Reservation, ReservationRecord,
    SpotStatus,
};
use crate::AppState;

use super::auth::AuthContext;
use super::error::ApiError;
use super::validation::validate_vehicle_no;

/// Book the first available spot in a lot
pub async fn book_spot(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(lot_id): Path<String>,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<ReservationRecord>), ApiError> {
    ctx.require_user()?;

    if let Err(e) = validate_vehicle_no(&req.vehicle_no) {
        return Err(ApiError::validation_field("vehicle_no", e));
    }

    let lot = ParkingLot::find(&state.db, &lot_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Parking lot not found"))?;

    let mut tx = state.db.begin().await?;

    // TODO: two concurrent bookings can both select this spot before either
    // flips it; needs a conditional UPDATE on status to close the window.
    let spot: Option<ParkingSpot> = sqlx::query_as(
        "SELECT * FROM parking_spots WHERE lot_id = ? AND status = 'available' ORDER BY spot_index ASC LIMIT 1",
    )
    .bind(&lot.id)
    .fetch_optional(&mut *tx)
    .await?;

    let spot = spot.ok_or_else(|| ApiError::business_rule("No available spot in this lot"))?;

    let reservation_id = Uuid::new_v4().to_string();
    let entry_at = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO reservations (id, user_id, spot_id, vehicle_no, entry_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&reservation_id)
    .bind(&ctx.user_id)
    .bind(&spot.id)
    .bind(&req.vehicle_no)
    .bind(&entry_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE parking_spots SET status = ? WHERE id = ?")
        .bind(SpotStatus::Occupied.as_str())
        .bind(&spot.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        lot = %lot.name,
        spot = %spot.spot_number,
        user = %ctx.user_id,
        "Booked parking spot"
    );

    let record = ReservationRecord::find(&state.db, &reservation_id)
        .await?
        .ok_or_else(|| ApiError::internal("Reservation vanished after insert"))?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Release a reservation: stamp exit time and cost, free the spot.
///
/// Only the owning user may release, and a closed reservation stays closed;
/// a second release attempt is rejected without touching cost or timestamps.
pub async fn release_reservation(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<ReleaseResponse>, ApiError> {
    ctx.require_user()?;

    let reservation = Reservation::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("No reservation with this ID"))?;

    if reservation.user_id != ctx.user_id {
        return Err(ApiError::forbidden(
            "Unauthorized access to this reservation",
        ));
    }

    if !reservation.is_open() {
        return Err(ApiError::business_rule(
            "This reservation has already been released.",
        ));
    }

    let price: (f64,) = sqlx::query_as(
        r#"
        SELECT l.price_per_hour FROM parking_lots l
        JOIN parking_spots s ON s.lot_id = l.id
        WHERE s.id = ?
        "#,
    )
    .bind(&reservation.spot_id)
    .fetch_one(&state.db)
    .await?;

    let entry = billing::parse_timestamp(&reservation.entry_at)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let exit = chrono::Utc::now();
    let cost = billing::parking_cost(entry, exit, price.0);

    let mut tx = state.db.begin().await?;

    sqlx::query("UPDATE reservations SET exit_at = ?, cost = ? WHERE id = ?")
        .bind(exit.to_rfc3339())
        .bind(cost)
        .bind(&reservation.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE parking_spots SET status = ? WHERE id = ?")
        .bind(SpotStatus::Available.as_str())
        .bind(&reservation.spot_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(reservation = %reservation.id, cost = cost, "Released parking spot");

    let record = ReservationRecord::find(&state.db, &reservation.id)
        .await?
        .ok_or_else(|| ApiError::internal("Reservation vanished after update"))?;

    Ok(Json(ReleaseResponse {
        reservation: record,
        cost,
    }))
}

/// Admin view of every reservation, newest entry first
pub async fn list_all_reservations(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<Json<Vec<ReservationRecord>>, ApiError> {
    ctx.require_admin()?;
    let reservations = ReservationRecord::list_all(&state.db).await?;
    Ok(Json(reservations))
}
