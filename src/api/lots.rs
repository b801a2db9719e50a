//! Admin parking lot endpoints: CRUD, capacity resizing, and search.
//!
//! Lot creation and resizing are multi-row writes and run inside a single
//! transaction; a failure part-way leaves the lot untouched.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    CreateLotRequest, LotDetailResponse, LotSearchResponse, LotWithAvailability,
    NearbySearchRequest, NearbySearchResponse, ParkingLot, ParkingSpot, SearchLotsQuery,
    SpotStatus, UpdateLotRequest,
};
use crate::AppState;

use super::auth::AuthContext;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    validate_address, validate_max_spots, validate_name, validate_pincode, validate_price,
};

const DEFAULT_SPOTS_PER_PAGE: i64 = 10;
const MAX_SPOTS_PER_PAGE: i64 = 100;

/// Spot numbers are prefixed with the first three alphanumeric characters
/// of the lot name, uppercased ("Central Mall" -> "CEN-1", "CEN-2", ...).
fn spot_prefix(name: &str) -> String {
    let prefix: String = name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    if prefix.is_empty() {
        "LOT".to_string()
    } else {
        prefix
    }
}

fn validate_lot_fields(
    name: &str,
    price_per_hour: f64,
    address: &str,
    pincode: &str,
    max_spots: i64,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_name(name) {
        errors.add("name", e);
    }
    if let Err(e) = validate_price(price_per_hour) {
        errors.add("price_per_hour", e);
    }
    if let Err(e) = validate_address(address) {
        errors.add("address", e);
    }
    if let Err(e) = validate_pincode(pincode) {
        errors.add("pincode", e);
    }
    if let Err(e) = validate_max_spots(max_spots) {
        errors.add("max_spots", e);
    }

    errors.finish()
}

/// Admin dashboard: every lot with its live available-spot count
pub async fn admin_dashboard(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<Json<Vec<LotWithAvailability>>, ApiError> {
    ctx.require_admin()?;
    let lots = ParkingLot::list_with_availability(&state.db).await?;
    Ok(Json(lots))
}

/// Create a lot and its full complement of spots in one transaction
pub async fn create_lot(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Json(req): Json<CreateLotRequest>,
) -> Result<(StatusCode, Json<ParkingLot>), ApiError> {
    ctx.require_admin()?;
    validate_lot_fields(
        &req.name,
        req.price_per_hour,
        &req.address,
        &req.pincode,
        req.max_spots,
    )?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let prefix = spot_prefix(&req.name);

    let mut tx = state.db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO parking_lots (id, name, price_per_hour, address, pincode, max_spots, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.name)
    .bind(req.price_per_hour)
    .bind(&req.address)
    .bind(&req.pincode)
    .bind(req.max_spots)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    for i in 1..=req.max_spots {
        sqlx::query(
            "INSERT INTO parking_spots (id, lot_id, spot_number, spot_index, status) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&id)
        .bind(format!("{}-{}", prefix, i))
        .bind(i)
        .bind(SpotStatus::Available.as_str())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(lot = %req.name, spots = req.max_spots, "Created parking lot");

    let lot = ParkingLot::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::internal("Lot vanished after insert"))?;

    Ok((StatusCode::CREATED, Json(lot)))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Lot detail: the lot plus one page of its spots
pub async fn get_lot(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Query(paging): Query<PageQuery>,
) -> Result<Json<LotDetailResponse>, ApiError> {
    ctx.require_admin()?;

    let lot = ParkingLot::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Parking lot not found"))?;

    let page = paging.page.unwrap_or(1).max(1);
    let per_page = paging
        .per_page
        .unwrap_or(DEFAULT_SPOTS_PER_PAGE)
        .clamp(1, MAX_SPOTS_PER_PAGE);

    let total_spots = lot.count_spots(&state.db).await?;
    let spots = ParkingSpot::page_for_lot(&state.db, &id, page, per_page).await?;

    Ok(Json(LotDetailResponse {
        lot,
        spots,
        page,
        per_page,
        total_spots,
    }))
}

/// Update a lot, growing or shrinking its spot set to the new capacity.
///
/// Growing appends fresh available spots, continuing the number sequence.
/// Shrinking removes the newest spots that are available AND have never
/// been reserved; if fewer such spots exist than the deficit, the whole
/// edit is rejected and the lot is left unchanged.
pub async fn update_lot(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateLotRequest>,
) -> Result<Json<ParkingLot>, ApiError> {
    ctx.require_admin()?;
    validate_lot_fields(
        &req.name,
        req.price_per_hour,
        &req.address,
        &req.pincode,
        req.max_spots,
    )?;

    let lot = ParkingLot::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Parking lot not found"))?;

    let now = chrono::Utc::now().to_rfc3339();
    let mut tx = state.db.begin().await?;

    let current: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM parking_spots WHERE lot_id = ?")
        .bind(&lot.id)
        .fetch_one(&mut *tx)
        .await?;
    let current = current.0;

    if req.max_spots > current {
        let max_index: (Option<i64>,) =
            sqlx::query_as("SELECT MAX(spot_index) FROM parking_spots WHERE lot_id = ?")
                .bind(&lot.id)
                .fetch_one(&mut *tx)
                .await?;
        let mut next_index = max_index.0.unwrap_or(0) + 1;
        let prefix = spot_prefix(&req.name);

        for _ in 0..(req.max_spots - current) {
            sqlx::query(
                "INSERT INTO parking_spots (id, lot_id, spot_number, spot_index, status) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&lot.id)
            .bind(format!("{}-{}", prefix, next_index))
            .bind(next_index)
            .bind(SpotStatus::Available.as_str())
            .execute(&mut *tx)
            .await?;
            next_index += 1;
        }
    } else if req.max_spots < current {
        let deficit = current - req.max_spots;

        // Only spots that are free right now and were never reserved may go
        let deletable: Vec<ParkingSpot> = sqlx::query_as(
            r#"
            SELECT s.* FROM parking_spots s
            LEFT JOIN reservations r ON r.spot_id = s.id
            WHERE s.lot_id = ? AND s.status = 'available' AND r.id IS NULL
            ORDER BY s.spot_index DESC
            LIMIT ?
            "#,
        )
        .bind(&lot.id)
        .bind(deficit)
        .fetch_all(&mut *tx)
        .await?;

        if (deletable.len() as i64) < deficit {
            return Err(ApiError::business_rule(format!(
                "Cannot reduce to {} spots. Only {} empty spots available.",
                req.max_spots,
                deletable.len()
            )));
        }

        for spot in &deletable {
            sqlx::query("DELETE FROM parking_spots WHERE id = ?")
                .bind(&spot.id)
                .execute(&mut *tx)
                .await?;
        }
    }

    sqlx::query(
        r#"
        UPDATE parking_lots SET
            name = ?, price_per_hour = ?, address = ?, pincode = ?, max_spots = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(req.price_per_hour)
    .bind(&req.address)
    .bind(&req.pincode)
    .bind(req.max_spots)
    .bind(&now)
    .bind(&lot.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(lot = %req.name, from = current, to = req.max_spots, "Updated parking lot");

    let lot = ParkingLot::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Parking lot not found"))?;

    Ok(Json(lot))
}

/// Delete a lot and its spots. Refused while any spot carries reservation
/// history, open or closed.
pub async fn delete_lot(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.require_admin()?;

    let lot = ParkingLot::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Parking lot not found"))?;

    if lot.reservation_history_count(&state.db).await? > 0 {
        return Err(ApiError::business_rule(
            "Cannot delete lot. Some spots have or had reservations.",
        ));
    }

    let mut tx = state.db.begin().await?;
    sqlx::query("DELETE FROM parking_spots WHERE lot_id = ?")
        .bind(&lot.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM parking_lots WHERE id = ?")
        .bind(&lot.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(lot = %lot.name, "Deleted parking lot");

    Ok(StatusCode::NO_CONTENT)
}

/// Admin lot search by one of: location, address, pincode, price.
///
/// Price means "price_per_hour <= query"; the rest are case-insensitive
/// substring matches. A missing or unknown filter, or an unparsable price,
/// yields an empty result with the reason spelled out.
pub async fn search_lots(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Query(params): Query<SearchLotsQuery>,
) -> Result<Json<LotSearchResponse>, ApiError> {
    ctx.require_admin()?;

    let search_by = params.search_by.unwrap_or_default().to_lowercase();
    let query = params.query.unwrap_or_default().trim().to_string();

    if search_by.is_empty() || query.is_empty() {
        return Ok(Json(LotSearchResponse {
            lots: vec![],
            error: Some("Missing search parameters".to_string()),
        }));
    }

    const AVAILABILITY_SELECT: &str = r#"
        SELECT l.*,
               (SELECT COUNT(*) FROM parking_spots s
                WHERE s.lot_id = l.id AND s.status = 'available') AS available_spots
        FROM parking_lots l
    "#;

    let lots: Vec<LotWithAvailability> = match search_by.as_str() {
        "location" | "address" | "pincode" => {
            let column = match search_by.as_str() {
                "location" => "name",
                "address" => "address",
                _ => "pincode",
            };
            let pattern = format!("%{}%", query.to_lowercase());
            sqlx::query_as(&format!(
                "{AVAILABILITY_SELECT} WHERE lower(l.{column}) LIKE ? ORDER BY l.created_at DESC"
            ))
            .bind(&pattern)
            .fetch_all(&state.db)
            .await?
        }
        "price" => {
            let Ok(price) = query.parse::<f64>() else {
                return Ok(Json(LotSearchResponse {
                    lots: vec![],
                    error: Some("Invalid value for price".to_string()),
                }));
            };
            sqlx::query_as(&format!(
                "{AVAILABILITY_SELECT} WHERE l.price_per_hour <= ? ORDER BY l.price_per_hour ASC"
            ))
            .bind(price)
            .fetch_all(&state.db)
            .await?
        }
        _ => {
            return Ok(Json(LotSearchResponse {
                lots: vec![],
                error: Some("Invalid search filter".to_string()),
            }));
        }
    };

    Ok(Json(LotSearchResponse { lots, error: None }))
}

/// User-facing lot search: exact pincode or substring-of-address match
pub async fn search_nearby(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Json(req): Json<NearbySearchRequest>,
) -> Result<Json<NearbySearchResponse>, ApiError> {
    ctx.require_user()?;

    let location = req.location.trim().to_string();
    if location.is_empty() {
        return Err(ApiError::validation_field(
            "location",
            "Please enter a location or pincode",
        ));
    }

    let pattern = format!("%{}%", location.to_lowercase());
    let lots: Vec<LotWithAvailability> = sqlx::query_as(
        r#"
        SELECT l.*,
               (SELECT COUNT(*) FROM parking_spots s
                WHERE s.lot_id = l.id AND s.status = 'available') AS available_spots
        FROM parking_lots l
        WHERE l.pincode = ? OR lower(l.address) LIKE ?
        ORDER BY l.created_at DESC
        "#,
    )
    .bind(&location)
    .bind(&pattern)
    .fetch_all(&state.db)
    .await?;

    let message = if lots.is_empty() {
        Some(format!("No parking lots found for '{}'.", location))
    } else {
        None
    };

    Ok(Json(NearbySearchResponse { lots, message }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spot_prefix() {
        assert_eq!(spot_prefix("Central Mall"), "CEN");
        assert_eq!(spot_prefix("a1 lot"), "A1L");
        assert_eq!(spot_prefix("xy"), "XY");
        assert_eq!(spot_prefix("  --  "), "LOT");
    }

    #[test]
    fn test_validate_lot_fields_collects_errors() {
        let err = validate_lot_fields("", -1.0, "", "12ab56", 0).unwrap_err();
        assert!(err.message().contains("5 fields"));

        assert!(validate_lot_fields("Central", 20.0, "12 MG Road", "560001", 3).is_ok());
    }
}
