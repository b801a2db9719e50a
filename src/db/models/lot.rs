//! Parking lot models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::spot::ParkingSpot;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParkingLot {
    pub id: String,
    pub name: String,
    pub price_per_hour: f64,
    pub address: String,
    pub pincode: String,
    pub max_spots: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ParkingLot {
    pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<ParkingLot>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM parking_lots WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All lots with a live available-spot count each, newest first
    pub async fn list_with_availability(
        pool: &SqlitePool,
    ) -> Result<Vec<LotWithAvailability>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT l.*,
                   (SELECT COUNT(*) FROM parking_spots s
                    WHERE s.lot_id = l.id AND s.status = 'available') AS available_spots
            FROM parking_lots l
            ORDER BY l.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn count_spots(&self, pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM parking_spots WHERE lot_id = ?")
            .bind(&self.id)
            .fetch_one(pool)
            .await?;
        Ok(count.0)
    }

    /// Number of reservations (open or closed) ever made against this lot's
    /// spots. Nonzero blocks lot deletion.
    pub async fn reservation_history_count(&self, pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM reservations r
            JOIN parking_spots s ON s.id = r.spot_id
            WHERE s.lot_id = ?
            "#,
        )
        .bind(&self.id)
        .fetch_one(pool)
        .await?;
        Ok(count.0)
    }
}

/// Lot with its live available-spot count, for dashboards and search results
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LotWithAvailability {
    pub id: String,
    pub name: String,
    pub price_per_hour: f64,
    pub address: String,
    pub pincode: String,
    pub max_spots: i64,
    pub created_at: String,
    pub updated_at: String,
    pub available_spots: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateLotRequest {
    pub name: String,
    pub price_per_hour: f64,
    pub address: String,
    pub pincode: String,
    pub max_spots: i64,
}

/// The edit form resubmits every field, including the new capacity
#[derive(Debug, Deserialize)]
pub struct UpdateLotRequest {
    pub name: String,
    pub price_per_hour: f64,
    pub address: String,
    pub pincode: String,
    pub max_spots: i64,
}

/// Lot detail view: the lot plus one page of its spots
#[derive(Debug, Serialize)]
pub struct LotDetailResponse {
    pub lot: ParkingLot,
    pub spots: Vec<ParkingSpot>,
    pub page: i64,
    pub per_page: i64,
    pub total_spots: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchLotsQuery {
    pub search_by: Option<String>,
    pub query: Option<String>,
}

/// Admin lot search result. A bad filter key or unparsable price query is
/// reported through `error` alongside an empty result set, never as a crash.
#[derive(Debug, Serialize)]
pub struct LotSearchResponse {
    pub lots: Vec<LotWithAvailability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NearbySearchRequest {
    pub location: String,
}

/// User-facing lot search result with availability counts
#[derive(Debug, Serialize)]
pub struct NearbySearchResponse {
    pub lots: Vec<LotWithAvailability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
