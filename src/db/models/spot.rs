//! Parking spot models.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::reservation::ReservationRecord;

/// Occupancy state of a spot. Cycles available -> occupied -> available in
/// lockstep with its current open reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotStatus {
    Available,
    Occupied,
}

impl SpotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpotStatus::Available => "available",
            SpotStatus::Occupied => "occupied",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(SpotStatus::Available),
            "occupied" => Some(SpotStatus::Occupied),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParkingSpot {
    pub id: String,
    pub lot_id: String,
    pub spot_number: String,
    pub spot_index: i64,
    pub status: String,
}

impl ParkingSpot {
    pub fn is_available(&self) -> bool {
        self.status == SpotStatus::Available.as_str()
    }

    pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<ParkingSpot>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM parking_spots WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One page of a lot's spots in creation order
    pub async fn page_for_lot(
        pool: &SqlitePool,
        lot_id: &str,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<ParkingSpot>, sqlx::Error> {
        sqlx::query_as(
            "SELECT * FROM parking_spots WHERE lot_id = ? ORDER BY spot_index ASC LIMIT ? OFFSET ?",
        )
        .bind(lot_id)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(pool)
        .await
    }
}

/// Spot detail view. When an open reservation holds the spot, the response
/// carries it along with a live cost estimate at the current clock.
#[derive(Debug, Serialize)]
pub struct SpotDetailResponse {
    pub spot: ParkingSpot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation: Option<ReservationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
}
