//! Reservation models and DTOs.
//!
//! A reservation is open while `exit_at` is null; releasing it stamps the
//! exit timestamp and the computed cost, and that transition is terminal.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: String,
    pub user_id: String,
    pub spot_id: String,
    pub vehicle_no: String,
    pub entry_at: String,
    pub exit_at: Option<String>,
    pub cost: Option<f64>,
}

impl Reservation {
    pub fn is_open(&self) -> bool {
        self.exit_at.is_none()
    }

    pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<Reservation>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM reservations WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The open reservation currently holding a spot, if any
    pub async fn open_for_spot(
        pool: &SqlitePool,
        spot_id: &str,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM reservations WHERE spot_id = ? AND exit_at IS NULL")
            .bind(spot_id)
            .fetch_optional(pool)
            .await
    }
}

/// Reservation joined with its spot, lot, and user for list views.
/// Joins are explicit here rather than navigated through object graphs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReservationRecord {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub spot_id: String,
    pub spot_number: String,
    pub lot_id: String,
    pub lot_name: String,
    pub price_per_hour: f64,
    pub vehicle_no: String,
    pub entry_at: String,
    pub exit_at: Option<String>,
    pub cost: Option<f64>,
}

const RECORD_SELECT: &str = r#"
    SELECT r.id, r.user_id, u.name AS user_name, r.spot_id, s.spot_number,
           l.id AS lot_id, l.name AS lot_name, l.price_per_hour,
           r.vehicle_no, r.entry_at, r.exit_at, r.cost
    FROM reservations r
    JOIN parking_spots s ON s.id = r.spot_id
    JOIN parking_lots l ON l.id = s.lot_id
    JOIN users u ON u.id = r.user_id
"#;

impl ReservationRecord {
    pub async fn find(
        pool: &SqlitePool,
        id: &str,
    ) -> Result<Option<ReservationRecord>, sqlx::Error> {
        sqlx::query_as(&format!("{RECORD_SELECT} WHERE r.id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A user's reservation history, newest entry first
    pub async fn list_for_user(
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<Vec<ReservationRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "{RECORD_SELECT} WHERE r.user_id = ? ORDER BY r.entry_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Every reservation in the system, newest entry first
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<ReservationRecord>, sqlx::Error> {
        sqlx::query_as(&format!("{RECORD_SELECT} ORDER BY r.entry_at DESC"))
            .fetch_all(pool)
            .await
    }
}

#[derive(Debug, Deserialize)]
pub struct BookRequest {
    pub vehicle_no: String,
}

/// Outcome of a successful release, echoing the billed amount
#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub reservation: ReservationRecord,
    pub cost: f64,
}
