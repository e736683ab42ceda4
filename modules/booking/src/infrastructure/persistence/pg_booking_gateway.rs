//! PostgreSQL implementation of the Inventory Store Gateway (C1).
//!
//! Every fetch-and-lock query ends in `FOR UPDATE`, holding the row's
//! exclusive lock for the lifetime of the transaction. Two sessions
//! contending on the same row serialize at the database; the second blocks
//! until the first commits or rolls back. `classify_store_error` turns a
//! driver-level deadlock or serialization failure into `STORE_CONFLICT` so
//! the Coordinator's retry wrapper can react to it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::entities::{Reservation, Sale, Screening, Seat};
use crate::domain::repositories::{BookingGateway, BookingSession};
use crate::domain::value_objects::{
    ReservationId, ReservationStatus, SaleId, ScreeningId, SeatId, SeatStatus,
};
use crate::BookingError;

/// Opens transactional sessions against Postgres. Cloned cheaply; `PgPool`
/// is itself a handle around a connection pool shared by every replica's
/// gateway instance.
pub struct PgBookingGateway {
    pool: PgPool,
}

impl PgBookingGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingGateway for PgBookingGateway {
    async fn begin(&self) -> Result<Box<dyn BookingSession>, BookingError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(BookingError::classify_store_error)?;
        Ok(Box::new(PgBookingSession { tx: Some(tx) }))
    }
}

/// A single Postgres transaction. Every method below runs within it; the
/// transaction is either committed or rolled back exactly once per session,
/// dropping it otherwise rolls back implicitly (sqlx's `Transaction::drop`).
pub struct PgBookingSession {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgBookingSession {
    fn tx(&mut self) -> &mut Transaction<'static, Postgres> {
        self.tx.as_mut().expect("session used after commit/rollback")
    }
}

fn seat_from_row(row: &sqlx::postgres::PgRow, prefix: &str) -> Result<Seat, BookingError> {
    let status: String = row.try_get(format!("{prefix}_status").as_str())?;
    Ok(Seat::reconstitute(
        SeatId::from_uuid(row.try_get(format!("{prefix}_id").as_str())?),
        ScreeningId::from_uuid(row.try_get(format!("{prefix}_screening_id").as_str())?),
        row.try_get(format!("{prefix}_label").as_str())?,
        row.try_get(format!("{prefix}_row").as_str())?,
        status.parse()?,
        row.try_get(format!("{prefix}_created_at").as_str())?,
        row.try_get(format!("{prefix}_updated_at").as_str())?,
    ))
}

fn reservation_from_row(row: &sqlx::postgres::PgRow, prefix: &str) -> Result<Reservation, BookingError> {
    let status: String = row.try_get(format!("{prefix}_status").as_str())?;
    Ok(Reservation::reconstitute(
        ReservationId::from_uuid(row.try_get(format!("{prefix}_id").as_str())?),
        SeatId::from_uuid(row.try_get(format!("{prefix}_seat_id").as_str())?),
        row.try_get(format!("{prefix}_user_id").as_str())?,
        status.parse()?,
        row.try_get(format!("{prefix}_expires_at").as_str())?,
        row.try_get(format!("{prefix}_created_at").as_str())?,
        row.try_get(format!("{prefix}_updated_at").as_str())?,
    ))
}

fn screening_from_row(row: &sqlx::postgres::PgRow, prefix: &str) -> Result<Screening, BookingError> {
    Ok(Screening::reconstitute(
        ScreeningId::from_uuid(row.try_get(format!("{prefix}_id").as_str())?),
        row.try_get(format!("{prefix}_movie_name").as_str())?,
        row.try_get(format!("{prefix}_start_time").as_str())?,
        row.try_get(format!("{prefix}_room_number").as_str())?,
        row.try_get(format!("{prefix}_ticket_price").as_str())?,
        row.try_get(format!("{prefix}_is_active").as_str())?,
        row.try_get(format!("{prefix}_created_at").as_str())?,
        row.try_get(format!("{prefix}_updated_at").as_str())?,
    ))
}

fn sale_from_row(row: &sqlx::postgres::PgRow) -> Result<Sale, BookingError> {
    Ok(Sale::reconstitute(
        SaleId::from_uuid(row.try_get("id")?),
        SeatId::from_uuid(row.try_get("seat_id")?),
        row.try_get("user_id")?,
        ReservationId::from_uuid(row.try_get("reservation_id")?),
        row.try_get("amount")?,
        row.try_get("paid_at")?,
        row.try_get("created_at")?,
    ))
}

#[async_trait]
impl BookingSession for PgBookingSession {
    async fn find_screening(&mut self, screening_id: ScreeningId) -> Result<Option<Screening>, BookingError> {
        let row = sqlx::query(
            r#"
            SELECT id as sc_id, movie_name as sc_movie_name, start_time as sc_start_time,
                   room_number as sc_room_number, ticket_price as sc_ticket_price,
                   is_active as sc_is_active, created_at as sc_created_at, updated_at as sc_updated_at
            FROM screenings
            WHERE id = $1
            "#,
        )
        .bind(screening_id.into_uuid())
        .fetch_optional(self.tx().as_mut())
        .await
        .map_err(BookingError::classify_store_error)?;

        row.as_ref().map(|r| screening_from_row(r, "sc")).transpose()
    }

    async fn fetch_and_lock_seat(
        &mut self,
        screening_id: ScreeningId,
        label: &str,
    ) -> Result<Option<Seat>, BookingError> {
        let row = sqlx::query(
            r#"
            SELECT id as s_id, screening_id as s_screening_id, label as s_label, row as s_row,
                   status as s_status, created_at as s_created_at, updated_at as s_updated_at
            FROM seats
            WHERE screening_id = $1 AND label = $2
            FOR UPDATE
            "#,
        )
        .bind(screening_id.into_uuid())
        .bind(label)
        .fetch_optional(self.tx().as_mut())
        .await
        .map_err(BookingError::classify_store_error)?;

        row.as_ref().map(|r| seat_from_row(r, "s")).transpose()
    }

    async fn fetch_and_lock_reservation_for_buyer(
        &mut self,
        reservation_id: ReservationId,
        buyer_id: &str,
    ) -> Result<Option<(Reservation, Seat, Screening)>, BookingError> {
        let row = sqlx::query(
            r#"
            SELECT r.id as r_id, r.seat_id as r_seat_id, r.user_id as r_user_id, r.status as r_status,
                   r.expires_at as r_expires_at, r.created_at as r_created_at, r.updated_at as r_updated_at,
                   s.id as s_id, s.screening_id as s_screening_id, s.label as s_label, s.row as s_row,
                   s.status as s_status, s.created_at as s_created_at, s.updated_at as s_updated_at,
                   sc.id as sc_id, sc.movie_name as sc_movie_name, sc.start_time as sc_start_time,
                   sc.room_number as sc_room_number, sc.ticket_price as sc_ticket_price,
                   sc.is_active as sc_is_active, sc.created_at as sc_created_at, sc.updated_at as sc_updated_at
            FROM reservations r
            JOIN seats s ON s.id = r.seat_id
            JOIN screenings sc ON sc.id = s.screening_id
            WHERE r.id = $1 AND r.user_id = $2
            FOR UPDATE OF r, s
            "#,
        )
        .bind(reservation_id.into_uuid())
        .bind(buyer_id)
        .fetch_optional(self.tx().as_mut())
        .await
        .map_err(BookingError::classify_store_error)?;

        let Some(row) = row else { return Ok(None) };
        Ok(Some((
            reservation_from_row(&row, "r")?,
            seat_from_row(&row, "s")?,
            screening_from_row(&row, "sc")?,
        )))
    }

    async fn fetch_and_lock_reservation(
        &mut self,
        reservation_id: ReservationId,
    ) -> Result<Option<(Reservation, Seat)>, BookingError> {
        let row = sqlx::query(
            r#"
            SELECT r.id as r_id, r.seat_id as r_seat_id, r.user_id as r_user_id, r.status as r_status,
                   r.expires_at as r_expires_at, r.created_at as r_created_at, r.updated_at as r_updated_at,
                   s.id as s_id, s.screening_id as s_screening_id, s.label as s_label, s.row as s_row,
                   s.status as s_status, s.created_at as s_created_at, s.updated_at as s_updated_at
            FROM reservations r
            JOIN seats s ON s.id = r.seat_id
            WHERE r.id = $1
            FOR UPDATE OF r, s
            "#,
        )
        .bind(reservation_id.into_uuid())
        .fetch_optional(self.tx().as_mut())
        .await
        .map_err(BookingError::classify_store_error)?;

        let Some(row) = row else { return Ok(None) };
        Ok(Some((reservation_from_row(&row, "r")?, seat_from_row(&row, "s")?)))
    }

    async fn fetch_and_lock_pending_siblings(
        &mut self,
        buyer_id: &str,
        screening_id: ScreeningId,
        expires_at: DateTime<Utc>,
    ) -> Result<Vec<(Reservation, Seat)>, BookingError> {
        let rows = sqlx::query(
            r#"
            SELECT r.id as r_id, r.seat_id as r_seat_id, r.user_id as r_user_id, r.status as r_status,
                   r.expires_at as r_expires_at, r.created_at as r_created_at, r.updated_at as r_updated_at,
                   s.id as s_id, s.screening_id as s_screening_id, s.label as s_label, s.row as s_row,
                   s.status as s_status, s.created_at as s_created_at, s.updated_at as s_updated_at
            FROM reservations r
            JOIN seats s ON s.id = r.seat_id
            WHERE r.user_id = $1 AND s.screening_id = $2 AND r.expires_at = $3 AND r.status = 'pending'
            ORDER BY s.label
            FOR UPDATE OF r, s
            "#,
        )
        .bind(buyer_id)
        .bind(screening_id.into_uuid())
        .bind(expires_at)
        .fetch_all(self.tx().as_mut())
        .await
        .map_err(BookingError::classify_store_error)?;

        rows.iter()
            .map(|row| Ok((reservation_from_row(row, "r")?, seat_from_row(row, "s")?)))
            .collect()
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> Result<(), BookingError> {
        sqlx::query(
            r#"
            INSERT INTO reservations (id, seat_id, user_id, status, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(reservation.id().into_uuid())
        .bind(reservation.seat_id().into_uuid())
        .bind(reservation.buyer_id())
        .bind(reservation.status().to_string())
        .bind(reservation.expires_at())
        .bind(reservation.created_at())
        .bind(reservation.updated_at())
        .execute(self.tx().as_mut())
        .await
        .map_err(BookingError::classify_store_error)?;

        Ok(())
    }

    async fn insert_sale(&mut self, sale: &Sale) -> Result<(), BookingError> {
        sqlx::query(
            r#"
            INSERT INTO sales (id, seat_id, user_id, reservation_id, amount, paid_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(sale.id().into_uuid())
        .bind(sale.seat_id().into_uuid())
        .bind(sale.buyer_id())
        .bind(sale.reservation_id().into_uuid())
        .bind(sale.amount())
        .bind(sale.paid_at())
        .bind(sale.created_at())
        .execute(self.tx().as_mut())
        .await
        .map_err(BookingError::classify_store_error)?;

        Ok(())
    }

    async fn update_seat_status(&mut self, seat_id: SeatId, status: SeatStatus) -> Result<(), BookingError> {
        let row = sqlx::query(
            r#"
            SELECT id as s_id, screening_id as s_screening_id, label as s_label, row as s_row,
                   status as s_status, created_at as s_created_at, updated_at as s_updated_at
            FROM seats
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(seat_id.into_uuid())
        .fetch_optional(self.tx().as_mut())
        .await
        .map_err(BookingError::classify_store_error)?
        .ok_or_else(|| BookingError::SeatNotFound(seat_id.into_uuid().to_string()))?;

        let mut seat = seat_from_row(&row, "s")?;
        match status {
            SeatStatus::Available => seat.release()?,
            SeatStatus::Reserved => seat.reserve()?,
            SeatStatus::Sold => seat.sell()?,
        }

        sqlx::query(
            r#"
            UPDATE seats SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(seat_id.into_uuid())
        .bind(seat.status().to_string())
        .execute(self.tx().as_mut())
        .await
        .map_err(BookingError::classify_store_error)?;

        Ok(())
    }

    async fn update_reservation_status(
        &mut self,
        reservation_id: ReservationId,
        status: ReservationStatus,
    ) -> Result<(), BookingError> {
        let row = sqlx::query(
            r#"
            SELECT id as r_id, seat_id as r_seat_id, user_id as r_user_id, status as r_status,
                   expires_at as r_expires_at, created_at as r_created_at, updated_at as r_updated_at
            FROM reservations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(reservation_id.into_uuid())
        .fetch_optional(self.tx().as_mut())
        .await
        .map_err(BookingError::classify_store_error)?
        .ok_or_else(|| BookingError::ReservationNotFound(reservation_id.into_uuid()))?;

        let mut reservation = reservation_from_row(&row, "r")?;
        match status {
            ReservationStatus::Confirmed => reservation.confirm()?,
            ReservationStatus::Expired => reservation.expire()?,
            other => {
                return Err(BookingError::InvalidState(format!(
                    "gateway does not support transitioning to {other}"
                )))
            }
        }

        sqlx::query(
            r#"
            UPDATE reservations SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(reservation_id.into_uuid())
        .bind(reservation.status().to_string())
        .execute(self.tx().as_mut())
        .await
        .map_err(BookingError::classify_store_error)?;

        Ok(())
    }

    async fn find_sale_by_reservation(&mut self, reservation_id: ReservationId) -> Result<Option<Sale>, BookingError> {
        let row = sqlx::query(
            r#"
            SELECT id, seat_id, user_id, reservation_id, amount, paid_at, created_at
            FROM sales
            WHERE reservation_id = $1
            "#,
        )
        .bind(reservation_id.into_uuid())
        .fetch_optional(self.tx().as_mut())
        .await
        .map_err(BookingError::classify_store_error)?;

        row.as_ref().map(sale_from_row).transpose()
    }

    async fn commit(mut self: Box<Self>) -> Result<(), BookingError> {
        let tx = self.tx.take().expect("session used after commit/rollback");
        tx.commit().await.map_err(BookingError::classify_store_error)
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), BookingError> {
        let tx = self.tx.take().expect("session used after commit/rollback");
        tx.rollback().await.map_err(BookingError::classify_store_error)
    }
}
