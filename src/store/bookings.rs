//! Booking records and lifecycle updates

use rusqlite::{params, OptionalExtension, Row};
use tracing::warn;

use super::{has_role, new_id, Result, Store, StoreError};
use crate::models::{Acceptance, Booking, BookingStatus, BookingView, NewBooking, Transition};
use crate::types::Role;

fn booking_from_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: row.get("id")?,
        learner_id: row.get("learner_id")?,
        instructor_id: row.get("instructor_id")?,
        date: row.get("date")?,
        package_id: row.get("package_id")?,
        status: row.get("status")?,
        accepted: row.get("accepted")?,
    })
}

impl Store {
    /// Record a new lesson request. Both parties must exist with the
    /// matching role.
    pub async fn create_booking(&self, new: &NewBooking) -> Result<Booking> {
        new.validate()?;
        let conn = self.conn.lock().await;

        if !has_role(&conn, &new.learner_id, Role::Learner)? {
            return Err(StoreError::UnknownReference("learner"));
        }
        if !has_role(&conn, &new.instructor_id, Role::Instructor)? {
            return Err(StoreError::UnknownReference("instructor"));
        }

        let booking = Booking {
            id: new_id(),
            learner_id: new.learner_id.clone(),
            instructor_id: new.instructor_id.clone(),
            date: new.date.clone(),
            package_id: new.package_id.clone(),
            status: BookingStatus::Confirmed,
            accepted: Acceptance::Pending,
        };
        conn.execute(
            "INSERT INTO bookings (id, learner_id, instructor_id, date, status, package_id, accepted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                booking.id,
                booking.learner_id,
                booking.instructor_id,
                booking.date,
                booking.status,
                booking.package_id,
                booking.accepted,
            ],
        )?;
        Ok(booking)
    }

    pub async fn booking(&self, id: &str) -> Result<Option<Booking>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached("SELECT * FROM bookings WHERE id = ?1")?;
        Ok(stmt.query_row(params![id], booking_from_row).optional()?)
    }

    /// A learner's bookings with the instructor's name and car
    pub async fn bookings_for_learner(&self, learner_id: &str) -> Result<Vec<BookingView>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT b.*, u.name AS instructor_name, u.vehicle AS vehicle
             FROM bookings b
             JOIN users u ON b.instructor_id = u.id
             WHERE b.learner_id = ?1
             ORDER BY b.date",
        )?;
        let bookings = stmt
            .query_map(params![learner_id], |row| {
                Ok(BookingView {
                    booking: booking_from_row(row)?,
                    learner_name: None,
                    instructor_name: row.get("instructor_name")?,
                    vehicle: row.get("vehicle")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bookings)
    }

    /// An instructor's bookings with the learner's name
    pub async fn bookings_for_instructor(&self, instructor_id: &str) -> Result<Vec<BookingView>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT b.*, u.name AS learner_name
             FROM bookings b
             JOIN users u ON b.learner_id = u.id
             WHERE b.instructor_id = ?1
             ORDER BY b.date",
        )?;
        let bookings = stmt
            .query_map(params![instructor_id], |row| {
                Ok(BookingView {
                    booking: booking_from_row(row)?,
                    learner_name: row.get("learner_name")?,
                    instructor_name: None,
                    vehicle: None,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bookings)
    }

    /// Every booking, newest lesson date first
    pub async fn all_bookings(&self) -> Result<Vec<BookingView>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT b.*, l.name AS learner_name, i.name AS instructor_name, i.vehicle AS vehicle
             FROM bookings b
             JOIN users l ON b.learner_id = l.id
             JOIN users i ON b.instructor_id = i.id
             ORDER BY b.date DESC",
        )?;
        let bookings = stmt
            .query_map([], |row| {
                Ok(BookingView {
                    booking: booking_from_row(row)?,
                    learner_name: row.get("learner_name")?,
                    instructor_name: row.get("instructor_name")?,
                    vehicle: row.get("vehicle")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bookings)
    }

    /// Apply a named transition and persist the resulting state
    pub async fn transition_booking(&self, id: &str, transition: Transition) -> Result<Booking> {
        let conn = self.conn.lock().await;
        let mut booking = conn
            .query_row("SELECT * FROM bookings WHERE id = ?1", params![id], booking_from_row)
            .optional()?
            .ok_or(StoreError::NotFound("Booking"))?;

        let next = booking.state().apply(transition)?;
        if next.completed_while_pending() {
            warn!("Booking {} completed while still awaiting instructor acceptance", id);
        }

        conn.execute(
            "UPDATE bookings SET status = ?1, accepted = ?2 WHERE id = ?3",
            params![next.status, next.acceptance, id],
        )?;
        booking.status = next.status;
        booking.accepted = next.acceptance;
        Ok(booking)
    }

    pub async fn delete_booking(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound("Booking"));
        }
        Ok(())
    }
}
