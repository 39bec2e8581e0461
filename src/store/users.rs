//! Accounts, profiles and the instructor/learner directories

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{Result, Store, StoreError};
use crate::models::instructor::display_rating;
use crate::models::{InstructorCard, InstructorProfile, LearnerListing, Performance, ProfileUpdate, User, UserListing};
use crate::types::{Role, UserStatus};

const USER_COLUMNS: &str = "id, name, email, password, role, location, image, bio, vehicle, price, \
     languages, transmission, experience, licence_number, address, transmission_preference, status";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: row.get(4)?,
        location: row.get(5)?,
        image: row.get(6)?,
        bio: row.get(7)?,
        vehicle: row.get(8)?,
        price: row.get(9)?,
        languages: row.get(10)?,
        transmission: row.get(11)?,
        experience: row.get(12)?,
        licence_number: row.get(13)?,
        address: row.get(14)?,
        transmission_preference: row.get(15)?,
        status: row.get(16)?,
    })
}

/// Column/value pairs for the fields present in `update`
fn profile_columns(update: &ProfileUpdate) -> Vec<(&'static str, Value)> {
    fn text(v: &Option<String>) -> Option<Value> {
        v.as_ref().map(|s| Value::Text(s.clone()))
    }

    let candidates = [
        ("name", text(&update.name)),
        ("location", text(&update.location)),
        ("image", text(&update.image)),
        ("bio", text(&update.bio)),
        ("vehicle", update.vehicle.map(|v| Value::Text(v.as_str().to_string()))),
        ("price", update.price.map(Value::Integer)),
        ("languages", text(&update.languages)),
        ("transmission", text(&update.transmission)),
        ("experience", update.experience.map(Value::Integer)),
        ("licence_number", text(&update.licence_number)),
        ("address", text(&update.address)),
        ("transmission_preference", text(&update.transmission_preference)),
    ];

    candidates
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
        .collect()
}

fn role_of(conn: &Connection, id: &str) -> Result<Option<Role>> {
    Ok(conn
        .query_row("SELECT role FROM users WHERE id = ?1", params![id], |row| row.get(0))
        .optional()?)
}

fn admin_count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = 'admin'",
        [],
        |row| row.get(0),
    )?)
}

impl Store {
    /// Insert a new account. Emails are unique and only one admin may exist.
    pub async fn insert_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock().await;

        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
            params![user.email],
            |row| row.get(0),
        )?;
        if taken {
            return Err(StoreError::DuplicateEmail);
        }
        if user.role == Role::Admin && admin_count(&conn)? > 0 {
            return Err(StoreError::AdminExists);
        }

        conn.execute(
            &format!(
                "INSERT INTO users ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                USER_COLUMNS
            ),
            params![
                user.id,
                user.name,
                user.email,
                user.password_hash,
                user.role,
                user.location,
                user.image,
                user.bio,
                user.vehicle,
                user.price,
                user.languages,
                user.transmission,
                user.experience,
                user.licence_number,
                user.address,
                user.transmission_preference,
                user.status,
            ],
        )?;
        Ok(())
    }

    pub async fn user_by_id(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))?;
        Ok(stmt.query_row(params![id], user_from_row).optional()?)
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS))?;
        Ok(stmt
            .query_row(params![email.trim().to_lowercase()], user_from_row)
            .optional()?)
    }

    pub async fn list_users(&self) -> Result<Vec<UserListing>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, email, role, location, status FROM users ORDER BY name",
        )?;
        let users = stmt
            .query_map([], |row| {
                Ok(UserListing {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    role: row.get(3)?,
                    location: row.get(4)?,
                    status: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// Write the present fields of `update`, validated against the user's role
    pub async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> Result<()> {
        let conn = self.conn.lock().await;
        let role = role_of(&conn, id)?.ok_or(StoreError::NotFound("User"))?;
        update.validate_for(role)?;
        if update.is_empty() {
            return Err(crate::models::ValidationError::new("No valid fields to update").into());
        }

        let columns = profile_columns(update);

        let assignments = columns
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE users SET {} WHERE id = ?{}", assignments, columns.len() + 1);

        let mut values: Vec<Value> = columns.into_iter().map(|(_, v)| v).collect();
        values.push(Value::Text(id.to_string()));
        conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    pub async fn set_user_status(&self, id: &str, status: UserStatus) -> Result<()> {
        let conn = self.conn.lock().await;
        let changed = conn.execute("UPDATE users SET status = ?1 WHERE id = ?2", params![status, id])?;
        if changed == 0 {
            return Err(StoreError::NotFound("User"));
        }
        Ok(())
    }

    /// Delete an account and everything that references it. The last admin
    /// cannot be removed.
    pub async fn delete_user(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        let role = role_of(&conn, id)?.ok_or(StoreError::NotFound("User"))?;
        if role == Role::Admin && admin_count(&conn)? <= 1 {
            return Err(StoreError::LastAdmin);
        }
        conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Every instructor with their review aggregate
    pub async fn instructor_cards(&self) -> Result<Vec<InstructorCard>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT u.id, u.name, u.location, u.vehicle, u.price, u.bio, u.image,
                    AVG(r.rating), COUNT(r.id)
             FROM users u
             LEFT JOIN reviews r ON r.instructor_id = u.id
             WHERE u.role = 'instructor'
             GROUP BY u.id
             ORDER BY u.name",
        )?;
        let cards = stmt
            .query_map([], |row| {
                Ok(InstructorCard {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    location: row.get(2)?,
                    vehicle: row.get(3)?,
                    price: row.get(4)?,
                    bio: row.get(5)?,
                    image: row.get(6)?,
                    rating: display_rating(row.get(7)?),
                    reviews: row.get(8)?,
                    performance: Performance::default(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    pub async fn instructor_profile(&self, id: &str) -> Result<Option<InstructorProfile>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM users WHERE id = ?1 AND role = 'instructor'",
            USER_COLUMNS
        ))?;
        let Some(user) = stmt.query_row(params![id], user_from_row).optional()? else {
            return Ok(None);
        };

        let (average, count): (Option<f64>, i64) = conn.query_row(
            "SELECT AVG(rating), COUNT(*) FROM reviews WHERE instructor_id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(Some(InstructorProfile {
            user,
            rating: display_rating(average),
            reviews: count,
            performance: Performance::default(),
        }))
    }

    pub async fn learners(&self) -> Result<Vec<LearnerListing>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, location, bio, image, transmission_preference
             FROM users WHERE role = 'learner' ORDER BY name",
        )?;
        let learners = stmt
            .query_map([], |row| {
                Ok(LearnerListing {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    location: row.get(2)?,
                    bio: row.get(3)?,
                    image: row.get(4)?,
                    transmission_preference: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(learners)
    }
}
