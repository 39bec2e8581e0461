//! Lesson reviews

use chrono::{DateTime, Utc};
use rusqlite::params;
use rusqlite::types::Type;

use super::{has_role, new_id, Result, Store, StoreError};
use crate::models::{NewReview, Review, ReviewView};
use crate::types::Role;

/// RFC 3339 text column
fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

impl Store {
    /// Insert a review. Several reviews for the same booking are allowed.
    pub async fn create_review(&self, new: &NewReview) -> Result<Review> {
        let rating = new.validate()?;
        let review = Review {
            id: new_id(),
            booking_id: new.booking_id.clone(),
            instructor_id: new.instructor_id.clone(),
            learner_id: new.learner_id.clone(),
            rating,
            comment: new.comment.clone(),
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().await;
        if !has_role(&conn, &review.learner_id, Role::Learner)? {
            return Err(StoreError::UnknownReference("learner"));
        }
        if !has_role(&conn, &review.instructor_id, Role::Instructor)? {
            return Err(StoreError::UnknownReference("instructor"));
        }
        conn.execute(
            "INSERT INTO reviews (id, booking_id, instructor_id, learner_id, rating, comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                review.id,
                review.booking_id,
                review.instructor_id,
                review.learner_id,
                review.rating,
                review.comment,
                review.created_at.to_rfc3339(),
            ],
        )?;
        Ok(review)
    }

    /// Reviews of an instructor with the author's name, newest first
    pub async fn reviews_for_instructor(&self, instructor_id: &str) -> Result<Vec<ReviewView>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT r.id, r.booking_id, r.instructor_id, r.learner_id, r.rating, r.comment,
                    r.created_at, u.name
             FROM reviews r
             JOIN users u ON r.learner_id = u.id
             WHERE r.instructor_id = ?1
             ORDER BY r.created_at DESC",
        )?;
        let reviews = stmt
            .query_map(params![instructor_id], |row| {
                let created_at: String = row.get(6)?;
                Ok(ReviewView {
                    review: Review {
                        id: row.get(0)?,
                        booking_id: row.get(1)?,
                        instructor_id: row.get(2)?,
                        learner_id: row.get(3)?,
                        rating: row.get(4)?,
                        comment: row.get(5)?,
                        created_at: parse_timestamp(6, &created_at)?,
                    },
                    author_name: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::users::tests::account;

    fn review(rating: i64) -> NewReview {
        NewReview {
            booking_id: Some("b1".into()),
            instructor_id: "sarah".into(),
            learner_id: "lee".into(),
            rating,
            comment: Some("Great lesson".into()),
        }
    }

    #[tokio::test]
    async fn test_duplicate_reviews_allowed_and_aggregated() {
        let store = Store::open_in_memory().unwrap();
        store.insert_user(&account("lee", Role::Learner)).await.unwrap();
        store.insert_user(&account("sarah", Role::Instructor)).await.unwrap();

        store.create_review(&review(5)).await.unwrap();
        store.create_review(&review(4)).await.unwrap();

        let listed = store.reviews_for_instructor("sarah").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].author_name, "User lee");

        let card = &store.instructor_cards().await.unwrap()[0];
        assert_eq!(card.reviews, 2);
        assert_eq!(card.rating, 4.5);
    }

    #[tokio::test]
    async fn test_out_of_range_rating_rejected() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(store.create_review(&review(9)).await, Err(StoreError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_review_of_unknown_instructor_rejected() {
        let store = Store::open_in_memory().unwrap();
        store.insert_user(&account("lee", Role::Learner)).await.unwrap();
        assert!(matches!(
            store.create_review(&review(4)).await,
            Err(StoreError::UnknownReference("instructor"))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_timestamp_is_an_error() {
        let store = Store::open_in_memory().unwrap();
        store.insert_user(&account("lee", Role::Learner)).await.unwrap();
        store.insert_user(&account("sarah", Role::Instructor)).await.unwrap();
        store.create_review(&review(5)).await.unwrap();
        {
            let conn = store.conn.lock().await;
            conn.execute("UPDATE reviews SET created_at = 'last tuesday'", []).unwrap();
        }

        assert!(matches!(
            store.reviews_for_instructor("sarah").await,
            Err(StoreError::Sqlite(rusqlite::Error::FromSqlConversionFailure(6, Type::Text, _)))
        ));
    }
}
