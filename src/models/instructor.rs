//! Instructor cards, profiles and search

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::User;
use crate::types::Vehicle;

/// Rating shown for instructors nobody has reviewed yet
pub const DEFAULT_RATING: f64 = 4.8;

/// Radar-chart scores. Not collected yet, so every instructor gets the same
/// placeholder block.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Performance {
    pub punctuality: u8,
    pub clarity: u8,
    pub patience: u8,
    pub knowledge: u8,
    pub safety: u8,
}

impl Default for Performance {
    fn default() -> Self {
        Self {
            punctuality: 95,
            clarity: 95,
            patience: 95,
            knowledge: 95,
            safety: 95,
        }
    }
}

/// Mean review rating rounded to one decimal, or [`DEFAULT_RATING`]
pub fn display_rating(average: Option<f64>) -> f64 {
    match average {
        Some(avg) => (avg * 10.0).round() / 10.0,
        None => DEFAULT_RATING,
    }
}

/// Search-result card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstructorCard {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub vehicle: Option<Vehicle>,
    pub price: Option<i64>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub rating: f64,
    pub reviews: i64,
    pub performance: Performance,
}

/// Full profile page
#[derive(Debug, Clone, Serialize)]
pub struct InstructorProfile {
    #[serde(flatten)]
    pub user: User,
    pub rating: f64,
    pub reviews: i64,
    pub performance: Performance,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub enum VehicleFilter {
    #[default]
    All,
    Auto,
    Manual,
}

impl VehicleFilter {
    fn matches(&self, vehicle: Option<Vehicle>) -> bool {
        match self {
            VehicleFilter::All => true,
            VehicleFilter::Auto => vehicle == Some(Vehicle::Auto),
            VehicleFilter::Manual => vehicle == Some(Vehicle::Manual),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Rating,
    Price,
}

/// Query string of `GET /api/instructors`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub vehicle: VehicleFilter,
    #[serde(default)]
    pub sort: SortBy,
}

impl SearchQuery {
    /// Filter by vehicle, then order best-rated first or cheapest first.
    /// Instructors without a price sort last.
    pub fn apply(&self, cards: Vec<InstructorCard>) -> Vec<InstructorCard> {
        let mut results: Vec<InstructorCard> = cards
            .into_iter()
            .filter(|c| self.vehicle.matches(c.vehicle))
            .collect();

        match self.sort {
            SortBy::Rating => results.sort_by(|a, b| {
                b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal)
            }),
            SortBy::Price => results.sort_by_key(|c| c.price.unwrap_or(i64::MAX)),
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, vehicle: Vehicle, price: i64, rating: f64) -> InstructorCard {
        InstructorCard {
            id: id.into(),
            name: id.into(),
            location: None,
            vehicle: Some(vehicle),
            price: Some(price),
            bio: None,
            image: None,
            rating,
            reviews: 0,
            performance: Performance::default(),
        }
    }

    fn sample() -> Vec<InstructorCard> {
        vec![
            card("sarah", Vehicle::Auto, 75, 4.9),
            card("mike", Vehicle::Manual, 80, 4.7),
            card("emily", Vehicle::Auto, 70, 4.8),
        ]
    }

    #[test]
    fn test_filter_by_vehicle() {
        let query = SearchQuery { vehicle: VehicleFilter::Manual, sort: SortBy::Rating };
        let ids: Vec<_> = query.apply(sample()).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["mike"]);
    }

    #[test]
    fn test_sort_by_rating_then_price() {
        let by_rating = SearchQuery::default().apply(sample());
        assert_eq!(by_rating[0].id, "sarah");

        let by_price = SearchQuery { vehicle: VehicleFilter::All, sort: SortBy::Price }.apply(sample());
        let ids: Vec<_> = by_price.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["emily", "sarah", "mike"]);
    }

    #[test]
    fn test_display_rating() {
        assert_eq!(display_rating(None), DEFAULT_RATING);
        assert_eq!(display_rating(Some(4.666)), 4.7);
    }
}
