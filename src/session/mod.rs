//! Client-side application session
//!
//! Everything a front end keeps between pages: who is signed in, the booking
//! being assembled, and the comparison list. The session is an explicit
//! value; only identity and token are persisted.

pub mod compare;
pub mod routes;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::models::package::{self, Package};
use crate::models::{InstructorCard, NewBooking, UserSummary};
pub use compare::ComparisonList;
pub use routes::{Guard, Route};

/// Step of the search → profile → pricing → confirm → payment flow the
/// current selection has reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Search,
    Profile,
    Pricing,
    Confirm,
    Payment,
}

impl Stage {
    pub fn route(&self, selection: &BookingSelection) -> Route {
        match self {
            Stage::Search => Route::Search,
            Stage::Profile => selection
                .instructor
                .as_ref()
                .map(|i| Route::Instructor(i.id.clone()))
                .unwrap_or(Route::Search),
            Stage::Pricing => Route::Pricing,
            Stage::Confirm => Route::BookingConfirm,
            Stage::Payment => Route::Payment,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingSelection {
    pub instructor: Option<InstructorCard>,
    pub package: Option<&'static Package>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Please login to complete booking")]
    LoginRequired,

    #[error("No booking details found")]
    IncompleteSelection,
}

impl CheckoutError {
    /// Where the client should go instead
    pub fn redirect(&self) -> Route {
        match self {
            CheckoutError::LoginRequired => Route::Login,
            CheckoutError::IncompleteSelection => Route::Search,
        }
    }
}

/// Persisted identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct Snapshot {
    user: UserSummary,
    token: String,
}

#[derive(Debug, Clone, Default)]
pub struct AppSession {
    user: Option<UserSummary>,
    token: Option<String>,
    selection: BookingSelection,
    comparison: ComparisonList,
}

impl AppSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&mut self, user: UserSummary, token: String) {
        self.user = Some(user);
        self.token = Some(token);
    }

    /// Forget the user, their token and the booking in progress
    pub fn logout(&mut self) {
        self.user = None;
        self.token = None;
        self.selection = BookingSelection::default();
    }

    pub fn user(&self) -> Option<&UserSummary> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn selection(&self) -> &BookingSelection {
        &self.selection
    }

    pub fn select_instructor(&mut self, instructor: InstructorCard) {
        self.selection.instructor = Some(instructor);
    }

    /// Pick a catalog package by id. Returns false for unknown ids.
    pub fn select_package(&mut self, package_id: &str) -> bool {
        match package::find(package_id) {
            Some(package) => {
                self.selection.package = Some(package);
                true
            }
            None => false,
        }
    }

    pub fn select_date(&mut self, date: impl Into<String>) {
        self.selection.date = Some(date.into());
    }

    pub fn comparison(&self) -> &ComparisonList {
        &self.comparison
    }

    pub fn comparison_mut(&mut self) -> &mut ComparisonList {
        &mut self.comparison
    }

    pub fn stage(&self) -> Stage {
        let s = &self.selection;
        match (&s.instructor, s.package, &s.date) {
            (None, _, _) => Stage::Search,
            (Some(_), None, _) => Stage::Profile,
            (Some(_), Some(_), None) => Stage::Pricing,
            (Some(_), Some(_), Some(_)) if self.user.is_none() => Stage::Confirm,
            (Some(_), Some(_), Some(_)) => Stage::Payment,
        }
    }

    pub fn guard(&self, route: &Route) -> Guard {
        route.guard(self.user())
    }

    /// Booking request for the payment step. Without a chosen date the
    /// lesson is requested for now.
    pub fn checkout(&self) -> Result<NewBooking, CheckoutError> {
        let user = self.user.as_ref().ok_or(CheckoutError::LoginRequired)?;
        let (Some(instructor), Some(package)) = (&self.selection.instructor, self.selection.package) else {
            return Err(CheckoutError::IncompleteSelection);
        };

        Ok(NewBooking {
            learner_id: user.id.clone(),
            instructor_id: instructor.id.clone(),
            date: self
                .selection
                .date
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339()),
            package_id: Some(package.id.to_string()),
        })
    }

    /// Write the signed-in identity to `path`, or remove the file when
    /// signed out
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let (Some(user), Some(token)) = (&self.user, &self.token) else {
            if path.exists() {
                std::fs::remove_file(path).context("Failed to remove session file")?;
            }
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create session directory")?;
        }
        let snapshot = Snapshot { user: user.clone(), token: token.clone() };
        let contents = serde_json::to_string_pretty(&snapshot).context("Failed to serialize session")?;
        std::fs::write(path, contents).context("Failed to write session file")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set file permissions")?;
        }
        Ok(())
    }

    /// Restore identity from `path`. A missing file is a signed-out session.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut session = Self::new();
        if !path.exists() {
            return Ok(session);
        }
        let contents = std::fs::read_to_string(path).context("Failed to read session file")?;
        let snapshot: Snapshot = serde_json::from_str(&contents).context("Failed to parse session file")?;
        session.login(snapshot.user, snapshot.token);
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Performance;
    use crate::types::Role;
    use tempfile::tempdir;

    fn learner() -> UserSummary {
        UserSummary {
            id: "lee".into(),
            name: "Lee".into(),
            email: "lee@example.com".into(),
            role: Role::Learner,
        }
    }

    fn instructor() -> InstructorCard {
        InstructorCard {
            id: "sarah".into(),
            name: "Sarah".into(),
            location: None,
            vehicle: None,
            price: Some(75),
            bio: None,
            image: None,
            rating: 4.8,
            reviews: 0,
            performance: Performance::default(),
        }
    }

    #[test]
    fn test_stage_follows_selection() {
        let mut session = AppSession::new();
        assert_eq!(session.stage(), Stage::Search);

        session.select_instructor(instructor());
        assert_eq!(session.stage(), Stage::Profile);
        assert_eq!(
            session.stage().route(session.selection()),
            Route::Instructor("sarah".into())
        );

        assert!(!session.select_package("p9"));
        assert!(session.select_package("p3"));
        assert_eq!(session.stage(), Stage::Pricing);

        session.select_date("2026-11-02T09:00:00Z");
        assert_eq!(session.stage(), Stage::Confirm);

        session.login(learner(), "token".into());
        assert_eq!(session.stage(), Stage::Payment);
    }

    #[test]
    fn test_checkout_requires_login_then_selection() {
        let mut session = AppSession::new();
        session.select_instructor(instructor());
        session.select_package("p2");
        let err = session.checkout().unwrap_err();
        assert_eq!(err, CheckoutError::LoginRequired);
        assert_eq!(err.redirect(), Route::Login);

        let mut session = AppSession::new();
        session.login(learner(), "token".into());
        assert_eq!(session.checkout().unwrap_err().redirect(), Route::Search);
    }

    #[test]
    fn test_checkout_builds_booking_with_fallback_date() {
        let mut session = AppSession::new();
        session.login(learner(), "token".into());
        session.select_instructor(instructor());
        session.select_package("p4");

        let booking = session.checkout().unwrap();
        assert_eq!(booking.learner_id, "lee");
        assert_eq!(booking.instructor_id, "sarah");
        assert_eq!(booking.package_id.as_deref(), Some("p4"));
        assert!(chrono::DateTime::parse_from_rfc3339(&booking.date).is_ok());
        assert!(booking.validate().is_ok());
    }

    #[test]
    fn test_logout_clears_identity_and_selection() {
        let mut session = AppSession::new();
        session.login(learner(), "token".into());
        session.select_instructor(instructor());
        session.comparison_mut().add(instructor());

        session.logout();
        assert!(session.user().is_none());
        assert!(session.token().is_none());
        assert_eq!(session.selection(), &BookingSelection::default());
        assert_eq!(session.comparison().len(), 1);
        assert_eq!(session.guard(&Route::Dashboard), Guard::Redirect(Route::Login));
    }

    #[test]
    fn test_snapshot_persists_identity_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut session = AppSession::new();
        session.login(learner(), "jwt".into());
        session.select_instructor(instructor());
        session.save_to(&path).unwrap();

        let restored = AppSession::load_from(&path).unwrap();
        assert_eq!(restored.user(), Some(&learner()));
        assert_eq!(restored.token(), Some("jwt"));
        assert!(restored.selection().instructor.is_none());

        session.logout();
        session.save_to(&path).unwrap();
        assert!(!path.exists());
        assert!(AppSession::load_from(&path).unwrap().user().is_none());
    }
}
