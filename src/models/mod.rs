//! Domain models for the marketplace
//!
//! Plain data plus validation. Persistence lives in [`crate::store`], HTTP
//! shaping in [`crate::server`].

pub mod booking;
pub mod instructor;
pub mod package;
pub mod progress;
pub mod prompt;
pub mod review;
pub mod user;

use thiserror::Error;

pub use booking::{Acceptance, Booking, BookingState, BookingStatus, BookingView, NewBooking, Transition};
pub use instructor::{InstructorCard, InstructorProfile, Performance, SearchQuery};
pub use package::Package;
pub use progress::{ProgressUpdate, SkillProgress};
pub use prompt::{NewPrompt, PromptLog};
pub use review::{NewReview, Review, ReviewView};
pub use user::{LearnerListing, ProfileUpdate, RegisterRequest, User, UserListing, UserSummary};

/// A request field failed validation. The message is shown to the client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Reject empty or whitespace-only required text
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(format!("Missing required field: {}", field)));
    }
    Ok(())
}
