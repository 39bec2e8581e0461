//! Bookings and their lifecycle
//!
//! A booking carries two pieces of state: the lesson status driven by either
//! party, and the instructor's acceptance decision. Both only change through
//! named [`Transition`]s applied to a [`BookingState`].

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use super::{package, require_text, ValidationError};
use crate::types::Vehicle;

/// Lesson status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "in-progress" => Ok(BookingStatus::InProgress),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(ValidationError::new("Invalid status value")),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instructor decision, stored and serialized as 0 / 1 / -1
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(into = "i64", try_from = "i64")]
pub enum Acceptance {
    Pending,
    Accepted,
    Rejected,
}

impl From<Acceptance> for i64 {
    fn from(a: Acceptance) -> i64 {
        match a {
            Acceptance::Pending => 0,
            Acceptance::Accepted => 1,
            Acceptance::Rejected => -1,
        }
    }
}

impl TryFrom<i64> for Acceptance {
    type Error = String;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Acceptance::Pending),
            1 => Ok(Acceptance::Accepted),
            -1 => Ok(Acceptance::Rejected),
            other => Err(format!("invalid acceptance flag: {}", other)),
        }
    }
}

impl std::fmt::Display for Acceptance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Acceptance::Pending => "pending",
            Acceptance::Accepted => "accepted",
            Acceptance::Rejected => "rejected",
        })
    }
}

/// Named booking transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Start,
    Complete,
    Cancel,
    Accept,
    Reject,
}

impl Transition {
    /// The transition that moves a booking into `status`. Nothing moves a
    /// booking back to `confirmed`.
    pub fn into_status(status: BookingStatus) -> Option<Transition> {
        match status {
            BookingStatus::Confirmed => None,
            BookingStatus::InProgress => Some(Transition::Start),
            BookingStatus::Completed => Some(Transition::Complete),
            BookingStatus::Cancelled => Some(Transition::Cancel),
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Transition::Start => "start",
            Transition::Complete => "complete",
            Transition::Cancel => "cancel",
            Transition::Accept => "accept",
            Transition::Reject => "reject",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot {} a booking that is {status}", .transition.verb())]
    InvalidStatus {
        transition: Transition,
        status: BookingStatus,
    },

    #[error("Booking has already been {0}")]
    AlreadyDecided(Acceptance),

    #[error("Booking was rejected by the instructor")]
    Rejected,
}

/// Combined status and acceptance of one booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingState {
    pub status: BookingStatus,
    pub acceptance: Acceptance,
}

impl Default for BookingState {
    fn default() -> Self {
        Self {
            status: BookingStatus::Confirmed,
            acceptance: Acceptance::Pending,
        }
    }
}

impl BookingState {
    pub fn apply(self, transition: Transition) -> Result<BookingState, TransitionError> {
        let invalid = || TransitionError::InvalidStatus {
            transition,
            status: self.status,
        };

        match transition {
            Transition::Accept | Transition::Reject => {
                if self.acceptance != Acceptance::Pending {
                    return Err(TransitionError::AlreadyDecided(self.acceptance));
                }
                if self.status == BookingStatus::Cancelled {
                    return Err(invalid());
                }
                let acceptance = if transition == Transition::Accept {
                    Acceptance::Accepted
                } else {
                    Acceptance::Rejected
                };
                Ok(BookingState { acceptance, ..self })
            }
            Transition::Start | Transition::Complete => {
                let from = if transition == Transition::Start {
                    BookingStatus::Confirmed
                } else {
                    BookingStatus::InProgress
                };
                if self.status != from {
                    return Err(invalid());
                }
                if self.acceptance == Acceptance::Rejected {
                    return Err(TransitionError::Rejected);
                }
                let status = if transition == Transition::Start {
                    BookingStatus::InProgress
                } else {
                    BookingStatus::Completed
                };
                Ok(BookingState { status, ..self })
            }
            Transition::Cancel => match self.status {
                BookingStatus::Confirmed | BookingStatus::InProgress => Ok(BookingState {
                    status: BookingStatus::Cancelled,
                    ..self
                }),
                _ => Err(invalid()),
            },
        }
    }

    /// A lesson finished without the instructor ever answering the request
    pub fn completed_while_pending(&self) -> bool {
        self.status == BookingStatus::Completed && self.acceptance == Acceptance::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub learner_id: String,
    pub instructor_id: String,
    pub date: String,
    pub package_id: Option<String>,
    pub status: BookingStatus,
    pub accepted: Acceptance,
}

impl Booking {
    pub fn state(&self) -> BookingState {
        BookingState {
            status: self.status,
            acceptance: self.accepted,
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.learner_id == user_id || self.instructor_id == user_id
    }
}

/// A booking joined with the names the dashboards display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewBooking {
    pub learner_id: String,
    pub instructor_id: String,
    pub date: String,
    #[serde(default)]
    pub package_id: Option<String>,
}

impl NewBooking {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("learner_id", &self.learner_id)?;
        require_text("instructor_id", &self.instructor_id)?;
        require_text("date", &self.date)?;
        if let Some(id) = &self.package_id {
            if package::find(id).is_none() {
                return Err(ValidationError::new(format!("Unknown package: {}", id)));
            }
        }
        Ok(())
    }
}

/// Body of `PUT /api/bookings/{id}/status`
#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

impl StatusChange {
    pub fn transition(&self) -> Result<Transition, ValidationError> {
        let status: BookingStatus = self.status.parse()?;
        Transition::into_status(status).ok_or_else(|| ValidationError::new("Invalid status value"))
    }
}
