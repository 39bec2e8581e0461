//! Accounts and profile updates

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{require_text, ValidationError};
use crate::types::{Role, UserStatus, Vehicle};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// A stored account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub location: Option<String>,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub vehicle: Option<Vehicle>,
    pub price: Option<i64>,
    pub languages: Option<String>,
    pub transmission: Option<String>,
    pub experience: Option<i64>,
    pub licence_number: Option<String>,
    pub address: Option<String>,
    pub transmission_preference: Option<String>,
    pub status: UserStatus,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Identity returned by register/login and kept by the client session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Row of the admin user list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListing {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub location: Option<String>,
    pub status: UserStatus,
}

/// Public learner fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerListing {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub transmission_preference: Option<String>,
}

/// Typed partial update of a profile.
///
/// Only fields present in the request are written. Unknown JSON keys are
/// ignored; fields that belong to another role's schema are rejected by
/// [`ProfileUpdate::validate_for`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
    pub bio: Option<String>,
    // instructor
    pub vehicle: Option<Vehicle>,
    pub price: Option<i64>,
    pub languages: Option<String>,
    pub transmission: Option<String>,
    pub experience: Option<i64>,
    // learner
    pub licence_number: Option<String>,
    pub address: Option<String>,
    pub transmission_preference: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ProfileUpdate::default()
    }

    fn instructor_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.vehicle.is_some() {
            fields.push("vehicle");
        }
        if self.price.is_some() {
            fields.push("price");
        }
        if self.languages.is_some() {
            fields.push("languages");
        }
        if self.transmission.is_some() {
            fields.push("transmission");
        }
        if self.experience.is_some() {
            fields.push("experience");
        }
        fields
    }

    fn learner_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.licence_number.is_some() {
            fields.push("licence_number");
        }
        if self.address.is_some() {
            fields.push("address");
        }
        if self.transmission_preference.is_some() {
            fields.push("transmission_preference");
        }
        fields
    }

    /// Check every present field against the schema of `role`
    pub fn validate_for(&self, role: Role) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }

        let foreign = match role {
            Role::Instructor => self.learner_fields(),
            Role::Learner => self.instructor_fields(),
            Role::Admin => {
                let mut all = self.instructor_fields();
                all.extend(self.learner_fields());
                all
            }
        };
        if let Some(field) = foreign.first() {
            return Err(ValidationError::new(format!(
                "Field '{}' is not valid for a {} profile",
                field, role
            )));
        }

        if matches!(self.price, Some(p) if p < 0) {
            return Err(ValidationError::new("price must not be negative"));
        }
        if matches!(self.experience, Some(e) if e < 0) {
            return Err(ValidationError::new("experience must not be negative"));
        }
        Ok(())
    }
}

/// Registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Role,
    #[serde(flatten)]
    pub profile: ProfileUpdate,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("email", &self.email)?;
        require_text("password", &self.password)?;
        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(ValidationError::new("Invalid email address"));
        }
        self.profile.validate_for(self.role)
    }

    /// Build the account to store. `password_hash` must already be hashed.
    pub fn into_user(self, id: String, password_hash: String) -> User {
        let p = self.profile;
        User {
            id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password_hash,
            role: self.role,
            location: p.location,
            image: p.image,
            bio: p.bio,
            vehicle: p.vehicle,
            price: p.price,
            languages: p.languages,
            transmission: p.transmission,
            experience: p.experience,
            licence_number: p.licence_number,
            address: p.address,
            transmission_preference: p.transmission_preference,
            status: UserStatus::Active,
        }
    }
}
