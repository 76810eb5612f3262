//! Request and response shapes for the users API.
//!
//! These are distinct from the stored [`User`] entity: inputs are validated
//! here before reaching the service, and outputs expose only public fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::config::{MAX_EMAIL_LENGTH, MAX_NAME_LENGTH};
use crate::domain::{NewUser, User, UserChanges};

/// User creation request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UserCreate {
    /// Display name
    #[validate(length(max = 255, message = "name must be at most 255 characters"))]
    #[schema(example = "Alice", max_length = 255)]
    pub name: String,
    /// Email address, unique across users
    #[validate(length(max = 255, message = "email must be at most 255 characters"))]
    #[schema(example = "alice@example.com", max_length = 255)]
    pub email: String,
}

impl From<UserCreate> for NewUser {
    fn from(input: UserCreate) -> Self {
        Self {
            name: input.name,
            email: input.email,
        }
    }
}

/// Partial user update request.
///
/// Omitted fields are left untouched. Sending `null` for a field is rejected
/// since neither field can be cleared.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserUpdate {
    /// New display name
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "Alice Smith")]
    pub name: Option<Option<String>>,
    /// New email address
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "alice.smith@example.com")]
    pub email: Option<Option<String>>,
}

impl UserUpdate {
    /// Convert into domain changes. Call after [`Validate::validate`].
    pub fn into_changes(self) -> UserChanges {
        UserChanges {
            name: self.name.flatten(),
            email: self.email.flatten(),
        }
    }
}

impl Validate for UserUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match &self.name {
            Some(None) => errors.add("name", field_error("not_null", "name may not be null")),
            Some(Some(name)) if !within(name, MAX_NAME_LENGTH) => errors.add(
                "name",
                field_error("length", "name must be at most 255 characters"),
            ),
            _ => {}
        }

        match &self.email {
            Some(None) => errors.add("email", field_error("not_null", "email may not be null")),
            Some(Some(email)) if !within(email, MAX_EMAIL_LENGTH) => errors.add(
                "email",
                field_error("length", "email must be at most 255 characters"),
            ),
            _ => {}
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// User representation returned by every endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRead {
    /// Unique user identifier
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    /// Display name
    #[schema(example = "Alice")]
    pub name: String,
    /// Email address
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserRead {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn within(value: &str, max: u64) -> bool {
    value.chars().count() as u64 <= max
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}
