//! User service - Handles user-related business logic.
//!
//! Enforces the invariants the repository does not: existence of the
//! target user and uniqueness of email addresses.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{NewUser, User, UserChanges};
use crate::errors::{AppError, AppResult};
use crate::infra::UserRepository;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get user by ID
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    /// List all users
    async fn get_all_users(&self) -> AppResult<Vec<User>>;

    /// Register a new user with a unique email
    async fn create_user(&self, input: NewUser) -> AppResult<User>;

    /// Apply a partial update to an existing user
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<User>;

    /// Permanently delete a user
    async fn delete_user(&self, id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of UserService using repository.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
}

impl UserManager {
    /// Create new user service instance with repository
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Fail with Conflict if `email` belongs to a user other than `owner`.
    async fn ensure_email_available(&self, email: &str, owner: Option<Uuid>) -> AppResult<()> {
        match self.repo.get_by_email(email).await? {
            Some(holder) if Some(holder.id) != owner => Err(email_taken(email)),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {} not found", id)))
    }

    async fn get_all_users(&self) -> AppResult<Vec<User>> {
        self.repo.get_all().await
    }

    async fn create_user(&self, input: NewUser) -> AppResult<User> {
        self.ensure_email_available(&input.email, None).await?;

        let user = User::new(input.name, input.email);
        let email = user.email.clone();
        let user = self
            .repo
            .create(user)
            .await
            .map_err(|e| unique_violation_as_conflict(e, &email))?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<User> {
        let mut user = self.get_user(id).await?;

        if changes.is_empty() {
            return Ok(user);
        }

        if let Some(email) = changes.email.as_deref() {
            self.ensure_email_available(email, Some(id)).await?;
        }

        user.apply(changes);
        let email = user.email.clone();
        let user = self
            .repo
            .update(user)
            .await
            .map_err(|e| unique_violation_as_conflict(e, &email))?;

        tracing::info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        let user = self.get_user(id).await?;
        self.repo.delete(user).await?;

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}

fn email_taken(email: &str) -> AppError {
    AppError::conflict(format!("User with email {} already exists", email))
}

/// A concurrent writer may claim the email between check and write; the
/// store's unique constraint then reports it.
fn unique_violation_as_conflict(error: AppError, email: &str) -> AppError {
    if error.is_unique_violation() {
        email_taken(email)
    } else {
        error
    }
}
