//! User repository implementation.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::User;
use crate::errors::{AppError, AppResult};

#[cfg(test)]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Absence is reported as `None`; only store failures become errors.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn get(&self, id: Uuid) -> AppResult<Option<User>>;

    /// List every user, unordered
    async fn get_all(&self) -> AppResult<Vec<User>>;

    /// Find user by exact email address
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a new user row
    async fn create(&self, user: User) -> AppResult<User>;

    /// Replace the stored name and email of an existing user
    async fn update(&self, user: User) -> AppResult<User>;

    /// Remove the user row
    async fn delete(&self, user: User) -> AppResult<()>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn get(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn get_all(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(User::from).collect())
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn create(&self, user: User) -> AppResult<User> {
        let model = ActiveModel::for_insert(user)
            .insert(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(User::from(model))
    }

    async fn update(&self, user: User) -> AppResult<User> {
        let model = ActiveModel::for_update(user)
            .update(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(User::from(model))
    }

    async fn delete(&self, user: User) -> AppResult<()> {
        UserEntity::delete_by_id(user.id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }
}
