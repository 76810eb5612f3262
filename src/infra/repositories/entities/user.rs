//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Unchanged, Set};

use crate::domain::User;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            name: model.name,
            email: model.email,
            created_at: model.created_at,
        }
    }
}

impl ActiveModel {
    /// Active model for inserting a brand new row
    pub fn for_insert(user: User) -> Self {
        Self {
            id: Set(user.id),
            name: Set(user.name),
            email: Set(user.email),
            created_at: Set(user.created_at),
        }
    }

    /// Active model replacing the mutable columns of an existing row
    pub fn for_update(user: User) -> Self {
        Self {
            id: Unchanged(user.id),
            name: Set(user.name),
            email: Set(user.email),
            created_at: Unchanged(user.created_at),
        }
    }
}
