//! User entity: members, trainers, and admins

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User role enum
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Member,
    Trainer,
    Admin,
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        match s.as_str() {
            "trainer" => UserRole::Trainer,
            "admin" => UserRole::Admin,
            _ => UserRole::Member,
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Member => "member".to_string(),
            UserRole::Trainer => "trainer".to_string(),
            UserRole::Admin => "admin".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub username: String,

    #[sea_orm(column_type = "Text", unique)]
    pub email: String,

    /// Argon2 PHC-format hash, never the plaintext credential
    #[sea_orm(column_type = "Text")]
    #[serde(skip_serializing)]
    pub password_hash: String,

    #[sea_orm(column_type = "Text")]
    pub preferred_language: String,

    #[sea_orm(column_type = "Text")]
    pub role: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the user role as an enum
    pub fn user_role(&self) -> UserRole {
        UserRole::from(self.role.clone())
    }

    /// Trainers and admins may manage training programs
    pub fn can_manage_programs(&self) -> bool {
        matches!(self.user_role(), UserRole::Trainer | UserRole::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.user_role() == UserRole::Admin
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::chat_history::Entity")]
    ChatHistory,

    #[sea_orm(has_many = "super::chat_session::Entity")]
    ChatSessions,
}

impl Related<super::chat_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChatHistory.def()
    }
}

impl Related<super::chat_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChatSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        assert_eq!(UserRole::from(String::from(UserRole::Trainer)), UserRole::Trainer);
        assert_eq!(UserRole::from("nonsense".to_string()), UserRole::Member);
    }
}
