use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "admins")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stored lowercased and trimmed.
    #[sea_orm(unique)]
    pub email: String,

    pub is_verified: bool,

    /// Active login challenge; both columns set together, cleared together.
    pub verification_code: Option<String>,
    pub code_expires_at: Option<String>,

    /// Server-issued session token (64-char hex) with its expiry.
    pub session_token: Option<String>,
    pub session_expires_at: Option<String>,

    pub last_login: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
