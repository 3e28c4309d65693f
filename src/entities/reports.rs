use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_name: String,
    pub user_area: String,
    pub user_pincode: String,

    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,

    /// Public URL of the stored photo.
    pub image_url: String,

    pub uploaded_at: String,

    pub analysis: Option<String>,
    /// One of "Safe" / "Moderate" / "Danger" once analyzed.
    pub safety_score: Option<String>,
    pub safety_percentage: Option<i32>,
    pub analyzed_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::comments::Entity")]
    Comments,
    #[sea_orm(has_many = "super::report_likes::Entity")]
    ReportLikes,
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::report_likes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportLikes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
