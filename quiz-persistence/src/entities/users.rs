use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub email: String,
    pub username: String,
    pub credential: String,
    pub display_name: String,
    pub avatar: String,
    pub created_at: DateTimeUtc,
    pub last_login: DateTimeUtc,
    pub last_attempt_at: Option<DateTimeUtc>,
    pub total_quizzes: i32,
    pub average_score: i32,
    pub total_time_seconds: i32,
    pub rank: i32,
    pub streak: i32,
    pub level: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
