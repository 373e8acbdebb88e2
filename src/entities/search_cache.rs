use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "search_cache")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub query: String,
    pub platform: String,
    #[sea_orm(column_type = "Text")]
    pub results_json: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub continuation_json: Option<String>,
    pub has_more: bool,
    pub cached_at: String, // RFC 3339 UTC, fixed width so string order is time order
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
