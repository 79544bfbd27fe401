use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub director: String,
    pub cast: String,
    pub year: Option<i32>,
    pub duration: Option<i32>,
    pub language: String,
    #[sea_orm(column_type = "Double")]
    pub rating: f64,
    pub vote_count: i32,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub image_preview_url: String,
    pub image_url: String,
    pub url: String,
    pub updated_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
