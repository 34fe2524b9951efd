use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wish_products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category_id: i32,
    pub region: String,
    pub expected_price: f64,
    pub currency: String,
    pub wish_count: i64,
    pub like_count: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub additional_info: Option<String>,
    /// 以 `;` 分隔的已存储文件名
    #[sea_orm(column_type = "Text")]
    pub image_urls: String,
    pub status: String,
    pub user_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
