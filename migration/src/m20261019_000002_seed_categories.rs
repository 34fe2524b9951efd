use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use sea_orm_migration::prelude::*;

use crate::entities::product_category;

/// 默认商品分类 (id, 名称, 描述)
pub const DEFAULT_CATEGORIES: [(i32, &str, &str); 9] = [
    (1, "電子產品", "手機、電腦、3C 周邊"),
    (2, "服飾配件", "衣服、鞋子、包包與飾品"),
    (3, "美妝保養", "彩妝、保養品與香氛"),
    (4, "食品飲料", "零食、飲品與地方特產"),
    (5, "居家生活", "家具、家電與生活用品"),
    (6, "運動健身", "運動用品與健身器材"),
    (7, "圖書文具", "書籍、文具與辦公用品"),
    (8, "玩具遊戲", "玩具、模型與桌遊"),
    (9, "其他", "其他類別商品"),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // 已有分类数据（例如从旧 CSV 导入）时不覆盖
        if product_category::Entity::find().count(db).await? > 0 {
            return Ok(());
        }

        let now = chrono::Utc::now();
        for (id, name, description) in DEFAULT_CATEGORIES {
            product_category::ActiveModel {
                id: Set(id),
                name: Set(name.to_string()),
                description: Set(Some(description.to_string())),
                is_active: Set(true),
                sort_order: Set(id),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(db)
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let ids: Vec<i32> = DEFAULT_CATEGORIES.iter().map(|(id, _, _)| *id).collect();
        product_category::Entity::delete_many()
            .filter(product_category::Column::Id.is_in(ids))
            .exec(manager.get_connection())
            .await?;
        Ok(())
    }
}
