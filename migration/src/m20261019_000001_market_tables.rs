use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 商品分类表
        manager
            .create_table(
                Table::create()
                    .table(ProductCategory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductCategory::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductCategory::Name).string().not_null())
                    .col(ColumnDef::new(ProductCategory::Description).text().null())
                    .col(
                        ColumnDef::new(ProductCategory::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ProductCategory::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ProductCategory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductCategory::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 许愿商品表
        manager
            .create_table(
                Table::create()
                    .table(WishProduct::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WishProduct::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WishProduct::Name).string().not_null())
                    .col(ColumnDef::new(WishProduct::Description).text().not_null())
                    .col(ColumnDef::new(WishProduct::CategoryId).integer().not_null())
                    .col(ColumnDef::new(WishProduct::Region).string().not_null())
                    .col(
                        ColumnDef::new(WishProduct::ExpectedPrice)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(WishProduct::Currency)
                            .string()
                            .not_null()
                            .default("TWD"),
                    )
                    .col(
                        ColumnDef::new(WishProduct::WishCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(WishProduct::LikeCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(WishProduct::AdditionalInfo).text().null())
                    .col(
                        ColumnDef::new(WishProduct::ImageUrls)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(WishProduct::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(WishProduct::UserId).string().null())
                    .col(
                        ColumnDef::new(WishProduct::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WishProduct::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_wish_products_category", WishProduct::CategoryId),
            ("idx_wish_products_status", WishProduct::Status),
            ("idx_wish_products_created_at", WishProduct::CreatedAt),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(WishProduct::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        // 上传文件记录表
        manager
            .create_table(
                Table::create()
                    .table(FileUpload::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FileUpload::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FileUpload::OriginalFilename)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FileUpload::StoredFilename)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FileUpload::FilePath).text().not_null())
                    .col(
                        ColumnDef::new(FileUpload::FileSize)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(FileUpload::MimeType).string().not_null())
                    .col(ColumnDef::new(FileUpload::RelatedTable).string().null())
                    .col(ColumnDef::new(FileUpload::RelatedId).string().null())
                    .col(
                        ColumnDef::new(FileUpload::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_file_uploads_related_id")
                    .table(FileUpload::Table)
                    .col(FileUpload::RelatedId)
                    .to_owned(),
            )
            .await?;

        // 连署表：同一访客对同一商品只能有一条记录
        manager
            .create_table(
                Table::create()
                    .table(Petition::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Petition::ProductId).string().not_null())
                    .col(ColumnDef::new(Petition::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Petition::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_petitions")
                            .col(Petition::ProductId)
                            .col(Petition::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_petitions_user_id")
                    .table(Petition::Table)
                    .col(Petition::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Petition::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FileUpload::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WishProduct::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductCategory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProductCategory {
    #[sea_orm(iden = "product_categories")]
    Table,
    Id,
    Name,
    Description,
    IsActive,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum WishProduct {
    #[sea_orm(iden = "wish_products")]
    Table,
    Id,
    Name,
    Description,
    CategoryId,
    Region,
    ExpectedPrice,
    Currency,
    WishCount,
    LikeCount,
    AdditionalInfo,
    ImageUrls,
    Status,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FileUpload {
    #[sea_orm(iden = "file_uploads")]
    Table,
    Id,
    OriginalFilename,
    StoredFilename,
    FilePath,
    FileSize,
    MimeType,
    RelatedTable,
    RelatedId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Petition {
    #[sea_orm(iden = "petitions")]
    Table,
    ProductId,
    UserId,
    CreatedAt,
}
