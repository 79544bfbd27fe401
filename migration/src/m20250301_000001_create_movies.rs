use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(pk_auto(Movies::Id))
                    .col(string(Movies::Title))
                    .col(string(Movies::Slug))
                    .col(string(Movies::Director).default(""))
                    .col(text(Movies::Cast).default(""))
                    .col(integer_null(Movies::Year))
                    .col(integer_null(Movies::Duration))
                    .col(string(Movies::Language).default(""))
                    .col(double(Movies::Rating).default(0.0))
                    .col(integer(Movies::VoteCount).default(0))
                    .col(text(Movies::Description).default(""))
                    .col(string(Movies::ImagePreviewUrl).default(""))
                    .col(string(Movies::ImageUrl).default(""))
                    .col(string(Movies::Url).default(""))
                    .col(string_null(Movies::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Slugs are computed at write time; two titles that slugify alike are rejected here.
        manager
            .create_index(
                Index::create()
                    .name("idx_movies_slug_unique")
                    .table(Movies::Table)
                    .col(Movies::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_updated_at")
                    .table(Movies::Table)
                    .col(Movies::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_title")
                    .table(Movies::Table)
                    .col(Movies::Title)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_year_rating_updated_at")
                    .table(Movies::Table)
                    .col(Movies::Year)
                    .col(Movies::Rating)
                    .col(Movies::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Title,
    Slug,
    Director,
    Cast,
    Year,
    Duration,
    Language,
    Rating,
    VoteCount,
    Description,
    ImagePreviewUrl,
    ImageUrl,
    Url,
    UpdatedAt,
}
