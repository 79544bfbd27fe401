use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(integer(Reviews::Id).primary_key())
                    .col(string_uniq(Reviews::Uid))
                    .col(string(Reviews::Title))
                    .col(text(Reviews::Content).default(""))
                    .col(string(Reviews::FilmTitle).default(""))
                    .col(string(Reviews::Director).default(""))
                    .col(integer_null(Reviews::Year))
                    .col(double_null(Reviews::Rating))
                    .col(string(Reviews::Slug).default(""))
                    .col(string_null(Reviews::AuthorId))
                    .col(string(Reviews::CreatedAt))
                    .col(string_null(Reviews::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Reviews::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    Id,
    Uid,
    Title,
    Content,
    FilmTitle,
    Director,
    Year,
    Rating,
    Slug,
    AuthorId,
    CreatedAt,
    UpdatedAt,
}
