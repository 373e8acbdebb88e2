use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ViewedState::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ViewedState::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ViewedState::UserId).string().not_null())
                    .col(ColumnDef::new(ViewedState::Query).string().not_null())
                    .col(ColumnDef::new(ViewedState::Platform).string().not_null())
                    .col(
                        ColumnDef::new(ViewedState::DisplayedIndex)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ViewedState::ViewedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_viewed_state_user_query_platform")
                    .table(ViewedState::Table)
                    .col(ViewedState::UserId)
                    .col(ViewedState::Query)
                    .col(ViewedState::Platform)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_viewed_state_viewed_at")
                    .table(ViewedState::Table)
                    .col(ViewedState::ViewedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ViewedState::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ViewedState {
    Table,
    Id,
    UserId,
    Query,
    Platform,
    DisplayedIndex,
    ViewedAt,
}
