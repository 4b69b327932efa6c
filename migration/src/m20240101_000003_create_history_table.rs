use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(History::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(History::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(History::UserId).string().not_null())
                    .col(ColumnDef::new(History::QuizName).string().not_null())
                    .col(ColumnDef::new(History::Category).string().not_null())
                    .col(ColumnDef::new(History::Score).integer().not_null())
                    .col(ColumnDef::new(History::TotalQuestions).integer().not_null())
                    .col(ColumnDef::new(History::CorrectAnswers).integer().not_null())
                    .col(ColumnDef::new(History::TimeSpent).integer().not_null())
                    .col(
                        ColumnDef::new(History::Date)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookups by owner, chronology and category must not scan
        for (name, column) in [
            ("idx_history_user_id", History::UserId),
            ("idx_history_date", History::Date),
            ("idx_history_category", History::Category),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(History::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(History::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum History {
    Table,
    Id,
    UserId,
    QuizName,
    Category,
    Score,
    TotalQuestions,
    CorrectAnswers,
    TimeSpent,
    Date,
}
