use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Settings::UserId).string().not_null().primary_key())
                    .col(boolean_on(Settings::EmailNotifications))
                    .col(boolean_on(Settings::QuizReminders))
                    .col(boolean_on(Settings::AchievementAlerts))
                    .col(
                        ColumnDef::new(Settings::ProfileVisibility)
                            .string()
                            .not_null()
                            .default("public"),
                    )
                    .col(boolean_on(Settings::ShowOnLeaderboard))
                    .col(boolean_on(Settings::AllowMessages))
                    .col(
                        ColumnDef::new(Settings::Theme)
                            .string()
                            .not_null()
                            .default("light"),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Settings::Table).to_owned())
            .await
    }
}

fn boolean_on(column: Settings) -> ColumnDef {
    ColumnDef::new(column)
        .boolean()
        .not_null()
        .default(true)
        .to_owned()
}

#[derive(DeriveIden)]
enum Settings {
    Table,
    UserId,
    EmailNotifications,
    QuizReminders,
    AchievementAlerts,
    ProfileVisibility,
    ShowOnLeaderboard,
    AllowMessages,
    Theme,
}
