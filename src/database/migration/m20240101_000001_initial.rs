use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).unsigned().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Users::Username).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Serial).string().not_null())
                    .col(ColumnDef::new(Users::Hash).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::ResetNonce).string().null())
                    .col(ColumnDef::new(Users::Deleted).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::UpdatedOn).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Profiles::Id).unsigned().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Profiles::UserId).unsigned().not_null())
                    .col(ColumnDef::new(Profiles::Ordinal).small_integer().not_null())
                    .col(ColumnDef::new(Profiles::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Profiles::FavPlayer).unsigned().not_null().default(0))
                    .col(ColumnDef::new(Profiles::FavTeam).unsigned().not_null().default(0))
                    .col(ColumnDef::new(Profiles::Rank).unsigned().not_null().default(0))
                    .col(ColumnDef::new(Profiles::Points).integer().not_null().default(0))
                    .col(ColumnDef::new(Profiles::Disconnects).unsigned().not_null().default(0))
                    .col(ColumnDef::new(Profiles::SecondsPlayed).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Profiles::Rating).integer().null())
                    .col(ColumnDef::new(Profiles::Comment).string().null())
                    .col(ColumnDef::new(Profiles::Deleted).boolean().not_null().default(false))
                    .col(ColumnDef::new(Profiles::UpdatedOn).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Profiles::Table, Profiles::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Matches::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Matches::Id).unsigned().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Matches::ProfileIdHome).unsigned().null())
                    .col(ColumnDef::new(Matches::ProfileIdAway).unsigned().null())
                    .col(ColumnDef::new(Matches::ScoreHome).integer().not_null())
                    .col(ColumnDef::new(Matches::ScoreAway).integer().not_null())
                    .col(ColumnDef::new(Matches::TeamIdHome).unsigned().not_null())
                    .col(ColumnDef::new(Matches::TeamIdAway).unsigned().not_null())
                    .col(ColumnDef::new(Matches::PlayedOn).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MatchesPlayed::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MatchesPlayed::Id).unsigned().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(MatchesPlayed::MatchId).unsigned().not_null())
                    .col(ColumnDef::new(MatchesPlayed::ProfileId).unsigned().not_null())
                    .col(ColumnDef::new(MatchesPlayed::Home).boolean().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(MatchesPlayed::Table, MatchesPlayed::MatchId)
                            .to(Matches::Table, Matches::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Streaks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Streaks::Id).unsigned().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Streaks::ProfileId).unsigned().not_null().unique_key())
                    .col(ColumnDef::new(Streaks::Wins).unsigned().not_null().default(0))
                    .col(ColumnDef::new(Streaks::Best).unsigned().not_null().default(0))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Settings::Id).unsigned().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Settings::ProfileId).unsigned().not_null().unique_key())
                    .col(ColumnDef::new(Settings::Settings1).binary().not_null())
                    .col(ColumnDef::new(Settings::Settings2).binary().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Settings::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Streaks::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MatchesPlayed::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Matches::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Profiles::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Serial,
    Hash,
    ResetNonce,
    Deleted,
    UpdatedOn,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    UserId,
    Ordinal,
    Name,
    FavPlayer,
    FavTeam,
    Rank,
    Points,
    Disconnects,
    SecondsPlayed,
    Rating,
    Comment,
    Deleted,
    UpdatedOn,
}

#[derive(DeriveIden)]
enum Matches {
    Table,
    Id,
    ProfileIdHome,
    ProfileIdAway,
    ScoreHome,
    ScoreAway,
    TeamIdHome,
    TeamIdAway,
    PlayedOn,
}

#[derive(DeriveIden)]
enum MatchesPlayed {
    Table,
    Id,
    MatchId,
    ProfileId,
    Home,
}

#[derive(DeriveIden)]
enum Streaks {
    Table,
    Id,
    ProfileId,
    Wins,
    Best,
}

#[derive(DeriveIden)]
enum Settings {
    Table,
    Id,
    ProfileId,
    Settings1,
    Settings2,
}
