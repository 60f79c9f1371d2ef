//! The `matches` table (§6, §3 "Match"): one row per completed match.
//! Dialect-A embeds both profile ids directly; dialect-B links participants
//! via [`super::matches_played`] instead and leaves these columns unset.

use crate::database::DbResult;
use chrono::Utc;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::Serialize;
use std::future::Future;

#[derive(Serialize, Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "matches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: u32,
    pub profile_id_home: Option<u32>,
    pub profile_id_away: Option<u32>,
    pub score_home: i32,
    pub score_away: i32,
    pub team_id_home: u32,
    pub team_id_away: u32,
    pub played_on: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Inserts a dialect-A match row (profile ids embedded flat). Generic
    /// over `ConnectionTrait` so callers can run this inside a transaction
    /// (§4.7 requires the match insert and streak updates to be atomic).
    pub async fn insert_flat<C: ConnectionTrait>(
        db: &C,
        profile_id_home: u32,
        profile_id_away: u32,
        score_home: i32,
        score_away: i32,
        team_id_home: u32,
        team_id_away: u32,
    ) -> DbResult<Self> {
        let active = ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            profile_id_home: Set(Some(profile_id_home)),
            profile_id_away: Set(Some(profile_id_away)),
            score_home: Set(score_home),
            score_away: Set(score_away),
            team_id_home: Set(team_id_home),
            team_id_away: Set(team_id_away),
            played_on: Set(Utc::now()),
        };
        active.insert(db).await
    }

    /// Inserts a dialect-B match row; participants are recorded separately
    /// via `matches_played` link rows.
    pub async fn insert_linked<C: ConnectionTrait>(
        db: &C,
        score_home: i32,
        score_away: i32,
        team_id_home: u32,
        team_id_away: u32,
    ) -> DbResult<Self> {
        let active = ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            profile_id_home: Set(None),
            profile_id_away: Set(None),
            score_home: Set(score_home),
            score_away: Set(score_away),
            team_id_home: Set(team_id_home),
            team_id_away: Set(team_id_away),
            played_on: Set(Utc::now()),
        };
        active.insert(db).await
    }

    pub fn games_for_profile(
        db: &DatabaseConnection,
        profile_id: u32,
    ) -> impl Future<Output = DbResult<Vec<Self>>> + Send + '_ {
        Entity::find()
            .filter(
                Column::ProfileIdHome
                    .eq(profile_id)
                    .or(Column::ProfileIdAway.eq(profile_id)),
            )
            .all(db)
    }

    pub fn count(db: &DatabaseConnection) -> impl Future<Output = DbResult<u64>> + Send + '_ {
        Entity::find().count(db)
    }
}
