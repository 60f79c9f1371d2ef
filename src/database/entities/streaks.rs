//! The `streaks` table (§6, §4.7 step 4): current and best consecutive-win
//! counts per profile.

use crate::database::DbResult;
use sea_orm::{entity::prelude::*, sea_query::OnConflict, ActiveValue::Set};
use serde::Serialize;
use std::future::Future;

#[derive(Serialize, Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "streaks")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip)]
    pub id: u32,
    #[sea_orm(unique)]
    pub profile_id: u32,
    pub wins: u32,
    pub best: u32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn by_profile<C: ConnectionTrait>(
        db: &C,
        profile_id: u32,
    ) -> impl Future<Output = DbResult<Option<Self>>> + Send + '_ {
        Entity::find()
            .filter(Column::ProfileId.eq(profile_id))
            .one(db)
    }

    /// Applies one match result's worth of streak update for `profile_id`
    /// and upserts the row, exactly per the original `_writeStreak`
    /// algorithm: a win increments `wins` (and `best` tracks the max), any
    /// non-win (loss or draw) resets `wins` to 0. Generic so it can run
    /// inside the same transaction as the match insert (§4.7).
    pub async fn apply_result<C: ConnectionTrait>(db: &C, profile_id: u32, won: bool) -> DbResult<()> {
        let existing = Self::by_profile(db, profile_id).await?;
        let (wins, best) = match existing {
            Some(row) if won => (row.wins + 1, row.best.max(row.wins + 1)),
            Some(row) => (0, row.best),
            None if won => (1, 1),
            None => (0, 0),
        };

        Entity::insert(ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            profile_id: Set(profile_id),
            wins: Set(wins),
            best: Set(best),
        })
        .on_conflict(
            OnConflict::column(Column::ProfileId)
                .update_columns([Column::Wins, Column::Best])
                .to_owned(),
        )
        .exec(db)
        .await?;

        Ok(())
    }
}
