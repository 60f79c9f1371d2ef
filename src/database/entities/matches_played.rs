//! The `matches_played` link table: dialect-B participant-to-match rows
//! (§6: "dialect-B links via matches_played(match_id, profile_id, home)").

use crate::database::DbResult;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::Serialize;
use std::future::Future;

#[derive(Serialize, Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "matches_played")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: u32,
    pub match_id: u32,
    pub profile_id: u32,
    pub home: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(belongs_to = "super::matches::Entity", from = "Column::MatchId", to = "super::matches::Column::Id")]
    Match,
}

impl Related<super::matches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Match.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn insert<C: ConnectionTrait>(
        db: &C,
        match_id: u32,
        profile_id: u32,
        home: bool,
    ) -> DbResult<Self> {
        let active = ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            match_id: Set(match_id),
            profile_id: Set(profile_id),
            home: Set(home),
        };
        active.insert(db).await
    }

    pub fn for_profile(
        db: &DatabaseConnection,
        profile_id: u32,
    ) -> impl Future<Output = DbResult<Vec<Self>>> + Send + '_ {
        Entity::find()
            .filter(Column::ProfileId.eq(profile_id))
            .all(db)
    }
}
