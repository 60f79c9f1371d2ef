//! The `settings` table: the two opaque, zlib-compressed per-profile
//! settings blobs exchanged by the 0x308a/0x3087/0x3088/0x3089 handlers.

use crate::database::DbResult;
use sea_orm::{entity::prelude::*, sea_query::OnConflict, ActiveValue::Set};
use serde::Serialize;
use std::future::Future;

#[derive(Serialize, Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip)]
    pub id: u32,
    #[sea_orm(unique)]
    pub profile_id: u32,
    #[serde(skip)]
    pub settings1: Vec<u8>,
    #[serde(skip)]
    pub settings2: Vec<u8>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn by_profile(
        db: &DatabaseConnection,
        profile_id: u32,
    ) -> impl Future<Output = DbResult<Option<Self>>> + Send + '_ {
        Entity::find()
            .filter(Column::ProfileId.eq(profile_id))
            .one(db)
    }

    pub fn set(
        db: &DatabaseConnection,
        profile_id: u32,
        settings1: Vec<u8>,
        settings2: Vec<u8>,
    ) -> impl Future<Output = DbResult<()>> + Send + '_ {
        async move {
            Entity::insert(ActiveModel {
                id: sea_orm::ActiveValue::NotSet,
                profile_id: Set(profile_id),
                settings1: Set(settings1),
                settings2: Set(settings2),
            })
            .on_conflict(
                OnConflict::column(Column::ProfileId)
                    .update_columns([Column::Settings1, Column::Settings2])
                    .to_owned(),
            )
            .exec(db)
            .await?;
            Ok(())
        }
    }
}
