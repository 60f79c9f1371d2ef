//! The `profiles` table (§3 "Profile"): a named play identity owned by a
//! user at ordinal 0-2, carrying the rating/points/rank the server computes.

use crate::database::DbResult;
use chrono::Utc;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::Serialize;
use std::future::Future;

#[derive(Serialize, Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: u32,
    pub user_id: u32,
    /// Slot index, 0-2.
    pub ordinal: i16,
    #[sea_orm(unique)]
    pub name: String,
    pub fav_player: u32,
    pub fav_team: u32,
    pub rank: u32,
    pub points: i32,
    pub disconnects: u32,
    pub seconds_played: i64,
    /// Dialect-B only.
    pub rating: Option<i32>,
    /// Dialect-B only.
    pub comment: Option<String>,
    pub deleted: bool,
    pub updated_on: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(belongs_to = "super::users::Entity", from = "Column::UserId", to = "super::users::Column::Id")]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn by_id(
        db: &DatabaseConnection,
        id: u32,
    ) -> impl Future<Output = DbResult<Option<Self>>> + Send + '_ {
        Entity::find_by_id(id).one(db)
    }

    pub fn by_name<'a>(
        db: &'a DatabaseConnection,
        name: &str,
    ) -> impl Future<Output = DbResult<Option<Self>>> + Send + 'a {
        Entity::find()
            .filter(Column::Name.eq(name).and(Column::Deleted.eq(false)))
            .one(db)
    }

    pub fn all(db: &DatabaseConnection) -> impl Future<Output = DbResult<Vec<Self>>> + Send + '_ {
        Entity::find()
            .filter(Column::Deleted.eq(false))
            .order_by_desc(Column::Points)
            .all(db)
    }

    pub fn for_user(
        db: &DatabaseConnection,
        user_id: u32,
    ) -> impl Future<Output = DbResult<Vec<Self>>> + Send + '_ {
        Entity::find()
            .filter(Column::UserId.eq(user_id).and(Column::Deleted.eq(false)))
            .order_by_asc(Column::Ordinal)
            .all(db)
    }

    /// Creates a profile at the given ordinal for `user_id`. Callers must
    /// have already checked name uniqueness (§4.4 CreateProfile ⇒
    /// `ProfileNameTaken`).
    pub async fn create(
        db: &DatabaseConnection,
        user_id: u32,
        ordinal: i16,
        name: String,
    ) -> DbResult<Self> {
        let active = ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            user_id: Set(user_id),
            ordinal: Set(ordinal),
            name: Set(name),
            fav_player: Set(0),
            fav_team: Set(0),
            rank: Set(0),
            points: Set(0),
            disconnects: Set(0),
            seconds_played: Set(0),
            rating: Set(None),
            comment: Set(None),
            deleted: Set(false),
            updated_on: Set(Utc::now()),
        };
        active.insert(db).await
    }

    pub async fn soft_delete(db: &DatabaseConnection, id: u32) -> DbResult<()> {
        Entity::update_many()
            .col_expr(Column::Deleted, sea_orm::sea_query::Expr::value(true))
            .filter(Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn set_favourite_team(db: &DatabaseConnection, id: u32, team: u32) -> DbResult<()> {
        Entity::update_many()
            .col_expr(Column::FavTeam, sea_orm::sea_query::Expr::value(team))
            .filter(Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn set_favourite_player(db: &DatabaseConnection, id: u32, player: u32) -> DbResult<()> {
        Entity::update_many()
            .col_expr(Column::FavPlayer, sea_orm::sea_query::Expr::value(player))
            .filter(Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn add_disconnect(db: &DatabaseConnection, id: u32) -> DbResult<()> {
        if let Some(model) = Self::by_id(db, id).await? {
            let mut active: ActiveModel = model.into();
            active.disconnects = Set(active.disconnects.as_ref() + 1);
            active.update(db).await?;
        }
        Ok(())
    }

    /// Recomputes and persists `points` for this profile, from its current
    /// win/draw/loss stats (§4.8).
    pub async fn recompute_points(
        db: &DatabaseConnection,
        id: u32,
        points: i32,
    ) -> DbResult<()> {
        Entity::update_many()
            .col_expr(Column::Points, sea_orm::sea_query::Expr::value(points))
            .filter(Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }
}
