//! The `users` table (§6, §3 "User"): an identity hash plus a username,
//! owning up to 3 profiles by ordinal.

use crate::database::DbResult;
use chrono::Utc;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::Serialize;
use std::future::Future;

#[derive(Serialize, Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: u32,
    #[sea_orm(unique)]
    pub username: String,
    pub serial: String,
    /// 32-hex-character identity hash, unique. Looked up on every login.
    #[sea_orm(unique)]
    pub hash: String,
    /// Present iff the account is locked pending re-registration.
    pub reset_nonce: Option<String>,
    pub deleted: bool,
    pub updated_on: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::profiles::Entity")]
    Profiles,
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn by_hash<'a>(
        db: &'a DatabaseConnection,
        hash: &str,
    ) -> impl Future<Output = DbResult<Option<Self>>> + Send + 'a {
        Entity::find()
            .filter(Column::Hash.eq(hash).and(Column::Deleted.eq(false)))
            .one(db)
    }

    pub fn by_username<'a>(
        db: &'a DatabaseConnection,
        username: &str,
    ) -> impl Future<Output = DbResult<Option<Self>>> + Send + 'a {
        Entity::find()
            .filter(Column::Username.eq(username).and(Column::Deleted.eq(false)))
            .one(db)
    }

    pub fn all(db: &DatabaseConnection) -> impl Future<Output = DbResult<Vec<Self>>> + Send + '_ {
        Entity::find()
            .filter(Column::Deleted.eq(false))
            .all(db)
    }

    /// Creates a user, or re-binds an existing one found by username with a
    /// new hash (the registration re-bind flow driven by the admin-issued
    /// one-time nonce, §6).
    pub async fn register(
        db: &DatabaseConnection,
        username: String,
        serial: String,
        hash: String,
    ) -> DbResult<Self> {
        if let Some(existing) = Self::by_username(db, &username).await? {
            let mut active: ActiveModel = existing.into();
            active.hash = Set(hash);
            active.serial = Set(serial);
            active.reset_nonce = Set(None);
            active.updated_on = Set(Utc::now());
            return active.update(db).await;
        }

        let active = ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            username: Set(username),
            serial: Set(serial),
            hash: Set(hash),
            reset_nonce: Set(None),
            deleted: Set(false),
            updated_on: Set(Utc::now()),
        };
        active.insert(db).await
    }

    pub async fn set_locked(db: &DatabaseConnection, id: u32, nonce: Option<String>) -> DbResult<()> {
        Entity::update_many()
            .col_expr(Column::ResetNonce, sea_orm::sea_query::Expr::value(nonce))
            .filter(Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn soft_delete(db: &DatabaseConnection, id: u32) -> DbResult<()> {
        Entity::update_many()
            .col_expr(Column::Deleted, sea_orm::sea_query::Expr::value(true))
            .filter(Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }
}
