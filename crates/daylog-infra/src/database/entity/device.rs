//! Remembered-device entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "devices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub user_agent: String,
    pub created_at: DateTimeUtc,
    pub last_seen_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for daylog_core::domain::Device {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_agent: model.user_agent,
            created_at: model.created_at,
            last_seen_at: model.last_seen_at,
        }
    }
}

impl From<daylog_core::domain::Device> for ActiveModel {
    fn from(device: daylog_core::domain::Device) -> Self {
        Self {
            id: Set(device.id),
            user_agent: Set(device.user_agent),
            created_at: Set(device.created_at),
            last_seen_at: Set(device.last_seen_at),
        }
    }
}
