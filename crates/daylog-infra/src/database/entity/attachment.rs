//! Attachment entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "attachments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeUtc,
    pub file_path: String,
    pub file_hash: String,
    pub in_use: bool,
    pub post_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for daylog_core::domain::Attachment {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            created_at: model.created_at,
            file_path: model.file_path,
            file_hash: model.file_hash,
            in_use: model.in_use,
            post_id: model.post_id,
        }
    }
}

impl From<daylog_core::domain::Attachment> for ActiveModel {
    fn from(attachment: daylog_core::domain::Attachment) -> Self {
        Self {
            id: Set(attachment.id),
            created_at: Set(attachment.created_at),
            file_path: Set(attachment.file_path),
            file_hash: Set(attachment.file_hash),
            in_use: Set(attachment.in_use),
            post_id: Set(attachment.post_id),
        }
    }
}
