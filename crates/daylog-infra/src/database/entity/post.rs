//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
    pub deleted_at: Option<DateTimeUtc>,
    pub event_time: DateTimeUtc,
    pub title: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub body: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attachment::Entity")]
    Attachment,
}

impl Related<super::attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for daylog_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            created_at: model.created_at,
            updated_at: model.updated_at,
            deleted_at: model.deleted_at,
            event_time: model.event_time,
            title: model.title,
            body: model.body,
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<daylog_core::domain::Post> for ActiveModel {
    fn from(post: daylog_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            created_at: Set(post.created_at),
            updated_at: Set(post.updated_at),
            deleted_at: Set(post.deleted_at),
            event_time: Set(post.event_time),
            title: Set(post.title),
            body: Set(post.body),
        }
    }
}
