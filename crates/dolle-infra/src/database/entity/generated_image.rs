//! Generated image (ledger entry) entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "generated_images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub artifact_url: String,
    pub user_id: String,
    pub user_name: String,
    #[sea_orm(column_type = "Text")]
    pub prompt: String,
    pub server_name: String,
    pub channel_name: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to the domain ledger entry.
impl From<Model> for dolle_core::domain::LedgerEntry {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            artifact_url: model.artifact_url,
            user_id: model.user_id,
            user_name: model.user_name,
            prompt: model.prompt,
            server_name: model.server_name,
            channel_name: model.channel_name,
            created_at: model.created_at.into(),
        }
    }
}

/// Conversion from the domain ledger entry to SeaORM ActiveModel.
impl From<dolle_core::domain::LedgerEntry> for ActiveModel {
    fn from(entry: dolle_core::domain::LedgerEntry) -> Self {
        Self {
            id: Set(entry.id),
            artifact_url: Set(entry.artifact_url),
            user_id: Set(entry.user_id),
            user_name: Set(entry.user_name),
            prompt: Set(entry.prompt),
            server_name: Set(entry.server_name),
            channel_name: Set(entry.channel_name),
            created_at: Set(entry.created_at.into()),
        }
    }
}
