use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const LOOKUP_INDEX: &str = "idx_generated_images_user_server_channel";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GeneratedImages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GeneratedImages::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GeneratedImages::ArtifactUrl).text().not_null())
                    .col(ColumnDef::new(GeneratedImages::UserId).string().not_null())
                    .col(ColumnDef::new(GeneratedImages::UserName).string().not_null())
                    .col(ColumnDef::new(GeneratedImages::Prompt).text().not_null())
                    .col(ColumnDef::new(GeneratedImages::ServerName).string().not_null())
                    .col(ColumnDef::new(GeneratedImages::ChannelName).string().not_null())
                    .col(
                        ColumnDef::new(GeneratedImages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(LOOKUP_INDEX)
                    .table(GeneratedImages::Table)
                    .col(GeneratedImages::UserId)
                    .col(GeneratedImages::ServerName)
                    .col(GeneratedImages::ChannelName)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(LOOKUP_INDEX)
                    .table(GeneratedImages::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(GeneratedImages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GeneratedImages {
    Table,
    Id,
    ArtifactUrl,
    UserId,
    UserName,
    Prompt,
    ServerName,
    ChannelName,
    CreatedAt,
}
