//! PostgreSQL usage ledger.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use sea_orm::{
    ColumnTrait, DbConn, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use uuid::Uuid;

use dolle_core::domain::{LedgerEntry, PortfolioFilter};
use dolle_core::ports::{LedgerStream, UsageLedger};
use dolle_core::StoreError;

use crate::database::entity::generated_image::{self, Entity as GeneratedImage};

/// Rows fetched per round-trip while streaming a portfolio.
const PAGE_SIZE: u64 = 100;

/// Ledger stored in the `generated_images` table.
pub struct PostgresUsageLedger {
    db: Arc<DbConn>,
}

impl PostgresUsageLedger {
    pub fn new(db: DbConn) -> Self {
        Self { db: Arc::new(db) }
    }
}

#[async_trait]
impl UsageLedger for PostgresUsageLedger {
    async fn record(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        let model: generated_image::ActiveModel = entry.clone().into();
        GeneratedImage::insert(model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(query_error)?;

        tracing::debug!(id = %entry.id, user_id = %entry.user_id, "Ledger entry recorded");
        Ok(())
    }

    /// Keyset pagination on the primary key: each page starts after the last
    /// id seen, so rows present when the scan started come out exactly once.
    fn find(&self, filter: PortfolioFilter) -> LedgerStream {
        let db = Arc::clone(&self.db);

        let pages = stream::try_unfold(Some(None::<Uuid>), move |cursor| {
            let db = Arc::clone(&db);
            let select = filtered(&filter);
            async move {
                let Some(after) = cursor else {
                    return Ok::<_, StoreError>(None);
                };

                let mut page = select;
                if let Some(after) = after {
                    page = page.filter(generated_image::Column::Id.gt(after));
                }
                let rows = page
                    .order_by_asc(generated_image::Column::Id)
                    .limit(PAGE_SIZE)
                    .all(db.as_ref())
                    .await
                    .map_err(query_error)?;

                let next = if (rows.len() as u64) < PAGE_SIZE {
                    None
                } else {
                    rows.last().map(|row| Some(row.id))
                };
                Ok::<_, StoreError>(Some((rows, next)))
            }
        });

        pages
            .map_ok(|rows| {
                stream::iter(
                    rows.into_iter()
                        .map(|row| Ok::<_, StoreError>(LedgerEntry::from(row))),
                )
            })
            .try_flatten()
            .boxed()
    }
}

fn filtered(filter: &PortfolioFilter) -> Select<GeneratedImage> {
    let mut select =
        GeneratedImage::find().filter(generated_image::Column::UserId.eq(filter.user_id.as_str()));
    if let Some(server) = &filter.server_name {
        select = select.filter(generated_image::Column::ServerName.eq(server.as_str()));
    }
    if let Some(channel) = &filter.channel_name {
        select = select.filter(generated_image::Column::ChannelName.eq(channel.as_str()));
    }
    select
}

fn query_error(e: DbErr) -> StoreError {
    match e {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => StoreError::Connection(e.to_string()),
        _ => StoreError::Operation(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn row(user: &str, server: &str) -> generated_image::Model {
        generated_image::Model {
            id: Uuid::new_v4(),
            artifact_url: "https://cdn.test/a.png".to_owned(),
            user_id: user.to_owned(),
            user_name: "ada".to_owned(),
            prompt: "a red fox".to_owned(),
            server_name: server.to_owned(),
            channel_name: "general".to_owned(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_record_inserts_one_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let ledger = PostgresUsageLedger::new(db);

        let entry = LedgerEntry::new("u", "u1", "ada", "p", "Alpha", "general", Utc::now());
        ledger.record(&entry).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_streams_single_short_page() {
        let rows = vec![row("u1", "Alpha"), row("u1", "Alpha")];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows.clone()])
            .into_connection();
        let ledger = PostgresUsageLedger::new(db);

        let found: Vec<LedgerEntry> = ledger
            .find(PortfolioFilter::for_user("u1").in_server("Alpha"))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, rows[0].id);
        assert!(found.iter().all(|e| e.server_name == "Alpha"));
    }

    #[tokio::test]
    async fn test_find_follows_full_pages() {
        let first: Vec<_> = (0..PAGE_SIZE).map(|_| row("u1", "Alpha")).collect();
        let second = vec![row("u1", "Alpha")];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([first, second])
            .into_connection();
        let ledger = PostgresUsageLedger::new(db);

        let found: Vec<LedgerEntry> = ledger
            .find(PortfolioFilter::for_user("u1"))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(found.len() as u64, PAGE_SIZE + 1);
    }

    #[tokio::test]
    async fn test_find_restarts_on_shared_connection() {
        let rows = vec![row("u1", "Alpha")];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows.clone(), rows.clone()])
            .into_connection();
        let ledger = PostgresUsageLedger::new(db);

        for _ in 0..2 {
            let found: Vec<LedgerEntry> = ledger
                .find(PortfolioFilter::for_user("u1"))
                .try_collect()
                .await
                .unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].id, rows[0].id);
        }
    }

    #[test]
    fn test_filter_sql() {
        use sea_orm::QueryTrait;
        use sea_orm::sea_query::PostgresQueryBuilder;

        let sql = filtered(&PortfolioFilter::for_user("u1").in_channel("art"))
            .into_query()
            .to_string(PostgresQueryBuilder);

        assert!(sql.contains(r#""user_id" = 'u1'"#));
        assert!(sql.contains(r#""channel_name" = 'art'"#));
        assert!(!sql.contains("server_name\" ="));
    }
}
